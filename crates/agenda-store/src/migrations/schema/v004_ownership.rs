//! Join tables linking users to the items and notes they can see.

use crate::migrations::SqlMigration;

const UP_SQL: &str = r#"
CREATE TABLE item_on_user (
    item_id_fk     TEXT NOT NULL,
    user_id_fk     TEXT NOT NULL,
    permission     TEXT NOT NULL CHECK (permission IN ('Owner', 'Write', 'Read')),
    invite_pending INTEGER NOT NULL DEFAULT 0,
    sorting_rank   INTEGER NOT NULL DEFAULT 0,

    PRIMARY KEY (item_id_fk, user_id_fk),
    FOREIGN KEY (item_id_fk) REFERENCES items(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id_fk) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX idx_item_on_user_user ON item_on_user(user_id_fk, sorting_rank);

CREATE TABLE note_on_user (
    note_id_fk     TEXT NOT NULL,
    user_id_fk     TEXT NOT NULL,
    permission     TEXT NOT NULL CHECK (permission IN ('Owner', 'Write', 'Read')),
    invite_pending INTEGER NOT NULL DEFAULT 0,
    sorting_rank   INTEGER NOT NULL DEFAULT 0,

    PRIMARY KEY (note_id_fk, user_id_fk),
    FOREIGN KEY (note_id_fk) REFERENCES notes(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id_fk) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX idx_note_on_user_user ON note_on_user(user_id_fk, sorting_rank);
"#;

const DOWN_SQL: &str = r#"
DROP TABLE note_on_user;
DROP TABLE item_on_user;
"#;

pub const UNIT: SqlMigration = SqlMigration {
    name: "2023-08-20_004_create_ownership",
    up_sql: UP_SQL,
    down_sql: DOWN_SQL,
};
