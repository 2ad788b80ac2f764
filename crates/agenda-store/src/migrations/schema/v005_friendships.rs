//! Friendships, one row per unordered pair of users.

use crate::migrations::SqlMigration;

const UP_SQL: &str = r#"
CREATE TABLE friendships (
    user1_id_fk TEXT NOT NULL,
    user2_id_fk TEXT NOT NULL,
    status      TEXT NOT NULL CHECK (status IN (
        'PendingFirst', 'PendingSecond', 'Friends',
        'BlockedFirst', 'BlockedSecond', 'BlockedBoth'
    )),

    PRIMARY KEY (user1_id_fk, user2_id_fk),
    CHECK (user1_id_fk < user2_id_fk),
    FOREIGN KEY (user1_id_fk) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (user2_id_fk) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX idx_friendships_user2 ON friendships(user2_id_fk);
"#;

const DOWN_SQL: &str = "DROP TABLE friendships;";

pub const UNIT: SqlMigration = SqlMigration {
    name: "2023-08-20_005_create_friendships",
    up_sql: UP_SQL,
    down_sql: DOWN_SQL,
};
