use crate::migrations::SqlMigration;

const UP_SQL: &str = r#"
CREATE TABLE items (
    id               TEXT PRIMARY KEY NOT NULL,
    name             TEXT NOT NULL,
    description      TEXT,
    date             TEXT,                      -- YYYY-MM-DD
    time             TEXT,                      -- HH:MM
    duration_minutes INTEGER,
    repeat_rule      TEXT,
    done             INTEGER NOT NULL DEFAULT 0,
    template_id_fk   TEXT,                      -- nullable FK -> items(id)
    created_at       TEXT NOT NULL,

    FOREIGN KEY (template_id_fk) REFERENCES items(id) ON DELETE SET NULL
);

CREATE INDEX idx_items_template ON items(template_id_fk);
"#;

const DOWN_SQL: &str = r#"
DROP INDEX idx_items_template;
DROP TABLE items;
"#;

pub const UNIT: SqlMigration = SqlMigration {
    name: "2023-08-20_002_create_items",
    up_sql: UP_SQL,
    down_sql: DOWN_SQL,
};
