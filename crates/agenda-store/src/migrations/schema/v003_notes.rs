use crate::migrations::SqlMigration;

const UP_SQL: &str = r#"
CREATE TABLE notes (
    id         TEXT PRIMARY KEY NOT NULL,
    title      TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

const DOWN_SQL: &str = "DROP TABLE notes;";

pub const UNIT: SqlMigration = SqlMigration {
    name: "2023-08-20_003_create_notes",
    up_sql: UP_SQL,
    down_sql: DOWN_SQL,
};
