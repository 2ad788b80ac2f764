//! Users table. Identifiers are carried over from the legacy store.

use crate::migrations::SqlMigration;

const UP_SQL: &str = r#"
CREATE TABLE users (
    id                    TEXT PRIMARY KEY NOT NULL,
    username              TEXT NOT NULL UNIQUE,
    email                 TEXT,
    password_hash         TEXT,
    timezone              TEXT NOT NULL,        -- IANA zone name
    notify_minutes_before INTEGER NOT NULL,
    created_at            TEXT NOT NULL         -- RFC-3339
);
"#;

const DOWN_SQL: &str = "DROP TABLE users;";

pub const UNIT: SqlMigration = SqlMigration {
    name: "2023-08-20_001_create_users",
    up_sql: UP_SQL,
    down_sql: DOWN_SQL,
};
