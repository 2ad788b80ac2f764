/// Application name
pub const APP_NAME: &str = "Agenda";

/// Timezone assigned to users whose legacy record carries none
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";

/// Notification lead time (minutes) when the legacy value is absent or unparseable
pub const DEFAULT_NOTIFY_MINUTES_BEFORE: i64 = 5;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Ledger table for schema-evolution units
pub const SCHEMA_LEDGER_TABLE: &str = "schema_migrations";

/// Ledger table for one-off data units
pub const DATA_LEDGER_TABLE: &str = "data_migrations";

/// Last data unit of the initial cutover from the legacy document store
pub const SEED_CHECKPOINT: &str = "2023-09-01_007_import_friendships";

/// File names of the legacy collection dumps
pub const LEGACY_USERS_FILE: &str = "users.json";
pub const LEGACY_ITEMS_FILE: &str = "items.json";
pub const LEGACY_NOTES_FILE: &str = "notes.json";
