use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// A migration unit's forward or backward operation failed.
    #[error("Migration {name} failed: {message}")]
    Migration { name: String, message: String },

    /// Two units in the same family share a name.
    #[error("Duplicate migration name: {0}")]
    DuplicateMigration(String),

    /// A checkpoint was requested that no unit in the family carries.
    #[error("Unknown migration checkpoint: {0}")]
    UnknownCheckpoint(String),

    /// The legacy document store could not be read.
    #[error("Legacy store error: {0}")]
    Legacy(String),

    /// JSON decoding error (legacy dumps).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Errors raised before any unit runs, caused by how the unit set or the
    /// run was configured.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateMigration(_) | StoreError::UnknownCheckpoint(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
