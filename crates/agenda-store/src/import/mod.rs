//! Conversion of legacy documents into relational rows.
//!
//! Imports are best-effort per record: a document that cannot be converted
//! or written is logged, recorded in the [`ImportReport`] and skipped, and
//! the import moves on. Only failures that make the whole source unreadable
//! surface as a [`StoreError`] and fail the enclosing unit.
//!
//! Within a unit's transaction, SQLite rolls a failing statement back on its
//! own, so a skipped record never leaves partial writes behind.

mod entities;
mod sharing;
mod social;
pub mod transform;

pub use entities::{import_items, import_notes, import_users, ItemSelection};
pub use sharing::import_ownership;
pub use social::import_friendships;

use rusqlite::ffi;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::legacy_store::RejectedDocument;

/// Why a single legacy record was not imported.
#[derive(Error, Debug)]
pub enum RecordTransformError {
    #[error("malformed field `{field}`: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("{entity} {id} does not exist")]
    MissingReference { entity: &'static str, id: String },

    #[error("row already exists")]
    Duplicate,

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("legacy store error: {0}")]
    Legacy(String),
}

impl From<rusqlite::Error> for RecordTransformError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ffi_err, _) = &err {
            if ffi_err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || ffi_err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
            {
                return RecordTransformError::Duplicate;
            }
        }
        RecordTransformError::Database(err)
    }
}

impl From<StoreError> for RecordTransformError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Sqlite(e) => e.into(),
            other => RecordTransformError::Legacy(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct SkippedRecord {
    /// Legacy identifier of the record, or a `user/entry` pair for links.
    pub record: String,
    pub error: RecordTransformError,
}

/// Aggregated outcome of importing one entity kind.
#[derive(Debug)]
pub struct ImportReport {
    pub entity: &'static str,
    pub imported: usize,
    /// Referenced rows created on the spot because they were missing.
    pub healed: usize,
    /// Rows written with a null reference because the target is unknown.
    pub unresolved_references: usize,
    /// Symmetric relations left for the other side of the pair to write.
    pub deferred: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl ImportReport {
    pub fn new(entity: &'static str) -> Self {
        Self {
            entity,
            imported: 0,
            healed: 0,
            unresolved_references: 0,
            deferred: 0,
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, record: impl Into<String>, error: RecordTransformError) {
        let record = record.into();
        warn!(entity = self.entity, record = %record, error = %error, "skipping legacy record");
        self.skipped.push(SkippedRecord { record, error });
    }

    /// Count documents the legacy store could not decode as skipped records.
    fn skip_rejected(&mut self, rejected: Vec<RejectedDocument>) {
        for doc in rejected {
            self.skip(
                doc.id,
                RecordTransformError::Malformed {
                    field: "document",
                    reason: doc.reason,
                },
            );
        }
    }

    pub fn log(&self, unit: &str) {
        info!(
            unit,
            entity = self.entity,
            imported = self.imported,
            healed = self.healed,
            unresolved_references = self.unresolved_references,
            deferred = self.deferred,
            skipped = self.skipped.len(),
            "legacy import finished"
        );
    }
}
