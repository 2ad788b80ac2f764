//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and is the entry
//! point for both migration families: schema units run through
//! [`Database::migrate`], the one-time legacy cutover through
//! [`Database::seed`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::legacy_store::LegacyStore;
use crate::migrations::data;
use crate::migrations::ledger::Ledger;
use crate::migrations::runner::{MigrationRunner, MigrationStatus, RunResult, SeedRunner};
use crate::migrations::{schema, Migration};

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/agenda/agenda.db`
    /// - macOS:   `~/Library/Application Support/com.agenda.agenda/agenda.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\agenda\agenda\data\agenda.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "agenda", "agenda").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("agenda.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// No migration runs here; callers decide when to call [`Database::migrate`].
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self { conn })
    }

    /// Open a private in-memory database. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return a mutable reference to the underlying connection.
    ///
    /// Runners need it to open one transaction per unit.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    // ------------------------------------------------------------------
    // Migrations
    // ------------------------------------------------------------------

    /// Apply every pending schema-evolution unit.
    ///
    /// `Err` means the run could not start (bad unit set, unreadable ledger);
    /// a unit failure is reported inside the returned [`RunResult`].
    pub fn migrate(&mut self) -> Result<RunResult> {
        let runner = MigrationRunner::new(Ledger::SCHEMA, schema::units())?;
        runner.apply_all(&mut self.conn)
    }

    /// Import the legacy store up to `checkpoint`.
    ///
    /// Meant to run once, at cutover. Repeats are no-ops thanks to the data
    /// ledger.
    pub fn seed(&mut self, legacy: Arc<dyn LegacyStore>, checkpoint: &str) -> Result<RunResult> {
        let seeder = SeedRunner::for_legacy(legacy)?;
        seeder.seed_up_to(&mut self.conn, checkpoint)
    }

    /// Applied and pending schema units.
    pub fn schema_status(&self) -> Result<MigrationStatus> {
        let names: Vec<String> = schema::units()
            .iter()
            .map(|unit| unit.name().to_string())
            .collect();
        MigrationStatus::read(&self.conn, Ledger::SCHEMA, &names)
    }

    /// Applied and pending data units.
    pub fn data_status(&self) -> Result<MigrationStatus> {
        let names: Vec<String> = data::unit_names().map(str::to_string).collect();
        MigrationStatus::read(&self.conn, Ledger::DATA, &names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("test.db");

        let db = Database::open_at(&path).expect("should open");
        assert!(db.path().is_some());
        assert!(path.exists());
    }

    #[test]
    fn migrate_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda.db");

        {
            let mut db = Database::open_at(&path).unwrap();
            let first = db.migrate().unwrap();
            assert!(first.is_success());
            assert_eq!(first.applied().len(), schema::units().len());
        }

        let mut db = Database::open_at(&path).unwrap();
        let second = db.migrate().unwrap();
        assert!(second.is_success());
        assert!(second.applied().is_empty());
        assert_eq!(second.skipped().len(), schema::units().len());

        let status = db.schema_status().unwrap();
        assert!(status.pending.is_empty());
        assert_eq!(status.applied.len(), schema::units().len());
    }

    #[test]
    fn fresh_database_reports_everything_pending() {
        let db = Database::open_in_memory().unwrap();

        let schema = db.schema_status().unwrap();
        assert!(schema.applied.is_empty());
        assert_eq!(schema.pending.len(), schema::units().len());

        let data = db.data_status().unwrap();
        assert_eq!(data.pending.len(), data::unit_names().count());
    }
}
