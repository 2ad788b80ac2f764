//! Persisted record of applied units.
//!
//! One table per family. An entry is written in the same transaction as its
//! unit's effects, is never updated, and disappears only when that unit is
//! explicitly rolled back.

use agenda_shared::constants::{DATA_LEDGER_TABLE, SCHEMA_LEDGER_TABLE};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::Result;
use crate::sql;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub migration_name: String,
    pub applied_at: DateTime<Utc>,
}

/// Handle on one ledger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ledger {
    table: &'static str,
}

impl Ledger {
    pub const SCHEMA: Ledger = Ledger::new(SCHEMA_LEDGER_TABLE);
    pub const DATA: Ledger = Ledger::new(DATA_LEDGER_TABLE);

    pub const fn new(table: &'static str) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    /// Create the table if this database has never seen it.
    pub fn ensure(&self, conn: &Connection) -> Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                seq            INTEGER PRIMARY KEY AUTOINCREMENT,
                migration_name TEXT NOT NULL UNIQUE,
                applied_at     TEXT NOT NULL
            );",
            self.table
        ))?;
        Ok(())
    }

    fn exists(&self, conn: &Connection) -> Result<bool> {
        let found: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![self.table],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    pub fn is_applied(&self, conn: &Connection, name: &str) -> Result<bool> {
        let found: bool = conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {} WHERE migration_name = ?1)",
                self.table
            ),
            params![name],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// Record `name` as applied. Fails if it already is.
    pub fn record(&self, conn: &Connection, name: &str) -> Result<()> {
        conn.execute(
            &format!(
                "INSERT INTO {} (migration_name, applied_at) VALUES (?1, ?2)",
                self.table
            ),
            params![name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn remove(&self, conn: &Connection, name: &str) -> Result<bool> {
        let affected = conn.execute(
            &format!("DELETE FROM {} WHERE migration_name = ?1", self.table),
            params![name],
        )?;
        Ok(affected > 0)
    }

    /// Entries in the order they were applied. Empty when the table does not
    /// exist yet; reading never creates it.
    pub fn entries(&self, conn: &Connection) -> Result<Vec<LedgerEntry>> {
        if !self.exists(conn)? {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(&format!(
            "SELECT migration_name, applied_at FROM {} ORDER BY seq ASC",
            self.table
        ))?;
        let rows = stmt.query_map([], |row| {
            let applied_str: String = row.get(1)?;
            Ok(LedgerEntry {
                migration_name: row.get(0)?,
                applied_at: sql::timestamp(1, &applied_str)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}
