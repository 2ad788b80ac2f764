//! Migration units and the machinery that applies them.
//!
//! Two families exist, each with its own ledger table:
//!
//! - [`schema`]: schema-evolution units, applied on every start-up.
//! - [`data`]: one-off data units importing the legacy document store, run
//!   once at cutover through the [`runner::SeedRunner`].
//!
//! A unit is identified solely by its name. Names follow
//! `<date>_<sequence>_<description>` so that lexical order is application
//! order.

pub mod data;
pub mod ledger;
pub mod runner;
pub mod schema;

use rusqlite::Transaction;

use crate::error::Result;

/// A named forward/backward pair against the relational store.
///
/// Both operations receive the transaction the runner opened for the unit;
/// the ledger write happens in the same transaction, so a failing `up`
/// leaves neither its effects nor a ledger entry behind.
pub trait Migration: Send + Sync {
    fn name(&self) -> &str;

    fn up(&self, tx: &Transaction<'_>) -> Result<()>;

    fn down(&self, tx: &Transaction<'_>) -> Result<()>;
}

/// A unit expressed as two SQL batches.
#[derive(Debug, Clone, Copy)]
pub struct SqlMigration {
    pub name: &'static str,
    pub up_sql: &'static str,
    pub down_sql: &'static str,
}

impl Migration for SqlMigration {
    fn name(&self) -> &str {
        self.name
    }

    fn up(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute_batch(self.up_sql)?;
        Ok(())
    }

    fn down(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute_batch(self.down_sql)?;
        Ok(())
    }
}
