//! # agenda-store
//!
//! Relational storage for the Agenda application, backed by SQLite.
//!
//! The crate owns the schema and the two ledger-backed migration families
//! that build and fill it: schema-evolution units applied at every start-up,
//! and the one-time import of the legacy document store. A synchronous
//! `Database` handle wraps a `rusqlite::Connection`; the per-table modules
//! hold typed CRUD helpers over any connection or transaction.

pub mod database;
pub mod friendships;
pub mod import;
pub mod items;
pub mod legacy_store;
pub mod migrations;
pub mod models;
pub mod notes;
pub mod ownership;
pub mod users;

mod error;
mod sql;

pub use database::Database;
pub use error::{Result, StoreError};
pub use legacy_store::{JsonDumpStore, LegacyStore};
pub use migrations::runner::{MigrationStatus, RunResult};
pub use models::*;
