//! # agenda-shared
//!
//! Types shared between the relational store and the server: the legacy
//! document model read during the cutover import, the enumerations stored in
//! relational columns, and application-wide constants.

pub mod constants;
pub mod error;
pub mod legacy;
pub mod types;

pub use error::AgendaError;
