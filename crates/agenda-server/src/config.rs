//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use agenda_shared::constants::{DEFAULT_HTTP_PORT, SEED_CHECKPOINT};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: the platform data directory (see `Database::new`).
    pub database_path: Option<PathBuf>,

    /// Directory holding the legacy export (`users.json`, `items.json`,
    /// `notes.json`). The seed only runs when this is set.
    /// Env: `LEGACY_DUMP_DIR`
    pub legacy_dump_dir: Option<PathBuf>,

    /// Last data unit the seed applies.
    /// Env: `SEED_CHECKPOINT`
    /// Default: the final import unit.
    pub seed_checkpoint: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            legacy_dump_dir: None,
            seed_checkpoint: SEED_CHECKPOINT.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = var("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Some(dir) = var("LEGACY_DUMP_DIR").filter(|d| !d.is_empty()) {
            config.legacy_dump_dir = Some(PathBuf::from(dir));
        }

        if let Some(name) = var("SEED_CHECKPOINT").filter(|n| !n.is_empty()) {
            config.seed_checkpoint = name;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
