//! # agenda-server
//!
//! Back end of the Agenda application.
//!
//! On start-up the binary brings the relational store up to date before it
//! accepts a single request:
//! - **Schema migrations** run on every start, in name order, halting on the
//!   first failing unit
//! - **Legacy seed** imports the old document store once, when
//!   `LEGACY_DUMP_DIR` points at an export
//! - **REST API** (axum) exposes health and migration ledger status

mod api;
mod config;
mod error;
mod startup;

use std::sync::Arc;

use agenda_shared::constants::APP_NAME;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,agenda_server=debug,agenda_store=debug")
            }),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Migrate (and seed) before binding; failures exit non-zero
    // -----------------------------------------------------------------------
    let db = startup::prepare_database(&config)?;

    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
