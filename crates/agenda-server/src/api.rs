use std::sync::Arc;

use agenda_store::{Database, MigrationStatus};
use axum::{extract::State, http::Method, routing::get, Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/migrations", get(migration_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Ledger state of both migration families.
#[derive(Serialize)]
struct MigrationsResponse {
    schema: MigrationStatus,
    data: MigrationStatus,
    seed_checkpoint: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn migration_status(
    State(state): State<AppState>,
) -> Result<Json<MigrationsResponse>, ServerError> {
    let db = state.db.lock().await;

    Ok(Json(MigrationsResponse {
        schema: db.schema_status()?,
        data: db.data_status()?,
        seed_checkpoint: state.config.seed_checkpoint.clone(),
    }))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn state(db: Database) -> AppState {
        AppState {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(ServerConfig::default()),
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_reports_version() {
        let app = build_router(state(Database::open_in_memory().unwrap()));

        let (status, body) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn migrations_lists_applied_and_pending_units() {
        let mut db = Database::open_in_memory().unwrap();
        db.migrate().unwrap().into_result().unwrap();
        let app = build_router(state(db));

        let (status, body) = get_json(app, "/migrations").await;

        assert_eq!(status, StatusCode::OK);
        let schema = body["schema"]["applied"].as_array().unwrap();
        assert_eq!(schema.len(), 6);
        assert_eq!(schema[0]["migration_name"], "2023-08-20_001_create_users");
        assert!(body["schema"]["pending"].as_array().unwrap().is_empty());
        assert!(body["data"]["applied"].as_array().unwrap().is_empty());
        assert_eq!(body["data"]["pending"].as_array().unwrap().len(), 7);
        assert_eq!(body["seed_checkpoint"], agenda_shared::constants::SEED_CHECKPOINT);
    }

    #[tokio::test]
    async fn unmigrated_database_reports_everything_pending() {
        let app = build_router(state(Database::open_in_memory().unwrap()));

        let (status, body) = get_json(app, "/migrations").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["schema"]["applied"].as_array().unwrap().is_empty());
        assert_eq!(body["schema"]["pending"].as_array().unwrap().len(), 6);
    }
}
