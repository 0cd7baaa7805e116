use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the database is reachable, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub db_healthy: bool,
    /// Whether the inference sidecar answers. Dataset and export endpoints
    /// keep working without it, so it does not affect `status`.
    pub inference_healthy: bool,
}

/// GET /health -- returns service, database and inference health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (db, inference) = tokio::join!(
        adaptlabel_db::health_check(&state.pool),
        state.resolver.loader().api().health(),
    );
    if let Err(e) = &inference {
        tracing::debug!(error = %e, "Inference sidecar unreachable");
    }

    let db_healthy = db.is_ok();
    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        inference_healthy: inference.is_ok(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
