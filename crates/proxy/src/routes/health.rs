use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Deployment environment label (e.g. `development`, `production`).
    pub environment: String,
    /// Seconds since the proxy process started.
    pub uptime_secs: u64,
}

/// GET /api/health -- returns proxy liveness and build info.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Mount the health check route.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}
