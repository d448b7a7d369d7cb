//! Telemetry ingestion routes.
//!
//! Each endpoint relays the raw request body to its configured
//! collector and answers `202 Accepted` regardless of the outcome.
//! Telemetry must never break the caller.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;

use crate::state::AppState;

fn content_type_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// POST /api/metrics -- relay browser performance metrics.
async fn ingest_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state.forwarder.forward(
        state.config.metrics_collector_url.as_deref(),
        "metrics",
        content_type_of(&headers),
        body,
    );
    StatusCode::ACCEPTED
}

/// POST /api/logs -- relay client-side log batches.
async fn ingest_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state.forwarder.forward(
        state.config.log_collector_url.as_deref(),
        "logs",
        content_type_of(&headers),
        body,
    );
    StatusCode::ACCEPTED
}

/// POST /api/csp-report -- relay Content-Security-Policy violation
/// reports. Browsers send these with `application/csp-report`, so the
/// body is taken as raw bytes rather than JSON.
async fn ingest_csp_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    state.forwarder.forward(
        state.config.csp_report_url.as_deref(),
        "csp-report",
        content_type_of(&headers),
        body,
    );
    StatusCode::ACCEPTED
}

/// Mount the telemetry ingestion routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/metrics", post(ingest_metrics))
        .route("/api/logs", post(ingest_logs))
        .route("/api/csp-report", post(ingest_csp_report))
}
