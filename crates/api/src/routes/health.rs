//! Health endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use telemetry::health;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub buffer_depth: usize,
    pub sink_healthy: bool,
}

/// GET /health - overall status with buffer depth.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let sink_healthy = state.buffer.sink_healthy();
    Json(HealthResponse {
        status: if sink_healthy { "ok" } else { "degraded" },
        buffer_depth: state.buffer.size(),
        sink_healthy,
    })
}

/// GET /health/ready - readiness probe.
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - liveness probe.
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}
