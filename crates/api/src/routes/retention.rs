//! Operator retention endpoints.

use axum::{extract::State, Json};
use pulse_core::RetentionPolicies;
use tracing::info;
use worker::RetentionReport;

use crate::extractors::OperatorAuth;
use crate::state::AppState;

/// POST /admin/retention/run - on-demand sweep.
///
/// Overlap with the scheduled sweep is safe: the second invocation
/// reports `skipped` instead of double-counting.
pub async fn run_handler(
    State(state): State<AppState>,
    _auth: OperatorAuth,
) -> Json<RetentionReport> {
    info!("On-demand retention sweep requested");
    Json(state.sweeper.enforce_retention().await)
}

/// GET /admin/retention - the active policy values.
pub async fn policies_handler(
    State(state): State<AppState>,
    _auth: OperatorAuth,
) -> Json<RetentionPolicies> {
    Json(state.sweeper.retention_periods().clone())
}
