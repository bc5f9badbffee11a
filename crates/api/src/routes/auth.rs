//! The authentication entry point the admission gate guards.
//!
//! A denial is an expected outcome, surfaced as 429 with a Retry-After
//! hint. Only failed credential checks count toward the limit; checking
//! the limit itself never does, and success clears the window.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extractors::ClientIp;
use crate::response::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub account: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub authenticated: bool,
}

/// Identity the gate keys on: client IP plus normalized account name.
fn identity_for(client_ip: &ClientIp, account: &str) -> String {
    format!("{}:{}", client_ip.or_unknown(), account.trim().to_lowercase())
}

/// POST /auth/login - operator login.
pub async fn login_handler(
    State(state): State<AppState>,
    client_ip: ClientIp,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let identity = identity_for(&client_ip, &request.account);

    let decision = state.gate.check_limit(&identity);
    if !decision.allowed {
        return Err(ApiError::rate_limited(
            decision.retry_after_secs.unwrap_or(1),
        ));
    }

    // Constant credential check; real identity providers sit outside the
    // core. Only its outcome feeds the gate.
    if request.token == state.operator_token {
        state.gate.record_success(&identity);
        info!(account = %request.account, "Operator authenticated");
        return Ok(Json(LoginResponse {
            authenticated: true,
        }));
    }

    state.gate.record_failure(&identity);
    Err(ApiError::unauthorized("Invalid credentials"))
}
