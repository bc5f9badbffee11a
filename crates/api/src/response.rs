//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Response for the collect endpoint. Ingestion failures downstream of
/// the buffer are invisible here by design.
#[derive(Debug, Serialize, Deserialize)]
pub struct CollectResponse {
    pub success: bool,
    pub accepted: usize,
    pub rejected: usize,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl CollectResponse {
    pub fn new(accepted: usize, errors: Vec<String>) -> Self {
        Self {
            success: true,
            accepted,
            rejected: errors.len(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// API error with status and optional retry hint.
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse {
                error: msg.into(),
                code: code.into(),
                details: None,
            },
            retry_after: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "validation", msg)
    }

    pub fn validation(errors: Vec<String>) -> Self {
        let mut err = Self::bad_request("Validation failed");
        err.response.details = Some(errors);
        err
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::UNAUTHORIZED, "unauthorized", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "not_found", msg)
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        let mut err = Self::with_code(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            format!("Too many failed attempts, retry after {}s", retry_after),
        );
        err.retry_after = Some(retry_after);
        err
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "internal", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<pulse_core::Error> for ApiError {
    fn from(err: pulse_core::Error) -> Self {
        use pulse_core::Error;

        match &err {
            Error::RateLimited { retry_after_secs } => ApiError::rate_limited(*retry_after_secs),
            Error::Unauthorized(msg) => ApiError::unauthorized(msg.clone()),
            Error::UnknownReport(name) => ApiError::not_found(format!("unknown report: {name}")),
            Error::Validation(msg) => ApiError::bad_request(msg.clone()),
            Error::Serialization(e) => ApiError::bad_request(e.to_string()),
            // Sink/config/crypto details stay out of responses.
            _ => ApiError::internal("Request failed"),
        }
    }
}
