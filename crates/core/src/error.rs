//! Unified error types for the analytics core.
//!
//! The taxonomy mirrors how failures propagate:
//! - transient sink errors are swallowed on the fire-and-forget path and
//!   propagated on the synchronous read path
//! - configuration errors are fatal at startup in a production posture
//! - data-integrity errors (failed AEAD authentication) fail closed
//! - a rate-limit denial is an expected outcome, carried as data, and only
//!   becomes an `Error` when it has to cross the HTTP boundary

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the analytics core.
#[derive(Debug, Error)]
pub enum Error {
    /// Transient failure talking to the write or read sink.
    #[error("sink error: {0}")]
    Sink(String),

    /// Missing or malformed configuration (secrets, key lengths, policy).
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed encryption, decryption, or envelope parsing. Fails closed.
    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Denied by the admission gate. Retry hint in seconds.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("unknown report: {0}")]
    UnknownReport(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn crypto(msg: impl Into<String>) -> Self {
        Self::Crypto(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether retrying later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Sink(_))
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Sink(_) => 502,
            Self::Config(_) => 500,
            Self::Crypto(_) => 500,
            Self::Validation(_) => 400,
            Self::Serialization(_) => 400,
            Self::RateLimited { .. } => 429,
            Self::Unauthorized(_) => 401,
            Self::UnknownReport(_) => 404,
            Self::Internal(_) => 500,
        }
    }
}
