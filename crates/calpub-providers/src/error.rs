//! Error types for remote calendar API operations.
//!
//! The retry executor only needs one capability from an error: whether
//! it is transient. [`ApiError`] carries that classification alongside
//! enough context (HTTP status, response body) to diagnose a failed
//! export.

use thiserror::Error;

use crate::retry::TransientError;

/// An error returned by the remote calendar API or its transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API signalled throttling (HTTP 429, or a 403 carrying a
    /// quota reason). Retryable.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The server failed transiently (HTTP 5xx). Retryable.
    #[error("server error (HTTP {status}): {message}")]
    Server {
        /// The HTTP status code.
        status: u16,
        /// The response body, if any.
        message: String,
    },

    /// The request never produced an HTTP response (timeout, connection
    /// failure, interrupted read). Retryable.
    #[error("network error: {0}")]
    Network(String),

    /// The access token was missing, expired, or invalid (HTTP 401).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The caller lacks permission (HTTP 403 without a quota reason).
    #[error("access denied: {0}")]
    Forbidden(String),

    /// The requested resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected as malformed (HTTP 4xx).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The response could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl TransientError for ApiError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Server { .. } | Self::Network(_)
        )
    }
}

/// A specialized Result type for remote API operations.
pub type ApiResult<T> = Result<T, ApiError>;
