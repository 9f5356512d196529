//! Errors returned by the partner REST client.

use thiserror::Error;

use super::error_codes::ApiError;

/// Errors that occur while calling the partner API.
#[derive(Debug, Error)]
pub enum ApiClientError {
    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The API answered with a negative `ErrorCode`.
    #[error("PayMaster API error {0}")]
    Api(#[from] ApiError),

    /// The body was not the JSON shape the operation expects.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A caller-supplied argument was rejected before any request was made.
    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: String },
}

impl ApiClientError {
    /// Returns true if repeating the same call may succeed.
    ///
    /// Non-idempotent calls (`refundPayment`) should only be repeated with a
    /// caller-chosen external id.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiClientError::Transport(_) => true,
            ApiClientError::Http { status, .. } => *status >= 500,
            ApiClientError::Api(err) => err.is_retryable(),
            ApiClientError::MalformedResponse(_) | ApiClientError::InvalidArgument { .. } => false,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        ApiClientError::MalformedResponse(reason.into())
    }
}
