//! Failures while handling a PayMaster callback.
//!
//! A bad signature is not one of these: it is answered with the
//! `HashError` body directly. Everything here still becomes a well-formed
//! plain-text response so PayMaster can decide whether to redeliver.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;
use crate::ports::{CallbackResponse, LookupError};

/// Errors that occur while processing a verified notification.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// Required notification field absent or empty.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Notification field present but unusable.
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Signed notification describes a different invoice than the payment
    /// it was delivered for.
    #[error("Notification {field} does not match the payment")]
    InvoiceMismatch { field: &'static str },

    /// Payment storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] DomainError),

    /// Strict verification could not reach a verdict.
    #[error("Remote lookup failed: {0}")]
    RemoteLookup(#[from] LookupError),
}

impl CallbackError {
    /// Returns true if PayMaster should redeliver the notification.
    pub fn is_retryable(&self) -> bool {
        match self {
            CallbackError::MissingField(_)
            | CallbackError::InvalidField { .. }
            | CallbackError::InvoiceMismatch { .. } => false,
            CallbackError::Storage(_) => true,
            CallbackError::RemoteLookup(err) => err.is_retryable(),
        }
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - 4xx: malformed notification, no retry
    /// - 5xx: local or upstream failure, PayMaster redelivers
    pub fn status_code(&self) -> StatusCode {
        match self {
            CallbackError::MissingField(_)
            | CallbackError::InvalidField { .. }
            | CallbackError::InvoiceMismatch { .. } => StatusCode::BAD_REQUEST,
            CallbackError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            CallbackError::RemoteLookup(LookupError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CallbackError::RemoteLookup(LookupError::Rejected(_)) => StatusCode::BAD_GATEWAY,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            CallbackError::MissingField(_) => "MissingField",
            CallbackError::InvalidField { .. } => "InvalidField",
            CallbackError::InvoiceMismatch { .. } => "InvoiceMismatch",
            CallbackError::Storage(_) => "StorageError",
            CallbackError::RemoteLookup(_) => "LookupError",
        }
    }

    pub fn into_response(self) -> CallbackResponse {
        CallbackResponse::text(self.status_code(), self.body())
    }
}
