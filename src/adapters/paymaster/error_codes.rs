//! PayMaster REST error code registry.
//!
//! Every response of the partner API carries an `ErrorCode`. Negative values
//! are failures; the documented ones map onto [`ApiErrorKind`] and anything
//! else is kept verbatim as [`ApiErrorKind::Unknown`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use thiserror::Error;

/// Message used for codes missing from the registry.
pub const UNKNOWN_ERROR_MESSAGE: &str =
    "Unknown error. PayMaster system failure; contact support if the error repeats.";

/// Documented failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    Generic,
    Network,
    Permission,
    Signature,
    PaymentNotFound,
    DuplicateNonce,
    InvalidAmount,
    Unknown(i64),
}

impl ApiErrorKind {
    pub fn code(&self) -> i64 {
        match self {
            ApiErrorKind::Generic => -1,
            ApiErrorKind::Network => -2,
            ApiErrorKind::Permission => -6,
            ApiErrorKind::Signature => -7,
            ApiErrorKind::PaymentNotFound => -13,
            ApiErrorKind::DuplicateNonce => -14,
            ApiErrorKind::InvalidAmount => -18,
            ApiErrorKind::Unknown(code) => *code,
        }
    }
}

struct Entry {
    kind: ApiErrorKind,
    message: &'static str,
}

static REGISTRY: Lazy<HashMap<i64, Entry>> = Lazy::new(|| {
    [
        (ApiErrorKind::Generic, "Request failed."),
        (ApiErrorKind::Network, "PayMaster network error."),
        (ApiErrorKind::Permission, "Access denied for this login."),
        (ApiErrorKind::Signature, "Request signature is invalid."),
        (ApiErrorKind::PaymentNotFound, "Payment not found."),
        (ApiErrorKind::DuplicateNonce, "Nonce has already been used."),
        (ApiErrorKind::InvalidAmount, "Amount is invalid."),
    ]
    .into_iter()
    .map(|(kind, message)| (kind.code(), Entry { kind, message }))
    .collect()
});

/// A failure reported by the partner API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("({code}) {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    kind: ApiErrorKind,
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// True for the provider's own transient network failure.
    pub fn is_retryable(&self) -> bool {
        self.kind == ApiErrorKind::Network
    }
}

/// Resolves an `ErrorCode` value. Never fails.
pub fn lookup(code: i64) -> ApiError {
    match REGISTRY.get(&code) {
        Some(entry) => ApiError {
            code,
            message: entry.message.to_string(),
            kind: entry.kind,
        },
        None => ApiError {
            code,
            message: UNKNOWN_ERROR_MESSAGE.to_string(),
            kind: ApiErrorKind::Unknown(code),
        },
    }
}
