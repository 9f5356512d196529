//! Remote payment lookup port.
//!
//! Used by the notification handler in strict mode to double-check a
//! notification against PayMaster's own record before settling a payment.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::payment::RemotePaymentState;

/// Errors returned by a remote lookup.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The provider could not be reached or answered with a server error.
    #[error("Payment lookup unavailable: {0}")]
    Unavailable(String),

    /// The provider answered but refused the lookup.
    #[error("Payment lookup rejected: {0}")]
    Rejected(String),
}

impl LookupError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LookupError::Unavailable(_))
    }
}

/// Port for reading a payment's state from the provider.
#[async_trait]
pub trait RemotePaymentLookup: Send + Sync {
    /// Fetch the provider-side state of the payment with the given
    /// provider transaction id.
    async fn payment_state(&self, transaction_id: &str) -> Result<RemotePaymentState, LookupError>;
}
