//! Payment repository port.
//!
//! Defines the contract for reading payment records and applying the
//! notification-driven status changes to them.
//!
//! # Design
//!
//! - **Single mutation path**: every status change goes through
//!   `compare_and_set`, so concurrent notifications for the same token
//!   cannot interleave a read-modify-write.
//! - **Host-owned records**: `save` exists for hosts and tests that let this
//!   crate hold the records; the callback flow never inserts.
//!
//! # Example
//!
//! ```ignore
//! let applied = repo
//!     .compare_and_set(&payment.token, PaymentStatus::Waiting, &PaymentChange::status(PaymentStatus::Confirmed))
//!     .await?;
//! if !applied {
//!     // Another delivery settled the payment first.
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{Payment, PaymentChange, PaymentStatus};

/// Repository port for payment records.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a new payment.
    ///
    /// # Errors
    ///
    /// - `PaymentExists` if the token is already stored
    /// - `DatabaseError` on persistence failure
    async fn save(&self, payment: &Payment) -> Result<(), DomainError>;

    /// Find a payment by its token.
    async fn find_by_token(&self, token: &str) -> Result<Option<Payment>, DomainError>;

    /// Atomically apply `change` if the stored status still equals `expected`.
    ///
    /// Returns `Ok(false)` when the status moved on (or the token is
    /// unknown); nothing is written in that case. Status and capture fields
    /// are written together or not at all.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if `expected -> change.status` is not a
    ///   valid transition
    /// - `DatabaseError` on persistence failure
    async fn compare_and_set(
        &self,
        token: &str,
        expected: PaymentStatus,
        change: &PaymentChange,
    ) -> Result<bool, DomainError>;
}
