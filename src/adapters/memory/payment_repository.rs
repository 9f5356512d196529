//! In-memory payment repository.
//!
//! Every operation holds one write lock for its whole duration, which makes
//! `compare_and_set` atomic with respect to concurrent callbacks in the same
//! process. Records do not survive a restart.
//!
//! # Example
//!
//! ```ignore
//! let repo = Arc::new(InMemoryPaymentRepository::new());
//! repo.save(&payment).await?;
//! let provider = PaymasterProvider::new(config, repo.clone());
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, StateMachine};
use crate::domain::payment::{Payment, PaymentChange, PaymentStatus};
use crate::ports::PaymentRepository;

/// Payment records held in a process-local map keyed by token.
#[derive(Debug, Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<String, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::new(ErrorCode::InternalError, "Payment store lock poisoned")
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().map_err(|_| poisoned())?;
        if payments.contains_key(&payment.token) {
            return Err(DomainError::new(
                ErrorCode::PaymentExists,
                format!("Payment {} already exists", payment.token),
            ));
        }
        payments.insert(payment.token.clone(), payment.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Payment>, DomainError> {
        let payments = self.payments.read().map_err(|_| poisoned())?;
        Ok(payments.get(token).cloned())
    }

    async fn compare_and_set(
        &self,
        token: &str,
        expected: PaymentStatus,
        change: &PaymentChange,
    ) -> Result<bool, DomainError> {
        if !expected.can_transition_to(&change.status) {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot move payment from {} to {}", expected, change.status),
            )
            .with_detail("token", token));
        }

        let mut payments = self.payments.write().map_err(|_| poisoned())?;
        let Some(payment) = payments.get_mut(token) else {
            return Ok(false);
        };
        if payment.status != expected {
            return Ok(false);
        }

        payment.apply(change)?;
        Ok(true)
    }
}
