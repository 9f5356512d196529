//! Payment record as seen by the checkout flow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PaymentStatus;
use crate::domain::foundation::{StateMachine, ValidationError};

/// Values captured from a verified notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDetails {
    pub captured_amount: Decimal,
    pub transaction_id: String,
    /// The full notification form, pretty-printed JSON.
    pub extra_data: String,
}

/// A status change, optionally carrying capture details, applied atomically
/// by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentChange {
    pub status: PaymentStatus,
    pub capture: Option<CaptureDetails>,
}

impl PaymentChange {
    pub fn status(status: PaymentStatus) -> Self {
        Self { status, capture: None }
    }

    pub fn captured(status: PaymentStatus, capture: CaptureDetails) -> Self {
        Self {
            status,
            capture: Some(capture),
        }
    }
}

/// Payment owned by the host application.
///
/// The checkout flow reads the order fields to build the redirect form and
/// only ever writes `status` and the capture fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub token: String,
    pub status: PaymentStatus,
    pub total: Decimal,
    pub currency: String,
    pub description: Option<String>,
    pub billing_email: Option<String>,
    pub billing_phone: Option<String>,
    pub captured_amount: Option<Decimal>,
    pub transaction_id: Option<String>,
    pub extra_data: Option<String>,
    pub success_url: String,
    pub failure_url: String,
}

impl Payment {
    /// Creates a payment in the `Input` status.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the token, currency or a redirect URL is
    /// empty.
    pub fn new(
        token: impl Into<String>,
        total: Decimal,
        currency: impl Into<String>,
        success_url: impl Into<String>,
        failure_url: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let token = token.into();
        let currency = currency.into();
        let success_url = success_url.into();
        let failure_url = failure_url.into();

        if token.trim().is_empty() {
            return Err(ValidationError::empty_field("token"));
        }
        if currency.trim().is_empty() {
            return Err(ValidationError::empty_field("currency"));
        }
        if success_url.is_empty() {
            return Err(ValidationError::empty_field("success_url"));
        }
        if failure_url.is_empty() {
            return Err(ValidationError::empty_field("failure_url"));
        }

        Ok(Self {
            token,
            status: PaymentStatus::Input,
            total,
            currency,
            description: None,
            billing_email: None,
            billing_phone: None,
            captured_amount: None,
            transaction_id: None,
            extra_data: None,
            success_url,
            failure_url,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_billing_email(mut self, email: impl Into<String>) -> Self {
        self.billing_email = Some(email.into());
        self
    }

    pub fn with_billing_phone(mut self, phone: impl Into<String>) -> Self {
        self.billing_phone = Some(phone.into());
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.status = status;
        self
    }

    /// Applies a change after validating the status transition.
    pub fn apply(&mut self, change: &PaymentChange) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(change.status)?;
        if let Some(capture) = &change.capture {
            self.captured_amount = Some(capture.captured_amount);
            self.transaction_id = Some(capture.transaction_id.clone());
            self.extra_data = Some(capture.extra_data.clone());
        }
        Ok(())
    }
}
