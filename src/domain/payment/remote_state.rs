//! Payment and refund states as reported by PayMaster.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PaymentStatus;
use crate::domain::foundation::ValidationError;

/// Provider-side payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemotePaymentState {
    Initiated,
    Processing,
    Complete,
    Cancelled,
}

impl RemotePaymentState {
    pub const ALL: [RemotePaymentState; 4] = [
        RemotePaymentState::Initiated,
        RemotePaymentState::Processing,
        RemotePaymentState::Complete,
        RemotePaymentState::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RemotePaymentState::Initiated => "INITIATED",
            RemotePaymentState::Processing => "PROCESSING",
            RemotePaymentState::Complete => "COMPLETE",
            RemotePaymentState::Cancelled => "CANCELLED",
        }
    }

    /// Local status implied by this state, if it is final.
    pub fn local_status(&self) -> Option<PaymentStatus> {
        match self {
            RemotePaymentState::Complete => Some(PaymentStatus::Confirmed),
            RemotePaymentState::Cancelled => Some(PaymentStatus::Rejected),
            RemotePaymentState::Initiated | RemotePaymentState::Processing => None,
        }
    }
}

impl fmt::Display for RemotePaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemotePaymentState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "state",
                    format!(
                        "'{}' is not one of INITIATED, PROCESSING, COMPLETE, CANCELLED",
                        s
                    ),
                )
            })
    }
}

/// Provider-side refund status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RefundStatus {
    Pending,
    Executing,
    Success,
    Failure,
}

impl RefundStatus {
    pub fn is_final(&self) -> bool {
        matches!(self, RefundStatus::Success | RefundStatus::Failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_final_states_map_to_local_status() {
        assert_eq!(
            RemotePaymentState::Complete.local_status(),
            Some(PaymentStatus::Confirmed)
        );
        assert_eq!(
            RemotePaymentState::Cancelled.local_status(),
            Some(PaymentStatus::Rejected)
        );
        assert_eq!(RemotePaymentState::Initiated.local_status(), None);
        assert_eq!(RemotePaymentState::Processing.local_status(), None);
    }

    #[test]
    fn parses_exact_wire_names() {
        assert_eq!(
            "COMPLETE".parse::<RemotePaymentState>(),
            Ok(RemotePaymentState::Complete)
        );
        assert!("complete".parse::<RemotePaymentState>().is_err());
        assert!("REFUNDED".parse::<RemotePaymentState>().is_err());
    }

    #[test]
    fn deserializes_from_provider_json() {
        let state: RemotePaymentState = serde_json::from_str("\"PROCESSING\"").unwrap();
        assert_eq!(state, RemotePaymentState::Processing);

        let refund: RefundStatus = serde_json::from_str("\"EXECUTING\"").unwrap();
        assert_eq!(refund, RefundStatus::Executing);
        assert!(!refund.is_final());
    }
}
