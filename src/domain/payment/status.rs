//! Local payment status state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, ValidationError};

/// Status of a payment record owned by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created by the host, customer not yet sent to PayMaster.
    #[default]
    Input,

    /// PayMaster announced the payment with a pre-request.
    Waiting,

    /// Funds captured.
    Confirmed,

    /// Payment cancelled or refused.
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Input => "input",
            PaymentStatus::Waiting => "waiting",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Rejected => "rejected",
        }
    }
}

impl StateMachine for PaymentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, target),
            (Input, Waiting)
                | (Waiting, Waiting) // Capture recorded while still pending
                | (Waiting, Confirmed)
                | (Waiting, Rejected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PaymentStatus::*;
        match self {
            Input => vec![Waiting],
            Waiting => vec![Waiting, Confirmed, Rejected],
            Confirmed | Rejected => vec![],
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "input" => Ok(PaymentStatus::Input),
            "waiting" => Ok(PaymentStatus::Waiting),
            "confirmed" => Ok(PaymentStatus::Confirmed),
            "rejected" => Ok(PaymentStatus::Rejected),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown payment status '{}'", other),
            )),
        }
    }
}
