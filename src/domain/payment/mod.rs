//! Payment domain - the local payment record and its lifecycle.
//!
//! - `PaymentStatus` - local state machine (`Input -> Waiting -> Confirmed | Rejected`)
//! - `RemotePaymentState` / `RefundStatus` - provider-side states
//! - `Payment` / `PaymentChange` - record and the atomic change applied to it

mod payment;
mod remote_state;
mod status;

pub use payment::{CaptureDetails, Payment, PaymentChange};
pub use remote_state::{RefundStatus, RemotePaymentState};
pub use status::PaymentStatus;
