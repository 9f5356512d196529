//! PayMaster (paymaster.ru) integration.
//!
//! - `PaymasterProvider` - redirect form and callback handling
//! - `PaymasterApiClient` - signed partner REST API
//! - `error_codes` - registry of the API's negative `ErrorCode` values

mod callback_error;
mod client;
mod error;
pub mod error_codes;
mod filters;
pub mod nonce;
mod provider;
mod types;

pub use callback_error::CallbackError;
pub use client::{
    DocumentStream, PaymasterApiClient, PaymasterApiConfig, DEFAULT_API_BASE_URL,
    DEFAULT_CANCEL_REASON,
};
pub use error::ApiClientError;
pub use error_codes::{ApiError, ApiErrorKind};
pub use filters::{CalendarDate, DocumentFilter, PaymentFilter, RefundFilter};
pub use nonce::{FixedNonceGenerator, UuidNonceGenerator};
pub use provider::{
    PaymasterProvider, PaymasterProviderConfig, DEFAULT_ACTION_URL, DEFAULT_DESCRIPTION,
};
pub use types::{
    DocumentRecord, PaymentList, PaymentRecord, ProviderTimestamp, RefundList, RefundRecord,
};
