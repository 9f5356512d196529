//! HTTP adapter for the checkout callback endpoints.
//!
//! - `GET|POST /payments/process/:token/` - browser return and gateway notifications
//! - `GET /payments/:token/form` - redirect form for a payment
//! - `GET /health` - liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{CheckoutFormResponse, ErrorResponse};
pub use handlers::{CallbackApiError, CallbackAppState};
pub use routes::callback_router;
