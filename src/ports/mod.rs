//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `CheckoutProvider` - outbound form and callback handling for a gateway
//! - `PaymentRepository` - payment records with atomic status changes
//! - `RemotePaymentLookup` - provider-side payment state for strict checks
//! - `NonceGenerator` - per-call nonces for signed REST requests

mod checkout_provider;
mod nonce_generator;
mod payment_repository;
mod remote_payment_lookup;

pub use checkout_provider::{CallbackResponse, CheckoutProvider};
pub use nonce_generator::NonceGenerator;
pub use payment_repository::PaymentRepository;
pub use remote_payment_lookup::{LookupError, RemotePaymentLookup};
