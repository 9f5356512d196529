//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `paymaster` - PayMaster checkout provider and partner REST client
//! - `memory` - in-memory payment repository
//! - `postgres` - PostgreSQL payment repository
//! - `http` - axum endpoints for callbacks and redirect forms

pub mod http;
pub mod memory;
pub mod paymaster;
pub mod postgres;

pub use memory::InMemoryPaymentRepository;
pub use paymaster::{PaymasterApiClient, PaymasterApiConfig, PaymasterProvider, PaymasterProviderConfig};
pub use postgres::PostgresPaymentRepository;
