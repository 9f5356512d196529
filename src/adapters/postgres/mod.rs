//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresPaymentRepository` - payment records with conditional status updates

mod payment_repository;

pub use payment_repository::PostgresPaymentRepository;
