//! In-memory adapters for tests and database-less deployments.

mod payment_repository;

pub use payment_repository::InMemoryPaymentRepository;
