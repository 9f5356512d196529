//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (errors, state machine trait)
//! - `payment` - Payment record, local status lifecycle and provider states
//! - `signature` - Canonical line construction and PayMaster digests

pub mod foundation;
pub mod payment;
pub mod signature;
