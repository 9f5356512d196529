//! Nonce source for signed REST calls.

/// Produces a value that must never repeat for the same API login.
pub trait NonceGenerator: Send + Sync {
    fn next_nonce(&self) -> String;
}
