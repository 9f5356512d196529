//! Nonce generators for signed REST calls.

use std::sync::Mutex;

use uuid::Uuid;

use crate::ports::NonceGenerator;

/// Random UUIDv4 nonces. Used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidNonceGenerator;

impl NonceGenerator for UuidNonceGenerator {
    fn next_nonce(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Hands out a fixed value, or a sequence of values, for reproducible
/// signatures in tests. Once a sequence is exhausted its last value repeats.
#[derive(Debug)]
pub struct FixedNonceGenerator {
    values: Mutex<Vec<String>>,
    last: Mutex<String>,
}

impl FixedNonceGenerator {
    pub fn new(value: impl Into<String>) -> Self {
        Self::sequence([value.into()])
    }

    pub fn sequence(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        values.reverse();
        Self {
            last: Mutex::new(values.first().cloned().unwrap_or_default()),
            values: Mutex::new(values),
        }
    }
}

impl NonceGenerator for FixedNonceGenerator {
    fn next_nonce(&self) -> String {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let next = match self.values.lock() {
            Ok(mut values) => values.pop(),
            Err(poisoned) => poisoned.into_inner().pop(),
        };
        if let Some(value) = next {
            *last = value;
        }
        last.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_nonces_are_unique() {
        let generator = UuidNonceGenerator;
        let first = generator.next_nonce();
        let second = generator.next_nonce();
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn fixed_sequence_then_repeats_last() {
        let generator = FixedNonceGenerator::sequence(["a", "b"]);
        assert_eq!(generator.next_nonce(), "a");
        assert_eq!(generator.next_nonce(), "b");
        assert_eq!(generator.next_nonce(), "b");
    }
}
