//! Payment store settings.
//!
//! The section is optional; without `PAYMASTER__DATABASE__URL` payments live
//! in process memory and are lost on restart.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Callback traffic is a handful of short transactions per payment.
const MAX_POOL_SIZE: u32 = 50;

/// PostgreSQL connection for the `payments` table
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` or `postgresql://` connection URL
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds a callback waits for a pooled connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Apply the bundled `payments` migration on startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMASTER__DATABASE__URL"));
        }
        if !["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections == 0 {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            run_migrations: false,
        }
    }

    #[test]
    fn accepts_both_postgres_schemes() {
        assert!(database("postgres://gateway@db/payments").validate().is_ok());
        assert!(database("postgresql://gateway@db/payments").validate().is_ok());
        assert_eq!(database("postgres://db/x").acquire_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn rejects_blank_or_foreign_url() {
        assert_eq!(
            database(" ").validate(),
            Err(ValidationError::MissingRequired("PAYMASTER__DATABASE__URL"))
        );
        assert_eq!(
            database("mysql://db/payments").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        );
    }

    #[test]
    fn pool_size_is_bounded() {
        let empty = DatabaseConfig {
            max_connections: 0,
            ..database("postgres://db/payments")
        };
        assert_eq!(empty.validate(), Err(ValidationError::InvalidPoolSize));

        let huge = DatabaseConfig {
            max_connections: MAX_POOL_SIZE + 1,
            ..database("postgres://db/payments")
        };
        assert_eq!(huge.validate(), Err(ValidationError::PoolSizeTooLarge));
    }
}
