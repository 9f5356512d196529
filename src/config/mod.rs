//! Application configuration module
//!
//! Configuration is loaded from environment variables with the `PAYMASTER`
//! prefix using the `config` and `dotenvy` crates. Nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use paymaster_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod paymaster;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use paymaster::PaymasterConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection; payments stay in memory without it
    pub database: Option<DatabaseConfig>,

    /// Merchant credentials and checkout behaviour
    pub paymaster: PaymasterConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `PAYMASTER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYMASTER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYMASTER__PAYMASTER__MERCHANT_ID=...` -> `paymaster.merchant_id = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYMASTER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.paymaster.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signature::HashMethod;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PAYMASTER__PAYMASTER__MERCHANT_ID",
        "PAYMASTER__PAYMASTER__SECRET",
        "PAYMASTER__PAYMASTER__RETURN_BASE_URL",
        "PAYMASTER__PAYMASTER__HASH_METHOD",
        "PAYMASTER__PAYMASTER__API_VERIFY",
        "PAYMASTER__DATABASE__URL",
        "PAYMASTER__SERVER__PORT",
        "PAYMASTER__SERVER__ENVIRONMENT",
    ];

    fn set_minimal_env() {
        env::set_var("PAYMASTER__PAYMASTER__MERCHANT_ID", "merchant-1");
        env::set_var("PAYMASTER__PAYMASTER__SECRET", "secret");
        env::set_var("PAYMASTER__PAYMASTER__RETURN_BASE_URL", "https://shop.example");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.paymaster.merchant_id, "merchant-1");
        assert_eq!(config.paymaster.hash_method, HashMethod::Sha256);
        assert_eq!(config.paymaster.api_hash_method, HashMethod::Sha1);
        assert_eq!(config.paymaster.hash_fail_http_code, 400);
        assert_eq!(config.paymaster.poll_delay_secs, 3);
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYMASTER__PAYMASTER__HASH_METHOD", "md5");
        env::set_var("PAYMASTER__SERVER__PORT", "3000");
        env::set_var("PAYMASTER__DATABASE__URL", "postgresql://test@localhost/test");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.paymaster.hash_method, HashMethod::Md5);
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.database.map(|d| d.url),
            Some("postgresql://test@localhost/test".to_string())
        );
    }

    #[test]
    fn test_verify_without_credentials_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYMASTER__PAYMASTER__API_VERIFY", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::VerifyWithoutCredentials)
        );
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYMASTER__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_missing_merchant_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(AppConfig::load().is_err());
    }
}
