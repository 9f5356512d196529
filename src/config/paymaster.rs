//! PayMaster merchant configuration

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::signature::{HashMethod, DEFAULT_NOTIFICATION_FIELDS};

/// PayMaster merchant and partner API settings
#[derive(Debug, Clone, Deserialize)]
pub struct PaymasterConfig {
    /// Site identifier (`LMI_MERCHANT_ID`)
    pub merchant_id: String,

    /// Secret appended to every notification signature
    pub secret: SecretString,

    /// Optional shop within the site (`LMI_SHOP_ID`)
    pub shop_id: Option<String>,

    /// Partner REST API login
    pub api_login: Option<String>,

    /// Partner REST API password, only ever used inside request hashes
    pub api_password: Option<SecretString>,

    /// Check each notification against `getPayment` before settling
    #[serde(default)]
    pub api_verify: bool,

    /// Test mode (`LMI_SIM_MODE`)
    pub sim_mode: Option<String>,

    /// Preselected payment method (`LMI_PAYMENT_METHOD`)
    pub payment_method: Option<String>,

    /// Comma-separated notification fields covered by `LMI_HASH`
    pub hash_fields: Option<String>,

    /// Digest for notification and redirect signatures
    #[serde(default = "default_hash_method")]
    pub hash_method: HashMethod,

    /// Digest for partner API request signatures
    #[serde(default = "default_api_hash_method")]
    pub api_hash_method: HashMethod,

    /// HTTP status returned with `HashError`
    #[serde(default = "default_hash_fail_http_code")]
    pub hash_fail_http_code: u16,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    /// Hosted payment page the redirect form posts to
    #[serde(default = "default_action_url")]
    pub action_url: String,

    /// Public origin of this service; return URLs hang off it
    pub return_base_url: String,

    /// Seconds a browser waits before re-checking a pending payment
    #[serde(default = "default_poll_delay")]
    pub poll_delay_secs: u64,
}

impl PaymasterConfig {
    /// Hashed field names, in signing order.
    pub fn hash_field_list(&self) -> Vec<String> {
        match &self.hash_fields {
            Some(list) => list
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            None => DEFAULT_NOTIFICATION_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_secs(self.poll_delay_secs)
    }

    /// True when both API credentials are present.
    pub fn has_api_credentials(&self) -> bool {
        self.api_login.as_deref().is_some_and(|l| !l.is_empty())
            && self
                .api_password
                .as_ref()
                .is_some_and(|p| !p.expose_secret().is_empty())
    }

    /// Validate PayMaster configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.merchant_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMASTER__MERCHANT_ID"));
        }
        if self.secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMASTER__SECRET"));
        }
        if self.return_base_url.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMASTER__RETURN_BASE_URL"));
        }
        if self.api_verify && !self.has_api_credentials() {
            return Err(ValidationError::VerifyWithoutCredentials);
        }
        if !(400..=599).contains(&self.hash_fail_http_code) {
            return Err(ValidationError::InvalidHashFailStatus(
                self.hash_fail_http_code,
            ));
        }
        if self.hash_field_list().is_empty() {
            return Err(ValidationError::EmptyHashFields);
        }
        if self.api_timeout_secs == 0 || self.api_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }

        for (name, url) in [
            ("return_base_url", &self.return_base_url),
            ("action_url", &self.action_url),
            ("api_base_url", &self.api_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidUrl(name));
            }
        }

        Ok(())
    }
}

fn default_hash_method() -> HashMethod {
    HashMethod::Sha256
}

fn default_api_hash_method() -> HashMethod {
    HashMethod::Sha1
}

fn default_hash_fail_http_code() -> u16 {
    400
}

fn default_api_base_url() -> String {
    "https://paymaster.ru/partners/rest/".to_string()
}

fn default_api_timeout() -> u64 {
    30
}

fn default_action_url() -> String {
    "https://paymaster.ru/Payment/Init".to_string()
}

fn default_poll_delay() -> u64 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaymasterConfig {
        PaymasterConfig {
            merchant_id: "2902fb4a-d618-4b6b-aade-793b95e10c59".to_string(),
            secret: SecretString::new("secret".to_string()),
            shop_id: None,
            api_login: None,
            api_password: None,
            api_verify: false,
            sim_mode: None,
            payment_method: None,
            hash_fields: None,
            hash_method: default_hash_method(),
            api_hash_method: default_api_hash_method(),
            hash_fail_http_code: default_hash_fail_http_code(),
            api_base_url: default_api_base_url(),
            api_timeout_secs: default_api_timeout(),
            action_url: default_action_url(),
            return_base_url: "https://shop.example".to_string(),
            poll_delay_secs: default_poll_delay(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_hash_field_list_defaults() {
        let fields = config().hash_field_list();
        assert_eq!(fields.len(), DEFAULT_NOTIFICATION_FIELDS.len());
        assert_eq!(fields[0], "LMI_MERCHANT_ID");
    }

    #[test]
    fn test_hash_field_list_parses_comma_list() {
        let config = PaymasterConfig {
            hash_fields: Some("LMI_MERCHANT_ID, LMI_PAYMENT_NO,,LMI_PAID_AMOUNT".to_string()),
            ..config()
        };
        assert_eq!(
            config.hash_field_list(),
            ["LMI_MERCHANT_ID", "LMI_PAYMENT_NO", "LMI_PAID_AMOUNT"]
        );
    }

    #[test]
    fn test_validation_missing_merchant() {
        let config = PaymasterConfig {
            merchant_id: " ".to_string(),
            ..config()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAYMASTER__MERCHANT_ID"))
        );
    }

    #[test]
    fn test_validation_verify_needs_credentials() {
        let config = PaymasterConfig {
            api_verify: true,
            api_login: Some("login".to_string()),
            ..config()
        };
        assert_eq!(config.validate(), Err(ValidationError::VerifyWithoutCredentials));

        let config = PaymasterConfig {
            api_password: Some(SecretString::new("password".to_string())),
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_hash_fail_status() {
        let config = PaymasterConfig {
            hash_fail_http_code: 200,
            ..config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidHashFailStatus(200)));
    }

    #[test]
    fn test_validation_action_url_scheme() {
        let config = PaymasterConfig {
            action_url: "paymaster.ru/Payment/Init".to_string(),
            ..config()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidUrl("action_url")));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = PaymasterConfig {
            api_password: Some(SecretString::new("hunter2".to_string())),
            ..config()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("\"secret\""));
    }
}
