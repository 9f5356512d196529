//! Response bodies for the callback endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Everything a page needs to render the auto-submitting redirect form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutFormResponse {
    pub action: String,
    pub method: String,
    pub fields: BTreeMap<String, String>,
}

impl CheckoutFormResponse {
    pub fn post(action: impl Into<String>, fields: BTreeMap<String, String>) -> Self {
        Self {
            action: action.into(),
            method: "POST".to_string(),
            fields,
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_form_serializes_as_post() {
        let fields = BTreeMap::from([("LMI_PAYMENT_NO".to_string(), "tok-1".to_string())]);
        let json = serde_json::to_value(CheckoutFormResponse::post("https://pay", fields)).unwrap();

        assert_eq!(json["method"], "POST");
        assert_eq!(json["action"], "https://pay");
        assert_eq!(json["fields"]["LMI_PAYMENT_NO"], "tok-1");
    }
}
