//! Digest algorithms accepted by PayMaster.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::domain::foundation::ValidationError;

/// Digest used to sign a canonical line.
///
/// `Md5` is accepted for legacy merchant configurations only. Notifications
/// default to `Sha256`, the partner REST API always uses `Sha1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashMethod {
    Md5,
    Sha1,
    #[default]
    Sha256,
}

impl HashMethod {
    /// Digests `line` as UTF-8 and encodes the raw digest with standard base64.
    pub fn digest_base64(&self, line: &str) -> String {
        let bytes = line.as_bytes();
        match self {
            HashMethod::Md5 => STANDARD.encode(Md5::digest(bytes)),
            HashMethod::Sha1 => STANDARD.encode(Sha1::digest(bytes)),
            HashMethod::Sha256 => STANDARD.encode(Sha256::digest(bytes)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HashMethod::Md5 => "md5",
            HashMethod::Sha1 => "sha1",
            HashMethod::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(HashMethod::Md5),
            "sha1" => Ok(HashMethod::Sha1),
            "sha256" => Ok(HashMethod::Sha256),
            other => Err(ValidationError::invalid_format(
                "hash_method",
                format!("unsupported digest '{}'", other),
            )),
        }
    }
}
