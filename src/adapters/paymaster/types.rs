//! Partner API response records.
//!
//! PayMaster answers in PascalCase JSON. Identifiers arrive as strings or
//! numbers depending on the endpoint, so they are normalised to `String`.
//! Timestamps that cannot be parsed are kept as the raw provider text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::domain::payment::{RefundStatus, RemotePaymentState};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A timestamp as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderTimestamp {
    Parsed(DateTime<Utc>),
    Raw(String),
}

impl ProviderTimestamp {
    /// Parses ISO-8601 style values, with or without offset and fraction.
    /// Naive values are taken as UTC.
    pub fn parse(raw: &str) -> Self {
        parse_datetime(raw)
            .map(ProviderTimestamp::Parsed)
            .unwrap_or_else(|| ProviderTimestamp::Raw(raw.to_string()))
    }

    /// Parses the `/Date(<milliseconds>)/` form used by document listings.
    pub fn parse_ms_date(raw: &str) -> Self {
        parse_ms_date(raw)
            .map(ProviderTimestamp::Parsed)
            .unwrap_or_else(|| ProviderTimestamp::Raw(raw.to_string()))
    }

    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            ProviderTimestamp::Parsed(dt) => Some(dt),
            ProviderTimestamp::Raw(_) => None,
        }
    }
}

impl Serialize for ProviderTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProviderTimestamp::Parsed(dt) => {
                serializer.collect_str(&dt.format(TIMESTAMP_FORMAT))
            }
            ProviderTimestamp::Raw(raw) => serializer.serialize_str(raw),
        }
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_ms_date(raw: &str) -> Option<DateTime<Utc>> {
    let inner = raw.trim().strip_prefix("/Date(")?.strip_suffix(")/")?;
    // Some endpoints append a zone suffix such as `+0300`; the millisecond
    // value is already UTC.
    let end = inner
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(inner.len());
    let millis: i64 = inner[..end].parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

// ════════════════════════════════════════════════════════════════════════════════
// Field deserializers
// ════════════════════════════════════════════════════════════════════════════════

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn optional_id_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ProviderTimestamp>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(|s| ProviderTimestamp::parse(&s)))
}

fn optional_ms_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ProviderTimestamp>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(|s| ProviderTimestamp::parse_ms_date(&s)))
}

/// `Overflow` is documented as the string `"true"` but also seen as a bool.
fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(s.eq_ignore_ascii_case("true")),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        other => Err(de::Error::custom(format!("expected boolean, got {}", other))),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Records
// ════════════════════════════════════════════════════════════════════════════════

/// Payment as returned by `getPayment` and related calls.
///
/// The legacy `LastUpdate` field is discarded; `LastUpdateTime` carries the
/// same instant in a parseable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentRecord {
    #[serde(rename = "PaymentID", deserialize_with = "id_string")]
    pub payment_id: String,
    pub state: RemotePaymentState,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub payment_amount: Option<Decimal>,
    #[serde(default)]
    pub payment_currency_code: Option<String>,
    #[serde(default)]
    pub is_test_payment: Option<bool>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub last_update_time: Option<ProviderTimestamp>,
    #[serde(rename = "PaymentSystemID", default, deserialize_with = "optional_id_string")]
    pub payment_system_id: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(rename = "SiteID", default, deserialize_with = "optional_id_string")]
    pub site_id: Option<String>,
    #[serde(rename = "SiteInvoiceID", default, deserialize_with = "optional_id_string")]
    pub site_invoice_id: Option<String>,
    #[serde(default)]
    pub user_identifier: Option<String>,
    #[serde(default)]
    pub user_phone_number: Option<String>,
}

/// Result of `listPaymentsFilter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentList {
    /// More payments match than were returned; narrow the filter.
    #[serde(default, deserialize_with = "flexible_bool")]
    pub overflow: bool,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

/// Refund as returned by `refundPayment` and `listRefunds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefundRecord {
    #[serde(rename = "ExternalID", default, deserialize_with = "optional_id_string")]
    pub external_id: Option<String>,
    #[serde(rename = "PaymentID", deserialize_with = "id_string")]
    pub payment_id: String,
    pub status: RefundStatus,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_desc: Option<String>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub last_update: Option<ProviderTimestamp>,
}

/// Result of `listRefunds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefundList {
    #[serde(default, deserialize_with = "flexible_bool")]
    pub overflow: bool,
    #[serde(default)]
    pub refunds: Vec<RefundRecord>,
}

/// Entry of `listDocuments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentRecord {
    #[serde(rename = "DocumentID", deserialize_with = "id_string")]
    pub document_id: String,
    #[serde(default, deserialize_with = "optional_ms_date")]
    pub created: Option<ProviderTimestamp>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}
