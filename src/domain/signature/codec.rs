//! Canonical line construction and signing.
//!
//! PayMaster signs a request by joining the values of an ordered list of
//! field names with `;`. Absent and empty fields contribute an empty
//! segment, so `a;;c` is produced whether `b` is missing or blank. The two
//! flavours differ only in where the secret goes:
//!
//! - notifications and the outbound form append `;<secret>` to the line;
//! - REST calls carry the password as a synthetic field inside the line and
//!   append nothing.

use std::collections::{BTreeMap, HashMap};

use subtle::ConstantTimeEq;

use super::HashMethod;

/// Notification fields covered by `LMI_HASH`, in signing order.
pub const DEFAULT_NOTIFICATION_FIELDS: &[&str] = &[
    "LMI_MERCHANT_ID",
    "LMI_PAYMENT_NO",
    "LMI_SYS_PAYMENT_ID",
    "LMI_SYS_PAYMENT_DATE",
    "LMI_PAYMENT_AMOUNT",
    "LMI_CURRENCY",
    "LMI_PAID_AMOUNT",
    "LMI_PAID_CURRENCY",
    "LMI_PAYMENT_SYSTEM",
    "LMI_SIM_MODE",
];

/// Read access to named string values.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<&str>;
}

impl FieldSource for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl FieldSource for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<K: AsRef<str>> FieldSource for [(K, String)] {
    fn field(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.as_ref() == name)
            .map(|(_, value)| value.as_str())
    }
}

impl<K: AsRef<str>> FieldSource for Vec<(K, String)> {
    fn field(&self, name: &str) -> Option<&str> {
        self.as_slice().field(name)
    }
}

/// Joins the values named by `order` with `;`.
pub fn canonical_string<F, S>(fields: &F, order: &[S]) -> String
where
    F: FieldSource + ?Sized,
    S: AsRef<str>,
{
    order
        .iter()
        .map(|name| fields.field(name.as_ref()).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(";")
}

/// Signature of a notification or outbound form: the canonical line
/// followed by `;<secret>`.
pub fn notification_hash<F, S>(fields: &F, order: &[S], secret: &str, method: HashMethod) -> String
where
    F: FieldSource + ?Sized,
    S: AsRef<str>,
{
    let mut line = canonical_string(fields, order);
    line.push(';');
    line.push_str(secret);
    method.digest_base64(&line)
}

/// Signature of a REST call. The password must already be present in
/// `fields` under its own name.
pub fn request_hash<F, S>(fields: &F, order: &[S], method: HashMethod) -> String
where
    F: FieldSource + ?Sized,
    S: AsRef<str>,
{
    method.digest_base64(&canonical_string(fields, order))
}

/// Compares two base64 signatures without short-circuiting on content.
pub fn signatures_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
