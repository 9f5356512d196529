//! Canonical signature codec shared by the notification handler, the
//! outbound form builder and the REST client.

mod codec;
mod hash_method;

pub use codec::{
    canonical_string, notification_hash, request_hash, signatures_match, FieldSource,
    DEFAULT_NOTIFICATION_FIELDS,
};
pub use hash_method::HashMethod;
