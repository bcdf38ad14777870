//! core::refs
//!
//! Decoding of reference fields.
//!
//! The catalog stores reference lists as text: a JSON array of id strings in
//! a single field value. Upstream data is inconsistent, so decoding is lossy.
//! Absent, empty, malformed, or non-array values decode to an empty list and
//! never raise. Non-string array elements are skipped.

use serde_json::Value;

use super::types::EntityId;

/// The outcome of decoding one field value.
///
/// Kept distinct from a plain `Vec` so callers can log why a field
/// contributed nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedRefs {
    /// The value decoded as a JSON array; string elements in order.
    List(Vec<EntityId>),
    /// No value was present.
    Absent,
    /// A value was present but was not a JSON array.
    Invalid,
}

impl DecodedRefs {
    /// Collapse to the reference list, treating absent/invalid as empty.
    pub fn into_ids(self) -> Vec<EntityId> {
        match self {
            DecodedRefs::List(ids) => ids,
            DecodedRefs::Absent | DecodedRefs::Invalid => Vec::new(),
        }
    }
}

/// Decode a raw field value into a reference list.
///
/// # Example
///
/// ```
/// use reftrace::core::refs::{decode, DecodedRefs};
///
/// let refs = decode(Some(r#"["gid://shopify/Metaobject/1"]"#));
/// assert_eq!(refs.into_ids().len(), 1);
///
/// assert_eq!(decode(Some("not json")), DecodedRefs::Invalid);
/// assert_eq!(decode(None), DecodedRefs::Absent);
/// ```
pub fn decode(raw: Option<&str>) -> DecodedRefs {
    let raw = match raw {
        Some(r) if !r.trim().is_empty() => r,
        _ => return DecodedRefs::Absent,
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => DecodedRefs::List(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(EntityId::from(s)),
                    _ => None,
                })
                .collect(),
        ),
        Ok(Value::Null) => DecodedRefs::Absent,
        _ => DecodedRefs::Invalid,
    }
}

/// Decode straight to ids, logging fields that were present but unusable.
pub fn decode_ids(raw: Option<&str>, context: &str) -> Vec<EntityId> {
    let decoded = decode(raw);
    if decoded == DecodedRefs::Invalid {
        tracing::trace!(field = context, "field value is not a reference list");
    }
    decoded.into_ids()
}
