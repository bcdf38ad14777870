//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`EntityId`] - Opaque catalog identifier (product, variant, metaobject)
//! - [`SkuToken`] - Validated SKU search token
//! - [`MetafieldType`] - The two reference-carrying content types
//!
//! # Validation
//!
//! `SkuToken` enforces validity at construction time: an empty search is
//! rejected before any upstream call is made. `EntityId` is deliberately
//! unvalidated; identifiers are compared by exact string equality and never
//! normalized.
//!
//! # Examples
//!
//! ```
//! use reftrace::core::types::{EntityId, SkuToken};
//!
//! let token = SkuToken::new("  GAR-403069 ").unwrap();
//! assert_eq!(token.as_str(), "GAR-403069");
//! assert!(SkuToken::new("   ").is_err());
//!
//! let id = EntityId::from("gid://shopify/Product/1");
//! assert_eq!(id.as_str(), "gid://shopify/Product/1");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid SKU: {0}")]
    InvalidSku(String),

    #[error("unknown metafield type: {0}")]
    UnknownMetafieldType(String),
}

/// An opaque identifier issued by the catalog.
///
/// Two ids are equal only if their strings are byte-for-byte equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A trimmed, non-empty SKU search token.
///
/// Matching against variant SKUs is case-insensitive substring containment,
/// so the lower-cased form is computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuToken {
    raw: String,
    lowered: String,
}

impl SkuToken {
    /// Create a token from user input, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSku` if nothing remains after trimming.
    pub fn new(input: &str) -> Result<Self, TypeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidSku("SKU cannot be empty".into()));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            lowered: trimmed.to_lowercase(),
        })
    }

    /// The trimmed token as entered.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether a variant SKU contains this token, ignoring case.
    ///
    /// Missing and empty SKUs never match.
    pub fn matches(&self, sku: Option<&str>) -> bool {
        match sku {
            Some(sku) if !sku.is_empty() => sku.to_lowercase().contains(&self.lowered),
            _ => false,
        }
    }
}

impl fmt::Display for SkuToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The reference-carrying content types.
///
/// Each is both a metaobject type in the catalog schema and the key of a
/// product reference field pointing at metaobjects of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetafieldType {
    /// Add-on blocks (`custom.add_ons`)
    AddOns,
    /// Option blocks (`custom.options`)
    Options,
}

impl MetafieldType {
    /// All recognized types, in scan order.
    pub const ALL: [MetafieldType; 2] = [MetafieldType::AddOns, MetafieldType::Options];

    /// The canonical key, used for both the metafield key and the default
    /// metaobject type name.
    pub fn key(self) -> &'static str {
        match self {
            MetafieldType::AddOns => "add_ons",
            MetafieldType::Options => "options",
        }
    }
}

impl fmt::Display for MetafieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for MetafieldType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add_ons" => Ok(MetafieldType::AddOns),
            "options" => Ok(MetafieldType::Options),
            other => Err(TypeError::UnknownMetafieldType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod sku_token {
        use super::*;

        #[test]
        fn trims_whitespace() {
            let token = SkuToken::new("\t GAR-403069-0166 \n").unwrap();
            assert_eq!(token.as_str(), "GAR-403069-0166");
        }

        #[test]
        fn rejects_empty() {
            assert!(SkuToken::new("").is_err());
            assert!(SkuToken::new("   ").is_err());
        }

        #[test]
        fn matches_substring_ignoring_case() {
            let token = SkuToken::new("gar-4030").unwrap();
            assert!(token.matches(Some("GAR-403069-0166")));
            assert!(token.matches(Some("xx-gar-4030")));
            assert!(!token.matches(Some("GAR-40")));
        }

        #[test]
        fn missing_sku_never_matches() {
            let token = SkuToken::new("a").unwrap();
            assert!(!token.matches(None));
            assert!(!token.matches(Some("")));
        }
    }

    mod entity_id {
        use super::*;

        #[test]
        fn equality_is_exact() {
            assert_ne!(
                EntityId::from("gid://shopify/Product/1"),
                EntityId::from("gid://shopify/product/1")
            );
            assert_ne!(EntityId::from("1"), EntityId::from(" 1"));
        }

        #[test]
        fn serializes_transparently() {
            let id = EntityId::from("M1");
            assert_eq!(serde_json::to_string(&id).unwrap(), "\"M1\"");
        }
    }

    mod metafield_type {
        use super::*;

        #[test]
        fn serializes_as_snake_case() {
            assert_eq!(
                serde_json::to_string(&MetafieldType::AddOns).unwrap(),
                "\"add_ons\""
            );
            assert_eq!(
                serde_json::to_string(&MetafieldType::Options).unwrap(),
                "\"options\""
            );
        }

        #[test]
        fn parses_known_keys() {
            assert_eq!("add_ons".parse::<MetafieldType>(), Ok(MetafieldType::AddOns));
            assert_eq!("options".parse::<MetafieldType>(), Ok(MetafieldType::Options));
            assert!("other".parse::<MetafieldType>().is_err());
        }
    }
}
