//! resolver::response
//!
//! The search response, as serialized to callers.
//!
//! A search never fails at the type level. Errors are carried in the
//! response's `error` and `errorKind` fields, in which case `results` and
//! `foundInProducts` are both empty.

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, MetafieldType};

use super::error::{ErrorKind, SearchError};
use super::parents::ParentProduct;

/// Message when no product variant carries the SKU.
pub const NO_PRODUCT_MATCH_MESSAGE: &str = "No products found with that SKU";

/// Message when matched products are not referenced by any metaobject.
pub const NO_METAOBJECT_MATCH_MESSAGE: &str = "SKU found in products but not used in any metaobjects";

/// A product whose variant matched the SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundProduct {
    /// Product id
    pub product_id: EntityId,
    /// Product title
    pub product_title: String,
    /// First matching variant
    pub variant_id: EntityId,
    /// That variant's SKU
    pub sku: String,
}

/// A relevant metaobject and the products that reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaobjectMatch {
    /// Metaobject id
    pub metaobject_id: EntityId,
    /// Display name
    pub metaobject_name: String,
    /// Content type
    pub metaobject_type: MetafieldType,
    /// Referencing products; may be empty
    pub parent_products: Vec<ParentProduct>,
}

/// Result of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// The token as searched, trimmed
    pub searched_sku: String,
    /// Products with a matching variant
    pub found_in_products: Vec<FoundProduct>,
    /// One entry per relevant metaobject, in index order
    pub results: Vec<MetaobjectMatch>,
    /// Informational message for empty outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error message for failed searches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl SearchResponse {
    /// No product variant matched.
    pub fn no_product_match(searched_sku: impl Into<String>) -> Self {
        Self {
            searched_sku: searched_sku.into(),
            found_in_products: Vec::new(),
            results: Vec::new(),
            message: Some(NO_PRODUCT_MATCH_MESSAGE.to_string()),
            error: None,
            error_kind: None,
        }
    }

    /// Products matched but no metaobject references them.
    pub fn no_metaobject_match(searched_sku: impl Into<String>, found: Vec<FoundProduct>) -> Self {
        Self {
            searched_sku: searched_sku.into(),
            found_in_products: found,
            results: Vec::new(),
            message: Some(NO_METAOBJECT_MATCH_MESSAGE.to_string()),
            error: None,
            error_kind: None,
        }
    }

    /// Fully resolved search.
    pub fn resolved(
        searched_sku: impl Into<String>,
        found: Vec<FoundProduct>,
        results: Vec<MetaobjectMatch>,
    ) -> Self {
        Self {
            searched_sku: searched_sku.into(),
            found_in_products: found,
            results,
            message: None,
            error: None,
            error_kind: None,
        }
    }

    /// Failed search. Partial results are never included.
    pub fn failed(searched_sku: impl Into<String>, error: &SearchError) -> Self {
        Self {
            searched_sku: searched_sku.into(),
            found_in_products: Vec::new(),
            results: Vec::new(),
            message: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    /// Whether the search failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// HTTP-style status: 200 on success, otherwise per error kind.
    pub fn status_code(&self) -> u16 {
        match self.error_kind {
            Some(kind) => kind.status_code(),
            None if self.error.is_some() => 500,
            None => 200,
        }
    }
}
