//! catalog::traits
//!
//! Catalog trait definition for reading products and metaobjects.
//!
//! # Design
//!
//! The `Catalog` trait is async because every operation is a network round
//! trip. It exposes forward lookups only: a page of products matching an
//! advisory filter, a page of metaobjects of one type, and a page of the full
//! product collection. There is no reverse lookup; the resolver reconstructs
//! one by scanning.
//!
//! Pages are cursor-driven. A cursor is opaque and only valid for the
//! collection that issued it.
//!
//! # Example
//!
//! ```ignore
//! use reftrace::catalog::{Catalog, CatalogError};
//!
//! async fn first_titles(catalog: &dyn Catalog) -> Result<Vec<String>, CatalogError> {
//!     let page = catalog.fetch_all_products_page(None).await?;
//!     Ok(page.items.into_iter().map(|p| p.title).collect())
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::core::refs;
use crate::core::types::{EntityId, MetafieldType};

/// Errors from catalog operations.
///
/// These map to common failure modes when calling the store's API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The access token was rejected or lacks a required scope.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// The API returned a non-success HTTP status.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// The API returned a structured GraphQL error payload.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The call exceeded its deadline.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The response did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

/// One page of a cursor-paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in document order
    pub items: Vec<T>,
    /// Whether another page follows
    pub has_next_page: bool,
    /// Cursor to resume after this page
    pub end_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A page with no successor.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_next_page: false,
            end_cursor: None,
        }
    }
}

/// A product variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Variant id
    pub id: EntityId,
    /// SKU (may be missing or empty)
    pub sku: Option<String>,
}

/// A product with its variants and raw reference fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product id
    pub id: EntityId,
    /// Product title
    pub title: String,
    /// Variants in catalog order
    pub variants: Vec<Variant>,
    /// Raw `custom.add_ons` value (JSON array of metaobject ids)
    pub add_ons_refs: Option<String>,
    /// Raw `custom.options` value (JSON array of metaobject ids)
    pub options_refs: Option<String>,
}

impl Product {
    /// Raw reference field for a content type.
    pub fn reference_field(&self, kind: MetafieldType) -> Option<&str> {
        match kind {
            MetafieldType::AddOns => self.add_ons_refs.as_deref(),
            MetafieldType::Options => self.options_refs.as_deref(),
        }
    }

    /// Decoded metaobject ids referenced by a field; empty when the field is
    /// absent or malformed.
    pub fn references(&self, kind: MetafieldType) -> Vec<EntityId> {
        refs::decode_ids(self.reference_field(kind), kind.key())
    }

    /// SKU of the first variant, if any.
    pub fn first_sku(&self) -> Option<&str> {
        self.variants.first().and_then(|v| v.sku.as_deref())
    }
}

/// A key/value field of a metaobject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaobjectField {
    /// Field key
    pub key: String,
    /// Raw value
    pub value: Option<String>,
}

/// A metaobject record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metaobject {
    /// Metaobject id
    pub id: EntityId,
    /// Display name
    pub display_name: String,
    /// Fields in schema order
    pub fields: Vec<MetaobjectField>,
}

impl Metaobject {
    /// Every id referenced by any field, in field order.
    ///
    /// Fields that do not decode as a JSON array of strings contribute
    /// nothing.
    pub fn referenced_ids(&self) -> Vec<EntityId> {
        self.fields
            .iter()
            .flat_map(|f| refs::decode_ids(f.value.as_deref(), &f.key))
            .collect()
    }
}

/// Minimal product summary returned by the connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    /// Product id
    pub id: EntityId,
    /// Product title
    pub title: String,
}

/// Store identity returned by the connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopInfo {
    /// Store name
    pub name: String,
    /// Canonical myshopify domain
    pub myshopify_domain: String,
    /// First few products
    pub sample_products: Vec<ProductSummary>,
}

/// The Catalog trait for reading from the store.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so one catalog can serve concurrent
/// searches.
///
/// # Error Handling
///
/// All methods return `Result<T, CatalogError>`. None retry; retry policy
/// belongs to the caller.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Get the catalog name (e.g., "shopify", "mock").
    fn name(&self) -> &'static str;

    /// Fetch one page of products matching an advisory search filter.
    ///
    /// The filter is best effort and may over-match; callers re-filter.
    ///
    /// # Arguments
    ///
    /// * `filter` - Search query in the store's query syntax
    /// * `cursor` - Resume position, `None` for the first page
    async fn fetch_products_page(
        &self,
        filter: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Product>, CatalogError>;

    /// Fetch one page of metaobjects of a given type.
    ///
    /// # Arguments
    ///
    /// * `metaobject_type` - Type name in the store's schema
    /// * `cursor` - Resume position, `None` for the first page
    async fn fetch_metaobjects_page(
        &self,
        metaobject_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Metaobject>, CatalogError>;

    /// Fetch one page of the full, unfiltered product collection, including
    /// reference fields.
    async fn fetch_all_products_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<Page<Product>, CatalogError>;

    /// Fetch store identity and a few products, to check connectivity and
    /// credentials.
    async fn shop_info(&self) -> Result<ShopInfo, CatalogError>;
}
