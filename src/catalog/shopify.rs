//! catalog::shopify
//!
//! Shopify implementation of the catalog using the Admin GraphQL API.
//!
//! # Design
//!
//! Every operation is a single `POST` to
//! `https://{shop}/admin/api/{version}/graphql.json` with the query text and
//! its variables. Responses are decoded in two steps: first the GraphQL
//! envelope (so a structured `errors` payload is reported as such even when
//! `data` is null or partial), then `data` into the typed wire structs below.
//!
//! Reference fields are read as product metafields `custom.add_ons` and
//! `custom.options`, aliased in the query so both arrive on one node.
//!
//! # Query cost
//!
//! Page sizes are kept under the Admin API cost limit (see
//! [`crate::core::config::schema`]). SKU search candidates carry at most
//! [`SEARCH_VARIANTS_PER_PRODUCT`] variants per request; a product with more
//! has its remaining variants fetched page by page, so the full variant set
//! is always matched.
//!
//! # Rate Limiting
//!
//! Shopify throttles by query cost. This implementation:
//! - Returns `CatalogError::RateLimited` on HTTP 429 or a `THROTTLED` error
//! - Does not retry (caller's responsibility)
//!
//! Top-level `errors` arrive either as a list of error objects or as a single
//! message string; both are reported as `CatalogError::GraphQl`.
//!
//! # Example
//!
//! ```ignore
//! use reftrace::catalog::shopify::ShopifyCatalog;
//! use reftrace::catalog::Catalog;
//!
//! let catalog = ShopifyCatalog::new("example.myshopify.com", "shpat_xxx", "2025-10");
//! let shop = catalog.shop_info().await?;
//! println!("Connected to {}", shop.name);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::traits::{
    Catalog, CatalogError, Metaobject, MetaobjectField, Page, Product, ProductSummary, ShopInfo,
    Variant,
};
use crate::core::config::{
    Config, ConfigError, DEFAULT_PAGE_SIZE, DEFAULT_PRODUCT_SEARCH_LIMIT,
    DEFAULT_REQUEST_TIMEOUT_SECS, SCAN_VARIANTS_PER_PRODUCT, SEARCH_VARIANTS_PER_PRODUCT,
};
use crate::core::types::EntityId;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "reftrace";

/// Access token header.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Products listed by the connectivity probe.
const SHOP_SAMPLE_PRODUCTS: u32 = 5;

/// Product page query, shared by the SKU search and the full scan.
///
/// `$query` is null for the full scan.
const PRODUCTS_QUERY: &str = r#"query Products($first: Int!, $after: String, $query: String, $variants: Int!) {
  products(first: $first, after: $after, query: $query) {
    pageInfo { hasNextPage endCursor }
    nodes {
      id
      title
      variants(first: $variants) {
        pageInfo { hasNextPage endCursor }
        nodes { id sku }
      }
      addOns: metafield(namespace: "custom", key: "add_ons") { value }
      options: metafield(namespace: "custom", key: "options") { value }
    }
  }
}"#;

const VARIANTS_QUERY: &str = r#"query ProductVariants($id: ID!, $first: Int!, $after: String) {
  product(id: $id) {
    variants(first: $first, after: $after) {
      pageInfo { hasNextPage endCursor }
      nodes { id sku }
    }
  }
}"#;

const METAOBJECTS_QUERY: &str = r#"query Metaobjects($type: String!, $first: Int!, $after: String) {
  metaobjects(type: $type, first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    nodes {
      id
      displayName
      fields { key value }
    }
  }
}"#;

const SHOP_QUERY: &str = r#"query Shop($first: Int!) {
  shop { name myshopifyDomain }
  products(first: $first) { nodes { id title } }
}"#;

/// Shopify catalog implementation.
pub struct ShopifyCatalog {
    /// HTTP client (carries the per-call timeout)
    client: Client,
    /// Admin API access token
    access_token: String,
    /// GraphQL endpoint URL
    endpoint: String,
    /// Page size for full-collection scans
    page_size: u32,
    /// Candidate products requested by a SKU search
    search_limit: u32,
}

// Custom Debug to avoid exposing the access token
impl std::fmt::Debug for ShopifyCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyCatalog")
            .field("endpoint", &self.endpoint)
            .field("page_size", &self.page_size)
            .field("search_limit", &self.search_limit)
            .finish_non_exhaustive()
    }
}

impl ShopifyCatalog {
    /// Create a catalog for a store.
    ///
    /// # Arguments
    ///
    /// * `shop_domain` - Store host name (e.g., `example.myshopify.com`)
    /// * `access_token` - Admin API access token
    /// * `api_version` - API version segment (e.g., `2025-10`)
    pub fn new(
        shop_domain: impl AsRef<str>,
        access_token: impl Into<String>,
        api_version: impl AsRef<str>,
    ) -> Self {
        Self::with_endpoint(
            admin_endpoint(shop_domain.as_ref(), api_version.as_ref()),
            access_token,
        )
    }

    /// Create a catalog against an explicit GraphQL endpoint.
    ///
    /// Use this for proxies and for tests against a local server.
    pub fn with_endpoint(endpoint: impl Into<String>, access_token: impl Into<String>) -> Self {
        let client = build_client(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to a default HTTP client");
                Client::new()
            });

        Self {
            client,
            access_token: access_token.into(),
            endpoint: endpoint.into(),
            page_size: DEFAULT_PAGE_SIZE,
            search_limit: DEFAULT_PRODUCT_SEARCH_LIMIT,
        }
    }

    /// Create a catalog from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the store domain or token is absent,
    /// and `ConfigError::InvalidValue` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let credentials = config.credentials()?;
        Ok(Self::new(
            &credentials.shop_domain,
            credentials.access_token,
            config.api_version(),
        )
        .try_with_timeout(config.request_timeout())?
        .with_page_size(config.page_size())
        .with_search_limit(config.product_search_limit()))
    }

    /// Set the per-call deadline.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the HTTP client cannot be built.
    pub fn try_with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// Set the per-call deadline, keeping the current client if a new one
    /// cannot be built.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match build_client(timeout) {
            Ok(client) => self.client = client,
            Err(e) => tracing::warn!(error = %e, ?timeout, "keeping previous HTTP client"),
        }
        self
    }

    /// Set the page size for full-collection scans.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the candidate product limit for SKU searches.
    pub fn with_search_limit(mut self, search_limit: u32) -> Self {
        self.search_limit = search_limit;
        self
    }

    /// Get the GraphQL endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, CatalogError> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&self.access_token)
            .map_err(|_| CatalogError::AuthFailed("access token is not a valid header value".into()))?;
        headers.insert(ACCESS_TOKEN_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Execute a GraphQL query and decode its `data`.
    async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: Value,
    ) -> Result<T, CatalogError> {
        let body = json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        tracing::debug!(operation, status = status.as_u16(), "catalog response");

        let text = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            return Err(map_status(status, error_message(&text)));
        }

        let envelope: GraphQlEnvelope = serde_json::from_str(&text)
            .map_err(|e| CatalogError::Decode(format!("{}: {}", operation, e)))?;

        if let Some(err) = envelope.errors.and_then(GraphQlErrors::into_error) {
            return Err(err);
        }

        let data = envelope
            .data
            .filter(|d| !d.is_null())
            .ok_or_else(|| CatalogError::Decode(format!("{}: response has no data", operation)))?;

        serde_json::from_value(data).map_err(|e| CatalogError::Decode(format!("{}: {}", operation, e)))
    }

    /// Fetch one product page with the shared query.
    async fn products_page(
        &self,
        operation: &'static str,
        first: u32,
        variants: u32,
        filter: Option<&str>,
        cursor: Option<&str>,
    ) -> Result<Connection<ProductNode>, CatalogError> {
        let data: ProductsData = self
            .graphql(
                operation,
                PRODUCTS_QUERY,
                json!({
                    "first": first,
                    "after": cursor,
                    "query": filter,
                    "variants": variants,
                }),
            )
            .await?;

        Ok(data.products)
    }

    /// Fetch the variants of `node` beyond its first page.
    async fn complete_variants(&self, node: &mut ProductNode) -> Result<(), CatalogError> {
        while node.variants.page_info.has_next_page {
            let cursor = node.variants.page_info.end_cursor.take().ok_or_else(|| {
                CatalogError::Decode(format!(
                    "product_variants: {} reports more variants without a cursor",
                    node.id
                ))
            })?;

            let data: VariantsData = self
                .graphql(
                    "product_variants",
                    VARIANTS_QUERY,
                    json!({
                        "id": node.id,
                        "first": SEARCH_VARIANTS_PER_PRODUCT,
                        "after": cursor,
                    }),
                )
                .await?;

            let variants = data
                .product
                .ok_or_else(|| {
                    CatalogError::Decode(format!("product_variants: {} not found", node.id))
                })?
                .variants;

            tracing::debug!(
                product = %node.id,
                fetched = variants.nodes.len(),
                "variant page"
            );
            node.variants.nodes.extend(variants.nodes);
            node.variants.page_info = variants.page_info;
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for ShopifyCatalog {
    fn name(&self) -> &'static str {
        "shopify"
    }

    async fn fetch_products_page(
        &self,
        filter: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Product>, CatalogError> {
        let mut products = self
            .products_page(
                "search_products",
                self.search_limit,
                SEARCH_VARIANTS_PER_PRODUCT,
                Some(filter),
                cursor,
            )
            .await?;

        for node in &mut products.nodes {
            self.complete_variants(node).await?;
        }

        Ok(products.into_page())
    }

    async fn fetch_metaobjects_page(
        &self,
        metaobject_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Metaobject>, CatalogError> {
        let data: MetaobjectsData = self
            .graphql(
                "metaobjects",
                METAOBJECTS_QUERY,
                json!({
                    "type": metaobject_type,
                    "first": self.page_size,
                    "after": cursor,
                }),
            )
            .await?;

        Ok(data.metaobjects.into_page())
    }

    async fn fetch_all_products_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<Page<Product>, CatalogError> {
        // Only the first variant's SKU is reported for referencing products.
        let products = self
            .products_page(
                "all_products",
                self.page_size,
                SCAN_VARIANTS_PER_PRODUCT,
                None,
                cursor,
            )
            .await?;

        Ok(products.into_page())
    }

    async fn shop_info(&self) -> Result<ShopInfo, CatalogError> {
        let data: ShopData = self
            .graphql("shop", SHOP_QUERY, json!({ "first": SHOP_SAMPLE_PRODUCTS }))
            .await?;

        Ok(ShopInfo {
            name: data.shop.name,
            myshopify_domain: data.shop.myshopify_domain,
            sample_products: data
                .products
                .nodes
                .into_iter()
                .map(|p| ProductSummary {
                    id: EntityId::from(p.id),
                    title: p.title,
                })
                .collect(),
        })
    }
}

// --------------------------------------------------------------------------
// Helpers
// --------------------------------------------------------------------------

/// Admin GraphQL endpoint for a store and API version.
pub fn admin_endpoint(shop_domain: &str, api_version: &str) -> String {
    format!(
        "https://{}/admin/api/{}/graphql.json",
        shop_domain, api_version
    )
}

fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT_VALUE)
        .build()
        .map_err(|e| ConfigError::InvalidValue(format!("cannot build HTTP client: {}", e)))
}

fn map_transport_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout(e.to_string())
    } else if e.is_decode() {
        CatalogError::Decode(e.to_string())
    } else {
        CatalogError::NetworkError(e.to_string())
    }
}

/// Map a non-success HTTP status to a catalog error.
fn map_status(status: StatusCode, message: String) -> CatalogError {
    match status {
        StatusCode::UNAUTHORIZED => CatalogError::AuthFailed("Invalid or expired token".into()),
        StatusCode::FORBIDDEN => CatalogError::AuthFailed(format!("Permission denied: {}", message)),
        StatusCode::TOO_MANY_REQUESTS => CatalogError::RateLimited,
        _ if status.is_server_error() => CatalogError::ApiError {
            status: status.as_u16(),
            message: format!("Shopify server error: {}", message),
        },
        _ => CatalogError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull a readable message out of an error body.
///
/// Shopify sends `{"errors": "..."}`, `{"errors": [{"message": ...}]}`, or
/// plain text depending on the failure.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("errors") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|i| i.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => other.to_string(),
            None => "Unknown error".to_string(),
        },
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => "Unknown error".to_string(),
    }
}

fn map_graphql_errors(errors: &[GraphQlError]) -> CatalogError {
    let throttled = errors.iter().any(|e| {
        e.extensions
            .as_ref()
            .and_then(|x| x.code.as_deref())
            .is_some_and(|code| code == "THROTTLED")
    });
    if throttled {
        return CatalogError::RateLimited;
    }

    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    CatalogError::GraphQl(message)
}

// --------------------------------------------------------------------------
// API Response Types
// --------------------------------------------------------------------------

/// GraphQL response envelope.
#[derive(Deserialize)]
struct GraphQlEnvelope {
    data: Option<Value>,
    errors: Option<GraphQlErrors>,
}

/// Top-level `errors`: a list of error objects, or a bare message.
#[derive(Deserialize)]
#[serde(untagged)]
enum GraphQlErrors {
    List(Vec<GraphQlError>),
    Message(String),
}

impl GraphQlErrors {
    /// The catalog error these represent, if any.
    fn into_error(self) -> Option<CatalogError> {
        match self {
            GraphQlErrors::List(errors) if errors.is_empty() => None,
            GraphQlErrors::List(errors) => Some(map_graphql_errors(&errors)),
            GraphQlErrors::Message(message) => Some(CatalogError::GraphQl(message)),
        }
    }
}

/// GraphQL error format.
#[derive(Deserialize)]
struct GraphQlError {
    message: String,
    extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Deserialize)]
struct GraphQlErrorExtensions {
    code: Option<String>,
}

/// Relay-style connection with page info.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    page_info: PageInfo,
    nodes: Vec<T>,
}

impl<T> Connection<T> {
    fn into_page<U>(self) -> Page<U>
    where
        T: Into<U>,
    {
        Page {
            items: self.nodes.into_iter().map(Into::into).collect(),
            has_next_page: self.page_info.has_next_page,
            end_cursor: self.page_info.end_cursor,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// Connection without page info.
#[derive(Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Deserialize)]
struct ProductsData {
    products: Connection<ProductNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: String,
    title: String,
    variants: VariantConnection,
    add_ons: Option<MetafieldValue>,
    options: Option<MetafieldValue>,
}

/// Variant connection; `pageInfo` is absent when not requested.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantConnection {
    #[serde(default)]
    page_info: PageInfo,
    nodes: Vec<VariantNode>,
}

#[derive(Deserialize)]
struct VariantsData {
    product: Option<VariantsProduct>,
}

#[derive(Deserialize)]
struct VariantsProduct {
    variants: VariantConnection,
}

#[derive(Deserialize)]
struct VariantNode {
    id: String,
    sku: Option<String>,
}

#[derive(Deserialize)]
struct MetafieldValue {
    value: Option<String>,
}

#[derive(Deserialize)]
struct MetaobjectsData {
    metaobjects: Connection<MetaobjectNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetaobjectNode {
    id: String,
    display_name: String,
    fields: Vec<FieldNode>,
}

#[derive(Deserialize)]
struct FieldNode {
    key: String,
    value: Option<String>,
}

#[derive(Deserialize)]
struct ShopData {
    shop: ShopNode,
    products: Nodes<ProductSummaryNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShopNode {
    name: String,
    myshopify_domain: String,
}

#[derive(Deserialize)]
struct ProductSummaryNode {
    id: String,
    title: String,
}

impl From<ProductNode> for Product {
    fn from(node: ProductNode) -> Self {
        Product {
            id: EntityId::from(node.id),
            title: node.title,
            variants: node
                .variants
                .nodes
                .into_iter()
                .map(|v| Variant {
                    id: EntityId::from(v.id),
                    sku: v.sku,
                })
                .collect(),
            add_ons_refs: node.add_ons.and_then(|m| m.value),
            options_refs: node.options.and_then(|m| m.value),
        }
    }
}

impl From<MetaobjectNode> for Metaobject {
    fn from(node: MetaobjectNode) -> Self {
        Metaobject {
            id: EntityId::from(node.id),
            display_name: node.display_name,
            fields: node
                .fields
                .into_iter()
                .map(|f| MetaobjectField {
                    key: f.key,
                    value: f.value,
                })
                .collect(),
        }
    }
}
