//! catalog::mock
//!
//! Mock catalog implementation for deterministic testing.
//!
//! # Design
//!
//! The mock catalog stores products and metaobjects in memory, serves them in
//! insertion order through the same cursor-paginated interface as the real
//! store, and allows configuring failure scenarios. Every call is recorded so
//! tests can assert how the resolver paged through the collections.
//!
//! # Example
//!
//! ```
//! use reftrace::catalog::mock::MockCatalog;
//! use reftrace::catalog::Catalog;
//!
//! # tokio_test::block_on(async {
//! let catalog = MockCatalog::new()
//!     .with_product(MockCatalog::product("P1", "Hose", &["GAR-1"]))
//!     .with_page_size(1);
//!
//! let page = catalog.fetch_all_products_page(None).await.unwrap();
//! assert_eq!(page.items.len(), 1);
//! assert!(!page.has_next_page);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::traits::{
    Catalog, CatalogError, Metaobject, MetaobjectField, Page, Product, ProductSummary, ShopInfo,
    Variant,
};
use crate::core::types::EntityId;

/// Mock catalog for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockCatalogInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockCatalogInner {
    /// Products in document order.
    products: Vec<Product>,
    /// Metaobjects by type, in document order.
    metaobjects: HashMap<String, Vec<Metaobject>>,
    /// Fixed candidate list returned by the SKU search, ignoring the filter.
    search_results: Option<Vec<Product>>,
    /// Items per page for paginated calls.
    page_size: usize,
    /// Candidate products returned by the SKU search.
    search_limit: usize,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
///
/// `page` is zero-based: `page: 1` lets the first page succeed and fails the
/// second.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail fetch_products_page with the given error.
    ProductsPage(CatalogError),
    /// Fail fetch_metaobjects_page for a type at a page.
    MetaobjectsPage {
        metaobject_type: String,
        page: usize,
        error: CatalogError,
    },
    /// Fail fetch_all_products_page at a page.
    AllProductsPage { page: usize, error: CatalogError },
    /// Fail shop_info with the given error.
    ShopInfo(CatalogError),
    /// Report another page on the last page of the full scan without a cursor.
    MissingCursor,
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    FetchProductsPage {
        filter: String,
        cursor: Option<String>,
    },
    FetchMetaobjectsPage {
        metaobject_type: String,
        cursor: Option<String>,
    },
    FetchAllProductsPage {
        cursor: Option<String>,
    },
    ShopInfo,
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockCatalogInner {
                products: Vec::new(),
                metaobjects: HashMap::new(),
                search_results: None,
                page_size: 250,
                search_limit: 50,
                fail_on: None,
                operations: Vec::new(),
            })),
        }
    }

    /// Build a product with one variant per SKU and no reference fields.
    ///
    /// Variant ids are `{id}-V{n}`, starting at 1.
    pub fn product(id: &str, title: &str, skus: &[&str]) -> Product {
        Product {
            id: EntityId::from(id),
            title: title.to_string(),
            variants: skus
                .iter()
                .enumerate()
                .map(|(i, sku)| Variant {
                    id: EntityId::from(format!("{}-V{}", id, i + 1)),
                    sku: Some(sku.to_string()),
                })
                .collect(),
            add_ons_refs: None,
            options_refs: None,
        }
    }

    /// Build a metaobject with a single `products` reference field.
    pub fn metaobject(id: &str, display_name: &str, references: &[&str]) -> Metaobject {
        Metaobject {
            id: EntityId::from(id),
            display_name: display_name.to_string(),
            fields: vec![MetaobjectField {
                key: "products".to_string(),
                value: Some(json_array(references)),
            }],
        }
    }

    /// Add a product to the collection.
    pub fn with_product(self, product: Product) -> Self {
        self.lock().products.push(product);
        self
    }

    /// Add a metaobject of a type.
    pub fn with_metaobject(self, metaobject_type: &str, metaobject: Metaobject) -> Self {
        self.lock()
            .metaobjects
            .entry(metaobject_type.to_string())
            .or_default()
            .push(metaobject);
        self
    }

    /// Make the SKU search return these candidates regardless of the filter,
    /// simulating an over-matching upstream search.
    pub fn with_search_results(self, products: Vec<Product>) -> Self {
        self.lock().search_results = Some(products);
        self
    }

    /// Set the page size for paginated calls.
    pub fn with_page_size(self, page_size: usize) -> Self {
        self.lock().page_size = page_size.max(1);
        self
    }

    /// Set the number of candidates returned by the SKU search.
    pub fn with_search_limit(self, search_limit: usize) -> Self {
        self.lock().search_limit = search_limit;
        self
    }

    /// Configure the mock to fail on a specific operation.
    ///
    /// # Example
    ///
    /// ```
    /// use reftrace::catalog::mock::{FailOn, MockCatalog};
    /// use reftrace::catalog::CatalogError;
    ///
    /// let catalog = MockCatalog::new()
    ///     .fail_on(FailOn::AllProductsPage { page: 1, error: CatalogError::RateLimited });
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Count recorded full-scan page requests.
    pub fn all_products_calls(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::FetchAllProductsPage { .. }))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockCatalogInner> {
        // A poisoned lock only means another test thread panicked.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record an operation.
    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode ids as a JSON array string, the catalog's reference field format.
pub fn json_array(ids: &[&str]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

fn cursor_for(offset: usize) -> String {
    format!("cursor:{}", offset)
}

fn parse_cursor(cursor: Option<&str>) -> Result<usize, CatalogError> {
    match cursor {
        None => Ok(0),
        Some(c) => c
            .strip_prefix("cursor:")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| CatalogError::ApiError {
                status: 200,
                message: format!("invalid cursor '{}'", c),
            }),
    }
}

/// Slice one page out of a collection.
fn paginate<T: Clone>(items: &[T], cursor: Option<&str>, page_size: usize) -> Result<Page<T>, CatalogError> {
    let start = parse_cursor(cursor)?.min(items.len());
    let end = (start + page_size).min(items.len());
    let has_next_page = end < items.len();

    Ok(Page {
        items: items[start..end].to_vec(),
        has_next_page,
        end_cursor: has_next_page.then(|| cursor_for(end)),
    })
}

/// Zero-based page index for a cursor.
fn page_index(cursor: Option<&str>, page_size: usize) -> usize {
    parse_cursor(cursor).map(|offset| offset / page_size).unwrap_or(0)
}

/// Extract the search term from a `sku:` filter.
fn filter_term(filter: &str) -> String {
    filter
        .trim()
        .trim_start_matches("sku:")
        .trim_matches('*')
        .replace('\\', "")
        .to_lowercase()
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_products_page(
        &self,
        filter: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Product>, CatalogError> {
        self.record(MockOperation::FetchProductsPage {
            filter: filter.to_string(),
            cursor: cursor.map(String::from),
        });

        let inner = self.lock();
        if let Some(FailOn::ProductsPage(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        let candidates: Vec<Product> = match &inner.search_results {
            Some(fixed) => fixed.clone(),
            None => {
                let term = filter_term(filter);
                inner
                    .products
                    .iter()
                    .filter(|p| {
                        p.variants.iter().any(|v| {
                            v.sku
                                .as_deref()
                                .is_some_and(|s| s.to_lowercase().contains(&term))
                        })
                    })
                    .cloned()
                    .collect()
            }
        };

        paginate(&candidates, cursor, inner.search_limit.max(1))
    }

    async fn fetch_metaobjects_page(
        &self,
        metaobject_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Metaobject>, CatalogError> {
        self.record(MockOperation::FetchMetaobjectsPage {
            metaobject_type: metaobject_type.to_string(),
            cursor: cursor.map(String::from),
        });

        let inner = self.lock();
        if let Some(FailOn::MetaobjectsPage {
            metaobject_type: failing_type,
            page,
            error,
        }) = &inner.fail_on
        {
            if failing_type == metaobject_type && *page == page_index(cursor, inner.page_size) {
                return Err(error.clone());
            }
        }

        let empty = Vec::new();
        let items = inner.metaobjects.get(metaobject_type).unwrap_or(&empty);
        paginate(items, cursor, inner.page_size)
    }

    async fn fetch_all_products_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<Page<Product>, CatalogError> {
        self.record(MockOperation::FetchAllProductsPage {
            cursor: cursor.map(String::from),
        });

        let inner = self.lock();
        if let Some(FailOn::AllProductsPage { page, error }) = &inner.fail_on {
            if *page == page_index(cursor, inner.page_size) {
                return Err(error.clone());
            }
        }

        let mut page = paginate(&inner.products, cursor, inner.page_size)?;
        if matches!(inner.fail_on, Some(FailOn::MissingCursor)) && !page.has_next_page {
            page.has_next_page = true;
            page.end_cursor = None;
        }
        Ok(page)
    }

    async fn shop_info(&self) -> Result<ShopInfo, CatalogError> {
        self.record(MockOperation::ShopInfo);

        let inner = self.lock();
        if let Some(FailOn::ShopInfo(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        Ok(ShopInfo {
            name: "Mock Shop".to_string(),
            myshopify_domain: "mock.myshopify.com".to_string(),
            sample_products: inner
                .products
                .iter()
                .take(5)
                .map(|p| ProductSummary {
                    id: p.id.clone(),
                    title: p.title.clone(),
                })
                .collect(),
        })
    }
}
