//! resolver::sku
//!
//! SKU matching: the first hop of a search.
//!
//! The catalog's product search is advisory. It is asked for one bounded page
//! of candidates, and every candidate is re-checked here: a product matches
//! iff one of its variants' SKUs contains the token, ignoring case. Upstream
//! over-matches are discarded. No widening is attempted when nothing
//! survives.

use std::collections::HashSet;

use crate::catalog::{Catalog, CatalogError, Product, Variant};
use crate::core::types::{EntityId, SkuToken};

use super::response::FoundProduct;

/// A product with at least one variant whose SKU matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuMatch {
    /// The matching product, with its full variant set
    pub product: Product,
    /// Index of the first matching variant
    pub variant_index: usize,
}

impl SkuMatch {
    /// The first variant whose SKU matched.
    pub fn matched_variant(&self) -> &Variant {
        &self.product.variants[self.variant_index]
    }

    /// Summary for the response's `foundInProducts`.
    pub fn to_found_product(&self) -> FoundProduct {
        let variant = self.matched_variant();
        FoundProduct {
            product_id: self.product.id.clone(),
            product_title: self.product.title.clone(),
            variant_id: variant.id.clone(),
            sku: variant.sku.clone().unwrap_or_default(),
        }
    }
}

/// Escape characters with meaning in the store's search syntax.
pub fn escape_search_term(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '"' | '\'' | '(' | ')' | ':' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// The advisory product search filter for a token.
///
/// Recall is limited by the store's search: it documents only trailing
/// (prefix) wildcards, so the leading `*` may be ignored or taken literally.
/// A token that only occurs mid-SKU can then yield no candidates, and the
/// search reports no match without widening. Client-side matching in
/// [`filter_candidates`] can only narrow what the store returns.
///
/// # Example
///
/// ```
/// use reftrace::core::types::SkuToken;
/// use reftrace::resolver::sku::sku_filter;
///
/// let token = SkuToken::new("GAR-403069").unwrap();
/// assert_eq!(sku_filter(&token), "sku:*GAR-403069*");
/// ```
pub fn sku_filter(token: &SkuToken) -> String {
    format!("sku:*{}*", escape_search_term(token.as_str()))
}

/// Re-filter upstream candidates client-side.
///
/// Candidates keep their upstream order. A product returned twice is kept
/// once.
pub fn filter_candidates(token: &SkuToken, candidates: Vec<Product>) -> Vec<SkuMatch> {
    let mut seen: HashSet<EntityId> = HashSet::new();

    candidates
        .into_iter()
        .filter_map(|product| {
            let variant_index = product
                .variants
                .iter()
                .position(|v| token.matches(v.sku.as_deref()))?;
            if !seen.insert(product.id.clone()) {
                return None;
            }
            Some(SkuMatch {
                product,
                variant_index,
            })
        })
        .collect()
}

/// Find products with a variant SKU containing the token.
///
/// # Errors
///
/// Propagates the catalog error from the candidate query.
pub async fn match_sku(catalog: &dyn Catalog, token: &SkuToken) -> Result<Vec<SkuMatch>, CatalogError> {
    let filter = sku_filter(token);
    let page = catalog.fetch_products_page(&filter, None).await?;
    let candidates = page.items.len();

    let matches = filter_candidates(token, page.items);

    tracing::debug!(
        filter = %filter,
        candidates,
        matched = matches.len(),
        truncated = page.has_next_page,
        "matched SKU candidates"
    );

    Ok(matches)
}
