//! resolver::parents
//!
//! Parent-reference scan: the third hop of a search.
//!
//! The catalog has no reverse lookup from a metaobject to the products that
//! reference it, so the full product collection is paged through and each
//! product's two reference fields are decoded and intersected with the
//! relevant metaobjects. The scan always runs to exhaustion.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError, Product};
use crate::core::types::{EntityId, MetafieldType};

use super::index::RelevantMetaobjects;
use super::paginate::for_each_page;

/// A product whose reference field points at relevant metaobjects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentProduct {
    /// Product id
    pub product_id: EntityId,
    /// Product title
    pub product_title: String,
    /// SKU of the product's first variant
    pub product_sku: Option<String>,
    /// Which reference field matched
    pub metafield_type: MetafieldType,
    /// Relevant metaobjects referenced by that field, in field order
    pub metaobject_ids: Vec<EntityId>,
}

impl ParentProduct {
    /// Whether this record references a metaobject.
    pub fn references(&self, id: &EntityId) -> bool {
        self.metaobject_ids.contains(id)
    }
}

/// Records for one product: at most one per reference field, add-ons first.
///
/// A malformed field contributes nothing and does not affect the other.
pub fn parents_of(product: &Product, relevant: &RelevantMetaobjects) -> Vec<ParentProduct> {
    MetafieldType::ALL
        .into_iter()
        .filter_map(|kind| {
            let mut seen = HashSet::new();
            let ids: Vec<EntityId> = product
                .references(kind)
                .into_iter()
                .filter(|id| relevant.contains(id) && seen.insert(id.clone()))
                .collect();

            if ids.is_empty() {
                return None;
            }

            Some(ParentProduct {
                product_id: product.id.clone(),
                product_title: product.title.clone(),
                product_sku: product.first_sku().map(String::from),
                metafield_type: kind,
                metaobject_ids: ids,
            })
        })
        .collect()
}

/// Scan every product for references to the relevant metaobjects.
///
/// # Errors
///
/// Propagates the first page error; records from earlier pages are
/// discarded.
pub async fn scan_parents(
    catalog: &dyn Catalog,
    relevant: &RelevantMetaobjects,
) -> Result<Vec<ParentProduct>, CatalogError> {
    let mut parents = Vec::new();
    let mut scanned = 0usize;

    let pages = for_each_page(
        "products",
        |cursor| async move { catalog.fetch_all_products_page(cursor.as_deref()).await },
        |page| {
            scanned += page.len();
            for product in &page {
                parents.extend(parents_of(product, relevant));
            }
        },
    )
    .await?;

    tracing::debug!(pages, scanned, parents = parents.len(), "scanned products for references");
    Ok(parents)
}
