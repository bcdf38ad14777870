//! resolver::index
//!
//! Metaobject index: the second hop of a search.
//!
//! Every metaobject of each recognized content type is fetched and reduced to
//! the set of entity ids its fields reference. The index keeps document
//! order: add-on metaobjects first, then options, each in page order.
//!
//! A metaobject is *relevant* to a search when its reference set intersects
//! the matched product ids, compared by exact string equality.

use std::collections::HashSet;

use crate::catalog::{Catalog, CatalogError, Metaobject};
use crate::core::config::Config;
use crate::core::types::{EntityId, MetafieldType};

use super::paginate::for_each_page;

/// Store type names for the two content types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaobjectTypes {
    /// Type name of add-on metaobjects
    pub add_ons: String,
    /// Type name of option metaobjects
    pub options: String,
}

impl MetaobjectTypes {
    /// Read type names from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            add_ons: config.metaobject_type(MetafieldType::AddOns).to_string(),
            options: config.metaobject_type(MetafieldType::Options).to_string(),
        }
    }

    /// Store type name for a content type.
    pub fn type_name(&self, kind: MetafieldType) -> &str {
        match kind {
            MetafieldType::AddOns => &self.add_ons,
            MetafieldType::Options => &self.options,
        }
    }
}

impl Default for MetaobjectTypes {
    fn default() -> Self {
        Self {
            add_ons: MetafieldType::AddOns.key().to_string(),
            options: MetafieldType::Options.key().to_string(),
        }
    }
}

/// One indexed metaobject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Metaobject id
    pub id: EntityId,
    /// Display name
    pub display_name: String,
    /// Content type it was fetched as
    pub kind: MetafieldType,
    /// Every id referenced by any of its fields
    pub references: HashSet<EntityId>,
}

impl IndexEntry {
    /// Index a metaobject fetched as `kind`.
    pub fn new(kind: MetafieldType, metaobject: &Metaobject) -> Self {
        Self {
            id: metaobject.id.clone(),
            display_name: metaobject.display_name.clone(),
            kind,
            references: metaobject.referenced_ids().into_iter().collect(),
        }
    }

    /// Check whether this metaobject references any of the given ids.
    pub fn references_any(&self, ids: &HashSet<EntityId>) -> bool {
        // Iterate the smaller side.
        if self.references.len() <= ids.len() {
            self.references.iter().any(|r| ids.contains(r))
        } else {
            ids.iter().any(|id| self.references.contains(id))
        }
    }
}

/// All metaobjects of the recognized types, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaobjectIndex {
    entries: Vec<IndexEntry>,
    ids: HashSet<EntityId>,
}

impl MetaobjectIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metaobject. Returns `false` if its id was already indexed, in
    /// which case the first occurrence wins.
    pub fn insert(&mut self, kind: MetafieldType, metaobject: &Metaobject) -> bool {
        if !self.ids.insert(metaobject.id.clone()) {
            return false;
        }
        self.entries.push(IndexEntry::new(kind, metaobject));
        true
    }

    /// Indexed entries in document order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of indexed metaobjects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keep the metaobjects that reference any of the matched products.
    pub fn relevant_to(&self, product_ids: &HashSet<EntityId>) -> RelevantMetaobjects {
        RelevantMetaobjects::from_entries(
            self.entries
                .iter()
                .filter(|e| e.references_any(product_ids))
                .cloned()
                .collect(),
        )
    }
}

/// The metaobjects relevant to one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevantMetaobjects {
    entries: Vec<IndexEntry>,
    ids: HashSet<EntityId>,
}

impl RelevantMetaobjects {
    /// Build from entries, already in document order and unique by id.
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        let ids = entries.iter().map(|e| e.id.clone()).collect();
        Self { entries, ids }
    }

    /// Check whether an id is a relevant metaobject.
    pub fn contains(&self, id: &EntityId) -> bool {
        self.ids.contains(id)
    }

    /// Relevant entries in document order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of relevant metaobjects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no metaobject is relevant.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch and index every metaobject of both content types.
///
/// # Errors
///
/// Propagates the first page error; the partial index is discarded.
pub async fn build_index(
    catalog: &dyn Catalog,
    types: &MetaobjectTypes,
) -> Result<MetaobjectIndex, CatalogError> {
    let mut index = MetaobjectIndex::new();

    for kind in MetafieldType::ALL {
        let type_name = types.type_name(kind);
        let mut duplicates = 0usize;

        for_each_page(
            type_name,
            |cursor| async move { catalog.fetch_metaobjects_page(type_name, cursor.as_deref()).await },
            |page| {
                for metaobject in &page {
                    if !index.insert(kind, metaobject) {
                        duplicates += 1;
                    }
                }
            },
        )
        .await?;

        if duplicates > 0 {
            tracing::debug!(metaobject_type = type_name, duplicates, "skipped duplicate metaobjects");
        }
    }

    tracing::debug!(indexed = index.len(), "built metaobject index");
    Ok(index)
}
