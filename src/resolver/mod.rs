//! resolver
//!
//! Reverse-reference resolution from a SKU to the metaobjects that reference
//! products carrying it, and from those metaobjects to their parent products.
//!
//! # Design
//!
//! A search is an explicit state machine:
//!
//! ```text
//! Start -> MatchingSku -> BuildingIndex -> ScanningParents -> Finished
//! ```
//!
//! Each stage carries what it needs to run, and `step` advances exactly one
//! stage. Empty outcomes finish early: no matching products skips the index,
//! and no relevant metaobjects skips the parent scan. Any failure aborts the
//! whole search; partial results are never returned.
//!
//! Every hop is a full, sequential pass over catalog pages. Nothing is cached
//! between searches, and the resolver holds no mutable state, so one
//! `Resolver` can serve concurrent searches.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use reftrace::catalog::mock::{json_array, MockCatalog};
//! use reftrace::resolver::{Resolver, ResolverOptions};
//!
//! # tokio_test::block_on(async {
//! let mut parent = MockCatalog::product("P2", "Gift set", &["SET-1"]);
//! parent.add_ons_refs = Some(json_array(&["M1"]));
//!
//! let catalog = MockCatalog::new()
//!     .with_product(MockCatalog::product("P1", "Hose", &["GAR-1"]))
//!     .with_product(parent)
//!     .with_metaobject("add_ons", MockCatalog::metaobject("M1", "Hose add-on", &["P1"]));
//!
//! let resolver = Resolver::new(Arc::new(catalog), ResolverOptions::default());
//! let response = resolver.search("gar-1").await;
//!
//! assert_eq!(response.results.len(), 1);
//! assert_eq!(response.results[0].parent_products[0].product_id.as_str(), "P2");
//! # });
//! ```

pub mod error;
pub mod index;
pub mod paginate;
pub mod parents;
pub mod response;
pub mod sku;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::core::config::Config;
use crate::core::types::{EntityId, SkuToken};

pub use error::{ErrorKind, SearchError};
pub use index::{IndexEntry, MetaobjectIndex, MetaobjectTypes, RelevantMetaobjects};
pub use parents::ParentProduct;
pub use response::{FoundProduct, MetaobjectMatch, SearchResponse};
pub use sku::SkuMatch;

/// Options that shape a search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolverOptions {
    /// Store type names of the two content types
    pub metaobject_types: MetaobjectTypes,
    /// Bound on one whole search; `None` for no bound
    pub deadline: Option<Duration>,
}

impl ResolverOptions {
    /// Read options from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            metaobject_types: MetaobjectTypes::from_config(config),
            deadline: Some(config.search_deadline()),
        }
    }
}

/// A search in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Raw input, not yet validated
    Start { input: String },
    /// Validated token, about to query candidates
    MatchingSku { token: SkuToken },
    /// Products matched, about to index metaobjects
    BuildingIndex {
        token: SkuToken,
        matches: Vec<SkuMatch>,
    },
    /// Relevant metaobjects known, about to scan for parents
    ScanningParents {
        token: SkuToken,
        matches: Vec<SkuMatch>,
        relevant: RelevantMetaobjects,
    },
    /// Terminal
    Finished(Outcome),
}

impl Stage {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Start { .. } => "start",
            Stage::MatchingSku { .. } => "matching_sku",
            Stage::BuildingIndex { .. } => "building_index",
            Stage::ScanningParents { .. } => "scanning_parents",
            Stage::Finished(_) => "finished",
        }
    }
}

/// Successful end state of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No variant SKU contains the token
    NoProductMatch { token: SkuToken },
    /// Products matched, but no metaobject references them
    NoMetaobjectMatch {
        token: SkuToken,
        matches: Vec<SkuMatch>,
    },
    /// Relevant metaobjects found and parents scanned
    Resolved {
        token: SkuToken,
        matches: Vec<SkuMatch>,
        relevant: RelevantMetaobjects,
        parents: Vec<ParentProduct>,
    },
}

impl Outcome {
    /// Build the caller-facing response.
    pub fn into_response(self) -> SearchResponse {
        match self {
            Outcome::NoProductMatch { token } => SearchResponse::no_product_match(token.as_str()),
            Outcome::NoMetaobjectMatch { token, matches } => {
                SearchResponse::no_metaobject_match(token.as_str(), found_products(&matches))
            }
            Outcome::Resolved {
                token,
                matches,
                relevant,
                parents,
            } => SearchResponse::resolved(
                token.as_str(),
                found_products(&matches),
                assemble(&relevant, &parents),
            ),
        }
    }
}

fn found_products(matches: &[SkuMatch]) -> Vec<FoundProduct> {
    matches.iter().map(SkuMatch::to_found_product).collect()
}

/// One match per relevant metaobject, in index order, each listing the
/// parent records that reference it. Metaobjects with no parents are kept.
pub fn assemble(relevant: &RelevantMetaobjects, parents: &[ParentProduct]) -> Vec<MetaobjectMatch> {
    relevant
        .entries()
        .iter()
        .map(|entry| MetaobjectMatch {
            metaobject_id: entry.id.clone(),
            metaobject_name: entry.display_name.clone(),
            metaobject_type: entry.kind,
            parent_products: parents
                .iter()
                .filter(|p| p.references(&entry.id))
                .cloned()
                .collect(),
        })
        .collect()
}

/// Resolves SKUs against a catalog.
#[derive(Clone)]
pub struct Resolver {
    catalog: Arc<dyn Catalog>,
    options: ResolverOptions,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("catalog", &self.catalog.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Resolver {
    /// Create a resolver over a catalog.
    pub fn new(catalog: Arc<dyn Catalog>, options: ResolverOptions) -> Self {
        Self { catalog, options }
    }

    /// The options in effect.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Run one search. Never fails; errors are encoded in the response.
    pub async fn search(&self, input: &str) -> SearchResponse {
        let request_id = Uuid::new_v4();
        let searched = input.trim().to_string();
        let span = tracing::info_span!("search", %request_id, sku = %searched);

        async {
            let result = match self.options.deadline {
                Some(deadline) => match tokio::time::timeout(deadline, self.resolve(input)).await {
                    Ok(result) => result,
                    Err(_) => Err(SearchError::Timeout(format!(
                        "search exceeded {}s deadline",
                        deadline.as_secs_f64()
                    ))),
                },
                None => self.resolve(input).await,
            };

            match result {
                Ok(outcome) => {
                    let response = outcome.into_response();
                    tracing::info!(
                        found = response.found_in_products.len(),
                        results = response.results.len(),
                        "search finished"
                    );
                    response
                }
                Err(e) => {
                    tracing::warn!(kind = %e.kind(), error = %e, "search failed");
                    SearchResponse::failed(searched.as_str(), &e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Drive a search to its outcome.
    ///
    /// # Errors
    ///
    /// Returns the first error from any stage.
    pub async fn resolve(&self, input: &str) -> Result<Outcome, SearchError> {
        let mut stage = Stage::Start {
            input: input.to_string(),
        };

        loop {
            stage = match stage {
                Stage::Finished(outcome) => return Ok(outcome),
                other => self.step(other).await?,
            };
        }
    }

    /// Advance a search by one stage. A finished stage is returned as is.
    ///
    /// # Errors
    ///
    /// Validation errors from `Start`, catalog errors from the other stages.
    pub async fn step(&self, stage: Stage) -> Result<Stage, SearchError> {
        tracing::debug!(stage = stage.name(), "entering stage");

        let next = match stage {
            Stage::Start { input } => Stage::MatchingSku {
                token: SkuToken::new(&input)?,
            },

            Stage::MatchingSku { token } => {
                let matches = sku::match_sku(self.catalog.as_ref(), &token).await?;
                if matches.is_empty() {
                    Stage::Finished(Outcome::NoProductMatch { token })
                } else {
                    Stage::BuildingIndex { token, matches }
                }
            }

            Stage::BuildingIndex { token, matches } => {
                let index =
                    index::build_index(self.catalog.as_ref(), &self.options.metaobject_types).await?;
                let product_ids: HashSet<EntityId> =
                    matches.iter().map(|m| m.product.id.clone()).collect();
                let relevant = index.relevant_to(&product_ids);

                tracing::debug!(
                    indexed = index.len(),
                    relevant = relevant.len(),
                    "filtered relevant metaobjects"
                );

                if relevant.is_empty() {
                    Stage::Finished(Outcome::NoMetaobjectMatch { token, matches })
                } else {
                    Stage::ScanningParents {
                        token,
                        matches,
                        relevant,
                    }
                }
            }

            Stage::ScanningParents {
                token,
                matches,
                relevant,
            } => {
                let parents = parents::scan_parents(self.catalog.as_ref(), &relevant).await?;
                Stage::Finished(Outcome::Resolved {
                    token,
                    matches,
                    relevant,
                    parents,
                })
            }

            finished @ Stage::Finished(_) => finished,
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mock::{json_array, MockCatalog, MockOperation};
    use crate::catalog::CatalogError;

    fn resolver(catalog: MockCatalog) -> Resolver {
        Resolver::new(Arc::new(catalog), ResolverOptions::default())
    }

    fn token(s: &str) -> SkuToken {
        SkuToken::new(s).unwrap()
    }

    mod steps {
        use super::*;

        #[tokio::test]
        async fn start_validates_input() {
            let r = resolver(MockCatalog::new());

            let next = r
                .step(Stage::Start {
                    input: "  GAR-1 ".into(),
                })
                .await
                .unwrap();
            assert_eq!(next, Stage::MatchingSku { token: token("GAR-1") });

            let err = r.step(Stage::Start { input: "   ".into() }).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError);
        }

        #[tokio::test]
        async fn no_candidates_finishes_without_index() {
            let catalog = MockCatalog::new();
            let r = resolver(catalog.clone());

            let outcome = r.resolve("GAR-1").await.unwrap();

            assert_eq!(outcome, Outcome::NoProductMatch { token: token("GAR-1") });
            assert_eq!(catalog.operations().len(), 1);
        }

        #[tokio::test]
        async fn no_relevant_metaobjects_skips_scan() {
            let catalog = MockCatalog::new()
                .with_product(MockCatalog::product("P1", "Hose", &["GAR-1"]))
                .with_metaobject("add_ons", MockCatalog::metaobject("M1", "Other", &["P9"]));
            let r = resolver(catalog.clone());

            let outcome = r.resolve("gar").await.unwrap();

            assert!(matches!(outcome, Outcome::NoMetaobjectMatch { .. }));
            assert_eq!(catalog.all_products_calls(), 0);
        }

        #[tokio::test]
        async fn finished_is_a_fixed_point() {
            let r = resolver(MockCatalog::new());
            let done = Stage::Finished(Outcome::NoProductMatch { token: token("X") });

            assert_eq!(r.step(done.clone()).await.unwrap(), done);
        }
    }

    mod assembly {
        use super::*;

        #[test]
        fn zero_parent_metaobjects_are_kept() {
            let relevant = RelevantMetaobjects::from_entries(vec![IndexEntry::new(
                crate::core::types::MetafieldType::Options,
                &MockCatalog::metaobject("M1", "Size", &["P1"]),
            )]);

            let results = assemble(&relevant, &[]);

            assert_eq!(results.len(), 1);
            assert!(results[0].parent_products.is_empty());
        }
    }

    #[tokio::test]
    async fn failure_discards_partial_results() {
        let mut parent = MockCatalog::product("P2", "Set", &["SET-1"]);
        parent.add_ons_refs = Some(json_array(&["M1"]));
        let catalog = MockCatalog::new()
            .with_product(MockCatalog::product("P1", "Hose", &["GAR-1"]))
            .with_product(parent)
            .with_metaobject("add_ons", MockCatalog::metaobject("M1", "Add-on", &["P1"]))
            .with_page_size(1)
            .fail_on(crate::catalog::mock::FailOn::AllProductsPage {
                page: 1,
                error: CatalogError::RateLimited,
            });

        let response = resolver(catalog).search("GAR-1").await;

        assert_eq!(response.error_kind, Some(ErrorKind::UpstreamError));
        assert!(response.found_in_products.is_empty());
        assert!(response.results.is_empty());
        assert_eq!(response.searched_sku, "GAR-1");
    }

    #[tokio::test]
    async fn search_uses_configured_type_names() {
        let catalog = MockCatalog::new()
            .with_product(MockCatalog::product("P1", "Hose", &["GAR-1"]))
            .with_metaobject("custom_add_ons", MockCatalog::metaobject("M1", "Add-on", &["P1"]));
        let options = ResolverOptions {
            metaobject_types: MetaobjectTypes {
                add_ons: "custom_add_ons".into(),
                options: "custom_options".into(),
            },
            deadline: None,
        };

        let response = Resolver::new(Arc::new(catalog.clone()), options).search("GAR-1").await;

        assert_eq!(response.results.len(), 1);
        assert!(catalog.operations().contains(&MockOperation::FetchMetaobjectsPage {
            metaobject_type: "custom_options".into(),
            cursor: None,
        }));
    }
}
