//! catalog
//!
//! Abstraction over the store's read-only catalog API.
//!
//! # Architecture
//!
//! The `Catalog` trait is the port the resolver depends on. It offers forward
//! lookups only: products by advisory filter, metaobjects by type, and the
//! full product collection, each one cursor-paginated page at a time.
//! Commands use the [`create_catalog`] factory rather than importing a
//! specific implementation.
//!
//! # Modules
//!
//! - `traits`: Core `Catalog` trait, page and record types
//! - [`shopify`]: Shopify Admin GraphQL implementation
//! - [`mock`]: In-memory implementation for deterministic testing
//! - `factory`: Catalog creation from configuration

mod factory;
pub mod mock;
pub mod shopify;
mod traits;

pub use factory::create_catalog;
pub use traits::*;
