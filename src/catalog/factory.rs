//! catalog::factory
//!
//! Catalog creation from configuration.
//!
//! # Design
//!
//! Commands use `create_catalog()` instead of constructing a specific
//! implementation, so the resolver only ever sees `Arc<dyn Catalog>` and
//! tests can substitute [`MockCatalog`](super::mock::MockCatalog).
//!
//! # Example
//!
//! ```ignore
//! use reftrace::catalog::create_catalog;
//! use reftrace::core::config::Config;
//!
//! let config = Config::load(None)?.config;
//! let catalog = create_catalog(&config)?;
//! println!("Using {} catalog", catalog.name());
//! ```

use std::sync::Arc;

use super::shopify::ShopifyCatalog;
use super::traits::Catalog;
use crate::core::config::{Config, ConfigError};

/// Create the store catalog described by the configuration.
///
/// # Errors
///
/// Returns `ConfigError::Missing` if the store domain or access token is not
/// configured.
pub fn create_catalog(config: &Config) -> Result<Arc<dyn Catalog>, ConfigError> {
    let catalog = ShopifyCatalog::from_config(config)?;
    tracing::debug!(endpoint = catalog.endpoint(), "created shopify catalog");
    Ok(Arc::new(catalog))
}
