//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order:
//! 1. `--config <path>` on the command line
//! 2. `$REFTRACE_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/reftrace/config.toml`
//! 4. `~/.reftrace/config.toml`
//!
//! # Validation
//!
//! Config values are validated after parsing so that a bad page size or a
//! zero timeout is reported at startup rather than as an upstream failure.
//!
//! # Query cost
//!
//! The Admin API rejects any query whose estimated cost exceeds
//! [`MAX_QUERY_COST`]. A product page costs `2 + first * (5 + variants)`:
//! one point per product node, a variant connection of `2 + variants`, and
//! one point for each of the two reference metafields. The configured search
//! limit and page size must keep both product queries inside that budget.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Largest page the catalog API serves in one request.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Largest estimated cost the Admin API accepts for a single query.
pub const MAX_QUERY_COST: u32 = 1000;

/// Variants requested per product (and per follow-up variant page) when
/// matching SKUs.
pub const SEARCH_VARIANTS_PER_PRODUCT: u32 = 50;

/// Variants requested per product during the full scan; only the first SKU
/// is reported for referencing products.
pub const SCAN_VARIANTS_PER_PRODUCT: u32 = 1;

/// Estimated cost of one product page with `variants` variants per product.
///
/// # Example
///
/// ```
/// use reftrace::core::config::schema::products_query_cost;
///
/// assert_eq!(products_query_cost(10, 50), 552);
/// ```
pub fn products_query_cost(first: u32, variants: u32) -> u32 {
    first.saturating_mul(variants.saturating_add(5)).saturating_add(2)
}

/// File configuration.
///
/// The access token is intentionally absent: it is only ever read from the
/// environment.
///
/// # Example
///
/// ```toml
/// shop_domain = "example.myshopify.com"
/// api_version = "2025-10"
/// product_search_limit = 10
/// page_size = 100
/// request_timeout_secs = 30
/// search_deadline_secs = 120
///
/// [metaobject_types]
/// add_ons = "add_ons"
/// options = "options"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Store domain (e.g., "example.myshopify.com")
    pub shop_domain: Option<String>,

    /// Admin API version segment of the endpoint URL
    pub api_version: Option<String>,

    /// Number of candidate products requested for a SKU search
    pub product_search_limit: Option<u32>,

    /// Page size for full-collection scans
    pub page_size: Option<u32>,

    /// Deadline for each HTTP call
    pub request_timeout_secs: Option<u64>,

    /// Deadline for a whole search
    pub search_deadline_secs: Option<u64>,

    /// Metaobject type names in the store's schema
    pub metaobject_types: Option<MetaobjectTypesConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(domain) = &self.shop_domain {
            validate_shop_domain(domain)?;
        }

        if let Some(version) = &self.api_version {
            if version.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "api_version cannot be empty".to_string(),
                ));
            }
        }

        if let Some(limit) = self.product_search_limit {
            validate_page("product_search_limit", limit, SEARCH_VARIANTS_PER_PRODUCT)?;
        }

        if let Some(size) = self.page_size {
            validate_page("page_size", size, SCAN_VARIANTS_PER_PRODUCT)?;
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.search_deadline_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "search_deadline_secs must be at least 1".to_string(),
            ));
        }

        if let Some(types) = &self.metaobject_types {
            types.validate()?;
        }

        Ok(())
    }
}

/// Metaobject type names for the two reference-carrying content types.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MetaobjectTypesConfig {
    /// Type name of add-on metaobjects (default: "add_ons")
    pub add_ons: Option<String>,

    /// Type name of option metaobjects (default: "options")
    pub options: Option<String>,
}

impl MetaobjectTypesConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("add_ons", &self.add_ons), ("options", &self.options)] {
            if let Some(v) = value {
                if v.trim().is_empty() {
                    return Err(ConfigError::InvalidValue(format!(
                        "metaobject_types.{} cannot be empty",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Check a product page size against the page bound and the query budget.
fn validate_page(key: &str, first: u32, variants: u32) -> Result<(), ConfigError> {
    if first == 0 || first > MAX_PAGE_SIZE {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be between 1 and {}, got {}",
            key, MAX_PAGE_SIZE, first
        )));
    }

    let cost = products_query_cost(first, variants);
    if cost > MAX_QUERY_COST {
        return Err(ConfigError::InvalidValue(format!(
            "{} = {} gives an estimated query cost of {}, above the limit of {}",
            key, first, cost, MAX_QUERY_COST
        )));
    }
    Ok(())
}

/// Strip an optional scheme and trailing slash from a store domain.
pub fn normalize_shop_domain(domain: &str) -> String {
    let d = domain.trim();
    let d = d
        .strip_prefix("https://")
        .or_else(|| d.strip_prefix("http://"))
        .unwrap_or(d);
    d.trim_end_matches('/').to_string()
}

/// Check that a store domain is a bare host name.
pub fn validate_shop_domain(domain: &str) -> Result<(), ConfigError> {
    let normalized = normalize_shop_domain(domain);
    if normalized.is_empty() {
        return Err(ConfigError::InvalidValue(
            "shop_domain cannot be empty".to_string(),
        ));
    }
    if normalized.contains('/') || normalized.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidValue(format!(
            "shop_domain must be a host name, got '{}'",
            domain
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            shop_domain = "example.myshopify.com"
            api_version = "2025-10"
            product_search_limit = 15
            page_size = 100
            request_timeout_secs = 10
            search_deadline_secs = 60

            [metaobject_types]
            add_ons = "product_add_ons"
            "#,
        )
        .unwrap();

        assert_eq!(config.shop_domain.as_deref(), Some("example.myshopify.com"));
        assert_eq!(config.page_size, Some(100));
        let types = config.metaobject_types.as_ref().unwrap();
        assert_eq!(types.add_ons.as_deref(), Some("product_add_ons"));
        assert!(types.options.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn access_token_is_not_a_file_key() {
        let result: Result<FileConfig, _> = toml::from_str(r#"access_token = "shpat_x""#);
        assert!(result.is_err());
    }

    #[test]
    fn page_size_bounds() {
        let too_big = FileConfig {
            page_size: Some(MAX_PAGE_SIZE + 1),
            ..Default::default()
        };
        assert!(too_big.validate().is_err());

        let zero = FileConfig {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let largest = FileConfig {
            page_size: Some(166),
            ..Default::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn page_size_over_query_budget_rejected() {
        let config = FileConfig {
            page_size: Some(MAX_PAGE_SIZE),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("query cost of 1502"), "{}", err);

        let config = FileConfig {
            page_size: Some(167),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn product_search_limit_bounds() {
        let zero = FileConfig {
            product_search_limit: Some(0),
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let over_page = FileConfig {
            product_search_limit: Some(MAX_PAGE_SIZE + 1),
            ..Default::default()
        };
        assert!(over_page.validate().is_err());

        let over_budget = FileConfig {
            product_search_limit: Some(50),
            ..Default::default()
        };
        let err = over_budget.validate().unwrap_err();
        assert!(err.to_string().contains("query cost of 2752"), "{}", err);

        let largest = FileConfig {
            product_search_limit: Some(18),
            ..Default::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn query_cost_estimate() {
        assert_eq!(products_query_cost(50, 100), 5252);
        assert_eq!(products_query_cost(250, 1), 1502);
        assert_eq!(products_query_cost(u32::MAX, u32::MAX), u32::MAX);
    }

    #[test]
    fn zero_timeouts_rejected() {
        let config = FileConfig {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = FileConfig {
            search_deadline_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_metaobject_type_rejected() {
        let config = FileConfig {
            metaobject_types: Some(MetaobjectTypesConfig {
                add_ons: Some(" ".to_string()),
                options: None,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shop_domain_normalization() {
        assert_eq!(
            normalize_shop_domain("https://example.myshopify.com/"),
            "example.myshopify.com"
        );
        assert_eq!(
            normalize_shop_domain(" shop.example.com "),
            "shop.example.com"
        );
        assert!(validate_shop_domain("https://example.myshopify.com").is_ok());
        assert!(validate_shop_domain("example.com/admin").is_err());
        assert!(validate_shop_domain("https://").is_err());
    }
}
