//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables
//!
//! # Config File Locations
//!
//! Searched in order:
//! 1. An explicit path (the `--config` flag); it must exist
//! 2. `$REFTRACE_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/reftrace/config.toml`
//! 4. `~/.reftrace/config.toml`
//!
//! # Environment
//!
//! - `SHOP_CUSTOM_DOMAIN` (fallback `SHOPIFY_SHOP_DOMAIN`): store domain
//! - `SHOPIFY_ADMIN_API_ACCESS_TOKEN` (fallback
//!   `VITE_SHOPIFY_ADMIN_API_ACCESS_TOKEN`, warns): Admin API token
//!
//! # Example
//!
//! ```no_run
//! use reftrace::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("API version: {}", config.api_version());
//! let credentials = config.credentials()?;
//! println!("Store: {}", credentials.shop_domain);
//! # Ok::<(), reftrace::core::config::ConfigError>(())
//! ```

pub mod schema;

pub use schema::{
    products_query_cost, FileConfig, MetaobjectTypesConfig, MAX_PAGE_SIZE, MAX_QUERY_COST,
    SCAN_VARIANTS_PER_PRODUCT, SEARCH_VARIANTS_PER_PRODUCT,
};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::types::MetafieldType;

/// Default Admin API version.
pub const DEFAULT_API_VERSION: &str = "2025-10";

/// Default number of candidate products for a SKU search.
pub const DEFAULT_PRODUCT_SEARCH_LIMIT: u32 = 10;

/// Default page size for full-collection scans.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default per-call HTTP deadline.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default whole-search deadline.
pub const DEFAULT_SEARCH_DEADLINE_SECS: u64 = 120;

const ENV_CONFIG_PATH: &str = "REFTRACE_CONFIG";
const ENV_SHOP_DOMAIN: &str = "SHOP_CUSTOM_DOMAIN";
const ENV_SHOP_DOMAIN_FALLBACK: &str = "SHOPIFY_SHOP_DOMAIN";
const ENV_ACCESS_TOKEN: &str = "SHOPIFY_ADMIN_API_ACCESS_TOKEN";
const ENV_ACCESS_TOKEN_LEGACY: &str = "VITE_SHOPIFY_ADMIN_API_ACCESS_TOKEN";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("config file not found: '{0}'")]
    NotFound(PathBuf),

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("missing configuration: {0}")]
    Missing(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Values taken from the environment.
#[derive(Clone, Default, PartialEq)]
pub struct EnvOverrides {
    /// Store domain
    pub shop_domain: Option<String>,
    /// Admin API access token
    pub access_token: Option<String>,
}

// Custom Debug to avoid exposing the access token
impl std::fmt::Debug for EnvOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvOverrides")
            .field("shop_domain", &self.shop_domain)
            .field("has_access_token", &self.access_token.is_some())
            .finish()
    }
}

/// Connection details required to talk to the store.
#[derive(Clone)]
pub struct ShopCredentials {
    /// Normalized store domain (no scheme, no trailing slash)
    pub shop_domain: String,
    /// Admin API access token
    pub access_token: String,
}

impl std::fmt::Debug for ShopCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopCredentials")
            .field("shop_domain", &self.shop_domain)
            .finish_non_exhaustive()
    }
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence and defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// File configuration
    pub file: FileConfig,
    /// Environment overrides
    pub env: EnvOverrides,
    /// Path to the config file (if loaded)
    file_path: Option<PathBuf>,
}

impl Config {
    /// Build a config directly from its parts, bypassing file discovery.
    pub fn from_parts(file: FileConfig, env: EnvOverrides) -> Self {
        Self {
            file,
            env,
            file_path: None,
        }
    }

    /// Load configuration from the process environment and default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// an explicit path does not exist. A missing default config file is not
    /// an error (defaults are used).
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Load configuration with a custom environment lookup.
    pub fn load_with_env<F>(explicit: Option<&Path>, env: F) -> Result<ConfigLoadResult, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        let (file, file_path) = Self::load_file(explicit, &env)?;
        file.validate()?;

        let env = Self::read_env(&env, &mut warnings);
        if let Some(domain) = &env.shop_domain {
            schema::validate_shop_domain(domain)?;
        }

        tracing::debug!(
            config_path = ?file_path,
            has_domain = env.shop_domain.is_some() || file.shop_domain.is_some(),
            has_token = env.access_token.is_some(),
            "configuration loaded"
        );

        Ok(ConfigLoadResult {
            config: Config {
                file,
                env,
                file_path,
            },
            warnings,
        })
    }

    /// Locate and parse the config file.
    fn load_file<F>(
        explicit: Option<&Path>,
        env: &F,
    ) -> Result<(FileConfig, Option<PathBuf>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. Explicit path must exist
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            let config = Self::read_file_config(path)?;
            return Ok((config, Some(path.to_path_buf())));
        }

        // 2. Check $REFTRACE_CONFIG
        if let Some(path) = env(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_file_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check $XDG_CONFIG_HOME/reftrace/config.toml
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("reftrace/config.toml");
            if path.exists() {
                let config = Self::read_file_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 4. Check ~/.reftrace/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".reftrace/config.toml");
            if path.exists() {
                let config = Self::read_file_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    /// Read and parse a config file.
    fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Collect environment overrides, ignoring blank values.
    fn read_env<F>(env: &F, warnings: &mut Vec<ConfigWarning>) -> EnvOverrides
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let shop_domain = non_blank(ENV_SHOP_DOMAIN).or_else(|| non_blank(ENV_SHOP_DOMAIN_FALLBACK));

        let access_token = match non_blank(ENV_ACCESS_TOKEN) {
            Some(token) => Some(token),
            None => {
                let legacy = non_blank(ENV_ACCESS_TOKEN_LEGACY);
                if legacy.is_some() {
                    warnings.push(ConfigWarning {
                        message: format!(
                            "Using deprecated {}. Please set {} instead",
                            ENV_ACCESS_TOKEN_LEGACY, ENV_ACCESS_TOKEN
                        ),
                    });
                }
                legacy
            }
        };

        EnvOverrides {
            shop_domain,
            access_token,
        }
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the store domain, normalized.
    ///
    /// The environment overrides the config file.
    pub fn shop_domain(&self) -> Option<String> {
        self.env
            .shop_domain
            .as_deref()
            .or(self.file.shop_domain.as_deref())
            .map(schema::normalize_shop_domain)
    }

    /// Get the Admin API access token (environment only).
    pub fn access_token(&self) -> Option<&str> {
        self.env.access_token.as_deref()
    }

    /// Get the store domain and token, failing if either is missing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the absent values.
    pub fn credentials(&self) -> Result<ShopCredentials, ConfigError> {
        match (self.shop_domain(), self.access_token()) {
            (Some(shop_domain), Some(token)) => Ok(ShopCredentials {
                shop_domain,
                access_token: token.to_string(),
            }),
            (None, Some(_)) => Err(ConfigError::Missing(format!(
                "shop domain (set {} or shop_domain in the config file)",
                ENV_SHOP_DOMAIN
            ))),
            (Some(_), None) => Err(ConfigError::Missing(format!(
                "access token (set {})",
                ENV_ACCESS_TOKEN
            ))),
            (None, None) => Err(ConfigError::Missing(format!(
                "shop domain and access token (set {} and {})",
                ENV_SHOP_DOMAIN, ENV_ACCESS_TOKEN
            ))),
        }
    }

    /// Get the Admin API version.
    ///
    /// Defaults to [`DEFAULT_API_VERSION`].
    pub fn api_version(&self) -> &str {
        self.file
            .api_version
            .as_deref()
            .unwrap_or(DEFAULT_API_VERSION)
    }

    /// Get the candidate product limit for SKU searches.
    pub fn product_search_limit(&self) -> u32 {
        self.file
            .product_search_limit
            .unwrap_or(DEFAULT_PRODUCT_SEARCH_LIMIT)
    }

    /// Get the page size for full-collection scans.
    pub fn page_size(&self) -> u32 {
        self.file.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Get the per-call HTTP deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.file
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Get the whole-search deadline.
    pub fn search_deadline(&self) -> Duration {
        Duration::from_secs(
            self.file
                .search_deadline_secs
                .unwrap_or(DEFAULT_SEARCH_DEADLINE_SECS),
        )
    }

    /// Get the store's metaobject type name for a content type.
    pub fn metaobject_type(&self, kind: MetafieldType) -> &str {
        let types = self.file.metaobject_types.as_ref();
        let configured = match kind {
            MetafieldType::AddOns => types.and_then(|t| t.add_ons.as_deref()),
            MetafieldType::Options => types.and_then(|t| t.options.as_deref()),
        };
        configured.unwrap_or(kind.key())
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}
