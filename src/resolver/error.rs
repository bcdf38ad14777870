//! resolver::error
//!
//! Search error taxonomy.
//!
//! Every failure a search can hit collapses into one of five kinds. The kind
//! decides the boundary status code; the message is what the caller sees in
//! the response's `error` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::core::config::ConfigError;
use crate::core::types::TypeError;

/// Machine-readable error kind carried in a failed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input; the caller's fault
    ValidationError,
    /// Missing or invalid boundary configuration
    ConfigurationError,
    /// Transport or structured error from the catalog
    UpstreamError,
    /// A catalog page did not have the expected shape
    DecodeError,
    /// A call or the whole search exceeded its deadline
    Timeout,
}

impl ErrorKind {
    /// HTTP-style status for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::ValidationError => 400,
            ErrorKind::ConfigurationError => 500,
            ErrorKind::UpstreamError | ErrorKind::DecodeError => 502,
            ErrorKind::Timeout => 504,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::UpstreamError => "upstream_error",
            ErrorKind::DecodeError => "decode_error",
            ErrorKind::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Errors that abort a search.
///
/// None of these are retried by the resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// The search input was rejected.
    #[error("{0}")]
    Validation(String),

    /// Boundary configuration is missing or invalid.
    #[error("{0}")]
    Configuration(String),

    /// The catalog failed or returned an error payload.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A catalog page could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A deadline expired.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl SearchError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Validation(_) => ErrorKind::ValidationError,
            SearchError::Configuration(_) => ErrorKind::ConfigurationError,
            SearchError::Upstream(_) => ErrorKind::UpstreamError,
            SearchError::Decode(_) => ErrorKind::DecodeError,
            SearchError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

impl From<CatalogError> for SearchError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Decode(msg) => SearchError::Decode(msg),
            CatalogError::Timeout(msg) => SearchError::Timeout(msg),
            other => SearchError::Upstream(other.to_string()),
        }
    }
}

impl From<TypeError> for SearchError {
    fn from(e: TypeError) -> Self {
        SearchError::Validation(e.to_string())
    }
}

impl From<ConfigError> for SearchError {
    fn from(e: ConfigError) -> Self {
        SearchError::Configuration(e.to_string())
    }
}
