//! core
//!
//! Core domain types, decoding, and configuration for reftrace.
//!
//! # Modules
//!
//! - [`types`] - Strong types: EntityId, SkuToken, MetafieldType
//! - [`refs`] - Lossy decoding of JSON-array reference fields
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid searches from reaching the catalog
//! - Upstream field payloads are decoded explicitly, with an empty fallback
//! - Configuration is strict: unknown keys are rejected

pub mod config;
pub mod refs;
pub mod types;
