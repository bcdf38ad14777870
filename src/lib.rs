//! Reftrace - reverse-reference lookup for a Shopify catalog
//!
//! Given a SKU, reftrace finds the products whose variants carry it, the
//! `add_ons` and `options` metaobjects that reference those products, and the
//! parent products that reference those metaobjects in turn.
//!
//! # Architecture
//!
//! The codebase is layered:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the resolver)
//! - [`resolver`] - SKU → metaobject → parent-product resolution
//! - [`catalog`] - Abstraction over the store (Shopify Admin GraphQL, mock)
//! - [`core`] - Domain types, reference decoding, configuration
//! - [`ui`] - Output formatting
//! - [`logging`] - Tracing subscriber setup
//!
//! # Invariants
//!
//! 1. Every parent product listed under a metaobject references that metaobject
//! 2. Results are only reported when at least one product matched the SKU
//! 3. A failed search never carries partial results
//! 4. Identifiers are compared as opaque strings

pub mod catalog;
pub mod cli;
pub mod core;
pub mod logging;
pub mod resolver;
pub mod ui;
