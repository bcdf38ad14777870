//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, commands print machine-readable JSON instead
//! and bypass this module. Diagnostics go to stderr.

use std::fmt::Display;

use crate::catalog::ShopInfo;
use crate::resolver::{MetaobjectMatch, SearchResponse};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one metaobject match and its parents.
fn format_match(m: &MetaobjectMatch) -> String {
    let mut out = format!("{} ({}) [{}]", m.metaobject_name, m.metaobject_id, m.metaobject_type);

    if m.parent_products.is_empty() {
        out.push_str("\n  not currently used by any products");
        return out;
    }

    let parents: Vec<String> = m
        .parent_products
        .iter()
        .map(|p| {
            format!(
                "{} ({}) sku={} via {}",
                p.product_title,
                p.product_id,
                p.product_sku.as_deref().unwrap_or("-"),
                p.metafield_type
            )
        })
        .collect();
    out.push('\n');
    out.push_str(&format_list(&parents, "  - "));
    out
}

/// Human-readable report of a search.
pub fn format_search_response(response: &SearchResponse) -> String {
    if let Some(error) = &response.error {
        let kind = response
            .error_kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "error".to_string());
        return format!("Search for '{}' failed ({}): {}", response.searched_sku, kind, error);
    }

    let mut sections = vec![format!("SKU: {}", response.searched_sku)];

    if !response.found_in_products.is_empty() {
        let found: Vec<String> = response
            .found_in_products
            .iter()
            .map(|f| format!("{} ({}) variant {} sku={}", f.product_title, f.product_id, f.variant_id, f.sku))
            .collect();
        sections.push(format!("Found in products:\n{}", format_list(&found, "  - ")));
    }

    if let Some(message) = &response.message {
        sections.push(message.clone());
    }

    if !response.results.is_empty() {
        let results: Vec<String> = response.results.iter().map(format_match).collect();
        sections.push(format!("Metaobjects:\n{}", format_list(&results, "")));
    }

    sections.join("\n\n")
}

/// Print a search report. Failures go to stderr and are always shown.
pub fn print_search_response(response: &SearchResponse, verbosity: Verbosity) {
    if response.is_error() {
        error(format_search_response(response));
    } else {
        print(format_search_response(response), verbosity);
    }
}

/// Human-readable store details.
pub fn format_shop_info(info: &ShopInfo) -> String {
    let mut out = format!("Shop: {}\nDomain: {}", info.name, info.myshopify_domain);
    if info.sample_products.is_empty() {
        out.push_str("\nNo products");
    } else {
        let titles: Vec<String> = info
            .sample_products
            .iter()
            .map(|p| format!("{} ({})", p.title, p.id))
            .collect();
        out.push_str("\nProducts:\n");
        out.push_str(&format_list(&titles, "  - "));
    }
    out
}

/// Print store details (respects quiet mode).
pub fn print_shop_info(info: &ShopInfo, verbosity: Verbosity) {
    print(format_shop_info(info), verbosity);
}
