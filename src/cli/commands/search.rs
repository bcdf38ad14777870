//! search command - Resolve a SKU to metaobjects and parent products

use std::process::ExitCode;

use anyhow::Result;

use super::{exit_code_for_status, load_config};
use crate::catalog::create_catalog;
use crate::cli::Context;
use crate::core::types::SkuToken;
use crate::resolver::{Resolver, ResolverOptions, SearchError, SearchResponse};
use crate::ui::output;

/// Run the search command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn search(ctx: &Context, sku: &str, json: bool) -> Result<ExitCode> {
    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(run_search(ctx, sku));

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        output::print_search_response(&response, ctx.verbosity());
    }

    Ok(ExitCode::from(exit_code_for_status(response.status_code())))
}

/// Run one search from the command line's point of view.
///
/// The token is checked before configuration is loaded, so bad input is
/// reported as such even without credentials. Configuration failures are
/// encoded in the response like any other failure.
pub async fn run_search(ctx: &Context, sku: &str) -> SearchResponse {
    if let Err(e) = SkuToken::new(sku) {
        return SearchResponse::failed(sku.trim(), &SearchError::from(e));
    }

    let config = match load_config(ctx) {
        Ok(config) => config,
        Err(e) => return SearchResponse::failed(sku.trim(), &SearchError::from(e)),
    };

    let catalog = match create_catalog(&config) {
        Ok(catalog) => catalog,
        Err(e) => return SearchResponse::failed(sku.trim(), &SearchError::from(e)),
    };

    Resolver::new(catalog, ResolverOptions::from_config(&config))
        .search(sku)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ErrorKind;
    use std::path::PathBuf;

    #[tokio::test]
    async fn blank_sku_is_rejected_before_config() {
        let ctx = Context {
            config: Some(PathBuf::from("/nonexistent/reftrace.toml")),
            ..Default::default()
        };

        let response = run_search(&ctx, "   ").await;

        assert_eq!(response.error_kind, Some(ErrorKind::ValidationError));
        assert_eq!(response.status_code(), 400);
    }

    #[tokio::test]
    async fn missing_config_file_is_configuration_error() {
        let ctx = Context {
            config: Some(PathBuf::from("/nonexistent/reftrace.toml")),
            ..Default::default()
        };

        let response = run_search(&ctx, "GAR-1").await;

        assert_eq!(response.error_kind, Some(ErrorKind::ConfigurationError));
        assert_eq!(response.searched_sku, "GAR-1");
    }
}
