//! shop command - Connectivity and credentials probe

use std::process::ExitCode;

use anyhow::{Context as _, Result};

use super::load_config;
use crate::catalog::create_catalog;
use crate::cli::Context;
use crate::ui::output;

/// Run the shop command.
///
/// Fetches the store name, canonical domain, and first few products.
pub fn shop(ctx: &Context, json: bool) -> Result<ExitCode> {
    let config = load_config(ctx)?;
    let catalog = create_catalog(&config)?;

    let rt = tokio::runtime::Runtime::new()?;
    let info = rt
        .block_on(catalog.shop_info())
        .with_context(|| format!("failed to reach the store via the {} catalog", catalog.name()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        output::print_shop_info(&info, ctx.verbosity());
    }

    Ok(ExitCode::SUCCESS)
}
