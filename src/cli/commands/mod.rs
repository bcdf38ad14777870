//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration when it needs catalog access
//! 2. Runs the async work on a tokio runtime
//! 3. Formats and displays output
//! 4. Maps the outcome to a process exit code
//!
//! # Exit Codes
//!
//! - `0`: success
//! - `1`: configuration, upstream, or other failure
//! - `2`: the input was rejected

mod completion;
mod search;
mod shop;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use search::{run_search, search};
pub use shop::shop;

use std::process::ExitCode;

use anyhow::Result;

use super::args::Command;
use super::Context;
use crate::core::config::{Config, ConfigError};
use crate::ui::output;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Search { sku, json } => search(ctx, &sku, json),
        Command::Shop { json } => shop(ctx, json),
        Command::Completion { shell } => {
            completion(shell)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load configuration for a command, surfacing load warnings.
pub(crate) fn load_config(ctx: &Context) -> Result<Config, ConfigError> {
    let loaded = Config::load(ctx.config.as_deref())?;
    for warning in &loaded.warnings {
        output::warn(&warning.message, ctx.verbosity());
    }
    Ok(loaded.config)
}

/// Exit code for an HTTP-style status.
pub fn exit_code_for_status(status: u16) -> u8 {
    match status {
        200..=299 => 0,
        400..=499 => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_to_exit_code() {
        assert_eq!(exit_code_for_status(200), 0);
        assert_eq!(exit_code_for_status(400), 2);
        assert_eq!(exit_code_for_status(500), 1);
        assert_eq!(exit_code_for_status(502), 1);
        assert_eq!(exit_code_for_status(504), 1);
    }
}
