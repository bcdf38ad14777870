//! cli
//!
//! Command-line interface layer for reftrace.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging
//! - Delegate to command handlers and map outcomes to exit codes
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::resolver`] for searches. Configuration is loaded lazily by the
//! commands that need catalog access.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use crate::ui::output::Verbosity;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file path
    pub config: Option<PathBuf>,
    /// Debug logging enabled
    pub debug: bool,
    /// Minimal output
    pub quiet: bool,
}

impl Context {
    /// Output verbosity for these flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();

    crate::logging::init(cli.debug);

    let ctx = Context {
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
