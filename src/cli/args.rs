//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reftrace - find which add-ons and options reference a SKU, and where they are used
#[derive(Parser, Debug)]
#[command(name = "reftrace")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find metaobjects referencing products with a SKU, and their parent products
    #[command(
        name = "search",
        long_about = "Find metaobjects referencing products with a SKU.\n\n\
            Matches product variants whose SKU contains the given text (ignoring \
            case), finds the add-on and option metaobjects that reference those \
            products, then scans every product for references to those metaobjects.\n\n\
            Exits 0 on success, 2 when the input is rejected, 1 on any other failure.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Human-readable report
    reftrace search GAR-403069

    # Machine-readable response
    reftrace search GAR-403069 --json | jq '.results[].metaobjectName'"
    )]
    Search {
        /// SKU or SKU fragment to search for
        sku: String,

        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check connectivity and credentials by fetching store details
    #[command(name = "shop")]
    Shop {
        /// Print store details as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for reftrace commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    reftrace completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    reftrace completion zsh >> ~/.zshrc

    # Fish
    reftrace completion fish > ~/.config/fish/completions/reftrace.fish

    # PowerShell
    reftrace completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
