//! Command-line interface.

pub mod apply;
pub mod check;
pub mod completions;
pub mod graph;
pub mod output;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::core::config::StackConfig;
use crate::core::constants::CONFIG_ENV;
use crate::error::Result;

/// Berth - declarative EKS application stacks.
#[derive(Parser)]
#[command(
    name = "berth",
    about = "Compose and render EKS application stacks",
    version
)]
pub struct Cli {
    /// Path to the stack configuration
    #[arg(short, long, global = true, env = CONFIG_ENV, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the resolved manifests
    Render {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
        /// Print secret data instead of redacting it
        #[arg(long)]
        show_secrets: bool,
    },

    /// Resolve the stack and write one manifest per resource plus a plan index
    Apply {
        /// Directory to write manifests into
        #[arg(short, long, value_name = "DIR")]
        out_dir: PathBuf,
    },

    /// Print descriptors in apply order with their dependencies
    Graph,

    /// Validate the config and resolve the stack without writing anything
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Manifest output format.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    let config = cli.config;
    match cli.command {
        Render {
            format,
            show_secrets,
        } => render::execute(&load_config(config)?, format, show_secrets),
        Apply { out_dir } => apply::execute(&load_config(config)?, &out_dir),
        Graph => graph::execute(&load_config(config)?),
        Check => check::execute(&load_config(config)?),
        Completions { shell } => completions::execute(shell),
    }
}

/// Load the stack config from `--config`, `BERTH_CONFIG`, or `./berth.toml`.
fn load_config(path: Option<PathBuf>) -> Result<StackConfig> {
    let path = path.unwrap_or_else(StackConfig::default_path);
    debug!(path = %path.display(), "using config");
    StackConfig::load(&path)
}
