//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Callcheck - Verify earnings-call claims against reported financials.
#[derive(Debug, Parser)]
#[command(name = "callcheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Engine configuration file (TOML)
    #[arg(short, long, global = true, env = "CALLCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (claim ID and label only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Verify a batch of claims against reported facts
    Verify(VerifyArgs),

    /// Print the effective engine configuration
    Config(ConfigArgs),

    /// List every reason tag a verdict trace can carry
    Reasons,
}

/// Arguments for the verify command.
#[derive(Debug, Parser)]
pub struct VerifyArgs {
    /// JSON file containing an array of claims
    #[arg(long)]
    pub claims: PathBuf,

    /// JSON file containing an array of financial facts
    #[arg(long)]
    pub facts: PathBuf,

    /// Only verify claims for this company
    #[arg(long)]
    pub company: Option<String>,

    /// Write the full batch report as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Print a built-in preset instead of the loaded configuration
    #[arg(short, long, value_enum)]
    pub preset: Option<PresetArg>,
}

/// Configuration preset argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Canonical tolerances, every check enabled
    Default,
    /// Narrow tolerances
    Strict,
    /// Wide tolerances
    Lenient,
}

impl PresetArg {
    /// Preset name as understood by the engine
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetArg::Default => "default",
            PresetArg::Strict => "strict",
            PresetArg::Lenient => "lenient",
        }
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
