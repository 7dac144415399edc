//! Callcheck CLI library.
//!
//! This library provides the command-line surface over the verification
//! engine: argument parsing, engine configuration loading, command execution
//! and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::{ConfigSource, OutputFormat};
pub use error::{CliError, Result};
pub use output::Formatter;
