//! Engine configuration loading for the CLI.

use crate::error::{CliError, Result};
use callcheck_engine::EngineConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

/// Where the effective engine configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// File given on the command line
    Explicit(PathBuf),
    /// `~/.callcheck/engine.toml`
    UserDefault(PathBuf),
    /// Built-in defaults
    BuiltIn,
}

/// Get the default configuration file path.
pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".callcheck").join("engine.toml"))
}

/// Load an engine configuration file.
pub fn load_from(path: &Path) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config: EngineConfig = toml::from_str(&contents)?;
    config
        .validate()
        .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}

/// Resolve the effective engine configuration.
///
/// An explicit path must exist. Without one, the user default file is used
/// when present, else the built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<(EngineConfig, ConfigSource)> {
    if let Some(path) = explicit {
        return Ok((load_from(path)?, ConfigSource::Explicit(path.to_path_buf())));
    }

    match default_path() {
        Ok(path) if path.exists() => {
            let config = load_from(&path)?;
            Ok((config, ConfigSource::UserDefault(path)))
        }
        _ => Ok((EngineConfig::default(), ConfigSource::BuiltIn)),
    }
}

/// Save an engine configuration as TOML.
pub fn save(config: &EngineConfig, path: &Path) -> Result<()> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let contents = config
        .to_toml()
        .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, contents)?;
    Ok(())
}
