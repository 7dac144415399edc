//! Config command implementation.

use crate::cli::ConfigArgs;
use crate::config::ConfigSource;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use callcheck_engine::EngineConfig;

/// Render the configuration the command would print.
pub fn render_config(args: &ConfigArgs, loaded: &EngineConfig) -> Result<String> {
    let config = match args.preset {
        Some(preset) => EngineConfig::preset(preset.as_str())
            .ok_or_else(|| CliError::InvalidInput(format!("Unknown preset '{}'", preset.as_str())))?,
        None => loaded.clone(),
    };
    config.to_toml().map_err(CliError::Config)
}

/// Execute the config command.
pub fn execute_config(
    args: ConfigArgs,
    loaded: &EngineConfig,
    source: &ConfigSource,
    formatter: &Formatter,
) -> Result<()> {
    let origin = match (&args.preset, source) {
        (Some(preset), _) => format!("preset '{}'", preset.as_str()),
        (None, ConfigSource::Explicit(path)) | (None, ConfigSource::UserDefault(path)) => {
            path.display().to_string()
        }
        (None, ConfigSource::BuiltIn) => "built-in defaults".to_string(),
    };

    let toml = render_config(&args, loaded)?;
    eprintln!("{}", formatter.info(&format!("Engine configuration from {}", origin)));
    print!("{}", toml);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PresetArg;

    #[test]
    fn test_preset_overrides_loaded() {
        let args = ConfigArgs {
            preset: Some(PresetArg::Lenient),
        };
        let rendered = render_config(&args, &EngineConfig::default()).unwrap();
        assert_eq!(EngineConfig::from_toml(&rendered).unwrap(), EngineConfig::lenient());
    }

    #[test]
    fn test_loaded_config_rendered() {
        let args = ConfigArgs { preset: None };
        let rendered = render_config(&args, &EngineConfig::strict()).unwrap();
        assert!(rendered.contains("[heuristics]"));
        assert_eq!(EngineConfig::from_toml(&rendered).unwrap(), EngineConfig::strict());
    }
}
