//! Callcheck CLI - Verify earnings-call claims against reported financials.

use callcheck_cli::commands;
use callcheck_cli::{config, Cli, Command, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> callcheck_cli::Result<()> {
    let cli = Cli::parse();

    let (engine_config, source) = config::load(cli.config.as_deref())?;
    tracing::debug!("Engine configuration loaded from {:?}", source);

    let formatter = Formatter::new(cli.format.into(), !cli.no_color);

    match cli.command {
        Command::Verify(args) => {
            commands::execute_verify(args, engine_config, &formatter).await?;
        }
        Command::Config(args) => {
            commands::execute_config(args, &engine_config, &source, &formatter)?;
        }
        Command::Reasons => {
            commands::execute_reasons(&formatter)?;
        }
    }

    Ok(())
}
