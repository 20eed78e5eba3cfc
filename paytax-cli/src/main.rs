mod cli;
mod commands;
mod config;
mod logging;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use paytax_core::CalculatorRegistry;
use paytax_data::RateLoader;
use tracing::debug;

use crate::cli::{Cli, OutputFormat};
use crate::config::AppConfig;

// ─── startup ─────────────────────────────────────────────────────────────────

/// Loads the config file (if any), installs logging, then builds the registry
/// from the data directory or the bundled tables.
fn build_registry(cli: &Cli) -> Result<Arc<CalculatorRegistry>> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let env_filter = std::env::var("RUST_LOG").ok();
    logging::init(&logging::resolve_filter(
        cli.log_level.as_deref(),
        env_filter.as_deref(),
        config.log_level.as_deref(),
    ))?;

    let store = match cli.data_dir.as_ref().or(config.data_dir.as_ref()) {
        Some(dir) => RateLoader::load_dir(dir)
            .with_context(|| format!("Failed to load rate tables from {}", dir.display()))?,
        None => {
            debug!("using bundled rate tables");
            RateLoader::bundled().context("Failed to load bundled rate tables")?
        }
    };

    let registry = CalculatorRegistry::standard(Arc::new(store), &config.engine)?;
    Ok(Arc::new(registry))
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.format;

    let result = match build_registry(&cli) {
        Ok(registry) => commands::run(registry, cli.command).await,
        Err(err) => Err(err),
    };

    match result.and_then(|report| Ok(report.render(format)?)) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            debug!(error = %format!("{err:#}"), "command failed");
            match format {
                OutputFormat::Json => println!("{}", output::error_json(&format!("{err:#}"))),
                OutputFormat::Table => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
