//! RIAA - Responsive Image Asset Advisor
//!
//! Main entry point for the RIAA CLI: the offline pipeline simulator and
//! the local recommendation stub server.

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use riaa_config::{Config, ConfigLoader, ConfigValidator};

mod adapters;
mod cli;
mod simulate;
mod stub_server;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer());
    // Keep the guard alive for the life of the process.
    let _file_guard = if let Some(log_dir) = &cli.log_dir {
        let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "riaa.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        registry.with(fmt::layer().with_ansi(false).with_writer(writer)).init();
        Some(guard)
    } else {
        registry.init();
        None
    };

    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Simulate {
        offline: false,
        skip_analysis: false,
    }) {
        Commands::Simulate {
            offline,
            skip_analysis,
        } => simulate::run(&config, offline, skip_analysis).await,
        Commands::StubServer { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            stub_server::serve(&host, port).await
        }
    }
}

/// Load and validate configuration; a missing file falls back to defaults.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = if cli.config.exists() {
        info!(path = %cli.config.display(), "loading configuration");
        ConfigLoader::load(&cli.config)
            .with_context(|| format!("failed to load {}", cli.config.display()))?
    } else {
        info!(path = %cli.config.display(), "config file not found; using defaults");
        Config::default()
    };

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!(path = warning.path, "{}", warning.message);
    }
    if !validation.is_valid() {
        for error in &validation.errors {
            tracing::error!(path = error.path, "{}", error.message);
        }
        anyhow::bail!("configuration is invalid");
    }
    Ok(config)
}
