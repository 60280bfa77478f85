//! CLI definitions for RIAA.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// RIAA CLI.
#[derive(Parser)]
#[command(name = "riaa")]
#[command(about = "Responsive Image Asset Advisor - selection bridge and analysis panel")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Also write logs to rolling files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the full pipeline offline against a scripted host (default)
    Simulate {
        /// Pretend no host runtime exists, exercising the dev-mock path
        #[arg(long)]
        offline: bool,

        /// Skip the analysis request at the end of the scenario
        #[arg(long)]
        skip_analysis: bool,
    },

    /// Serve a local recommendation endpoint stub
    StubServer {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}
