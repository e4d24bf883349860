//! Edge Host - Main entry point
//!
//! Loads an enclave image, serves its edge calls and reports the outcome.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use edge_host::HostConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "edge-host", version, about = "Run enclaves over the edge-call substrate")]
struct Cli {
    /// Config file (default: <config dir>/edge-host/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an enclave image and run the attestor application
    Run {
        /// Enclave image
        image: PathBuf,

        /// Shared buffer length in bytes
        #[arg(long)]
        untrusted_size: Option<usize>,

        /// Fixed nonce instead of a random one
        #[arg(long)]
        nonce: Option<String>,

        /// Print the session report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print an enclave image's measurement
    Inspect {
        image: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = HostConfig::load(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            image,
            untrusted_size,
            nonce,
            json,
        } => {
            config.apply_cli(untrusted_size, nonce);
            commands::run::handle(&image, &config, json)
        }
        Commands::Inspect { image, json } => commands::inspect::handle(&image, json),
        Commands::Config => commands::show_config(&config),
    }
}
