//! Proposal Client - Main entry point
//!
//! Reads or recalculates the storage proposal over D-Bus and prints JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use proposal_client::{config::Config, utils, ProposalClient, ProposalSettings};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Bus address (overrides config)
    #[arg(short, long)]
    address: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current proposal
    Show,

    /// Print the devices available for a proposal
    Devices,

    /// Request a new proposal calculation
    Calculate {
        /// JSON file with the proposal settings
        #[arg(short, long, value_name = "FILE")]
        settings: PathBuf,

        /// Print the resulting proposal
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = args.config {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };
    if let Some(address) = args.address {
        config.bus.address = Some(address);
    }

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::info!(
        "Starting proposal-client v{} (service: {})",
        env!("CARGO_PKG_VERSION"),
        config.service.name
    );

    let client = ProposalClient::connect(&config)
        .await
        .context("connecting to the storage service")?;

    match args.command {
        Command::Show => print_json(&client.get_proposal().await?)?,
        Command::Devices => print_json(&client.available_devices().await?)?,
        Command::Calculate { settings: path, show } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let settings: ProposalSettings = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;

            client.calculate_proposal(&settings).await?;
            tracing::info!("Proposal calculation finished");

            if show {
                print_json(&client.get_proposal().await?)?;
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
