//! Lendbook CLI - Main entry point

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lendbook_cli::commands;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lendbook")]
#[command(about = "Lendbook - Peer-to-peer collateralized loans", long_about = None)]
struct Cli {
    /// CLI config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scenario file against a fresh in-memory registry
    Run {
        /// Scenario file path
        scenario: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the terms for a collateral amount without opening a loan
    Quote {
        /// Collateral in ether
        #[arg(long)]
        collateral: Decimal,
        /// Flat interest rate in percent
        #[arg(long)]
        rate: Option<u32>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => config.env_filter()?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { scenario, json } => {
            let run_id = Uuid::new_v4();
            let span = tracing::info_span!("scenario", %run_id);
            let _guard = span.enter();

            if commands::run(&scenario, json || config.json)? {
                Ok(ExitCode::SUCCESS)
            } else {
                tracing::warn!("Scenario finished with unexpected outcomes");
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Quote { collateral, rate } => {
            let quote = commands::quote(collateral, rate.unwrap_or(config.default_rate))?;
            commands::print_quote(&quote);
            Ok(ExitCode::SUCCESS)
        }
    }
}
