//! Jobseeker
//!
//! Scans SEEK, LinkedIn and Indeed search pages and stores new postings per user.

mod cli;
mod config;
mod error;
mod scraper;
mod storage;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobseeker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Commands::Init { name, location } => cli::run_init(config, name, location),
        Commands::Scan { source } => cli::run_scan(config, source).await,
        Commands::List {
            status,
            job_type,
            contract,
            limit,
            format,
        } => cli::run_list(config, status, job_type, contract, limit, format),
        Commands::Stats => cli::run_stats(config),
    }
}
