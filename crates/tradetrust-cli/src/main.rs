//! TradeTrust CLI - trust scoring and certificate recovery from the command line.

mod cli;
mod commands;
mod store;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use tradetrust_core::TrustEngine;
use tradetrust_runtime::RuntimeConfig;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr so command output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;
    let format = cli.format;

    tracing::debug!(config = ?cli.config, "Loaded configuration");

    match cli.command {
        Command::Workflow(args) => commands::workflow(args, config, format).await,
        Command::Recover(args) => commands::recover(args, format),
        Command::Config => commands::config(&config, format),
        Command::Provenance(args) => commands::provenance(args, &engine(config), format),
        Command::Score(kind) => commands::score(kind, &engine(config), format),
        Command::Summary(args) => commands::summary(args, &engine(config), format),
        Command::Escalate(args) => commands::escalate(args, &engine(config), format),
        Command::Sources(args) => commands::sources(args, &engine(config), format),
    }
}

fn engine(config: RuntimeConfig) -> TrustEngine {
    TrustEngine::new(config.trust)
}
