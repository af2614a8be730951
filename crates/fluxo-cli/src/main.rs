//! Command-line interface for fluxo
//!
//! # Usage
//!
//! ```bash
//! # Run the sample workflow with the direct strategy
//! fluxo run --mock
//!
//! # Run custom input through the graph strategy, then reflect on the result
//! fluxo run --graph --input '{"query": "churn drivers"}' --reflect
//!
//! # Inspect the agents
//! fluxo agents
//! fluxo agent approver
//!
//! # Several workflows at once on one engine
//! fluxo batch --count 5
//! ```
//!
//! Settings come from the environment (`USE_MOCK_WORKFLOW`,
//! `WORKFLOW_TIMEOUT_SECONDS`, `WORKFLOW_MAX_RETRIES`, `LOG_LEVEL`,
//! `LOG_FORMAT`); `RUST_LOG` overrides the log level.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fluxo_utils::AppConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fluxo")]
#[command(about = "Run multi-agent research workflows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute one workflow and print its result envelope
    Run(commands::RunArgs),
    /// List the pipeline agents
    Agents,
    /// Show one agent's configuration
    Agent {
        /// Agent id (researcher, processor, approver, optimizer)
        id: String,
    },
    /// Execute several workflows concurrently
    Batch(commands::BatchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    fluxo_utils::init_tracing_with(&config.logging);

    info!(
        environment = %config.environment,
        use_mock = config.workflow.use_mock,
        "Starting fluxo"
    );

    match cli.command {
        Commands::Run(args) => commands::run(&config, args).await,
        Commands::Agents => commands::agents(),
        Commands::Agent { id } => commands::agent(&id),
        Commands::Batch(args) => commands::batch(&config, args).await,
    }
}
