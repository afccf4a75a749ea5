// starload/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug starload run ... to see every statement
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            execution_date,
            vars,
        } => commands::run::execute(config, execution_date, vars).await,
        Commands::Plan { config, format } => commands::plan::execute(config, format),
        Commands::Check { config } => commands::check::execute(config),
        Commands::Query { query, config } => commands::query::execute(query, config).await,
        Commands::Inspect {
            db_path,
            table,
            limit,
        } => commands::inspect::execute(db_path, table, limit).await,
    }
}
