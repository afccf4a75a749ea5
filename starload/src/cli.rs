// starload/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "starload")]
#[command(about = "Stages raw events into a warehouse star schema and validates the result", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    Text,
    Mermaid,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the pipeline once (stage -> fact -> dimensions -> checks)
    Run {
        /// Pipeline file, or a directory holding starload.yaml
        #[arg(long, short, env = "STARLOAD_CONFIG")]
        config: Option<PathBuf>,

        /// Logical run date: RFC 3339 timestamp or YYYY-MM-DD (default: now)
        #[arg(long)]
        execution_date: Option<String>,

        /// Template variable, repeatable (ex: --var prefix=log_data)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
    },

    /// 🧭 Prints the execution layers or a Mermaid graph
    Plan {
        #[arg(long, short, env = "STARLOAD_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: PlanFormat,
    },

    /// ✅ Validates the pipeline definition without touching the warehouse
    Check {
        #[arg(long, short, env = "STARLOAD_CONFIG")]
        config: Option<PathBuf>,
    },

    /// ⚡ Executes a raw SQL query against the configured warehouse
    Query {
        query: String,

        #[arg(long, short, env = "STARLOAD_CONFIG")]
        config: Option<PathBuf>,
    },

    /// 🔍 Inspects a DuckDB table (schema + sample rows)
    Inspect {
        /// Path to the DuckDB database file
        #[arg(long, default_value = "starload.duckdb")]
        db_path: String,

        /// Table name to inspect
        #[arg(long, short)]
        table: String,

        /// Number of sample rows to display
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}
