// starload-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum WarehouseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(starload::infra::warehouse::duckdb),
        help("An error occurred inside the SQL engine.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("Redshift Error: {0}")]
    #[diagnostic(
        code(starload::infra::warehouse::redshift),
        help("Check connectivity, permissions and the SQL sent to the cluster.")
    )]
    Redshift(#[from] sqlx::Error),

    #[error("Warehouse connection unavailable: {0}")]
    #[diagnostic(code(starload::infra::warehouse::unavailable))]
    Unavailable(String),

    #[error("Warehouse rejected the request: {0}")]
    #[diagnostic(code(starload::infra::warehouse::rejected))]
    Rejected(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(starload::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(starload::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(starload::infra::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(starload::infra::config))]
    ConfigError(String),

    #[error("Pipeline configuration not found at '{0}'")]
    #[diagnostic(code(starload::infra::config_missing))]
    ConfigNotFound(String),

    // --- WAREHOUSE BOOTSTRAP (opening a connection, before any task runs) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Warehouse(#[from] WarehouseError),
}
