// starload-core/src/error.rs

use crate::domain::error::{ConfigurationError, DataQualityError};
use crate::infrastructure::error::{InfrastructureError, WarehouseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarloadError {
    // --- CONFIGURATION (raised before any warehouse call, never retried) ---
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    // --- WAREHOUSE (engine, connectivity, permissions) ---
    #[error("Warehouse error on '{table}': {source}\n    Statement: {statement}")]
    Warehouse {
        table: String,
        statement: String,
        source: WarehouseError,
    },

    // --- POST-LOAD VALIDATION ---
    #[error(transparent)]
    DataQuality(#[from] DataQualityError),

    // --- INFRASTRUCTURE (IO, YAML, report persistence) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl StarloadError {
    /// Builds a warehouse error carrying the statement that failed.
    pub fn warehouse(
        table: impl Into<String>,
        statement: impl Into<String>,
        source: WarehouseError,
    ) -> Self {
        StarloadError::Warehouse {
            table: table.into(),
            statement: statement.into(),
            source,
        }
    }

    /// Only warehouse failures are worth another attempt.
    /// Configuration and data-quality failures are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StarloadError::Warehouse { .. })
    }

    /// Short machine-readable category, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            StarloadError::Configuration(_) => "configuration",
            StarloadError::Warehouse { .. } => "warehouse",
            StarloadError::DataQuality(_) => "data_quality",
            StarloadError::Infrastructure(_) => "infrastructure",
        }
    }
}

impl From<std::io::Error> for StarloadError {
    fn from(err: std::io::Error) -> Self {
        StarloadError::Infrastructure(InfrastructureError::Io(err))
    }
}
