// starload-core/src/domain/catalog/dialect.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL flavour spoken by a warehouse adapter.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Redshift,
    #[serde(alias = "duck_db")]
    DuckDb,
}

impl Dialect {
    /// Schema searched by the existence check when none is configured.
    pub fn default_schema(&self) -> &'static str {
        match self {
            Dialect::Redshift => "public",
            Dialect::DuckDb => "main",
        }
    }

    /// Redshift accepts PRIMARY KEY as a planner hint only.
    /// DuckDB enforces it, which would reject rows the pipeline is meant to
    /// surface through data quality checks instead.
    pub fn renders_primary_keys(&self) -> bool {
        matches!(self, Dialect::Redshift)
    }

    /// TRUNCATE commits the enclosing transaction on Redshift.
    pub fn truncate_is_transactional(&self) -> bool {
        matches!(self, Dialect::DuckDb)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::DuckDb => write!(f, "duckdb"),
        }
    }
}
