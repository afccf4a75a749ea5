// starload/src/commands/mod.rs

pub mod check;
pub mod inspect;
pub mod plan;
pub mod query;
pub mod run;

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

use starload_core::domain::Scalar;
use starload_core::domain::catalog::Dialect;
use starload_core::infrastructure::adapters::{
    CopyCommandLoader, DuckDbWarehouse, PoolSettings, RedshiftWarehouse,
};
use starload_core::infrastructure::config::{PipelineConfig, load_pipeline_config};
use starload_core::ports::{BulkSource, Warehouse};

const DEFAULT_DUCKDB_PATH: &str = "starload.duckdb";

pub(crate) fn load_config(path: Option<PathBuf>) -> anyhow::Result<PipelineConfig> {
    let config = load_pipeline_config(path.as_deref()).with_context(|| {
        format!(
            "Failed to load pipeline definition from {:?}",
            path.unwrap_or_else(|| PathBuf::from("."))
        )
    })?;
    println!("   Pipeline: {} ({})", config.name, config.warehouse.engine);
    Ok(config)
}

/// Warehouse plus the matching bulk loader for the configured engine.
pub(crate) async fn connect(
    config: &PipelineConfig,
) -> anyhow::Result<(Arc<dyn Warehouse>, Arc<dyn BulkSource>)> {
    let settings = &config.warehouse;
    match settings.engine {
        Dialect::DuckDb => {
            let db_path = settings.path.as_deref().unwrap_or(DEFAULT_DUCKDB_PATH);
            println!("   Engine: DuckDB 🦆 ({})", db_path);
            let mut warehouse = DuckDbWarehouse::new(db_path)
                .with_context(|| format!("Failed to initialize DuckDB at {}", db_path))?;
            if let Some(schema) = &settings.schema {
                warehouse = warehouse.with_schema(schema.clone());
            }
            let warehouse = Arc::new(warehouse);
            let loader: Arc<dyn BulkSource> = warehouse.clone();
            let warehouse: Arc<dyn Warehouse> = warehouse;
            Ok((warehouse, loader))
        }
        Dialect::Redshift => {
            println!("   Engine: Redshift");
            let url = std::env::var(&settings.url_env).with_context(|| {
                format!("Environment variable {} must hold the Redshift URL", settings.url_env)
            })?;
            let pool = PoolSettings {
                max_connections: settings.max_connections,
                ..PoolSettings::default()
            };
            let warehouse: Arc<dyn Warehouse> = Arc::new(
                RedshiftWarehouse::connect(&url, settings.schema.clone(), &pool)
                    .await
                    .context("Failed to connect to Redshift")?,
            );
            let loader: Arc<dyn BulkSource> = Arc::new(CopyCommandLoader::new(warehouse.clone()));
            Ok((warehouse, loader))
        }
    }
}

/// Cell text for terminal output.
pub(crate) fn cell(value: &Scalar) -> String {
    match value {
        Scalar::Text(s) => s.clone(),
        other => other.to_string(),
    }
}
