// starload-core/src/infrastructure/config/pipeline.rs

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::Scalar;
use crate::domain::catalog::Dialect;
use crate::domain::load::{LoadMode, ObjectStore};
use crate::infrastructure::error::InfrastructureError;

pub const DEFAULT_URL_ENV: &str = "STARLOAD_WAREHOUSE_URL";

/// The whole pipeline definition, as written in `starload.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_target_path")]
    pub target_path: String,
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub staging: Vec<StagingConfig>,
    pub fact: FactConfig,
    #[serde(default)]
    pub dimensions: Vec<DimensionConfig>,
    #[serde(default)]
    pub quality: Option<QualityConfig>,
    /// User variables exposed to key templates.
    #[serde(default)]
    pub vars: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            delay_secs: default_retry_delay(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub engine: Dialect,
    /// DuckDB database file, `:memory:` for a throwaway database.
    #[serde(default)]
    pub path: Option<String>,
    /// Environment variable holding the Redshift connection URL.
    #[serde(default = "default_url_env")]
    pub url_env: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            engine: Dialect::default(),
            path: None,
            url_env: default_url_env(),
            schema: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StagingConfig {
    #[serde(default)]
    pub task_id: Option<String>,
    pub table: String,
    #[serde(default)]
    pub store: ObjectStore,
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub iam_role: String,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FactConfig {
    #[serde(default)]
    pub task_id: Option<String>,
    pub table: String,
    #[serde(default)]
    pub mode: LoadMode,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub atomic: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DimensionConfig {
    #[serde(default)]
    pub task_id: Option<String>,
    pub table: String,
    #[serde(default = "default_true")]
    pub truncate: bool,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub atomic: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QualityConfig {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub sql_queries: Vec<String>,
    #[serde(default)]
    pub expected_results: Vec<Scalar>,
}

fn default_target_path() -> String {
    "target".to_string()
}
fn default_max_parallel() -> usize {
    4
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    300
}
fn default_url_env() -> String {
    DEFAULT_URL_ENV.to_string()
}
fn default_max_connections() -> u32 {
    4
}
fn default_region() -> String {
    "us-west-2".to_string()
}
fn default_true() -> bool {
    true
}

// --- LOADER ---

/// Loads the pipeline definition at `path`, or `starload.yaml` in the current
/// directory when no path is given.
#[instrument]
pub fn load_pipeline_config(path: Option<&Path>) -> Result<PipelineConfig, InfrastructureError> {
    let config_path = match path {
        Some(p) if p.is_file() => p.to_path_buf(),
        Some(p) if p.is_dir() => find_pipeline_config(p)?,
        Some(p) => return Err(InfrastructureError::ConfigNotFound(p.display().to_string())),
        None => find_pipeline_config(Path::new("."))?,
    };
    info!(path = ?config_path, "Loading pipeline definition");

    let content = fs::read_to_string(&config_path)?;
    let mut config = parse_pipeline_config(&content)?;

    apply_env_overrides(&mut config)?;

    if config.max_parallel == 0 {
        return Err(InfrastructureError::ConfigError(
            "max_parallel must be at least 1".into(),
        ));
    }

    Ok(config)
}

pub fn parse_pipeline_config(content: &str) -> Result<PipelineConfig, InfrastructureError> {
    Ok(serde_yaml::from_str(content)?)
}

fn find_pipeline_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    let candidates = ["starload.yaml", "starload.yml"];
    candidates
        .iter()
        .map(|f| root.join(f))
        .find(|p| p.exists())
        .ok_or_else(|| {
            InfrastructureError::ConfigNotFound(format!(
                "{} (checked {:?})",
                root.display(),
                candidates
            ))
        })
}

fn apply_env_overrides(config: &mut PipelineConfig) -> Result<(), InfrastructureError> {
    if let Ok(val) = std::env::var("STARLOAD_TARGET_PATH") {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Ok(val) = std::env::var("STARLOAD_DUCKDB_PATH") {
        info!(old = ?config.warehouse.path, new = ?val, "Overriding DuckDB path via ENV");
        config.warehouse.path = Some(val);
    }
    if let Ok(val) = std::env::var("STARLOAD_MAX_PARALLEL") {
        config.max_parallel = val.parse().map_err(|_| {
            InfrastructureError::ConfigError(format!("STARLOAD_MAX_PARALLEL is not a number: '{}'", val))
        })?;
        info!(max_parallel = config.max_parallel, "Overriding parallelism via ENV");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const MINIMAL: &str = r#"
name: sparkify
fact:
  table: songplay
"#;

    #[test]
    fn test_defaults() -> Result<()> {
        let config = parse_pipeline_config(MINIMAL)?;
        assert_eq!(config.target_path, "target");
        assert_eq!(config.max_parallel, 4);
        assert_eq!(config.retry.retries, 3);
        assert_eq!(config.retry.delay_secs, 300);
        assert_eq!(config.warehouse.engine, Dialect::Redshift);
        assert_eq!(config.warehouse.url_env, DEFAULT_URL_ENV);
        assert_eq!(config.fact.mode, LoadMode::ReplaceAll);
        assert!(!config.fact.atomic);
        assert!(config.staging.is_empty());
        assert!(config.quality.is_none());
        Ok(())
    }

    #[test]
    fn test_full_definition() -> Result<()> {
        let yaml = r#"
name: sparkify
warehouse:
  engine: duckdb
  path: ":memory:"
staging:
  - table: staging_events
    store: local
    bucket: /data/lake
    key: "log_data/{{ year }}/{{ month }}"
    format: log_json_path.json
fact:
  table: songplay
  mode: append_only
dimensions:
  - table: user_info
  - table: time
    truncate: false
quality:
  parallel: true
  sql_queries:
    - SELECT COUNT(*) FROM user_info WHERE userid IS NULL
    - SELECT MAX(level) FROM user_info
  expected_results: [0, "paid"]
vars:
  region_code: eu
"#;
        let config = parse_pipeline_config(yaml)?;
        assert_eq!(config.warehouse.engine, Dialect::DuckDb);
        assert_eq!(config.staging[0].store, ObjectStore::Local);
        assert_eq!(config.staging[0].region, "us-west-2");
        assert_eq!(config.fact.mode, LoadMode::AppendOnly);
        assert!(config.dimensions[0].truncate);
        assert!(!config.dimensions[1].truncate);

        let quality = config.quality.ok_or_else(|| anyhow::anyhow!("quality missing"))?;
        assert!(quality.parallel);
        assert_eq!(quality.expected_results[0], Scalar::Int(0));
        assert_eq!(quality.expected_results[1], Scalar::Text("paid".into()));
        assert_eq!(config.vars["region_code"], serde_json::json!("eu"));
        Ok(())
    }

    #[test]
    fn test_missing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let result = load_pipeline_config(Some(dir.path()));
        assert!(matches!(result, Err(InfrastructureError::ConfigNotFound(_))));

        let result = load_pipeline_config(Some(&dir.path().join("nope.yaml")));
        assert!(matches!(result, Err(InfrastructureError::ConfigNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_load_from_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("starload.yaml"), MINIMAL)?;
        let config = load_pipeline_config(Some(dir.path()))?;
        assert_eq!(config.name, "sparkify");
        Ok(())
    }
}
