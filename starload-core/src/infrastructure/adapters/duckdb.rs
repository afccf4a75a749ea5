// starload-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::{Config, Connection, Statement};
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::domain::Scalar;
use crate::domain::catalog::Dialect;
use crate::domain::compiler::Quoter;
use crate::domain::load::{ObjectStore, SourceFormat};
use crate::infrastructure::error::WarehouseError;
use crate::ports::bulk::{BulkLoadRequest, BulkSource};
use crate::ports::warehouse::{Row, Warehouse};

/// Embedded warehouse for local runs and tests.
///
/// Also acts as the bulk source for `store: local`, reading newline-delimited
/// or array JSON files from a directory.
pub struct DuckDbWarehouse {
    conn: Arc<Mutex<Connection>>,
    schema: String,
}

impl DuckDbWarehouse {
    pub fn new(db_path: &str) -> Result<Self, WarehouseError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            schema: Dialect::DuckDb.default_schema().to_string(),
        })
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, WarehouseError> {
        self.conn
            .lock()
            .map_err(|_| WarehouseError::Unavailable("DuckDB Mutex Poisoned".into()))
    }

    /// The INSERT ... SELECT that reads the source files.
    pub fn load_statement(request: &BulkLoadRequest<'_>) -> Result<String, WarehouseError> {
        if request.location.store != ObjectStore::Local {
            return Err(WarehouseError::Rejected(format!(
                "DuckDB reads local files only, got '{}'",
                request.location.uri()
            )));
        }

        let table = request.table;
        let pattern = Quoter::literal(&json_glob(&request.location.uri()));
        let columns = table.column_names().join(", ");

        let select = match request.format {
            SourceFormat::Auto => {
                let schema = table
                    .columns
                    .iter()
                    .map(|c| format!("{}: {}", Quoter::literal(c.name), Quoter::literal(c.sql_type)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "SELECT {} FROM read_json({}, columns = {{{}}})",
                    columns, pattern, schema
                )
            }
            SourceFormat::Explicit(path) => {
                let paths = read_json_paths(path)?;
                if paths.len() != table.columns.len() {
                    return Err(WarehouseError::Rejected(format!(
                        "JSONPaths file '{}' has {} entries but '{}' has {} columns",
                        path,
                        paths.len(),
                        table.name,
                        table.columns.len()
                    )));
                }
                let projections = table
                    .columns
                    .iter()
                    .zip(&paths)
                    .map(|(c, p)| {
                        format!(
                            "CAST(json_extract_string(json, {}) AS {})",
                            Quoter::literal(&to_duckdb_path(p)),
                            c.sql_type
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("SELECT {} FROM read_json_objects({})", projections, pattern)
            }
        };

        Ok(format!(
            "INSERT INTO {} ({}) {}",
            table.quoted_name(),
            columns,
            select
        ))
    }
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    async fn execute(&self, statement: &str) -> Result<(), WarehouseError> {
        let conn = self.lock()?;
        conn.execute_batch(statement)?;
        Ok(())
    }

    async fn query(&self, statement: &str) -> Result<Vec<Row>, WarehouseError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(statement)?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let executed: &Statement<'_> = row.as_ref();
            let width = executed.column_count();
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                let value: Value = row.get(i)?;
                values.push(to_scalar(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    async fn execute_atomic(&self, statements: &[String]) -> Result<(), WarehouseError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for statement in statements {
            debug!(statement = %statement, "DuckDB transactional statement");
            tx.execute_batch(statement)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn default_schema(&self) -> &str {
        &self.schema
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

#[async_trait]
impl BulkSource for DuckDbWarehouse {
    fn render(&self, request: &BulkLoadRequest<'_>) -> String {
        Self::load_statement(request).unwrap_or_else(|e| {
            format!(
                "-- {} <- {} ({}): {}",
                request.table.name,
                request.location.uri(),
                request.format,
                e
            )
        })
    }

    async fn bulk_load(&self, request: &BulkLoadRequest<'_>) -> Result<(), WarehouseError> {
        let statement = Self::load_statement(request)?;
        self.execute(&statement).await
    }
}

fn to_scalar(value: Value) -> Scalar {
    match value {
        Value::Null => Scalar::Null,
        Value::Boolean(v) => Scalar::Bool(v),
        Value::TinyInt(v) => Scalar::Int(v.into()),
        Value::SmallInt(v) => Scalar::Int(v.into()),
        Value::Int(v) => Scalar::Int(v.into()),
        Value::BigInt(v) => Scalar::Int(v),
        Value::HugeInt(v) => i64::try_from(v)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(v as f64)),
        Value::UTinyInt(v) => Scalar::Int(v.into()),
        Value::USmallInt(v) => Scalar::Int(v.into()),
        Value::UInt(v) => Scalar::Int(v.into()),
        Value::UBigInt(v) => i64::try_from(v)
            .map(Scalar::Int)
            .unwrap_or(Scalar::Float(v as f64)),
        Value::Float(v) => Scalar::Float(v.into()),
        Value::Double(v) => Scalar::Float(v),
        Value::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .map(Scalar::Float)
                .unwrap_or(Scalar::Text(text))
        }
        Value::Text(v) => Scalar::Text(v),
        other => Scalar::Text(format!("{:?}", other)),
    }
}

/// A directory means "every JSON file below it".
fn json_glob(uri: &str) -> String {
    if uri.contains('*') || uri.ends_with(".json") {
        uri.to_string()
    } else {
        format!("{}/**/*.json", uri.trim_end_matches('/'))
    }
}

/// `$['firstName']` -> `$."firstName"`
fn to_duckdb_path(json_path: &str) -> String {
    json_path.trim().replace("['", ".\"").replace("']", "\"")
}

#[derive(Deserialize)]
struct JsonPaths {
    jsonpaths: Vec<String>,
}

fn read_json_paths(path: &str) -> Result<Vec<String>, WarehouseError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        WarehouseError::Rejected(format!("cannot read JSONPaths file '{}': {}", path, e))
    })?;
    let parsed: JsonPaths = serde_json::from_str(&content).map_err(|e| {
        WarehouseError::Rejected(format!("invalid JSONPaths file '{}': {}", path, e))
    })?;
    Ok(parsed.jsonpaths)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::catalog::TableId;
    use crate::domain::load::SourceLocation;
    use anyhow::Result;

    #[tokio::test]
    async fn test_duckdb_query_scalars() -> Result<()> {
        let wh = DuckDbWarehouse::new(":memory:")?;
        wh.execute("CREATE TABLE users (id INTEGER, name VARCHAR)").await?;
        wh.execute("INSERT INTO users VALUES (1, 'ada'), (2, NULL)").await?;

        let rows = wh.query("SELECT COUNT(*), MAX(name) FROM users").await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Scalar::Int(2));
        assert_eq!(rows[0][1], Scalar::Text("ada".into()));

        let empty = wh.query("SELECT id FROM users WHERE id > 10").await?;
        assert!(empty.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_table_exists() -> Result<()> {
        let wh = DuckDbWarehouse::new(":memory:")?;
        assert!(!wh.table_exists("main", "song").await?);
        wh.execute("CREATE TABLE song (song_id VARCHAR)").await?;
        assert!(wh.table_exists("main", "song").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_atomic_rolls_back() -> Result<()> {
        let wh = DuckDbWarehouse::new(":memory:")?;
        wh.execute("CREATE TABLE t (id INTEGER)").await?;
        wh.execute("INSERT INTO t VALUES (1)").await?;

        let result = wh
            .execute_atomic(&[
                "DELETE FROM t".to_string(),
                "INSERT INTO missing_table VALUES (1)".to_string(),
            ])
            .await;
        assert!(result.is_err());

        let rows = wh.query("SELECT COUNT(*) FROM t").await?;
        assert_eq!(rows[0][0], Scalar::Int(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_duckdb_error() -> Result<()> {
        let wh = DuckDbWarehouse::new(":memory:")?;
        let result = wh.execute("SELECT * FROM non_existent_table").await;
        assert!(matches!(result, Err(WarehouseError::DuckDB(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_local_json_auto_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let songs = dir.path().join("song-data");
        std::fs::create_dir_all(&songs)?;
        std::fs::write(
            songs.join("TRAAAAW128F429D538.json"),
            r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.5, "year": 0}"#,
        )?;

        let wh = DuckDbWarehouse::new(":memory:")?;
        let table = TableId::StagingSongs.descriptor();
        wh.execute(&table.create_statement(Dialect::DuckDb)).await?;

        let location = SourceLocation {
            store: ObjectStore::Local,
            bucket: dir.path().to_string_lossy().into_owned(),
            key: "song-data".into(),
        };
        let request = BulkLoadRequest {
            table,
            location: &location,
            credentials: "",
            format: &SourceFormat::Auto,
            region: "local",
        };
        wh.bulk_load(&request).await?;

        let rows = wh
            .query("SELECT artist_name, duration FROM staging_songs")
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Scalar::Text("Casual".into()));
        assert_eq!(rows[0][1], Scalar::Float(218.5));
        Ok(())
    }

    #[test]
    fn test_explicit_format_statement() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths_file = dir.path().join("song_paths.json");
        let entries: Vec<String> = TableId::StagingSongs
            .descriptor()
            .columns
            .iter()
            .map(|c| format!("$['{}']", c.name))
            .collect();
        std::fs::write(
            &paths_file,
            serde_json::json!({ "jsonpaths": entries }).to_string(),
        )?;

        let location = SourceLocation {
            store: ObjectStore::Local,
            bucket: "/lake".into(),
            key: "song-data".into(),
        };
        let format = SourceFormat::Explicit(paths_file.to_string_lossy().into_owned());
        let request = BulkLoadRequest {
            table: TableId::StagingSongs.descriptor(),
            location: &location,
            credentials: "",
            format: &format,
            region: "local",
        };

        let sql = DuckDbWarehouse::load_statement(&request)?;
        assert!(sql.starts_with("INSERT INTO \"staging_songs\" (num_songs, "));
        assert!(sql.contains("CAST(json_extract_string(json, '$.\"num_songs\"') AS int)"));
        assert!(sql.ends_with("FROM read_json_objects('/lake/song-data/**/*.json')"));
        Ok(())
    }

    #[test]
    fn test_s3_rejected_locally() {
        let location = SourceLocation {
            store: ObjectStore::S3,
            bucket: "bucket".into(),
            key: "song-data".into(),
        };
        let request = BulkLoadRequest {
            table: TableId::StagingSongs.descriptor(),
            location: &location,
            credentials: "",
            format: &SourceFormat::Auto,
            region: "us-west-2",
        };
        assert!(matches!(
            DuckDbWarehouse::load_statement(&request),
            Err(WarehouseError::Rejected(_))
        ));
    }
}
