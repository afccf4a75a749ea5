// starload-core/src/infrastructure/adapters/redshift.rs

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _, TypeInfo};
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::Scalar;
use crate::domain::catalog::Dialect;
use crate::infrastructure::error::WarehouseError;
use crate::ports::warehouse::{Row, Warehouse};

#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Redshift over the PostgreSQL wire protocol.
///
/// Statements go through the simple query protocol, so results come back in
/// text format and are decoded from their column type name.
pub struct RedshiftWarehouse {
    pool: PgPool,
    schema: String,
}

impl RedshiftWarehouse {
    pub async fn connect(
        url: &str,
        schema: Option<String>,
        settings: &PoolSettings,
    ) -> Result<Self, WarehouseError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await?;

        info!(max_connections = settings.max_connections, "Redshift pool ready");

        Ok(Self {
            pool,
            schema: schema.unwrap_or_else(|| Dialect::Redshift.default_schema().to_string()),
        })
    }
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    async fn execute(&self, statement: &str) -> Result<(), WarehouseError> {
        sqlx::raw_sql(statement).execute(&self.pool).await?;
        Ok(())
    }

    async fn query(&self, statement: &str) -> Result<Vec<Row>, WarehouseError> {
        let rows = sqlx::raw_sql(statement).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute_atomic(&self, statements: &[String]) -> Result<(), WarehouseError> {
        let mut tx = self.pool.begin().await?;
        for statement in statements {
            debug!(statement = %statement, "Redshift transactional statement");
            let conn: &mut PgConnection = &mut tx;
            sqlx::Executor::execute(conn, sqlx::raw_sql(statement)).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    fn default_schema(&self) -> &str {
        &self.schema
    }

    fn engine_name(&self) -> &str {
        "redshift"
    }
}

fn decode_row(row: &PgRow) -> Result<Row, WarehouseError> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let raw: Option<String> = row.try_get_unchecked(idx)?;
        values.push(match raw {
            None => Scalar::Null,
            Some(text) => parse_text(column.type_info().name(), text),
        });
    }
    Ok(values)
}

/// Text-format cell to scalar. Unknown types stay text.
fn parse_text(type_name: &str, text: String) -> Scalar {
    match type_name {
        "INT2" | "INT4" | "INT8" => text
            .parse::<i64>()
            .map(Scalar::Int)
            .unwrap_or(Scalar::Text(text)),
        "FLOAT4" | "FLOAT8" | "NUMERIC" => text
            .parse::<f64>()
            .map(Scalar::Float)
            .unwrap_or(Scalar::Text(text)),
        "BOOL" => match text.as_str() {
            "t" | "true" => Scalar::Bool(true),
            "f" | "false" => Scalar::Bool(false),
            _ => Scalar::Text(text),
        },
        _ => Scalar::Text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_cells() {
        assert_eq!(parse_text("INT8", "42".into()), Scalar::Int(42));
        assert_eq!(parse_text("NUMERIC", "0.50".into()), Scalar::Float(0.5));
        assert_eq!(parse_text("BOOL", "t".into()), Scalar::Bool(true));
        assert_eq!(
            parse_text("VARCHAR", "Casual".into()),
            Scalar::Text("Casual".into())
        );
        // A count compares equal to an integer expectation either way
        assert_eq!(parse_text("NUMERIC", "0".into()), Scalar::Int(0));
    }
}
