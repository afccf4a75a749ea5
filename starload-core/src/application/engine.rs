// starload-core/src/application/engine.rs

use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::domain::catalog::TableDescriptor;
use crate::error::StarloadError;
use crate::ports::warehouse::{Row, Warehouse, table_exists_query};

/// Runs one statement with timing, wrapping failures with the table and the
/// statement text.
#[instrument(skip(warehouse, statement), fields(statement.len = statement.len()))]
pub async fn execute_statement(
    warehouse: &dyn Warehouse,
    table: &str,
    statement: &str,
) -> Result<(), StarloadError> {
    let start = Instant::now();
    debug!("⚡ Executing: {}", statement);

    match warehouse.execute(statement).await {
        Ok(()) => {
            debug!("✅ Statement finished in {:.2?}", start.elapsed());
            Ok(())
        }
        Err(e) => {
            error!("❌ Statement failed after {:.2?}: {}", start.elapsed(), e);
            Err(StarloadError::warehouse(table, statement, e))
        }
    }
}

#[instrument(skip(warehouse, statement), fields(statement.len = statement.len()))]
pub async fn query_rows(
    warehouse: &dyn Warehouse,
    table: &str,
    statement: &str,
) -> Result<Vec<Row>, StarloadError> {
    let start = Instant::now();
    debug!("⚡ Querying: {}", statement);

    let rows = warehouse
        .query(statement)
        .await
        .map_err(|e| {
            error!("❌ Query failed after {:.2?}: {}", start.elapsed(), e);
            StarloadError::warehouse(table, statement, e)
        })?;

    debug!(rows = rows.len(), "✅ Query finished in {:.2?}", start.elapsed());
    Ok(rows)
}

/// All statements in one transaction. On failure the whole batch is reported.
#[instrument(skip(warehouse, statements), fields(statements = statements.len()))]
pub async fn execute_atomic(
    warehouse: &dyn Warehouse,
    table: &str,
    statements: &[String],
) -> Result<(), StarloadError> {
    let start = Instant::now();

    warehouse.execute_atomic(statements).await.map_err(|e| {
        error!("❌ Transaction rolled back after {:.2?}: {}", start.elapsed(), e);
        StarloadError::warehouse(table, statements.join(";\n"), e)
    })?;

    debug!("✅ Transaction committed in {:.2?}", start.elapsed());
    Ok(())
}

/// Catalog lookup in the warehouse's configured schema.
pub async fn table_exists(
    warehouse: &dyn Warehouse,
    table: &TableDescriptor,
) -> Result<bool, StarloadError> {
    let schema = warehouse.default_schema().to_string();
    warehouse
        .table_exists(&schema, table.name)
        .await
        .map_err(|e| StarloadError::warehouse(table.name, table_exists_query(&schema, table.name), e))
}
