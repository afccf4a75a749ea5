// starload-core/src/ports/warehouse.rs

// What the tasks need from a warehouse, without knowing which one it is.

use async_trait::async_trait;

use crate::domain::Scalar;
use crate::domain::catalog::Dialect;
use crate::domain::compiler::Quoter;
use crate::infrastructure::error::WarehouseError;

/// One result row, columns in SELECT order.
pub type Row = Vec<Scalar>;

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Runs a statement and discards any result.
    async fn execute(&self, statement: &str) -> Result<(), WarehouseError>;

    /// Runs a query and returns every row.
    async fn query(&self, statement: &str) -> Result<Vec<Row>, WarehouseError>;

    /// Runs all statements in one transaction: all of them or none.
    async fn execute_atomic(&self, statements: &[String]) -> Result<(), WarehouseError>;

    /// Catalog lookup through `information_schema`.
    async fn table_exists(&self, schema: &str, name: &str) -> Result<bool, WarehouseError> {
        let rows = self.query(&table_exists_query(schema, name)).await?;
        Ok(!rows.is_empty())
    }

    fn dialect(&self) -> Dialect;

    /// Schema holding the pipeline tables.
    fn default_schema(&self) -> &str {
        self.dialect().default_schema()
    }

    fn engine_name(&self) -> &str;
}

pub fn table_exists_query(schema: &str, name: &str) -> String {
    format!(
        "SELECT 1 FROM information_schema.tables WHERE table_schema = {} AND table_name = {}",
        Quoter::literal(schema),
        Quoter::literal(name)
    )
}
