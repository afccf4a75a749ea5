// starload-core/src/ports/bulk.rs

use async_trait::async_trait;

use crate::domain::catalog::TableDescriptor;
use crate::domain::load::{SourceFormat, SourceLocation};
use crate::infrastructure::error::WarehouseError;

/// Everything a bulk load needs. Placeholders are already resolved.
#[derive(Debug, Clone)]
pub struct BulkLoadRequest<'a> {
    pub table: &'static TableDescriptor,
    pub location: &'a SourceLocation,
    pub credentials: &'a str,
    pub format: &'a SourceFormat,
    pub region: &'a str,
}

/// Warehouse-native ingestion of many external files into one table.
#[async_trait]
pub trait BulkSource: Send + Sync {
    /// Human-readable command (e.g. the COPY statement) for logs and errors.
    fn render(&self, request: &BulkLoadRequest<'_>) -> String;

    async fn bulk_load(&self, request: &BulkLoadRequest<'_>) -> Result<(), WarehouseError>;
}
