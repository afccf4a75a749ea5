// starload-core/src/infrastructure/adapters/copy.rs

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::compiler::Quoter;
use crate::domain::load::SourceFormat;
use crate::infrastructure::error::WarehouseError;
use crate::ports::bulk::{BulkLoadRequest, BulkSource};
use crate::ports::warehouse::Warehouse;

/// Bulk load through Redshift `COPY ... FORMAT AS JSON`.
pub struct CopyCommandLoader {
    warehouse: Arc<dyn Warehouse>,
}

impl CopyCommandLoader {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self { warehouse }
    }
}

#[async_trait]
impl BulkSource for CopyCommandLoader {
    fn render(&self, request: &BulkLoadRequest<'_>) -> String {
        let format = match request.format {
            SourceFormat::Auto => "auto".to_string(),
            SourceFormat::Explicit(path) => path.clone(),
        };
        format!(
            "COPY {}\nFROM {}\nCREDENTIALS {}\nFORMAT AS JSON {}\nREGION {}\nACCEPTINVCHARS AS '?'",
            request.table.quoted_name(),
            Quoter::literal(&request.location.uri()),
            Quoter::literal(&format!("aws_iam_role={}", request.credentials)),
            Quoter::literal(&format),
            Quoter::literal(request.region),
        )
    }

    async fn bulk_load(&self, request: &BulkLoadRequest<'_>) -> Result<(), WarehouseError> {
        self.warehouse.execute(&self.render(request)).await
    }
}
