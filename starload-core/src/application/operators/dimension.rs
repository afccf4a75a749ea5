// starload-core/src/application/operators/dimension.rs

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::application::context::TaskContext;
use crate::application::operators::{Task, TaskKind, apply, check_dialect, ensure_table, insert_select};
use crate::domain::catalog::{Dialect, TableDefinition, TableId, TableRole};
use crate::domain::error::ConfigurationError;
use crate::domain::load::{LoadMode, LoadTaskRecord};
use crate::error::StarloadError;

/// Materialises one dimension table from staging or fact data.
pub struct DimensionLoader {
    id: String,
    table: TableDefinition,
    select: String,
    truncate: bool,
    atomic: bool,
    dialect: Dialect,
}

impl DimensionLoader {
    pub fn new(
        id: impl Into<String>,
        table: &str,
        query: Option<String>,
        truncate: bool,
        dialect: Dialect,
    ) -> Result<Self, ConfigurationError> {
        let target = TableId::resolve(table, TableRole::Dimension)?;
        let definition = TableDefinition::lookup(target, dialect);
        let select = insert_select(&definition, query)?;

        Ok(Self {
            id: id.into(),
            table: definition,
            select,
            truncate,
            atomic: false,
            dialect,
        })
    }

    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn statements(&self) -> Vec<String> {
        let table = self.table.descriptor.quoted_name();
        let mut statements = Vec::with_capacity(2);
        if self.truncate {
            statements.push(if self.atomic && !self.dialect.truncate_is_transactional() {
                format!("DELETE FROM {}", table)
            } else {
                format!("TRUNCATE TABLE {}", table)
            });
        }
        statements.push(format!("INSERT INTO {}\n{}", table, self.select));
        statements
    }

    fn mode(&self) -> LoadMode {
        if self.truncate {
            LoadMode::TruncateAndReplace
        } else {
            LoadMode::AppendOnly
        }
    }
}

#[async_trait]
impl Task for DimensionLoader {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Dimension
    }

    fn target(&self) -> Option<TableId> {
        Some(self.table.descriptor.id)
    }

    fn describe(&self) -> Option<LoadTaskRecord> {
        Some(LoadTaskRecord {
            target: self.table.descriptor.id,
            source: self.select.trim().to_string(),
            mode: self.mode(),
        })
    }

    #[instrument(skip(self, ctx), fields(task = %self.id, table = self.table.name(), truncate = self.truncate))]
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<(), StarloadError> {
        check_dialect(ctx, &self.id, self.dialect)?;
        ensure_table(ctx, &self.table).await?;

        info!(atomic = self.atomic, "Loading dimension table");
        apply(ctx, self.table.name(), self.statements(), self.atomic).await?;

        info!("✅ Dimension table loaded");
        Ok(())
    }
}
