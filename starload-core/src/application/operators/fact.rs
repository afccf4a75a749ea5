// starload-core/src/application/operators/fact.rs

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::application::context::TaskContext;
use crate::application::operators::{Task, TaskKind, apply, check_dialect, ensure_table, insert_select};
use crate::domain::catalog::{Dialect, TableDefinition, TableId, TableRole};
use crate::domain::error::ConfigurationError;
use crate::domain::load::{LoadMode, LoadTaskRecord};
use crate::error::StarloadError;

/// Materialises the fact table from staging data.
pub struct FactLoader {
    id: String,
    table: TableDefinition,
    select: String,
    mode: LoadMode,
    atomic: bool,
    dialect: Dialect,
}

impl FactLoader {
    pub fn new(
        id: impl Into<String>,
        table: &str,
        query: Option<String>,
        mode: LoadMode,
        dialect: Dialect,
    ) -> Result<Self, ConfigurationError> {
        let target = TableId::resolve(table, TableRole::Fact)?;
        if mode == LoadMode::TruncateAndReplace {
            return Err(ConfigurationError::Definition(format!(
                "fact table '{}' supports replace_all or append_only, not {}",
                table, mode
            )));
        }
        let definition = TableDefinition::lookup(target, dialect);
        let select = insert_select(&definition, query)?;

        Ok(Self {
            id: id.into(),
            table: definition,
            select,
            mode,
            atomic: false,
            dialect,
        })
    }

    /// Clear and insert in one transaction.
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Statements issued after the existence check, in order.
    pub fn statements(&self) -> Vec<String> {
        let table = self.table.descriptor.quoted_name();
        let mut statements = Vec::with_capacity(2);
        if self.mode == LoadMode::ReplaceAll {
            statements.push(format!("DELETE FROM {}", table));
        }
        statements.push(format!("INSERT INTO {}\n{}", table, self.select));
        statements
    }
}

#[async_trait]
impl Task for FactLoader {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Fact
    }

    fn target(&self) -> Option<TableId> {
        Some(self.table.descriptor.id)
    }

    fn describe(&self) -> Option<LoadTaskRecord> {
        Some(LoadTaskRecord {
            target: self.table.descriptor.id,
            source: self.select.trim().to_string(),
            mode: self.mode,
        })
    }

    #[instrument(skip(self, ctx), fields(task = %self.id, table = self.table.name(), mode = %self.mode))]
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<(), StarloadError> {
        check_dialect(ctx, &self.id, self.dialect)?;
        ensure_table(ctx, &self.table).await?;

        info!(atomic = self.atomic, "Loading fact table");
        apply(ctx, self.table.name(), self.statements(), self.atomic).await?;

        info!("✅ Fact table loaded");
        Ok(())
    }
}
