// starload-core/src/application/operators/mod.rs

// The four task types of a star-schema load, plus the start/end markers.
// Construction validates everything that can be validated offline; `run`
// only talks to the warehouse.

pub mod dimension;
pub mod fact;
pub mod marker;
pub mod quality;
pub mod stage;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::application::context::TaskContext;
use crate::application::engine;
use crate::domain::catalog::{Dialect, TableDefinition, TableId};
use crate::domain::error::ConfigurationError;
use crate::domain::load::LoadTaskRecord;
use crate::error::StarloadError;

pub use dimension::DimensionLoader;
pub use fact::FactLoader;
pub use marker::Marker;
pub use quality::DataQualityChecker;
pub use stage::{StageLoader, StageSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Marker,
    Stage,
    Fact,
    Dimension,
    Quality,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Marker => write!(f, "marker"),
            TaskKind::Stage => write!(f, "stage"),
            TaskKind::Fact => write!(f, "fact"),
            TaskKind::Dimension => write!(f, "dimension"),
            TaskKind::Quality => write!(f, "quality"),
        }
    }
}

#[async_trait]
pub trait Task: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TaskKind;

    /// Table written by this task, if any.
    fn target(&self) -> Option<TableId> {
        None
    }

    /// Load record shown by `plan`. Markers and checks have none.
    fn describe(&self) -> Option<LoadTaskRecord> {
        None
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<(), StarloadError>;
}

/// CREATE the table unless the catalog already has it.
pub(crate) async fn ensure_table(
    ctx: &TaskContext<'_>,
    table: &TableDefinition,
) -> Result<(), StarloadError> {
    if engine::table_exists(ctx.warehouse, table.descriptor).await? {
        info!(table = table.name(), "Table already exists");
        return Ok(());
    }
    info!(table = table.name(), "Creating table");
    engine::execute_statement(ctx.warehouse, table.name(), &table.create_sql).await
}

/// Tasks render their SQL for one dialect at construction.
pub(crate) fn check_dialect(
    ctx: &TaskContext<'_>,
    task: &str,
    built_for: Dialect,
) -> Result<(), StarloadError> {
    let actual = ctx.warehouse.dialect();
    if actual != built_for {
        return Err(ConfigurationError::Definition(format!(
            "task '{}' was built for {} but the warehouse speaks {}",
            task, built_for, actual
        ))
        .into());
    }
    Ok(())
}

/// Clear and insert either as separate statements or in one transaction.
pub(crate) async fn apply(
    ctx: &TaskContext<'_>,
    table: &str,
    statements: Vec<String>,
    atomic: bool,
) -> Result<(), StarloadError> {
    if atomic {
        return engine::execute_atomic(ctx.warehouse, table, &statements).await;
    }
    for statement in &statements {
        engine::execute_statement(ctx.warehouse, table, statement).await?;
    }
    Ok(())
}

/// Default catalog SELECT unless a non-empty override is given.
pub(crate) fn insert_select(
    table: &TableDefinition,
    query: Option<String>,
) -> Result<String, ConfigurationError> {
    let select = match query {
        Some(q) => q,
        None => table.default_insert.unwrap_or_default().to_string(),
    };
    if select.trim().is_empty() {
        return Err(ConfigurationError::EmptyQuery(table.name().to_string()));
    }
    Ok(select)
}
