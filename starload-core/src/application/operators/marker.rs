// starload-core/src/application/operators/marker.rs

use async_trait::async_trait;
use tracing::debug;

use crate::application::context::TaskContext;
use crate::application::operators::{Task, TaskKind};
use crate::error::StarloadError;

pub const BEGIN_EXECUTION: &str = "Begin_execution";
pub const STOP_EXECUTION: &str = "Stop_execution";

/// Start/end sentinel. Does nothing.
pub struct Marker {
    id: String,
}

impl Marker {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn begin() -> Self {
        Self::new(BEGIN_EXECUTION)
    }

    pub fn stop() -> Self {
        Self::new(STOP_EXECUTION)
    }
}

#[async_trait]
impl Task for Marker {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Marker
    }

    async fn run(&self, _ctx: &TaskContext<'_>) -> Result<(), StarloadError> {
        debug!(task = %self.id, "Marker reached");
        Ok(())
    }
}
