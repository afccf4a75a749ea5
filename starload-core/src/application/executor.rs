// starload-core/src/application/executor.rs

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{Instrument, error, info, info_span, warn};

use crate::application::context::TaskContext;
use crate::application::operators::Task;
use crate::application::pipeline::PipelineGraph;
use crate::domain::graph::NodeState;
use crate::error::StarloadError;
use crate::infrastructure::config::PipelineConfig;
use crate::infrastructure::report::write_run_report;

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub max_parallel: usize,
    /// Extra attempts after the first one, warehouse errors only.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_parallel: 4,
            retries: 3,
            retry_delay: Duration::from_secs(300),
        }
    }
}

impl From<&PipelineConfig> for ExecutorSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_parallel: config.max_parallel.max(1),
            retries: config.retry.retries,
            retry_delay: Duration::from_secs(config.retry.delay_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub id: String,
    pub state: NodeState,
    pub attempts: u32,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pipeline: String,
    /// Warehouse engine the run talked to.
    pub engine: String,
    pub execution_date: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub success: bool,
    pub tasks: Vec<TaskOutcome>,
}

impl RunReport {
    pub fn task(&self, id: &str) -> Option<&TaskOutcome> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn count(&self, state: NodeState) -> usize {
        self.tasks.iter().filter(|t| t.state == state).count()
    }
}

pub struct RunOutcome {
    pub report: RunReport,
    /// Final error of every failed task, in completion order.
    pub failures: Vec<(String, StarloadError)>,
}

struct Finished {
    node: usize,
    result: Result<(), StarloadError>,
    attempts: u32,
    elapsed: Duration,
}

/// Drives the graph once.
///
/// Every ready node runs concurrently up to `max_parallel`. A node becomes
/// ready when all of its upstream nodes succeeded, so everything downstream of
/// a failure stays pending while independent branches carry on.
pub async fn execute(
    pipeline: &PipelineGraph,
    ctx: &TaskContext<'_>,
    settings: &ExecutorSettings,
) -> RunOutcome {
    let graph = pipeline.graph();
    let started_at = Utc::now();
    let engine = ctx.warehouse.engine_name().to_string();
    info!(
        pipeline = pipeline.name(),
        engine = %engine,
        tasks = pipeline.len(),
        "🚀 Starting pipeline run"
    );

    let mut states = vec![NodeState::Pending; graph.len()];
    let mut outcomes: Vec<TaskOutcome> = (0..graph.len())
        .map(|node| TaskOutcome {
            id: graph.id(node).to_string(),
            state: NodeState::Pending,
            attempts: 0,
            duration_ms: 0,
            error_kind: None,
            error: None,
        })
        .collect();
    let mut waiting_on: Vec<usize> = (0..graph.len()).map(|n| graph.upstream(n).len()).collect();
    let mut ready: VecDeque<usize> = (0..graph.len()).filter(|&n| waiting_on[n] == 0).collect();
    let mut failures = Vec::new();

    let max_parallel = settings.max_parallel.max(1);
    let mut in_flight = FuturesUnordered::new();

    loop {
        while in_flight.len() < max_parallel {
            let Some(node) = ready.pop_front() else {
                break;
            };
            states[node] = NodeState::Running;
            in_flight.push(run_node(node, pipeline.task(node), ctx, settings));
        }

        let Some(finished) = in_flight.next().await else {
            break;
        };

        let node = finished.node;
        let outcome = &mut outcomes[node];
        outcome.attempts = finished.attempts;
        outcome.duration_ms = u64::try_from(finished.elapsed.as_millis()).unwrap_or(u64::MAX);

        match finished.result {
            Ok(()) => {
                states[node] = NodeState::Succeeded;
                for &next in graph.downstream(node) {
                    waiting_on[next] -= 1;
                    if waiting_on[next] == 0 {
                        ready.push_back(next);
                    }
                }
            }
            Err(e) => {
                states[node] = NodeState::Failed;
                error!(task = graph.id(node), kind = e.kind(), "❌ Task failed: {}", e);
                outcome.error_kind = Some(e.kind());
                outcome.error = Some(e.to_string());
                failures.push((graph.id(node).to_string(), e));
            }
        }
    }

    for (outcome, state) in outcomes.iter_mut().zip(&states) {
        outcome.state = *state;
    }
    let success = states.iter().all(|s| *s == NodeState::Succeeded);

    let report = RunReport {
        pipeline: pipeline.name().to_string(),
        engine,
        execution_date: ctx.run.execution_date,
        started_at,
        finished_at: Utc::now(),
        success,
        tasks: outcomes,
    };

    info!(
        success,
        succeeded = report.count(NodeState::Succeeded),
        failed = report.count(NodeState::Failed),
        pending = report.count(NodeState::Pending),
        "Pipeline run finished"
    );

    RunOutcome { report, failures }
}

/// Executes the graph and persists the report under `target_dir`.
pub async fn run_pipeline(
    pipeline: &PipelineGraph,
    ctx: &TaskContext<'_>,
    settings: &ExecutorSettings,
    target_dir: &Path,
) -> Result<RunOutcome, StarloadError> {
    let outcome = execute(pipeline, ctx, settings).await;
    write_run_report(target_dir, &outcome.report)?;
    Ok(outcome)
}

async fn run_node(
    node: usize,
    task: &dyn Task,
    ctx: &TaskContext<'_>,
    settings: &ExecutorSettings,
) -> Finished {
    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let span = info_span!("task", task = task.id(), kind = %task.kind(), attempt = attempts);
        let result = task.run(ctx).instrument(span).await;

        match result {
            Err(e) if e.is_retryable() && attempts <= settings.retries => {
                warn!(
                    task = task.id(),
                    attempt = attempts,
                    delay = ?settings.retry_delay,
                    "Retrying after warehouse error: {}",
                    e
                );
                tokio::time::sleep(settings.retry_delay).await;
            }
            result => {
                if result.is_ok() {
                    info!(task = task.id(), attempts, "✅ Task succeeded");
                }
                return Finished {
                    node,
                    result,
                    attempts,
                    elapsed: start.elapsed(),
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::RunContext;
    use crate::application::operators::testing::{
        RecordingBulkSource, RecordingWarehouse, context,
    };
    use crate::application::operators::{Marker, TaskKind};
    use crate::domain::catalog::Dialect;
    use crate::domain::error::ConfigurationError;
    use crate::infrastructure::compiler::JinjaRenderer;
    use crate::infrastructure::error::WarehouseError;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    enum Script {
        Succeed,
        FailWarehouse { times: u32 },
        FailConfiguration,
    }

    struct Scripted {
        id: &'static str,
        script: Script,
        calls: AtomicU32,
        order: std::sync::Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Task for Scripted {
        fn id(&self) -> &str {
            self.id
        }

        fn kind(&self) -> TaskKind {
            TaskKind::Dimension
        }

        async fn run(&self, _ctx: &TaskContext<'_>) -> Result<(), StarloadError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Ok(mut order) = self.order.lock() {
                order.push(self.id);
            }
            match self.script {
                Script::Succeed => Ok(()),
                Script::FailWarehouse { times } if call <= times => Err(StarloadError::warehouse(
                    self.id,
                    "SELECT 1",
                    WarehouseError::Unavailable("connection reset".into()),
                )),
                Script::FailWarehouse { .. } => Ok(()),
                Script::FailConfiguration => Err(ConfigurationError::EmptyQuery(self.id.into()).into()),
            }
        }
    }

    fn settings(retries: u32) -> ExecutorSettings {
        ExecutorSettings {
            max_parallel: 4,
            retries,
            retry_delay: Duration::ZERO,
        }
    }

    /// Begin -> a, b ; a -> a2 ; a2, b -> Stop
    fn diamond(
        a: Script,
        b: Script,
        order: &std::sync::Arc<Mutex<Vec<&'static str>>>,
    ) -> Result<PipelineGraph> {
        let scripted = |id, script| Scripted {
            id,
            script,
            calls: AtomicU32::new(0),
            order: order.clone(),
        };
        Ok(PipelineGraph::builder("diamond")
            .task(Marker::begin())
            .task(scripted("a", a))
            .task(scripted("a2", Script::Succeed))
            .task(scripted("b", b))
            .task(Marker::stop())
            .edge("Begin_execution", "a")
            .edge("Begin_execution", "b")
            .edge("a", "a2")
            .edge("a2", "Stop_execution")
            .edge("b", "Stop_execution")
            .build()?)
    }

    #[tokio::test]
    async fn test_all_succeed() -> Result<()> {
        let order = Default::default();
        let pipeline = diamond(Script::Succeed, Script::Succeed, &order)?;

        let wh = RecordingWarehouse::new(Dialect::DuckDb);
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(Utc::now());

        let outcome = execute(&pipeline, &context(&wh, &bulk, &renderer, &run), &settings(0)).await;
        assert!(outcome.report.success);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.report.count(NodeState::Succeeded), 5);

        let order = order.lock().map(|o| o.clone()).unwrap_or_default();
        let pos = |id| order.iter().position(|o| *o == id);
        assert!(pos("a") < pos("a2"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_leaves_downstream_pending() -> Result<()> {
        let order = Default::default();
        let pipeline = diamond(Script::FailConfiguration, Script::Succeed, &order)?;

        let wh = RecordingWarehouse::new(Dialect::DuckDb);
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(Utc::now());

        let outcome = execute(&pipeline, &context(&wh, &bulk, &renderer, &run), &settings(3)).await;
        let report = &outcome.report;
        assert!(!report.success);

        let state = |id| report.task(id).map(|t| t.state);
        assert_eq!(state("a"), Some(NodeState::Failed));
        assert_eq!(state("a2"), Some(NodeState::Pending));
        assert_eq!(state("b"), Some(NodeState::Succeeded));
        assert_eq!(state("Stop_execution"), Some(NodeState::Pending));

        // Configuration errors are final
        assert_eq!(report.task("a").map(|t| t.attempts), Some(1));
        assert_eq!(report.task("a").and_then(|t| t.error_kind), Some("configuration"));
        assert_eq!(outcome.failures.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_warehouse_errors_are_retried() -> Result<()> {
        let order = Default::default();
        let pipeline = diamond(Script::FailWarehouse { times: 2 }, Script::Succeed, &order)?;

        let wh = RecordingWarehouse::new(Dialect::DuckDb);
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(Utc::now());

        let outcome = execute(&pipeline, &context(&wh, &bulk, &renderer, &run), &settings(3)).await;
        assert!(outcome.report.success);
        assert_eq!(outcome.report.task("a").map(|t| t.attempts), Some(3));
        Ok(())
    }

    #[tokio::test]
    async fn test_retries_exhausted() -> Result<()> {
        let order = Default::default();
        let pipeline = diamond(Script::FailWarehouse { times: 10 }, Script::Succeed, &order)?;

        let wh = RecordingWarehouse::new(Dialect::DuckDb);
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(Utc::now());

        let outcome = execute(&pipeline, &context(&wh, &bulk, &renderer, &run), &settings(1)).await;
        let a = outcome
            .report
            .task("a")
            .ok_or_else(|| anyhow::anyhow!("missing task"))?;
        assert_eq!(a.state, NodeState::Failed);
        assert_eq!(a.attempts, 2);
        assert_eq!(a.error_kind, Some("warehouse"));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_written() -> Result<()> {
        let order = Default::default();
        let pipeline = diamond(Script::Succeed, Script::Succeed, &order)?;

        let wh = RecordingWarehouse::new(Dialect::DuckDb);
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(Utc::now());
        let dir = tempfile::tempdir()?;

        run_pipeline(
            &pipeline,
            &context(&wh, &bulk, &renderer, &run),
            &settings(0),
            dir.path(),
        )
        .await?;

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("run_results.json"))?)?;
        assert_eq!(json["pipeline"], "diamond");
        assert_eq!(json["engine"], "recording");
        assert_eq!(json["success"], true);
        assert_eq!(json["tasks"][0]["state"], "succeeded");
        Ok(())
    }
}
