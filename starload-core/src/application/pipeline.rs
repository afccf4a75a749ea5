// starload-core/src/application/pipeline.rs

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::info;

use crate::application::operators::marker::{BEGIN_EXECUTION, STOP_EXECUTION};
use crate::application::operators::{
    DataQualityChecker, DimensionLoader, FactLoader, Marker, StageLoader, StageSource, Task,
    TaskKind,
};
use crate::domain::catalog::{Dialect, TableId};
use crate::domain::error::ConfigurationError;
use crate::domain::graph::DependencyGraph;
use crate::domain::load::LoadTaskRecord;
use crate::infrastructure::config::PipelineConfig;

/// Validated task instances plus their dependency structure.
pub struct PipelineGraph {
    name: String,
    tasks: Vec<Box<dyn Task>>,
    graph: DependencyGraph,
}

/// One row of `plan` output.
#[derive(Debug, Serialize)]
pub struct PlannedTask {
    pub id: String,
    pub kind: TaskKind,
    pub layer: usize,
    pub upstream: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<LoadTaskRecord>,
}

impl PipelineGraph {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            tasks: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task at a graph node index.
    pub fn task(&self, node: usize) -> &dyn Task {
        self.tasks[node].as_ref()
    }

    pub fn to_mermaid(&self) -> String {
        self.graph.to_mermaid()
    }

    pub fn plan(&self) -> Vec<PlannedTask> {
        let mut planned = Vec::with_capacity(self.tasks.len());
        for (layer, nodes) in self.graph.layers().iter().enumerate() {
            for &node in nodes {
                let task = self.task(node);
                planned.push(PlannedTask {
                    id: task.id().to_string(),
                    kind: task.kind(),
                    layer,
                    upstream: self
                        .graph
                        .upstream(node)
                        .iter()
                        .map(|&u| self.graph.id(u).to_string())
                        .collect(),
                    record: task.describe(),
                });
            }
        }
        planned
    }
}

pub struct PipelineBuilder {
    name: String,
    tasks: Vec<Box<dyn Task>>,
    edges: Vec<(String, String)>,
}

impl PipelineBuilder {
    pub fn task(mut self, task: impl Task + 'static) -> Self {
        self.tasks.push(Box::new(task));
        self
    }

    /// `to` waits for `from`.
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    pub fn build(self) -> Result<PipelineGraph, ConfigurationError> {
        let ids = self.tasks.iter().map(|t| t.id().to_string()).collect();
        let graph = DependencyGraph::build(ids, &self.edges)?;
        check_targets(&graph, &self.tasks)?;

        info!(
            pipeline = %self.name,
            tasks = graph.len(),
            layers = graph.layers().len(),
            "Pipeline graph validated"
        );
        Ok(PipelineGraph {
            name: self.name,
            tasks: self.tasks,
            graph,
        })
    }
}

/// Two tasks writing the same table must be ordered by the graph.
fn check_targets(graph: &DependencyGraph, tasks: &[Box<dyn Task>]) -> Result<(), ConfigurationError> {
    let mut writers: HashMap<TableId, Vec<usize>> = HashMap::new();
    for (node, task) in tasks.iter().enumerate() {
        if let Some(table) = task.target() {
            writers.entry(table).or_default().push(node);
        }
    }

    for (table, nodes) in writers {
        for (i, &a) in nodes.iter().enumerate() {
            for &b in &nodes[i + 1..] {
                if !reaches(graph, a, b) && !reaches(graph, b, a) {
                    return Err(ConfigurationError::DuplicateTarget {
                        table: table.name().to_string(),
                        first: graph.id(a).to_string(),
                        second: graph.id(b).to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn reaches(graph: &DependencyGraph, from: usize, to: usize) -> bool {
    let mut seen = vec![false; graph.len()];
    let mut queue = VecDeque::from([from]);
    while let Some(node) = queue.pop_front() {
        if node == to {
            return true;
        }
        for &next in graph.downstream(node) {
            if !seen[next] {
                seen[next] = true;
                queue.push_back(next);
            }
        }
    }
    false
}

// --- FIXED TOPOLOGY ---

fn default_stage_id(table: &str) -> String {
    format!("Stage_{}", table.trim_start_matches("staging_"))
}

const STAGING_TABLES: [TableId; 2] = [TableId::StagingEvents, TableId::StagingSongs];
const DIMENSION_TABLES: [TableId; 4] = [
    TableId::UserInfo,
    TableId::Song,
    TableId::Artist,
    TableId::Time,
];

/// Every table of `required` must be loaded by some task of the stage.
fn require_tables(
    stage: &str,
    required: &[TableId],
    loaded: &[TableId],
) -> Result<(), ConfigurationError> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|t| !loaded.contains(t))
        .map(|t| t.name())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(ConfigurationError::Definition(format!(
        "{} must load every table, missing: [{}]",
        stage,
        missing.join(", ")
    )))
}

/// Begin -> stage loaders -> fact loader -> dimension loaders -> checks -> Stop.
///
/// Both staging tables, all four dimensions and at least one check are
/// mandatory.
pub fn build_pipeline(
    config: &PipelineConfig,
    dialect: Dialect,
) -> Result<PipelineGraph, ConfigurationError> {
    let mut builder = PipelineGraph::builder(&config.name).task(Marker::begin());
    let mut previous: Vec<String> = vec![BEGIN_EXECUTION.to_string()];

    // 1. Staging
    let mut current = Vec::new();
    let mut staged = Vec::new();
    for stage in &config.staging {
        let id = stage
            .task_id
            .clone()
            .unwrap_or_else(|| default_stage_id(&stage.table));
        let source = StageSource {
            store: stage.store,
            bucket: stage.bucket.clone(),
            key: stage.key.clone(),
            format: stage.format.clone(),
            iam_role: stage.iam_role.clone(),
            region: stage.region.clone(),
        };
        let loader = StageLoader::new(id.clone(), &stage.table, source, dialect)?;
        staged.extend(loader.target());
        builder = builder.task(loader);
        current.push(id);
    }
    require_tables("staging", &STAGING_TABLES, &staged)?;
    builder = link(builder, &previous, &current);
    previous = current;

    // 2. Fact
    let fact = &config.fact;
    let fact_id = fact
        .task_id
        .clone()
        .unwrap_or_else(|| format!("Load_{}_fact_table", fact.table));
    let loader = FactLoader::new(fact_id.clone(), &fact.table, fact.query.clone(), fact.mode, dialect)?
        .atomic(fact.atomic);
    builder = link(builder.task(loader), &previous, std::slice::from_ref(&fact_id));
    previous = vec![fact_id];

    // 3. Dimensions
    let mut current = Vec::new();
    let mut loaded = Vec::new();
    for dim in &config.dimensions {
        let id = dim
            .task_id
            .clone()
            .unwrap_or_else(|| format!("Load_{}_dim_table", dim.table));
        let loader = DimensionLoader::new(id.clone(), &dim.table, dim.query.clone(), dim.truncate, dialect)?
            .atomic(dim.atomic);
        loaded.extend(loader.target());
        builder = builder.task(loader);
        current.push(id);
    }
    require_tables("dimensions", &DIMENSION_TABLES, &loaded)?;
    builder = link(builder, &previous, &current);
    previous = current;

    // 4. Checks, the only way into Stop
    let quality = config.quality.as_ref().ok_or_else(|| {
        ConfigurationError::Definition("quality: at least one data quality check is required".into())
    })?;
    if quality.sql_queries.is_empty() {
        return Err(ConfigurationError::Definition(
            "quality.sql_queries must not be empty".into(),
        ));
    }
    let id = quality
        .task_id
        .clone()
        .unwrap_or_else(|| "Run_data_quality_checks".to_string());
    let checker = DataQualityChecker::new(
        id.clone(),
        quality.sql_queries.clone(),
        quality.expected_results.clone(),
    )?
    .parallel(quality.parallel);
    builder = link(builder.task(checker), &previous, std::slice::from_ref(&id));
    previous = vec![id];

    builder = link(
        builder.task(Marker::stop()),
        &previous,
        &[STOP_EXECUTION.to_string()],
    );
    builder.build()
}

fn link(mut builder: PipelineBuilder, from: &[String], to: &[String]) -> PipelineBuilder {
    for f in from {
        for t in to {
            builder = builder.edge(f.clone(), t.clone());
        }
    }
    builder
}
