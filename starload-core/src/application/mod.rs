// starload-core/src/application/mod.rs

pub mod context;
pub mod engine;
pub mod executor;
pub mod operators;
pub mod pipeline;
pub mod ports;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Lets the CLI write `use starload_core::application::{build_pipeline, run_pipeline}`.

pub use context::{RunContext, TaskContext};
pub use executor::{ExecutorSettings, RunOutcome, RunReport, TaskOutcome, execute, run_pipeline};
pub use operators::{Task, TaskKind};
pub use pipeline::{PipelineGraph, PlannedTask, build_pipeline};
