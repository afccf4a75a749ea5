// starload/src/commands/run.rs
//
// USE CASE: Run the pipeline once.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use starload_core::application::{
    ExecutorSettings, RunContext, TaskContext, build_pipeline, run_pipeline,
};
use starload_core::domain::graph::NodeState;
use starload_core::infrastructure::compiler::JinjaRenderer;

use crate::commands::{connect, load_config};

pub async fn execute(
    config: Option<PathBuf>,
    execution_date: Option<String>,
    vars: Vec<String>,
) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Load the definition and validate every task before connecting
    println!("⚙️  Loading configuration...");
    let config = load_config(config)?;
    let pipeline = match build_pipeline(&config, config.warehouse.engine) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    };

    let execution_date = match execution_date {
        Some(raw) => parse_execution_date(&raw)?,
        None => Utc::now(),
    };
    let mut template_vars = config.vars.clone();
    template_vars.extend(parse_vars(&vars)?);
    let run = RunContext::new(execution_date).with_vars(template_vars);
    info!(execution_date = %execution_date, "Run context ready");

    // B. Adapters
    let (warehouse, bulk_source) = connect(&config).await?;
    let renderer = JinjaRenderer::new();
    let ctx = TaskContext {
        warehouse: warehouse.as_ref(),
        bulk_source: bulk_source.as_ref(),
        renderer: &renderer,
        run: &run,
    };

    // C. Execute and persist the report
    println!("🟢 Processing Pipeline ({} tasks)...", pipeline.len());
    let settings = ExecutorSettings::from(&config);
    let target_dir = Path::new(&config.target_path);
    let outcome = run_pipeline(&pipeline, &ctx, &settings, target_dir)
        .await
        .context("Failed to persist the run report")?;

    for task in &outcome.report.tasks {
        let icon = match task.state {
            NodeState::Succeeded => "✅",
            NodeState::Failed => "❌",
            _ => "⏸️ ",
        };
        println!(
            "    {} {} ({}, {} attempt(s), {} ms)",
            icon, task.id, task.state, task.attempts, task.duration_ms
        );
    }

    if outcome.report.success {
        println!("\n✨ SUCCESS! Pipeline finished in {:.2?}", start.elapsed());
        Ok(())
    } else {
        for (task, error) in &outcome.failures {
            eprintln!("\n❌ {}: {}", task, error);
        }
        eprintln!(
            "\n❌ FAILURE. {} task(s) failed, {} never started.",
            outcome.report.count(NodeState::Failed),
            outcome.report.count(NodeState::Pending)
        );
        std::process::exit(1);
    }
}

/// RFC 3339, or a bare date taken as midnight UTC.
fn parse_execution_date(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid execution date '{}' (expected RFC 3339 or YYYY-MM-DD)", raw))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .with_context(|| format!("Invalid execution date '{}'", raw))?;
    Ok(midnight.and_utc())
}

fn parse_vars(raw: &[String]) -> anyhow::Result<BTreeMap<String, serde_json::Value>> {
    raw.iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Invalid --var '{}' (expected KEY=VALUE)", pair))?;
            Ok((key.trim().to_string(), serde_json::Value::String(value.to_string())))
        })
        .collect()
}
