// starload/src/commands/plan.rs
//
// USE CASE: Show what a run would do, layer by layer.

use std::path::PathBuf;

use starload_core::application::build_pipeline;

use crate::cli::PlanFormat;
use crate::commands::load_config;

pub fn execute(config: Option<PathBuf>, format: PlanFormat) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let pipeline = match build_pipeline(&config, config.warehouse.engine) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    };

    if format == PlanFormat::Mermaid {
        println!("{}", pipeline.to_mermaid());
        return Ok(());
    }

    let mut current_layer = None;
    for task in pipeline.plan() {
        if current_layer != Some(task.layer) {
            println!("\n  🔹 Layer {}", task.layer + 1);
            current_layer = Some(task.layer);
        }
        match &task.record {
            Some(record) => {
                let source = record.source.lines().next().unwrap_or_default();
                println!(
                    "     ➜ {} [{}] -> {} ({}) from {}",
                    task.id, task.kind, record.target, record.mode, source
                );
            }
            None => println!("     ➜ {} [{}]", task.id, task.kind),
        }
    }
    Ok(())
}
