// starload/src/commands/check.rs
//
// USE CASE: Validate the pipeline definition (construction only, no warehouse).

use std::path::PathBuf;

use starload_core::application::build_pipeline;

use crate::commands::load_config;

pub fn execute(config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config)?;

    match build_pipeline(&config, config.warehouse.engine) {
        Ok(pipeline) => {
            println!(
                "✅ {} tasks valid in {} layers",
                pipeline.len(),
                pipeline.graph().layers().len()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    }
}
