// starload/src/commands/query.rs
//
// USE CASE: Execute a raw SQL query (ad-hoc) against the configured warehouse.

use std::path::PathBuf;

use starload_core::application::engine::query_rows;

use crate::commands::{cell, connect, load_config};

pub async fn execute(query: String, config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let (warehouse, _) = connect(&config).await?;

    let rows = match query_rows(warehouse.as_ref(), "ad-hoc", &query).await {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("❌ Query failed: {}", e);
            std::process::exit(1);
        }
    };

    for row in &rows {
        let values: Vec<String> = row.iter().map(cell).collect();
        println!("   ➜ {}", values.join(" | "));
    }
    println!("   ({} rows)", rows.len());
    Ok(())
}
