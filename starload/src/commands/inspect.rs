// starload/src/commands/inspect.rs
//
// USE CASE: Inspect a DuckDB table (schema + sample rows).

use std::path::Path;

use starload_core::domain::compiler::Quoter;
use starload_core::infrastructure::adapters::DuckDbWarehouse;
use starload_core::ports::Warehouse;

use crate::commands::cell;

pub async fn execute(db_path: String, table: String, limit: usize) -> anyhow::Result<()> {
    if !Path::new(&db_path).exists() {
        anyhow::bail!(
            "❌ Database not found at: {}\n👉 Have you run 'starload run'?",
            db_path
        );
    }

    let warehouse = DuckDbWarehouse::new(&db_path)?;

    println!("\n🔍 Inspecting Table: '{}'", table);

    let columns = warehouse
        .query(&format!(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = {} ORDER BY ordinal_position",
            Quoter::literal(&table)
        ))
        .await?;
    if columns.is_empty() {
        anyhow::bail!("❌ Table '{}' not found in {}", table, db_path);
    }

    let described: Vec<String> = columns
        .iter()
        .map(|c| c.iter().map(cell).collect::<Vec<_>>().join(" "))
        .collect();
    println!("   Columns: [{}]", described.join(", "));
    println!("   --- Rows (Limit {}) ---", limit);

    let rows = warehouse
        .query(&format!(
            "SELECT * FROM {} LIMIT {}",
            Quoter::identifier(&table),
            limit
        ))
        .await?;
    for row in rows {
        let values: Vec<String> = row.iter().map(cell).collect();
        println!("   ➜ {}", values.join(" | "));
    }

    Ok(())
}
