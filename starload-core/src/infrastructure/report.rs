// starload-core/src/infrastructure/report.rs

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::infrastructure::error::InfrastructureError;

pub const RUN_RESULTS_FILE: &str = "run_results.json";

/// Serialises a run report to `<target_dir>/run_results.json`.
///
/// The file is written next to its final location and renamed into place, so a
/// reader never sees a half-written report from a crashed run.
pub fn write_run_report<T: Serialize>(
    target_dir: &Path,
    report: &T,
) -> Result<PathBuf, InfrastructureError> {
    std::fs::create_dir_all(target_dir)?;
    let path = target_dir.join(RUN_RESULTS_FILE);

    let json = serde_json::to_vec_pretty(report)?;
    let mut staged = tempfile::NamedTempFile::new_in(target_dir)?;
    staged.write_all(&json)?;
    staged
        .persist(&path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    info!(path = ?path, "Run report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn test_report_written_and_replaced() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("target");

        let path = write_run_report(&target, &json!({ "success": false }))?;
        assert_eq!(path, target.join("run_results.json"));

        write_run_report(&target, &json!({ "success": true }))?;
        let content: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(content["success"], json!(true));

        // No temp files left behind
        assert_eq!(std::fs::read_dir(&target)?.count(), 1);
        Ok(())
    }
}
