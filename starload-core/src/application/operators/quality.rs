// starload-core/src/application/operators/quality.rs

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{error, info, instrument};

use crate::application::context::TaskContext;
use crate::application::engine;
use crate::application::operators::{Task, TaskKind};
use crate::domain::Scalar;
use crate::domain::error::{ConfigurationError, DataQualityError};
use crate::domain::quality::QualityCheck;
use crate::error::StarloadError;

const CHECK_LABEL: &str = "data_quality";

/// Runs scalar queries and compares the first column of the first row with
/// the expected value.
pub struct DataQualityChecker {
    id: String,
    checks: Vec<QualityCheck>,
    parallel: bool,
}

impl DataQualityChecker {
    /// Queries and expectations pair up by position.
    pub fn new(
        id: impl Into<String>,
        queries: Vec<String>,
        expected: Vec<Scalar>,
    ) -> Result<Self, ConfigurationError> {
        if queries.len() != expected.len() {
            return Err(ConfigurationError::CheckCountMismatch {
                queries: queries.len(),
                expected: expected.len(),
            });
        }
        let checks = queries
            .into_iter()
            .zip(expected)
            .map(|(query, expected)| QualityCheck { query, expected })
            .collect();
        Ok(Self::from_checks(id, checks))
    }

    pub fn from_checks(id: impl Into<String>, checks: Vec<QualityCheck>) -> Self {
        Self {
            id: id.into(),
            checks,
            parallel: false,
        }
    }

    /// Run every check, then report all failures.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    async fn run_sequential(&self, ctx: &TaskContext<'_>) -> Result<(), StarloadError> {
        for check in &self.checks {
            run_check(ctx, check).await?;
        }
        Ok(())
    }

    async fn run_parallel(&self, ctx: &TaskContext<'_>) -> Result<(), StarloadError> {
        let results = join_all(self.checks.iter().map(|check| run_check(ctx, check))).await;
        let mut failures: Vec<StarloadError> = results.into_iter().filter_map(Result::err).collect();

        if failures.len() <= 1 {
            return failures.pop().map_or(Ok(()), Err);
        }

        // Several failures: surface the first warehouse error and log the
        // rest, or aggregate when they are all check failures
        match failures
            .iter()
            .position(|f| !matches!(f, StarloadError::DataQuality(_)))
        {
            Some(first) => {
                let reported = failures.remove(first);
                for other in &failures {
                    error!(error = %other, "Data quality check failed");
                }
                Err(reported)
            }
            None => {
                let failures = failures
                    .into_iter()
                    .filter_map(|f| match f {
                        StarloadError::DataQuality(e) => Some(e),
                        _ => None,
                    })
                    .collect();
                Err(DataQualityError::Several { failures }.into())
            }
        }
    }
}

async fn run_check(ctx: &TaskContext<'_>, check: &QualityCheck) -> Result<(), StarloadError> {
    let rows = engine::query_rows(ctx.warehouse, CHECK_LABEL, &check.query).await?;

    let actual = rows
        .first()
        .and_then(|row| row.first())
        .cloned()
        .ok_or_else(|| DataQualityError::NoResult {
            query: check.query.clone(),
        })?;

    if actual != check.expected {
        return Err(DataQualityError::Mismatch {
            query: check.query.clone(),
            expected: check.expected.clone(),
            actual,
        }
        .into());
    }

    info!(query = %check.query, result = %actual, "Data quality check passed");
    Ok(())
}

#[async_trait]
impl Task for DataQualityChecker {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Quality
    }

    #[instrument(skip(self, ctx), fields(task = %self.id, checks = self.checks.len(), parallel = self.parallel))]
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<(), StarloadError> {
        if self.parallel {
            self.run_parallel(ctx).await
        } else {
            self.run_sequential(ctx).await
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
    use crate::domain::catalog::Dialect;
    use crate::infrastructure::compiler::JinjaRenderer;
    use anyhow::Result;

    const NULL_USERS: &str = "SELECT COUNT(*) FROM user_info WHERE userid IS NULL";
    const NULL_SONGS: &str = "SELECT COUNT(*) FROM song WHERE song_id IS NULL";
    const EMPTY: &str = "SELECT userid FROM user_info WHERE 1 = 0";

    fn warehouse() -> RecordingWarehouse {
        let mut wh = RecordingWarehouse::new(Dialect::Redshift);
        wh.answers = vec![
            (NULL_USERS, vec![vec![Scalar::Int(1)]]),
            (NULL_SONGS, vec![vec![Scalar::Int(0)]]),
            (EMPTY, vec![]),
        ];
        wh
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let result = DataQualityChecker::new(
            "dq",
            vec![NULL_USERS.into(), NULL_SONGS.into()],
            vec![Scalar::Int(0)],
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::CheckCountMismatch {
                queries: 2,
                expected: 1
            })
        ));
    }

    #[tokio::test]
    async fn test_mismatch_names_query_and_values() -> Result<()> {
        let checker = DataQualityChecker::new(
            "dq",
            vec![NULL_SONGS.into(), NULL_USERS.into()],
            vec![Scalar::Int(0), Scalar::Int(0)],
        )?;
        let wh = warehouse();
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(chrono::Utc::now());

        let err = checker
            .run(&context(&wh, &bulk, &renderer, &run))
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected failure"))?;

        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            format!("Check mismatch. Query: {} Expected result: 0 vs Actual result: 1", NULL_USERS)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sequential_stops_at_first_failure() -> Result<()> {
        let checker = DataQualityChecker::new(
            "dq",
            vec![EMPTY.into(), NULL_SONGS.into()],
            vec![Scalar::Int(0), Scalar::Int(0)],
        )?;
        let wh = warehouse();
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(chrono::Utc::now());

        let result = checker.run(&context(&wh, &bulk, &renderer, &run)).await;
        assert!(matches!(
            result,
            Err(StarloadError::DataQuality(DataQualityError::NoResult { .. }))
        ));
        assert_eq!(wh.statements(), vec![EMPTY.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_parallel_runs_every_check() -> Result<()> {
        let checker = DataQualityChecker::new(
            "dq",
            vec![EMPTY.into(), NULL_SONGS.into(), NULL_USERS.into()],
            vec![Scalar::Int(0), Scalar::Int(0), Scalar::Int(0)],
        )?
        .parallel(true);
        let wh = warehouse();
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(chrono::Utc::now());

        let result = checker.run(&context(&wh, &bulk, &renderer, &run)).await;
        assert_eq!(wh.statements().len(), 3);

        match result {
            Err(StarloadError::DataQuality(DataQualityError::Several { failures })) => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].query(), Some(EMPTY));
                assert_eq!(failures[1].query(), Some(NULL_USERS));
            }
            other => panic!("unexpected result: {:?}", other.err()),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_parallel_warehouse_error_wins() -> Result<()> {
        let checker = DataQualityChecker::new(
            "dq",
            vec![NULL_USERS.into(), NULL_SONGS.into(), EMPTY.into()],
            vec![Scalar::Int(0), Scalar::Int(0), Scalar::Int(0)],
        )?
        .parallel(true);
        let mut wh = warehouse();
        wh.fail_on = Some(NULL_SONGS);
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(chrono::Utc::now());

        let result = checker.run(&context(&wh, &bulk, &renderer, &run)).await;
        assert_eq!(wh.statements().len(), 3);

        let err = result.err().ok_or_else(|| anyhow::anyhow!("expected failure"))?;
        assert!(err.is_retryable());
        match err {
            StarloadError::Warehouse { table, statement, .. } => {
                assert_eq!(table, CHECK_LABEL);
                assert_eq!(statement, NULL_SONGS);
            }
            other => panic!("unexpected error: {}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_all_pass() -> Result<()> {
        let checker = DataQualityChecker::from_checks(
            "dq",
            vec![QualityCheck::new(NULL_SONGS, 0.0)],
        );
        let wh = warehouse();
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = RunContext::new(chrono::Utc::now());

        checker.run(&context(&wh, &bulk, &renderer, &run)).await?;
        Ok(())
    }
}
