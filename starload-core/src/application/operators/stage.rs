// starload-core/src/application/operators/stage.rs

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, instrument};

use crate::application::context::TaskContext;
use crate::application::engine;
use crate::application::operators::{Task, TaskKind, check_dialect};
use crate::domain::catalog::{Dialect, TableDefinition, TableId, TableRole};
use crate::domain::error::ConfigurationError;
use crate::domain::load::{LoadMode, LoadTaskRecord, ObjectStore, SourceFormat, SourceLocation};
use crate::error::StarloadError;
use crate::ports::bulk::BulkLoadRequest;

static BUCKET_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$"));
static REGION_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d+$"));

fn pattern(
    re: &'static LazyLock<Result<Regex, regex::Error>>,
) -> Result<&'static Regex, ConfigurationError> {
    LazyLock::force(re)
        .as_ref()
        .map_err(|e| ConfigurationError::Definition(format!("Invalid validation pattern: {}", e)))
}

/// Where the raw files live. `key` may hold `{{ placeholders }}`.
#[derive(Debug, Clone)]
pub struct StageSource {
    pub store: ObjectStore,
    pub bucket: String,
    pub key: String,
    /// `auto`, a JSONPaths file name relative to the bucket, or a full URI.
    pub format: Option<String>,
    pub iam_role: String,
    pub region: String,
}

/// Recreates a staging table and bulk-loads every object under the key.
pub struct StageLoader {
    id: String,
    table: TableDefinition,
    source: StageSource,
    dialect: Dialect,
}

impl StageLoader {
    pub fn new(
        id: impl Into<String>,
        table: &str,
        source: StageSource,
        dialect: Dialect,
    ) -> Result<Self, ConfigurationError> {
        let target = TableId::resolve(table, TableRole::Staging)?;
        validate_source(target, &source)?;

        Ok(Self {
            id: id.into(),
            table: TableDefinition::lookup(target, dialect),
            source,
            dialect,
        })
    }

    fn location(&self, key: String) -> SourceLocation {
        SourceLocation {
            store: self.source.store,
            bucket: self.source.bucket.clone(),
            key,
        }
    }
}

fn validate_source(table: TableId, source: &StageSource) -> Result<(), ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidSource {
        table: table.name().to_string(),
        reason,
    };

    if source.key.trim().is_empty() {
        return Err(invalid("key is empty".into()));
    }

    match source.store {
        ObjectStore::Local => {
            if source.bucket.trim().is_empty() {
                return Err(invalid("local bucket directory is empty".into()));
            }
        }
        ObjectStore::S3 => {
            if !pattern(&BUCKET_RE)?.is_match(&source.bucket) {
                return Err(invalid(format!("'{}' is not a valid bucket name", source.bucket)));
            }
            if !pattern(&REGION_RE)?.is_match(&source.region) {
                return Err(invalid(format!("'{}' is not a valid region", source.region)));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Task for StageLoader {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Stage
    }

    fn target(&self) -> Option<TableId> {
        Some(self.table.descriptor.id)
    }

    fn describe(&self) -> Option<LoadTaskRecord> {
        let format = self.source.format.as_deref().unwrap_or("auto");
        Some(LoadTaskRecord {
            target: self.table.descriptor.id,
            source: format!("{} (format: {})", self.location(self.source.key.clone()).uri(), format),
            mode: LoadMode::TruncateAndReplace,
        })
    }

    #[instrument(skip(self, ctx), fields(task = %self.id, table = self.table.name()))]
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<(), StarloadError> {
        check_dialect(ctx, &self.id, self.dialect)?;

        // Placeholders first: nothing touches the warehouse if the key is bad
        let key = ctx
            .renderer
            .render(&self.source.key, &ctx.run.template_values())?;
        let location = self.location(key);
        let format = SourceFormat::resolve(self.source.format.as_deref(), &location);

        let table = self.table.name();
        info!("Recreating staging table");
        engine::execute_statement(ctx.warehouse, table, &self.table.descriptor.drop_statement())
            .await?;
        engine::execute_statement(ctx.warehouse, table, &self.table.create_sql).await?;

        let request = BulkLoadRequest {
            table: self.table.descriptor,
            location: &location,
            credentials: &self.source.iam_role,
            format: &format,
            region: &self.source.region,
        };
        info!(source = %location.uri(), format = %format, "Bulk loading");
        ctx.bulk_source
            .bulk_load(&request)
            .await
            .map_err(|e| StarloadError::warehouse(table, ctx.bulk_source.render(&request), e))?;

        info!("✅ Staging complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::RunContext;
    use crate::application::operators::testing::{
        RecordingBulkSource, RecordingWarehouse, context,
    };
    use crate::infrastructure::compiler::JinjaRenderer;
    use anyhow::Result;
    use chrono::TimeZone;

    fn s3_source(key: &str) -> StageSource {
        StageSource {
            store: ObjectStore::S3,
            bucket: "udacity-dend".into(),
            key: key.into(),
            format: Some("log_json_path.json".into()),
            iam_role: "arn:aws:iam::123:role/dwh".into(),
            region: "us-west-2".into(),
        }
    }

    fn run_context() -> Result<RunContext> {
        let date = chrono::Utc
            .with_ymd_and_hms(2018, 11, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("bad date"))?;
        Ok(RunContext::new(date))
    }

    #[test]
    fn test_rejects_non_staging_table() {
        let result = StageLoader::new("s", "songplay", s3_source("log_data"), Dialect::Redshift);
        assert!(matches!(result, Err(ConfigurationError::UnknownTable { .. })));
    }

    #[test]
    fn test_rejects_bad_bucket_and_region() {
        let mut source = s3_source("log_data");
        source.bucket = "Not_A_Bucket".into();
        assert!(matches!(
            StageLoader::new("s", "staging_events", source, Dialect::Redshift),
            Err(ConfigurationError::InvalidSource { .. })
        ));

        let mut source = s3_source("log_data");
        source.region = "west".into();
        assert!(matches!(
            StageLoader::new("s", "staging_events", source, Dialect::Redshift),
            Err(ConfigurationError::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_validation_patterns() -> Result<()> {
        let bucket = pattern(&BUCKET_RE)?;
        assert!(bucket.is_match("udacity-dend"));
        assert!(bucket.is_match("sparkify.lake-01"));
        assert!(!bucket.is_match("-leading-dash"));

        let region = pattern(&REGION_RE)?;
        assert!(region.is_match("us-west-2"));
        assert!(region.is_match("ap-southeast-1"));
        assert!(!region.is_match("local"));
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_create_then_load() -> Result<()> {
        let loader = StageLoader::new(
            "Stage_events",
            "staging_events",
            s3_source("log_data/{{ year }}/{{ month }}"),
            Dialect::Redshift,
        )?;

        let wh = RecordingWarehouse::new(Dialect::Redshift);
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = run_context()?;

        loader.run(&context(&wh, &bulk, &renderer, &run)).await?;

        let statements = wh.statements();
        assert_eq!(statements[0], "DROP TABLE IF EXISTS \"staging_events\"");
        assert!(statements[1].starts_with("CREATE TABLE \"staging_events\""));
        assert_eq!(statements.len(), 2);

        let loads = bulk.log.lock().map(|l| l.clone()).unwrap_or_default();
        assert_eq!(
            loads,
            vec![
                "LOAD staging_events FROM s3://udacity-dend/log_data/2018/11 \
                 FORMAT s3://udacity-dend/log_json_path.json"
                    .to_string()
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unresolved_placeholder_touches_nothing() -> Result<()> {
        let loader = StageLoader::new(
            "Stage_events",
            "staging_events",
            s3_source("log_data/{{ partition }}"),
            Dialect::Redshift,
        )?;

        let wh = RecordingWarehouse::new(Dialect::Redshift);
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = run_context()?;

        let result = loader.run(&context(&wh, &bulk, &renderer, &run)).await;
        assert!(matches!(
            result,
            Err(StarloadError::Configuration(
                ConfigurationError::UnresolvedPlaceholder { .. }
            ))
        ));
        assert!(wh.statements().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_failure_aborts_before_load() -> Result<()> {
        let loader = StageLoader::new(
            "Stage_songs",
            "staging_songs",
            s3_source("song_data"),
            Dialect::Redshift,
        )?;

        let mut wh = RecordingWarehouse::new(Dialect::Redshift);
        wh.fail_on = Some("CREATE TABLE");
        let bulk = RecordingBulkSource::default();
        let renderer = JinjaRenderer::new();
        let run = run_context()?;

        let err = loader
            .run(&context(&wh, &bulk, &renderer, &run))
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected failure"))?;
        assert!(err.is_retryable());
        assert!(bulk.log.lock().map(|l| l.is_empty()).unwrap_or(false));
        Ok(())
    }
}
