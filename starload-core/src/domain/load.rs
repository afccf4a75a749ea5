// starload-core/src/domain/load.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::domain::catalog::TableId;

/// How a loader treats rows already present in its target.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// DELETE every row, then insert.
    #[default]
    ReplaceAll,
    /// Never delete; rows accumulate across runs.
    AppendOnly,
    /// TRUNCATE (or DROP + CREATE for staging), then insert.
    TruncateAndReplace,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::ReplaceAll => write!(f, "replace-all"),
            LoadMode::AppendOnly => write!(f, "append-only"),
            LoadMode::TruncateAndReplace => write!(f, "truncate-and-replace"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObjectStore {
    #[default]
    S3,
    /// Bucket is a directory on the local filesystem.
    Local,
}

/// A fully resolved object-store path (placeholders already rendered).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub store: ObjectStore,
    pub bucket: String,
    pub key: String,
}

impl SourceLocation {
    pub fn uri(&self) -> String {
        self.sibling(&self.key)
    }

    /// Another object in the same bucket.
    pub fn sibling(&self, path: &str) -> String {
        let bucket = self.bucket.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        match self.store {
            ObjectStore::S3 => format!("s3://{}/{}", bucket, path),
            ObjectStore::Local => format!("{}/{}", bucket, path),
        }
    }
}

/// Column mapping used by the bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    /// Let the warehouse match object keys to column names.
    Auto,
    /// Explicit mapping file (JSONPaths), fully resolved.
    Explicit(String),
}

impl SourceFormat {
    /// `auto` or absent -> Auto. A URI or absolute path is kept as-is,
    /// anything else lives next to the source data in the same bucket.
    pub fn resolve(hint: Option<&str>, location: &SourceLocation) -> Self {
        match hint.map(str::trim) {
            None | Some("") => SourceFormat::Auto,
            Some(h) if h.eq_ignore_ascii_case("auto") => SourceFormat::Auto,
            Some(h) if h.contains("://") || Path::new(h).is_absolute() => {
                SourceFormat::Explicit(h.to_string())
            }
            Some(h) => SourceFormat::Explicit(location.sibling(h)),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Auto => write!(f, "auto"),
            SourceFormat::Explicit(path) => write!(f, "{}", path),
        }
    }
}

/// What a task loads, from where, and how. Used for plans and reports.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoadTaskRecord {
    pub target: TableId,
    pub source: String,
    pub mode: LoadMode,
}
