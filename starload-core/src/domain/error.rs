// starload-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::catalog::TableRole;
use crate::domain::scalar::Scalar;

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigurationError {
    #[error("Unknown {role} table: '{table}'")]
    #[diagnostic(
        code(starload::config::unknown_table),
        help("Known tables: staging_events, staging_songs, songplay, user_info, song, artist, time.")
    )]
    UnknownTable { table: String, role: TableRole },

    #[error("The number of SQL queries ({queries}) must match the number of expected results ({expected}).")]
    #[diagnostic(code(starload::config::check_count))]
    CheckCountMismatch { queries: usize, expected: usize },

    #[error("Unresolved placeholder in '{pattern}': {detail}")]
    #[diagnostic(
        code(starload::config::placeholder),
        help("Placeholders are resolved from the run context (ds, ds_nodash, year, month, day, hour, ts, vars).")
    )]
    UnresolvedPlaceholder { pattern: String, detail: String },

    #[error("Malformed template '{pattern}': {detail}")]
    #[diagnostic(code(starload::config::template))]
    InvalidTemplate { pattern: String, detail: String },

    #[error("Invalid source for '{table}': {reason}")]
    #[diagnostic(code(starload::config::source))]
    InvalidSource { table: String, reason: String },

    #[error("Empty insert query for table '{0}'")]
    #[diagnostic(code(starload::config::empty_query))]
    EmptyQuery(String),

    #[error("Task '{0}' is declared more than once")]
    #[diagnostic(code(starload::config::duplicate_task))]
    DuplicateTask(String),

    #[error("Table '{table}' is targeted by concurrently runnable tasks ({first}, {second})")]
    #[diagnostic(
        code(starload::config::duplicate_target),
        help("Create/truncate/insert are not transactional across tasks; give each table a single loader.")
    )]
    DuplicateTarget {
        table: String,
        first: String,
        second: String,
    },

    #[error("Dependency references unknown task '{0}'")]
    #[diagnostic(code(starload::config::unknown_task))]
    UnknownTask(String),

    #[error("Circular dependency detected: {0}")]
    #[diagnostic(code(starload::config::cycle))]
    CircularDependency(String),

    #[error("Pipeline must have a single {end} sentinel, found: [{found}]")]
    #[diagnostic(code(starload::config::sentinel))]
    Sentinel { end: &'static str, found: String },

    #[error("Pipeline definition error: {0}")]
    #[diagnostic(code(starload::config::definition))]
    Definition(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum DataQualityError {
    #[error("Check produced no result. Query: {query}")]
    #[diagnostic(code(starload::quality::no_result))]
    NoResult { query: String },

    #[error("Check mismatch. Query: {query} Expected result: {expected} vs Actual result: {actual}")]
    #[diagnostic(code(starload::quality::mismatch))]
    Mismatch {
        query: String,
        expected: Scalar,
        actual: Scalar,
    },

    #[error("{} data quality checks failed", .failures.len())]
    #[diagnostic(code(starload::quality::several))]
    Several {
        #[related]
        failures: Vec<DataQualityError>,
    },
}

impl DataQualityError {
    /// The query text of the (first) failing check.
    pub fn query(&self) -> Option<&str> {
        match self {
            DataQualityError::NoResult { query } | DataQualityError::Mismatch { query, .. } => {
                Some(query)
            }
            DataQualityError::Several { failures } => failures.first().and_then(|e| e.query()),
        }
    }
}
