// starload-core/src/application/context.rs

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::application::ports::TemplateEngine;
use crate::ports::{BulkSource, Warehouse};

/// Per-run values: the logical execution time and user variables.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub execution_date: DateTime<Utc>,
    pub vars: BTreeMap<String, Value>,
}

impl RunContext {
    pub fn new(execution_date: DateTime<Utc>) -> Self {
        Self {
            execution_date,
            vars: BTreeMap::new(),
        }
    }

    pub fn with_vars(mut self, vars: BTreeMap<String, Value>) -> Self {
        self.vars.extend(vars);
        self
    }

    /// Values visible to key templates.
    ///
    /// User variables are available both top-level and under `vars`; the
    /// built-in date values win on a name clash.
    pub fn template_values(&self) -> Value {
        let date = self.execution_date;
        let ds = date.format("%Y-%m-%d").to_string();
        let ts = date.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut values: Map<String, Value> = self
            .vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let builtins = json!({
            "ds": ds,
            "ds_nodash": date.format("%Y%m%d").to_string(),
            "ts": ts,
            "execution_date": ts,
            "year": date.year(),
            "month": date.month(),
            "day": date.day(),
            "hour": date.hour(),
            "vars": self.vars,
        });
        if let Value::Object(builtins) = builtins {
            values.extend(builtins);
        }
        Value::Object(values)
    }
}

/// Collaborators handed to every task run.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    pub warehouse: &'a dyn Warehouse,
    pub bulk_source: &'a dyn BulkSource,
    pub renderer: &'a dyn TemplateEngine,
    pub run: &'a RunContext,
}
