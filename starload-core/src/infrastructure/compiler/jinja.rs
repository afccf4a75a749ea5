// starload-core/src/infrastructure/compiler/jinja.rs

// Resolves the `{{ ds }}`-style placeholders found in staging keys before any
// statement reaches the warehouse.

use minijinja::{Environment, ErrorKind, UndefinedBehavior};

use crate::application::ports::TemplateEngine;
use crate::domain::error::ConfigurationError;
use crate::error::StarloadError;

pub struct JinjaRenderer<'a> {
    env: Environment<'a>,
}

impl<'a> JinjaRenderer<'a> {
    pub fn new() -> Self {
        let mut env = Environment::new();

        // A placeholder missing from the context is an error, never ""
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        // `{{ execution_date | nodash }}` -> 20181101
        env.add_filter("nodash", |value: String| value.replace('-', ""));
        // `{{ month | pad2 }}` -> 07
        env.add_filter("pad2", |value: i64| format!("{:02}", value));

        Self { env }
    }
}

impl<'a> Default for JinjaRenderer<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TemplateEngine for JinjaRenderer<'a> {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, StarloadError> {
        self.env.render_str(template, context).map_err(|e| {
            let detail = e.to_string();
            let err = if e.kind() == ErrorKind::UndefinedError {
                ConfigurationError::UnresolvedPlaceholder {
                    pattern: template.to_string(),
                    detail,
                }
            } else {
                ConfigurationError::InvalidTemplate {
                    pattern: template.to_string(),
                    detail,
                }
            };
            StarloadError::Configuration(err)
        })
    }
}
