use crate::error::StarloadError;

/// Resolves `{{ name }}` placeholders against the run context.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String, StarloadError>;
}
