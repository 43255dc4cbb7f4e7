//! Tool abstraction the model can call into.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ToolError;

/// Output of a successful tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Text fed back to the model as the call's result.
    pub text: String,
    /// How long the execution took.
    pub duration: Duration,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            duration,
        }
    }
}

/// A capability the model may invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as declared to the model.
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError>;
}

/// Extract a required string field from tool params.
pub fn require_str<'a>(params: &'a serde_json::Value, field: &str) -> Result<&'a str, ToolError> {
    params
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ToolError::InvalidParameters(format!("missing required string field '{field}'"))
        })
}
