//! Tool trait definition
//!
//! Defines the core trait implemented by every tool exposed to the agent.

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};

use crate::context::RequestContext;
use crate::tool::ToolError;

/// Outcome of one tool call
pub type ToolOutcome = std::result::Result<JsonValue, ToolError>;

/// Tool execution result as sent back to the client
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// JSON payload rendered as text
    pub output: String,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }
}

/// JSON body describing a tool failure: `{"ok": false, "error", "kind"}`
pub fn error_payload(err: &ToolError) -> JsonValue {
    let mut body = json!({
        "ok": false,
        "error": err.to_string(),
        "kind": err.kind(),
    });
    match err {
        ToolError::Unauthorized(denial) => {
            body["reason"] = json!(denial.code());
        }
        ToolError::Upstream {
            retry_after_secs: Some(secs),
            ..
        } => {
            body["retry_after_secs"] = json!(secs);
        }
        _ => {}
    }
    body
}

/// Tool trait
///
/// Implement this trait to expose an operation to the agent. The request
/// context carries the caller's session; tools must not act without it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description (shown to the agent when selecting tools)
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's input parameters
    fn input_schema(&self) -> JsonValue;

    /// Execute the tool for the request described by `ctx`
    async fn execute(&self, ctx: &RequestContext, input: JsonValue) -> ToolOutcome;
}
