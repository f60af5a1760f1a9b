//! Tool definitions and input schema helpers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

/// Tool definition as advertised by `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: JsonValue,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Builder for JSON object schemas describing tool arguments
///
/// # Example
/// ```ignore
/// let schema = SchemaBuilder::new()
///     .string("channel_id", "Channel ID or #name", true)
///     .integer("limit", "Maximum messages", 100)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    properties: Map<String, JsonValue>,
    required: Vec<String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string property
    pub fn string(mut self, name: &str, description: &str, required: bool) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({"type": "string", "description": description}),
        );
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Add an optional integer property with a default
    pub fn integer(mut self, name: &str, description: &str, default: i64) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({"type": "integer", "description": description, "default": default}),
        );
        self
    }

    /// Add an optional boolean property with a default
    pub fn boolean(mut self, name: &str, description: &str, default: bool) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({"type": "boolean", "description": description, "default": default}),
        );
        self
    }

    /// Add an optional string property restricted to `values`
    pub fn string_enum(
        mut self,
        name: &str,
        description: &str,
        values: &[&str],
        default: &str,
    ) -> Self {
        self.properties.insert(
            name.to_string(),
            json!({
                "type": "string",
                "description": description,
                "enum": values,
                "default": default,
            }),
        );
        self
    }

    pub fn build(self) -> JsonValue {
        json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        })
    }
}
