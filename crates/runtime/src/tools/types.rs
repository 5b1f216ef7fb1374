//! Tool-related types.

use super::ToolError;
use serde_json::{Map, Value};

/// Arguments for one tool call: a JSON object, or nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(pub Option<Map<String, Value>>);

impl ToolArguments {
    /// Parse the raw argument text a model produced.
    pub fn parse(raw: &str) -> Result<Self, ToolError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        Self::try_from(value)
    }

    pub fn into_value(self) -> Option<Value> {
        self.0.map(Value::Object)
    }
}

impl TryFrom<Value> for ToolArguments {
    type Error = ToolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(Some(map))),
            Value::Null => Ok(Self(None)),
            other => Err(ToolError::InvalidInput(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ToolArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(map) => write!(f, "{}", Value::Object(map.clone())),
            None => write!(f, "{{}}"),
        }
    }
}

/// Render a tool result for the transcript: strings verbatim, anything else as JSON.
pub fn render_output(output: &Value) -> String {
    match output {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
