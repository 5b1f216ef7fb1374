//! Tool host backed by a tool host subprocess.

use super::{ToolArguments, ToolError, ToolHost, ToolSpec};
use mcp::{CallToolResult, ServerConfig, Tool, ToolSession};
use serde_json::Value;
use tracing::debug;

/// [`ToolHost`] over a live [`ToolSession`].
pub struct McpToolHost {
    session: ToolSession,
}

impl McpToolHost {
    /// Spawn the subprocess and complete the handshake.
    pub async fn spawn(config: ServerConfig) -> Result<Self, ToolError> {
        let session = ToolSession::open(config).await?;
        if let Some(info) = session.server_info() {
            debug!(host = %info.name, version = info.version.as_deref().unwrap_or("-"), "tool host ready");
        }
        Ok(Self { session })
    }

    /// Wrap an already open session.
    pub fn new(session: ToolSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &ToolSession {
        &self.session
    }
}

impl From<Tool> for ToolSpec {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            schema: tool.input_schema,
        }
    }
}

/// Text-only results collapse to their text; anything richer stays JSON.
fn result_to_value(result: CallToolResult) -> Result<Value, ToolError> {
    if result.is_text_only() {
        return Ok(Value::String(result.text()));
    }
    serde_json::to_value(&result.content)
        .map_err(|e| ToolError::Transport(format!("serialize result: {e}")))
}

impl ToolHost for McpToolHost {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        let tools = self.session.list_tools().await?;
        Ok(tools.into_iter().map(ToolSpec::from).collect())
    }

    async fn call_tool(&self, name: &str, arguments: ToolArguments) -> Result<Value, ToolError> {
        let result = self.session.call_tool(name, arguments.into_value()).await?;
        result_to_value(result)
    }

    fn close(&self) {
        self.session.close();
    }
}
