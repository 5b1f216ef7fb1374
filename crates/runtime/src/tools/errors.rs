use thiserror::Error;

/// Errors from the tool host seam.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("tool {name} failed: {detail}")]
    Execution { name: String, detail: String },
    #[error("transport: {0}")]
    Transport(String),
}

impl From<mcp::Error> for ToolError {
    fn from(err: mcp::Error) -> Self {
        match err {
            mcp::Error::ToolCallFailed { name, detail } => Self::Execution { name, detail },
            other => Self::Transport(other.to_string()),
        }
    }
}
