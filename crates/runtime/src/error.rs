use crate::model::ModelError;
use crate::tools::ToolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("malformed arguments for tool {name}: {detail}")]
    MalformedArguments { name: String, detail: String },

    #[error("tool {name} failed: {detail}")]
    ToolExecution { name: String, detail: String },

    #[error("gateway error: {0}")]
    Gateway(#[from] ModelError),
}

impl Error {
    /// Whether the tool session should be considered unusable.
    ///
    /// Everything else is scoped to the query that raised it.
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl Error {
    /// Classify a failed call to the tool named `tool`.
    pub fn from_tool_call(tool: &str, err: ToolError) -> Self {
        match err {
            ToolError::NotFound(name) => Self::UnknownTool { name },
            ToolError::InvalidInput(detail) => Self::MalformedArguments {
                name: tool.to_string(),
                detail,
            },
            ToolError::Execution { name, detail } => Self::ToolExecution { name, detail },
            ToolError::Transport(detail) => Self::Transport(detail),
        }
    }

    /// Classify a failure outside any tool call (startup, catalog fetch).
    /// Without a working catalog the session is unusable.
    pub fn from_session(err: ToolError) -> Self {
        match err {
            ToolError::Transport(detail) => Self::Transport(detail),
            other => Self::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
