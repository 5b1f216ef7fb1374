//! Tool session error types.

use std::time::Duration;

use crate::protocol::JsonRpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to spawn tool host: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("channel I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake did not complete within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("timeout waiting for response")]
    Timeout,

    #[error("tool host exited unexpectedly")]
    ServerExited,

    #[error("session is closed")]
    Closed,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),

    #[error("tool {name} failed: {detail}")]
    ToolCallFailed { name: String, detail: String },

    #[error("output line exceeds {max} bytes")]
    OutputTooLarge { max: usize },
}

impl Error {
    /// Whether the channel itself failed, as opposed to the tool reporting an error.
    pub fn is_transport(&self) -> bool {
        !matches!(self, Self::ToolCallFailed { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
