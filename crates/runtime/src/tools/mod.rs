//! Tool execution seam and the subprocess-backed host.

pub mod errors;
mod mcp_host;
mod r#trait;
mod types;

pub use crate::model::ToolSpec;
pub use errors::ToolError;
pub use r#trait::ToolHost;
pub use mcp_host::McpToolHost;
pub use types::{ToolArguments, render_output};
