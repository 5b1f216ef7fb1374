//! Client side of the tool host protocol.
//!
//! A tool host is a child process that exposes callable tools over JSON-RPC
//! 2.0 on its stdin/stdout, one message per line. This crate spawns the host,
//! performs the `initialize` handshake, discovers tools and calls them.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{ServerConfig, ToolSession};
//!
//! # async fn example() -> mcp::Result<()> {
//! let session = ToolSession::open(ServerConfig::new("python", ["weather.py"])).await?;
//!
//! for tool in session.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let result = session
//!     .call_tool("get_weather", Some(serde_json::json!({ "city": "Paris" })))
//!     .await?;
//! println!("{}", result.text());
//!
//! session.close();
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod session;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, Implementation, Incoming, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListToolsParams,
    ListToolsResult, PROTOCOL_VERSION, RequestId, Tool, ToolContent,
};
pub use session::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, MAX_OUTPUT_SIZE, ServerConfig, ToolSession,
};
