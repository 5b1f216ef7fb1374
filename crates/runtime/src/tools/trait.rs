//! Tool host trait.

use crate::model::ToolSpec;
use crate::tools::{ToolArguments, ToolError};
use serde_json::Value;
use std::future::Future;

/// Trait for tool execution hosts.
///
/// This is the boundary between the negotiation loop and side effects.
/// Callers issue at most one request at a time; implementations backed by a
/// single channel must still serialize if shared.
pub trait ToolHost: Send + Sync {
    /// Fetch the current tool catalog.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolSpec>, ToolError>> + Send;

    /// Execute one tool call.
    fn call_tool(
        &self,
        name: &str,
        arguments: ToolArguments,
    ) -> impl Future<Output = Result<Value, ToolError>> + Send;

    /// Release the host. Must be safe to call more than once and must not fail.
    fn close(&self);
}
