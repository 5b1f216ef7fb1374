use super::errors::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in a query's transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A tool definition as discovered from the tool host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

/// What the model wants to do next. Exactly one per gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Answer the user directly.
    FinalAnswer { content: String },
    /// Invoke one tool. `arguments` is the raw JSON text as produced by the model.
    ToolInvocation { tool_name: String, arguments: String },
}

/// Everything the gateway sees for one decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionRequest<'a> {
    pub transcript: &'a [Message],
    pub tools: &'a [ToolSpec],
}

/// The reasoning engine boundary.
///
/// Implementations own prompt construction, transport and retries; the
/// caller only ever sees a [`Decision`] or a [`ModelError`].
pub trait Gateway: Send + Sync {
    fn decide(
        &self,
        request: DecisionRequest<'_>,
    ) -> impl Future<Output = Result<Decision, ModelError>> + Send;
}
