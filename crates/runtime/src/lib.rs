//! Tether runtime: tool sessions and the negotiation loop.
//!
//! This crate connects a reasoning gateway (a language model) to the tools
//! exposed by a tool host subprocess and turns one user query into one answer.
//!
//! # Overview
//!
//! - **Gateway**: the reasoning engine boundary. Given the transcript and the
//!   tool catalog it returns one [`Decision`]: a final answer or one tool call.
//! - **ToolHost**: lists and calls tools. [`McpToolHost`] runs them in a
//!   subprocess.
//! - **Orchestrator**: runs `decide → call at most one tool → decide again`
//!   for each query, with a fresh transcript every time.
//! - **SessionLifecycle**: starts the tool host from a script path and makes
//!   sure it is closed exactly once.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{AnthropicGateway, Orchestrator, SessionLifecycle, SessionOptions};
//!
//! # async fn example() -> runtime::Result<()> {
//! let session = SessionLifecycle::start("weather.py", SessionOptions::default()).await?;
//! let gateway = AnthropicGateway::builder("sk-ant-api01-...", "claude-sonnet-4-20250514").build();
//! let orchestrator = Orchestrator::new(gateway);
//!
//! let answer = orchestrator.process_query(session.host(), "weather in Paris?").await?;
//! println!("{answer}");
//!
//! session.stop();
//! # Ok(())
//! # }
//! ```

mod error;
mod lifecycle;
pub mod model;
mod orchestrator;
mod providers;
pub mod tools;

// Error types
pub use error::{Error, Result};

// Conversation model and gateway boundary
pub use model::{Decision, DecisionRequest, Gateway, Message, ModelError, Role, ToolSpec};

// Gateway implementations
pub use providers::{AnthropicGateway, AnthropicGatewayBuilder};

// Tool hosts
pub use tools::{McpToolHost, ToolArguments, ToolError, ToolHost, render_output};

// Negotiation and lifecycle
pub use lifecycle::{ScriptKind, SessionLifecycle, SessionOptions};
pub use orchestrator::{Answer, Orchestrator, Phase, QueryId};
