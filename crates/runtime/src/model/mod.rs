//! Conversation types and the reasoning gateway trait.

pub mod errors;
pub mod types;

pub use errors::ModelError;
pub use types::{Decision, DecisionRequest, Gateway, Message, Role, ToolSpec};
