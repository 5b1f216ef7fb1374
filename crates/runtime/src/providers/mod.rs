//! Reasoning gateway adapters.
//!
//! Each provider implements [`Gateway`](crate::model::Gateway) for its API.

mod anthropic;

pub use anthropic::{AnthropicGateway, AnthropicGatewayBuilder};
