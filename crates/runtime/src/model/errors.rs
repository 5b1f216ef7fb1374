use thiserror::Error;

/// Errors from the reasoning gateway.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The provider returned an error response.
    #[error("provider api: {0}")]
    Api(String),

    /// The response could not be turned into a decision.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
