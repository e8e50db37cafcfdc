use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The provider could not be reached, timed out, or answered non-2xx.
    #[error("upstream provider error: {0}")]
    Upstream(String),

    /// Missing API key or unusable client settings.
    #[error("chat is not configured: {0}")]
    Configuration(String),

    /// The provider answered 2xx with a body we could not read.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
