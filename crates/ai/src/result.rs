use thiserror::Error;

/// Failure of a summarizer call.
///
/// Every variant is recoverable from the caller's point of view: the handler or
/// per-store routine logs it and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AiError {
    #[error("invalid analysis input: {0}")]
    InvalidInput(String),

    #[error("summarizer request failed: {0}")]
    Transport(String),

    #[error("summarizer quota or rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("summarizer returned no text")]
    EmptyResponse,

    #[error("summarizer timed out")]
    Timeout,
}
