//! External service clients/adapters.

mod anthropic;

pub use anthropic::{AnthropicConfig, AnthropicSummarizer, DEFAULT_MODEL};
