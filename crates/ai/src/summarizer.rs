use std::sync::Mutex;

use async_trait::async_trait;

use crate::job::Analysis;
use crate::result::AiError;

/// Hosted language model, reduced to "prompt in, text out".
///
/// Implementations bound the response length and the request time; callers
/// treat every error as a recoverable per-call failure.
#[async_trait]
pub trait Summarizer: Send + Sync + 'static {
    async fn summarize(&self, prompt: &str) -> Result<String, AiError>;
}

/// Ask `summarizer` about `analysis`, rejecting blank answers.
pub async fn summarize<A>(summarizer: &dyn Summarizer, analysis: &A) -> Result<String, AiError>
where
    A: Analysis + ?Sized,
{
    let text = summarizer.summarize(&analysis.prompt()).await?;
    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

/// In-memory summarizer for tests/dev.
///
/// Answers every prompt with a fixed reply (or a fixed error) and records the
/// prompts it was given.
#[derive(Debug)]
pub struct InMemorySummarizer {
    reply: Result<String, AiError>,
    prompts: Mutex<Vec<String>>,
}

impl InMemorySummarizer {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: AiError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Summarizer for InMemorySummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, AiError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());
        self.reply.clone()
    }
}
