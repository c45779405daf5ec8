use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use bazaarops_ai::{AiError, Summarizer};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub base_url: String,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`Summarizer`] over the Anthropic Messages API: one user message in, the
/// first text block out.
#[derive(Debug, Clone)]
pub struct AnthropicSummarizer {
    client: Client,
    config: AnthropicConfig,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn first_text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
    }
}

impl AnthropicSummarizer {
    pub fn new(config: AnthropicConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

fn request_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        AiError::Timeout
    } else {
        AiError::Transport(e.to_string())
    }
}

#[async_trait]
impl Summarizer for AnthropicSummarizer {
    async fn summarize(&self, prompt: &str) -> Result<String, AiError> {
        if prompt.trim().is_empty() {
            return Err(AiError::InvalidInput("empty prompt".into()));
        }

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&json!({
                "model": self.config.model,
                "max_tokens": self.config.max_tokens,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited(body),
                _ => AiError::Transport(format!("{status}: {body}")),
            });
        }

        let parsed: MessagesResponse = response.json().await.map_err(request_error)?;
        let text = parsed.first_text().ok_or(AiError::EmptyResponse)?;
        debug!(model = %self.config.model, chars = text.len(), "summary received");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_text_block() {
        let parsed: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Aaj ka din accha raha!"}
            ]
        }))
        .unwrap();
        assert_eq!(parsed.first_text().as_deref(), Some("Aaj ka din accha raha!"));
    }

    #[test]
    fn empty_content_has_no_text() {
        let parsed: MessagesResponse = serde_json::from_value(json!({"content": []})).unwrap();
        assert_eq!(parsed.first_text(), None);
    }

    #[test]
    fn config_defaults() {
        let cfg = AnthropicConfig::new("key").with_model("claude-x");
        assert_eq!(cfg.max_tokens, 1024);
        assert_eq!(cfg.model, "claude-x");
        assert_eq!(cfg.timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_any_request() {
        // Unroutable base URL: reaching the network would surface as Transport.
        let mut cfg = AnthropicConfig::new("key");
        cfg.base_url = "http://127.0.0.1:9".into();
        let summarizer = AnthropicSummarizer::new(cfg).unwrap();

        let err = summarizer.summarize("  \n").await.unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)), "{err:?}");
    }
}
