use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{Notifier, NotifyError};

const API_BASE: &str = "https://api.telegram.org";

/// [`Notifier`] over the Telegram Bot API (`sendMessage`, Markdown).
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, timeout: Duration) -> Result<Self, NotifyError> {
        Self::with_base_url(API_BASE, bot_token, timeout)
    }

    /// Point at a different API host (local Bot API server, tests).
    pub fn with_base_url(base_url: &str, bot_token: &str, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{bot_token}/sendMessage", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        let channel = channel.trim();
        if channel.is_empty() {
            return Err(NotifyError::NoChannel);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "chat_id": channel,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(chat = channel, "telegram message sent");
        Ok(())
    }
}
