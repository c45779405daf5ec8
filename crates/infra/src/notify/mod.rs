//! Outbound messages to store owners.

mod telegram;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

pub use telegram::TelegramNotifier;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("blank channel address")]
    NoChannel,

    #[error("notifier request failed: {0}")]
    Transport(String),

    #[error("messaging API rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Sends a text message to a channel address (a chat id on the messaging
/// service). Markdown is allowed in `text`.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, channel: &str, text: &str) -> Result<(), NotifyError>;
}

#[async_trait]
impl<N> Notifier for Arc<N>
where
    N: Notifier + ?Sized,
{
    async fn send(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        (**self).send(channel, text).await
    }
}

/// In-memory notifier for tests/dev: records every message sent.
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail_for: Mutex<Vec<String>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends to `channel` fail.
    pub fn fail_for(&self, channel: impl Into<String>) {
        self.fail_for
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(channel.into());
    }

    /// `(channel, text)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_to(&self, channel: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        if channel.trim().is_empty() {
            return Err(NotifyError::NoChannel);
        }
        let failing = self
            .fail_for
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|c| c == channel);
        if failing {
            return Err(NotifyError::Transport(format!("channel {channel} unreachable")));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}
