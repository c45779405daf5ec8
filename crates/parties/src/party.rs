use serde::{Deserialize, Serialize};

use bazaarops_core::{CustomerId, StoreId};

/// A store (tenant) as the scheduler sees it.
///
/// `notification_channel` is the owner's chat address on the messaging
/// channel; stores without one cannot receive reports and are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreProfile {
    pub id: StoreId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub notification_channel: Option<String>,
}

impl StoreProfile {
    pub fn new(id: StoreId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            notification_channel: None,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.notification_channel = Some(channel.into());
        self
    }

    /// The channel address, if present and not blank.
    pub fn channel(&self) -> Option<&str> {
        self.notification_channel
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn is_reachable(&self) -> bool {
        self.channel().is_some()
    }

    /// Name for logs and messages, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

/// Customer contact details attached to orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub id: Option<CustomerId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Customer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    pub fn display_phone(&self) -> &str {
        self.phone.as_deref().unwrap_or("N/A")
    }
}
