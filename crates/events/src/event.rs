use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use uuid::Uuid;

use bazaarops_core::StoreId;

/// Errors raised while constructing an event or reading its payload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("event type cannot be empty")]
    EmptyType,

    #[error("store id cannot be empty")]
    EmptyStoreId,

    #[error("payload must be a JSON object, got {0}")]
    PayloadNotObject(&'static str),

    #[error("payload for `{event_type}` is missing required key `{key}`")]
    MissingKey { event_type: String, key: String },

    #[error("payload for `{event_type}` has invalid `{key}`: {reason}")]
    InvalidKey {
        event_type: String,
        key: String,
        reason: String,
    },
}

/// A store-scoped domain event.
///
/// Events are facts: fields are private and there are no mutators, so a
/// published event is never changed by the handlers it reaches. The payload is
/// kept as a loose JSON object; handlers decode it through the typed contracts
/// in [`crate::payload`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Correlation id for logs only; events are not persisted.
    event_id: Uuid,
    #[serde(rename = "type")]
    event_type: String,
    store_id: StoreId,
    payload: Map<String, JsonValue>,
    timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        event_type: impl Into<String>,
        store_id: StoreId,
        payload: Map<String, JsonValue>,
    ) -> Result<Self, EventError> {
        let event_type = event_type.into();
        if event_type.trim().is_empty() {
            return Err(EventError::EmptyType);
        }

        Ok(Self {
            event_id: Uuid::now_v7(),
            event_type,
            store_id,
            payload,
            timestamp: Utc::now(),
        })
    }

    /// Build an event from loosely-typed parts (HTTP trigger, scheduled jobs).
    ///
    /// `null` is accepted as an empty payload; any other non-object is rejected.
    pub fn from_parts(
        event_type: &str,
        store_id: &str,
        payload: JsonValue,
    ) -> Result<Self, EventError> {
        let store_id = StoreId::new(store_id).map_err(|_| EventError::EmptyStoreId)?;
        let payload = match payload {
            JsonValue::Object(map) => map,
            JsonValue::Null => Map::new(),
            JsonValue::Array(_) => return Err(EventError::PayloadNotObject("array")),
            JsonValue::String(_) => return Err(EventError::PayloadNotObject("string")),
            JsonValue::Number(_) => return Err(EventError::PayloadNotObject("number")),
            JsonValue::Bool(_) => return Err(EventError::PayloadNotObject("bool")),
        };
        Self::new(event_type, store_id, payload)
    }

    /// Override the occurrence time (replays, deterministic tests).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn store_id(&self) -> &StoreId {
        &self.store_id
    }

    pub fn payload(&self) -> &Map<String, JsonValue> {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
