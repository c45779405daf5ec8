//! Manual event trigger.
//!
//! The event is validated and acknowledged synchronously; handlers run on a
//! background task, so the caller never waits for (or sees) their outcome.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Map, Value as JsonValue};

use bazaarops_events::{Event, EventBus};

use crate::app::dto::{TriggerBody, TriggerQuery, TriggerResponse};
use crate::app::errors;

pub fn router() -> Router {
    Router::new().route("/trigger", get(trigger_get).post(trigger_post))
}

/// GET /api/events/trigger?event_type=X&store_id=Y&payload={...}
///
/// A `payload` that is not a JSON object is replaced by `{}`.
pub async fn trigger_get(
    Extension(bus): Extension<Arc<EventBus>>,
    Query(query): Query<TriggerQuery>,
) -> Response {
    let payload = query
        .payload
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Map<String, JsonValue>>(raw).ok())
        .unwrap_or_default();

    dispatch(bus, query.event_type, query.store_id, JsonValue::Object(payload))
}

/// POST /api/events/trigger
///
/// Either `?event_type=X&store_id=Y` with the payload as the JSON body, or a
/// JSON body `{"event_type", "store_id", "payload"}`.
pub async fn trigger_post(
    Extension(bus): Extension<Arc<EventBus>>,
    Query(query): Query<TriggerQuery>,
    body: Bytes,
) -> Response {
    let body: Option<JsonValue> = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(err) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", err.to_string());
            }
        }
    };

    if query.event_type.is_some() && query.store_id.is_some() {
        return dispatch(
            bus,
            query.event_type,
            query.store_id,
            body.unwrap_or(JsonValue::Null),
        );
    }

    let parsed = match body.map(serde_json::from_value::<TriggerBody>).transpose() {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(err) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", err.to_string());
        }
    };

    dispatch(
        bus,
        query.event_type.or(parsed.event_type),
        query.store_id.or(parsed.store_id),
        parsed.payload.unwrap_or(JsonValue::Null),
    )
}

/// `trigger_event` in two halves: construction errors answer 400 here, and
/// only the publish moves to a background task.
fn dispatch(
    bus: Arc<EventBus>,
    event_type: Option<String>,
    store_id: Option<String>,
    payload: JsonValue,
) -> Response {
    let event_type = event_type.unwrap_or_default();
    let store_id = store_id.unwrap_or_default();

    let event = match Event::from_parts(&event_type, &store_id, payload) {
        Ok(event) => event,
        Err(err) => return errors::event_error_to_response(err),
    };

    tracing::info!(
        event_id = %event.event_id(),
        event_type = %event_type,
        store_id = %store_id,
        "event triggered"
    );

    tokio::spawn(async move {
        let report = bus.publish(event).await;
        if !report.is_clean() {
            tracing::warn!(
                event_type = %report.event_type,
                failed = report.handlers_failed,
                invoked = report.handlers_invoked,
                "triggered event had failing handlers"
            );
        }
    });

    (StatusCode::OK, Json(TriggerResponse::accepted(event_type))).into_response()
}
