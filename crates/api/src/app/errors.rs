use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bazaarops_events::EventError;

pub fn event_error_to_response(err: EventError) -> axum::response::Response {
    match err {
        EventError::EmptyType | EventError::EmptyStoreId => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
        }
        EventError::PayloadNotObject(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_payload", err.to_string())
        }
        EventError::MissingKey { .. } | EventError::InvalidKey { .. } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_payload",
            err.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
