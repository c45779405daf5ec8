use std::sync::Arc;

use axum::{Json, extract::Extension};
use serde_json::{Value as JsonValue, json};

use crate::app::ServiceInfo;

pub async fn root(Extension(info): Extension<Arc<ServiceInfo>>) -> Json<ServiceInfo> {
    Json(info.as_ref().clone())
}

pub async fn health() -> Json<JsonValue> {
    Json(json!({ "status": "healthy" }))
}
