//! Manual job runs on the scheduler service.
//!
//! The run happens inside the request, so the caller gets the full report.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use bazaarops_infra::DailyScheduler;

use crate::app::dto::JobRunResponse;
use crate::app::errors;

pub fn router() -> Router {
    Router::new().route("/:name/run", post(run_job))
}

/// POST /jobs/{name}/run
pub async fn run_job(
    Extension(scheduler): Extension<Arc<DailyScheduler>>,
    Path(name): Path<String>,
) -> Response {
    match scheduler.run_now(&name).await {
        Some(report) => Json(JobRunResponse::from(report)).into_response(),
        None => errors::json_error(
            StatusCode::NOT_FOUND,
            "unknown_job",
            format!("no job named '{name}'"),
        ),
    }
}
