//! Axum router wiring.
//!
//! - `routes/`: HTTP handlers (one file per area)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use bazaarops_events::EventBus;
use bazaarops_infra::DailyScheduler;

pub mod dto;
pub mod errors;
pub mod routes;

pub use dto::ServiceInfo;

/// Router of the agent service: service info, health and the event trigger.
pub fn build_app(bus: Arc<EventBus>, info: ServiceInfo) -> Router {
    Router::new()
        .nest("/api/events", routes::events::router())
        .merge(system_routes())
        .layer(Extension(bus))
        .layer(Extension(Arc::new(info)))
}

/// Router of the scheduler service: health plus manual job runs.
pub fn scheduler_app(info: ServiceInfo, scheduler: Arc<DailyScheduler>) -> Router {
    Router::new()
        .nest("/jobs", routes::jobs::router())
        .merge(system_routes())
        .layer(Extension(scheduler))
        .layer(Extension(Arc::new(info)))
}

fn system_routes() -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
}
