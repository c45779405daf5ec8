//! HTTP surface of the agent service and the scheduler service.

pub mod app;
pub mod server;
