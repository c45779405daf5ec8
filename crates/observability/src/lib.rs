//! Process-wide logging setup shared by the service binaries.

pub mod tracing;

pub use crate::tracing::LogFormat;

/// Initialize structured logging for the process named `service`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(service: &'static str) {
    crate::tracing::init(service, LogFormat::from_env());
}
