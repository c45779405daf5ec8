//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failure of a pure domain rule.
///
/// Store, notifier and summarizer failures have their own error types in the
/// infrastructure crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{kind} cannot be empty")]
    EmptyId { kind: &'static str },
}

impl DomainError {
    pub fn empty_id(kind: &'static str) -> Self {
        Self::EmptyId { kind }
    }
}
