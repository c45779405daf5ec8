//! `bazaarops-core`: shared building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers scoped to the store tenant and the domain error model.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, OrderId, ProductId, StoreId};
