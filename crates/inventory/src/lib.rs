//! Inventory domain module.
//!
//! Stock levels per `(store, product)` and the rules the agents apply to them,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod stock;

pub use stock::{DEFAULT_REORDER_THRESHOLD, StockLevel, after_sale};
