//! In-process domain events for a store.
//!
//! - [`Event`]: immutable record of something that happened in one store
//! - [`payload`]: typed contracts for the known event types
//! - [`EventHandler`]: asynchronous reaction to one event
//! - [`EventBus`]: ordered, failure-isolating publish/subscribe router

pub mod bus;
pub mod event;
pub mod handler;
pub mod kinds;
pub mod payload;

pub use bus::{EventBus, PublishReport, SubscriptionId, trigger_event};
pub use event::{Event, EventError};
pub use handler::{EventHandler, HandlerResult, handler_fn};
pub use kinds::EventKind;
pub use payload::{GenerateDailySummary, InventoryUpdated, OrderCreated, OrderItem};
