//! Event-driven agents: handlers subscribed to the bus at startup.

mod order;
mod summary;

use std::sync::Arc;

use thiserror::Error;

use bazaarops_ai::{AiError, Summarizer};
use bazaarops_core::StoreId;
use bazaarops_events::{EventBus, EventError, EventKind, SubscriptionId};

use crate::notify::NotifyError;
use crate::scheduler::Clock;
use crate::store::{RetailStore, StoreError};

pub use order::OrderAgent;
pub use summary::SummaryAgent;

/// Failure of an agent or a scheduled routine for one store.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("unknown store {0}")]
    UnknownStore(StoreId),
}

/// Collaborators shared by the agents.
#[derive(Clone)]
pub struct AgentDeps {
    pub store: Arc<dyn RetailStore>,
    pub summarizer: Arc<dyn Summarizer>,
    pub clock: Arc<dyn Clock>,
}

/// Subscribe the order and summary agents on `bus`.
///
/// The order agent keeps only a weak reference to the bus it publishes
/// follow-up events on.
pub fn register_agents(bus: &Arc<EventBus>, deps: &AgentDeps) -> Vec<SubscriptionId> {
    let order = OrderAgent::new(deps.store.clone(), Arc::downgrade(bus));
    let summary = SummaryAgent::new(deps.store.clone(), deps.summarizer.clone(), deps.clock.clone());

    let ids = vec![
        bus.subscribe(EventKind::ORDER_CREATED, order),
        bus.subscribe(EventKind::GENERATE_DAILY_SUMMARY, summary),
    ];
    tracing::info!(subscriptions = ids.len(), "agents registered");
    ids
}

#[cfg(test)]
mod tests;
