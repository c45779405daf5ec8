//! Per-store routines the scheduler runs.
//!
//! A routine receives one reachable store and reports whether it finished.
//! Errors are per store: the scheduler logs them and moves on.

mod credit_analysis;
mod daily_report;
mod daily_summary;
mod inventory_analysis;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use bazaarops_ai::Summarizer;
use bazaarops_events::EventBus;
use bazaarops_parties::StoreProfile;

use crate::agents::AgentError;
use crate::notify::Notifier;
use crate::scheduler::Clock;
use crate::store::RetailStore;

pub use credit_analysis::CreditAnalysis;
pub use daily_report::DailyReport;
pub use daily_summary::DailySummaryTrigger;
pub use inventory_analysis::InventoryAnalysis;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutineOutcome {
    Completed,
    /// Ran without error but could not do its job (reason is logged).
    NotCompleted(String),
}

impl RoutineOutcome {
    pub fn not_completed(reason: impl Into<String>) -> Self {
        RoutineOutcome::NotCompleted(reason.into())
    }
}

#[async_trait]
pub trait StoreRoutine: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn run(&self, store: &StoreProfile) -> Result<RoutineOutcome, AgentError>;
}

/// Collaborators shared by the routines.
#[derive(Clone)]
pub struct RoutineDeps {
    pub store: Arc<dyn RetailStore>,
    pub notifier: Arc<dyn Notifier>,
    pub summarizer: Arc<dyn Summarizer>,
    pub clock: Arc<dyn Clock>,
    pub bus: Arc<EventBus>,
}

/// Routines by job name, as referenced from the schedule table.
#[derive(Clone, Default)]
pub struct RoutineCatalog {
    routines: BTreeMap<String, Arc<dyn StoreRoutine>>,
}

impl RoutineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// `daily_report`, `inventory_analysis`, `credit_analysis` and
    /// `daily_summary`.
    pub fn standard(deps: &RoutineDeps) -> Self {
        let mut catalog = Self::new();
        catalog.insert(DailyReport::new(deps.clone()));
        catalog.insert(InventoryAnalysis::new(deps.clone()));
        catalog.insert(CreditAnalysis::new(deps.clone()));
        catalog.insert(DailySummaryTrigger::new(deps.bus.clone(), deps.clock.clone()));
        catalog
    }

    pub fn insert<R: StoreRoutine>(&mut self, routine: R) {
        self.insert_shared(Arc::new(routine));
    }

    pub fn insert_shared(&mut self, routine: Arc<dyn StoreRoutine>) {
        self.routines.insert(routine.name().to_string(), routine);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn StoreRoutine>> {
        self.routines.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.routines.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for RoutineCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutineCatalog")
            .field("routines", &self.names())
            .finish()
    }
}

/// The store's channel, or the outcome to report when it has none.
fn channel_of(store: &StoreProfile) -> Result<&str, RoutineOutcome> {
    store
        .channel()
        .ok_or_else(|| RoutineOutcome::not_completed("store has no notification channel"))
}
