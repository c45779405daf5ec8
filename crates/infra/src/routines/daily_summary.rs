use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use bazaarops_events::{EventBus, EventKind, GenerateDailySummary, trigger_event};
use bazaarops_parties::StoreProfile;

use super::{RoutineOutcome, StoreRoutine};
use crate::agents::AgentError;
use crate::scheduler::Clock;

/// Requests today's stored summary by publishing `generate_daily_summary`.
pub struct DailySummaryTrigger {
    bus: Arc<EventBus>,
    clock: Arc<dyn Clock>,
}

impl DailySummaryTrigger {
    pub fn new(bus: Arc<EventBus>, clock: Arc<dyn Clock>) -> Self {
        Self { bus, clock }
    }
}

#[async_trait]
impl StoreRoutine for DailySummaryTrigger {
    fn name(&self) -> &str {
        "daily_summary"
    }

    async fn run(&self, store: &StoreProfile) -> Result<RoutineOutcome, AgentError> {
        let payload = GenerateDailySummary {
            date: Some(self.clock.today()),
        }
        .into_payload();
        let report = trigger_event(
            &self.bus,
            EventKind::GENERATE_DAILY_SUMMARY,
            store.id.as_str(),
            JsonValue::Object(payload),
        )
        .await?;

        Ok(if report.handlers_invoked == 0 {
            RoutineOutcome::not_completed("no summary agent subscribed")
        } else if !report.is_clean() {
            RoutineOutcome::not_completed(format!("{} summary handler(s) failed", report.handlers_failed))
        } else {
            RoutineOutcome::Completed
        })
    }
}
