use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use bazaarops_ai::{DailySummaryInput, Summarizer, summarize};
use bazaarops_events::{Event, EventHandler, GenerateDailySummary, HandlerResult};

use super::AgentError;
use crate::scheduler::Clock;
use crate::store::{RetailStore, SummaryRecord};

/// Writes an AI summary of the day for the event's store.
///
/// Every event inserts a new record; repeated requests for the same day are
/// not merged.
pub struct SummaryAgent {
    store: Arc<dyn RetailStore>,
    summarizer: Arc<dyn Summarizer>,
    clock: Arc<dyn Clock>,
}

impl SummaryAgent {
    pub fn new(store: Arc<dyn RetailStore>, summarizer: Arc<dyn Summarizer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            summarizer,
            clock,
        }
    }

    async fn process(&self, event: &Event) -> Result<(), AgentError> {
        let request = GenerateDailySummary::from_event(event)?;
        let store_id = event.store_id();
        let date = request.date.unwrap_or_else(|| self.clock.today());

        let metrics = self.store.get_daily_metrics(store_id, date).await?;
        let input = DailySummaryInput::new(store_id.clone(), metrics);
        let summary = summarize(self.summarizer.as_ref(), &input).await?;

        self.store
            .insert_summary(SummaryRecord {
                store_id: store_id.clone(),
                date,
                summary,
                metrics: input.metrics,
                created_at: self.clock.now_utc(),
            })
            .await?;

        info!(store = %store_id, %date, "daily summary stored");
        Ok(())
    }
}

#[async_trait]
impl EventHandler for SummaryAgent {
    fn name(&self) -> &str {
        "summary_agent"
    }

    async fn handle(&self, event: &Event) -> HandlerResult {
        if let Err(err) = self.process(event).await {
            error!(
                store = %event.store_id(),
                event_id = %event.event_id(),
                error = %err,
                "summary agent failed"
            );
            return Err(err.into());
        }
        Ok(())
    }
}
