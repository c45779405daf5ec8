use async_trait::async_trait;
use tracing::info;

use bazaarops_ai::{self as ai, summarize};
use bazaarops_parties::StoreProfile;

use super::{RoutineDeps, RoutineOutcome, StoreRoutine, channel_of};
use crate::agents::AgentError;

/// End-of-day sales report with AI insights.
pub struct DailyReport {
    deps: RoutineDeps,
}

impl DailyReport {
    pub fn new(deps: RoutineDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StoreRoutine for DailyReport {
    fn name(&self) -> &str {
        "daily_report"
    }

    async fn run(&self, store: &StoreProfile) -> Result<RoutineOutcome, AgentError> {
        let channel = match channel_of(store) {
            Ok(c) => c,
            Err(outcome) => return Ok(outcome),
        };
        let today = self.deps.clock.today();
        let orders = self
            .deps
            .store
            .orders_since(&store.id, self.deps.clock.start_of_today_utc())
            .await?;

        if orders.is_empty() {
            self.deps
                .notifier
                .send(channel, &ai::DailyReport::no_orders_message(today))
                .await?;
            info!(store = %store.id, "daily report sent (no orders)");
            return Ok(RoutineOutcome::Completed);
        }

        let report = ai::DailyReport::build(store, today, &orders);
        let insights = summarize(self.deps.summarizer.as_ref(), &report).await?;
        self.deps
            .notifier
            .send(channel, &report.message(&insights))
            .await?;

        info!(
            store = %store.id,
            orders = report.total_orders,
            revenue = report.total_revenue,
            "daily report sent"
        );
        Ok(RoutineOutcome::Completed)
    }
}
