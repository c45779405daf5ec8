use async_trait::async_trait;
use chrono::Duration;
use tracing::{info, warn};

use bazaarops_ai::{InventoryReview, SALES_WINDOW_DAYS, summarize};
use bazaarops_parties::StoreProfile;

use super::{RoutineDeps, RoutineOutcome, StoreRoutine, channel_of};
use crate::agents::AgentError;

/// Stock review with 30-day sales velocity, followed by one supplier alert
/// per critical product.
pub struct InventoryAnalysis {
    deps: RoutineDeps,
}

impl InventoryAnalysis {
    pub fn new(deps: RoutineDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StoreRoutine for InventoryAnalysis {
    fn name(&self) -> &str {
        "inventory_analysis"
    }

    async fn run(&self, store: &StoreProfile) -> Result<RoutineOutcome, AgentError> {
        let channel = match channel_of(store) {
            Ok(c) => c,
            Err(outcome) => return Ok(outcome),
        };

        let stock = self.deps.store.list_inventory(&store.id).await?;
        if stock.is_empty() {
            return Ok(RoutineOutcome::not_completed("store has no inventory rows"));
        }

        let since = self.deps.clock.now_utc() - Duration::days(SALES_WINDOW_DAYS);
        let recent = self.deps.store.orders_since(&store.id, since).await?;

        let review = InventoryReview::build(store, &stock, &recent);
        let analysis = summarize(self.deps.summarizer.as_ref(), &review).await?;
        self.deps
            .notifier
            .send(channel, &InventoryReview::message(&analysis))
            .await?;

        let alerts = review.critical_alerts();
        for alert in &alerts {
            if let Err(e) = self.deps.notifier.send(channel, &alert.message()).await {
                warn!(store = %store.id, product = %alert.product, error = %e, "restock alert not sent");
            }
        }

        info!(store = %store.id, products = review.items.len(), alerts = alerts.len(), "inventory analysis sent");
        Ok(RoutineOutcome::Completed)
    }
}
