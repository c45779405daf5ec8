use async_trait::async_trait;
use tracing::info;

use bazaarops_ai::{CreditReview, summarize};
use bazaarops_parties::StoreProfile;

use super::{RoutineDeps, RoutineOutcome, StoreRoutine, channel_of};
use crate::agents::AgentError;

/// Collection advice for orders still on credit. Sends nothing when nothing
/// is owed.
pub struct CreditAnalysis {
    deps: RoutineDeps,
}

impl CreditAnalysis {
    pub fn new(deps: RoutineDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl StoreRoutine for CreditAnalysis {
    fn name(&self) -> &str {
        "credit_analysis"
    }

    async fn run(&self, store: &StoreProfile) -> Result<RoutineOutcome, AgentError> {
        let channel = match channel_of(store) {
            Ok(c) => c,
            Err(outcome) => return Ok(outcome),
        };

        let open = self.deps.store.open_credit_orders(&store.id).await?;
        let review = CreditReview::build(store, &open, self.deps.clock.now_utc());
        if review.is_empty() {
            info!(store = %store.id, "no open credit");
            return Ok(RoutineOutcome::Completed);
        }

        let analysis = summarize(self.deps.summarizer.as_ref(), &review).await?;
        self.deps
            .notifier
            .send(channel, &CreditReview::message(&analysis))
            .await?;

        info!(
            store = %store.id,
            accounts = review.accounts.len(),
            outstanding = review.total_outstanding(),
            "credit analysis sent"
        );
        Ok(RoutineOutcome::Completed)
    }
}
