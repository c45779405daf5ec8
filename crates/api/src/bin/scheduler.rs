//! Scheduler service: runs the daily analysis jobs for every store and
//! exposes health and manual-run endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use bazaarops_api::app::{self, ServiceInfo};
use bazaarops_events::EventBus;
use bazaarops_infra::external::AnthropicSummarizer;
use bazaarops_infra::{
    AgentDeps, AppConfig, Clock, DailyScheduler, RetailStore, RoutineCatalog, RoutineDeps,
    SupabaseStore, SystemClock, TelegramNotifier, register_agents,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bazaarops_observability::init("scheduler");

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn RetailStore> = Arc::new(SupabaseStore::new(config.supabase.clone())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let summarizer = Arc::new(AnthropicSummarizer::new(config.anthropic.clone())?);
    let notifier = Arc::new(TelegramNotifier::new(
        config.telegram_bot_token()?,
        config.http_timeout,
    )?);

    // The `daily_summary` job publishes on a bus of its own, so the summary
    // agent has to live in this process too.
    let bus = Arc::new(EventBus::new());
    register_agents(
        &bus,
        &AgentDeps {
            store: store.clone(),
            summarizer: summarizer.clone(),
            clock: clock.clone(),
        },
    );

    let catalog = RoutineCatalog::standard(&RoutineDeps {
        store: store.clone(),
        notifier,
        summarizer,
        clock: clock.clone(),
        bus,
    });
    let jobs = config.jobs(&catalog)?;

    let info = ServiceInfo::new("scheduler")
        .with_jobs(jobs.iter().map(|job| format!("{} {}", job.at, job.name)));

    let scheduler = jobs.into_iter().fold(
        DailyScheduler::new(store, clock, config.scheduler.clone()),
        DailyScheduler::with_job,
    );
    let scheduler = Arc::new(scheduler);
    let handle = scheduler.clone().spawn();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.scheduler_port));
    let served = bazaarops_api::server::serve(addr, app::scheduler_app(info, scheduler)).await;

    handle.shutdown().await;
    served
}
