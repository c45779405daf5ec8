//! Agent service: the event bus, its agents and the HTTP trigger endpoint.

use std::sync::Arc;

use anyhow::Context;

use bazaarops_api::app::{self, ServiceInfo};
use bazaarops_events::EventBus;
use bazaarops_infra::external::AnthropicSummarizer;
use bazaarops_infra::{AgentDeps, AppConfig, SupabaseStore, SystemClock, register_agents};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bazaarops_observability::init("agent-service");

    let config = AppConfig::from_env().context("invalid configuration")?;

    let deps = AgentDeps {
        store: Arc::new(SupabaseStore::new(config.supabase.clone())?),
        summarizer: Arc::new(AnthropicSummarizer::new(config.anthropic.clone())?),
        clock: Arc::new(SystemClock),
    };

    let bus = Arc::new(EventBus::new());
    register_agents(&bus, &deps);

    let info = ServiceInfo::new("agent-service").with_agents(["order_agent", "summary_agent"]);

    bazaarops_api::server::serve(config.agent_service_addr, app::build_app(bus, info)).await
}
