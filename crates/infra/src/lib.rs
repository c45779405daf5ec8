//! Infrastructure layer: retail store adapters, messaging, the hosted
//! summarizer, agents, scheduled routines, the scheduler and configuration.

pub mod agents;
pub mod config;
pub mod external;
pub mod notify;
pub mod routines;
pub mod scheduler;
pub mod store;

pub use agents::{AgentDeps, AgentError, OrderAgent, SummaryAgent, register_agents};
pub use config::{AppConfig, ConfigError};
pub use notify::{InMemoryNotifier, Notifier, NotifyError, TelegramNotifier};
pub use routines::{RoutineCatalog, RoutineDeps, RoutineOutcome, StoreRoutine};
pub use scheduler::{Clock, DailyScheduler, SchedulerHandle, SystemClock};
pub use store::{InMemoryRetailStore, RetailStore, StoreError, SummaryRecord, SupabaseStore};
