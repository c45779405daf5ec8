//! Process configuration from environment variables (and a `.env` file).

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::external::{AnthropicConfig, DEFAULT_MODEL};
use crate::routines::RoutineCatalog;
use crate::scheduler::{ScheduledJob, SchedulerSettings, TimeOfDay};
use crate::store::SupabaseConfig;

pub const DEFAULT_SCHEDULE: &str =
    "10:00=inventory_analysis,16:00=inventory_analysis,21:00=daily_report,21:05=credit_analysis";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("schedule references unknown job {0:?}")]
    UnknownJob(String),
}

/// One `HH:MM=job_name` entry of the schedule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub at: TimeOfDay,
    pub job: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase: SupabaseConfig,
    pub anthropic: AnthropicConfig,
    /// Required by the scheduler service only.
    pub telegram_bot_token: Option<String>,
    /// Client timeout for the store and the notifier.
    pub http_timeout: Duration,
    pub agent_service_addr: SocketAddr,
    pub scheduler_port: u16,
    pub schedule: Vec<ScheduleEntry>,
    pub scheduler: SchedulerSettings,
    pub store_delay: Duration,
}

impl AppConfig {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let http_timeout = Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 10u64)?);
        let summarizer_timeout = Duration::from_secs(parse_or(&get, "SUMMARIZER_TIMEOUT_SECS", 60u64)?);

        let supabase = SupabaseConfig {
            url: required("SUPABASE_URL")?,
            key: required("SUPABASE_KEY")?,
            timeout: http_timeout,
        };

        let anthropic = AnthropicConfig::new(required("ANTHROPIC_API_KEY")?)
            .with_model(get("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()))
            .with_timeout(summarizer_timeout);

        let schedule_raw = get("SCHEDULE").unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
        let schedule = parse_schedule(&schedule_raw)?;

        let scheduler = SchedulerSettings::default()
            .with_poll_interval(Duration::from_secs(parse_or(&get, "SCHEDULER_POLL_SECS", 30u64)?))
            .with_routine_timeout(Duration::from_secs(parse_or(
                &get,
                "SCHEDULER_ROUTINE_TIMEOUT_SECS",
                120u64,
            )?));
        if scheduler.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SCHEDULER_POLL_SECS",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            supabase,
            anthropic,
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            http_timeout,
            agent_service_addr: parse_or(
                &get,
                "AGENT_SERVICE_ADDR",
                SocketAddr::from(([0, 0, 0, 0], 8003)),
            )?,
            scheduler_port: parse_or(&get, "PORT", 8080u16)?,
            schedule,
            scheduler,
            store_delay: Duration::from_millis(parse_or(&get, "SCHEDULER_STORE_DELAY_MS", 2000u64)?),
        })
    }

    pub fn telegram_bot_token(&self) -> Result<&str, ConfigError> {
        self.telegram_bot_token
            .as_deref()
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))
    }

    /// Resolve the schedule table against `catalog`; any unknown job name is
    /// an error.
    pub fn jobs(&self, catalog: &RoutineCatalog) -> Result<Vec<ScheduledJob>, ConfigError> {
        self.schedule
            .iter()
            .map(|entry| {
                let routine = catalog
                    .get(&entry.job)
                    .ok_or_else(|| ConfigError::UnknownJob(entry.job.clone()))?;
                Ok(ScheduledJob::new(entry.at, routine).with_store_delay(self.store_delay))
            })
            .collect()
    }
}

fn parse_or<G, T>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

/// Parse `HH:MM=job[,HH:MM=job...]`; whitespace around entries is ignored.
pub fn parse_schedule(raw: &str) -> Result<Vec<ScheduleEntry>, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: "SCHEDULE",
        value: raw.to_string(),
        reason,
    };

    let entries = raw
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|entry| {
            let (time, job) = entry
                .split_once('=')
                .ok_or_else(|| invalid(format!("entry {entry:?} is not HH:MM=job")))?;
            let at = time.parse::<TimeOfDay>().map_err(|e| invalid(e.to_string()))?;
            let job = job.trim();
            if job.is_empty() {
                return Err(invalid(format!("entry {entry:?} has no job name")));
            }
            Ok(ScheduleEntry {
                at,
                job: job.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if entries.is_empty() {
        return Err(invalid("no entries".into()));
    }
    Ok(entries)
}
