use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};

use bazaarops_core::StoreId;

use crate::routines::StoreRoutine;

/// Wall-clock `HH:MM` at which a job fires each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time of day {0:?} (expected HH:MM)")]
pub struct InvalidTimeOfDay(pub String);

impl FromStr for TimeOfDay {
    type Err = InvalidTimeOfDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTimeOfDay(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour = h.parse().map_err(|_| invalid())?;
        let minute = m.parse().map_err(|_| invalid())?;
        TimeOfDay::new(hour, minute).ok_or_else(invalid)
    }
}

/// A routine bound to a time of day.
#[derive(Clone)]
pub struct ScheduledJob {
    pub name: String,
    pub at: TimeOfDay,
    pub routine: Arc<dyn StoreRoutine>,
    /// Pause between two stores of the same run (external rate limits).
    pub store_delay: Duration,
}

impl ScheduledJob {
    pub fn new(at: TimeOfDay, routine: Arc<dyn StoreRoutine>) -> Self {
        Self {
            name: routine.name().to_string(),
            at,
            routine,
            store_delay: Duration::from_secs(2),
        }
    }

    pub fn with_store_delay(mut self, delay: Duration) -> Self {
        self.store_delay = delay;
        self
    }
}

impl fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("name", &self.name)
            .field("at", &self.at)
            .field("store_delay", &self.store_delay)
            .finish()
    }
}

/// Scheduler timing knobs.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub poll_interval: Duration,
    pub routine_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            routine_timeout: Duration::from_secs(120),
        }
    }
}

impl SchedulerSettings {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_routine_timeout(mut self, timeout: Duration) -> Self {
        self.routine_timeout = timeout;
        self
    }
}

/// Why a routine failed for one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Error(String),
    Panicked(String),
    TimedOut,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error(e) => write!(f, "error: {e}"),
            FailureKind::Panicked(p) => write!(f, "panicked: {p}"),
            FailureKind::TimedOut => f.write_str("timed out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreFailure {
    pub store_id: StoreId,
    pub kind: FailureKind,
}

/// What one run of one job did, store by store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRunReport {
    pub job: String,
    /// The trigger instant (local wall clock) this run belongs to.
    pub trigger: NaiveDateTime,
    pub completed: Vec<StoreId>,
    pub not_completed: Vec<(StoreId, String)>,
    pub failed: Vec<StoreFailure>,
    pub skipped_without_channel: Vec<StoreId>,
}

impl JobRunReport {
    pub fn new(job: impl Into<String>, trigger: NaiveDateTime) -> Self {
        Self {
            job: job.into(),
            trigger,
            completed: Vec::new(),
            not_completed: Vec::new(),
            failed: Vec::new(),
            skipped_without_channel: Vec::new(),
        }
    }

    /// Stores the routine was actually invoked for.
    pub fn attempted(&self) -> usize {
        self.completed.len() + self.not_completed.len() + self.failed.len()
    }
}
