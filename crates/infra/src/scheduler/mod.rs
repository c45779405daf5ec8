//! Daily wall-clock scheduler for per-store routines.
//!
//! A single task polls the clock every `poll_interval`. A job fires when its
//! trigger instant lies between the previous poll and the current one (on
//! the very first poll: when the current minute matches). Triggers missed
//! while the process was down are not caught up, and the same trigger never
//! fires twice.
//!
//! A run walks the store list one store at a time: stores without a
//! notification channel are skipped, each routine call is bounded by
//! `routine_timeout`, and failures (error, panic, timeout) are recorded per
//! store without stopping the run.

mod clock;
mod runner;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runner::{DailyScheduler, SchedulerHandle};
pub use types::{
    FailureKind, InvalidTimeOfDay, JobRunReport, ScheduledJob, SchedulerSettings, StoreFailure, TimeOfDay,
};
