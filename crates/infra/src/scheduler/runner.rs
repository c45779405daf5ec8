use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use chrono::{Duration as ChronoDuration, NaiveDateTime, Timelike};
use futures_util::FutureExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use bazaarops_parties::StoreProfile;

use super::clock::Clock;
use super::types::{FailureKind, JobRunReport, ScheduledJob, SchedulerSettings, StoreFailure};
use crate::routines::RoutineOutcome;
use crate::store::RetailStore;

#[derive(Debug, Default)]
struct PollState {
    previous_poll: Option<NaiveDateTime>,
    /// Job index -> trigger instant it last fired for.
    last_fired: HashMap<usize, NaiveDateTime>,
}

/// Runs registered jobs at their time of day.
pub struct DailyScheduler {
    jobs: Vec<ScheduledJob>,
    store: Arc<dyn RetailStore>,
    clock: Arc<dyn Clock>,
    settings: SchedulerSettings,
    state: Mutex<PollState>,
}

impl DailyScheduler {
    pub fn new(store: Arc<dyn RetailStore>, clock: Arc<dyn Clock>, settings: SchedulerSettings) -> Self {
        Self {
            jobs: Vec::new(),
            store,
            clock,
            settings,
            state: Mutex::new(PollState::default()),
        }
    }

    /// Register a job; coinciding jobs run in registration order.
    pub fn with_job(mut self, job: ScheduledJob) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn jobs(&self) -> &[ScheduledJob] {
        &self.jobs
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Jobs due at `now`, with the trigger instant each one fires for.
    /// Records the poll, so each trigger is returned once.
    fn take_due(&self, now: NaiveDateTime) -> Vec<(usize, NaiveDateTime)> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let previous = state.previous_poll.replace(now);

        let mut due = Vec::new();
        for (idx, job) in self.jobs.iter().enumerate() {
            let at = job.at.as_naive_time();
            let trigger = match previous {
                None => {
                    let same_minute = now.hour() == job.at.hour() && now.minute() == job.at.minute();
                    same_minute.then(|| now.date().and_time(at))
                }
                // Yesterday's trigger covers a poll window that spans midnight.
                Some(prev) => [now.date(), now.date() - ChronoDuration::days(1)]
                    .into_iter()
                    .map(|d| d.and_time(at))
                    .find(|t| prev < *t && *t <= now),
            };

            let Some(trigger) = trigger else { continue };
            if state.last_fired.get(&idx) == Some(&trigger) {
                continue;
            }
            state.last_fired.insert(idx, trigger);
            due.push((idx, trigger));
        }
        due
    }

    /// One poll: run every due job to completion, in registration order.
    pub async fn tick(&self) -> Vec<JobRunReport> {
        let due = self.take_due(self.clock.now());
        let mut reports = Vec::with_capacity(due.len());
        for (idx, trigger) in due {
            reports.push(self.run_job(&self.jobs[idx], trigger).await);
        }
        reports
    }

    /// Run the named job immediately, outside its schedule.
    pub async fn run_now(&self, job_name: &str) -> Option<JobRunReport> {
        let job = self.jobs.iter().find(|j| j.name == job_name)?;
        info!(job = %job.name, "manual run requested");
        Some(self.run_job(job, self.clock.now()).await)
    }

    /// Run `job` for every reachable store, one store at a time.
    pub async fn run_job(&self, job: &ScheduledJob, trigger: NaiveDateTime) -> JobRunReport {
        let mut report = JobRunReport::new(job.name.clone(), trigger);

        let stores = match self.store.get_stores().await {
            Ok(stores) => stores,
            Err(e) => {
                error!(job = %job.name, error = %e, "could not list stores; nothing to run");
                Vec::new()
            }
        };

        let (reachable, unreachable): (Vec<StoreProfile>, Vec<StoreProfile>) =
            stores.into_iter().partition(StoreProfile::is_reachable);
        report.skipped_without_channel = unreachable.into_iter().map(|s| s.id).collect();

        info!(
            job = %job.name,
            %trigger,
            stores = reachable.len(),
            skipped = report.skipped_without_channel.len(),
            "job started"
        );

        for (i, store) in reachable.iter().enumerate() {
            if i > 0 && !job.store_delay.is_zero() {
                tokio::time::sleep(job.store_delay).await;
            }
            self.run_for_store(job, store, &mut report).await;
        }

        info!(
            job = %job.name,
            completed = report.completed.len(),
            not_completed = report.not_completed.len(),
            failed = report.failed.len(),
            "job finished"
        );
        report
    }

    async fn run_for_store(&self, job: &ScheduledJob, store: &StoreProfile, report: &mut JobRunReport) {
        let call = AssertUnwindSafe(job.routine.run(store)).catch_unwind();
        let outcome = tokio::time::timeout(self.settings.routine_timeout, call).await;

        let failure = match outcome {
            Ok(Ok(Ok(RoutineOutcome::Completed))) => {
                report.completed.push(store.id.clone());
                return;
            }
            Ok(Ok(Ok(RoutineOutcome::NotCompleted(reason)))) => {
                warn!(job = %job.name, store = %store.id, name = store.display_name(), %reason, "routine did not complete");
                report.not_completed.push((store.id.clone(), reason));
                return;
            }
            Ok(Ok(Err(e))) => FailureKind::Error(e.to_string()),
            Ok(Err(panic)) => FailureKind::Panicked(panic_message(panic.as_ref()).to_string()),
            Err(_) => FailureKind::TimedOut,
        };

        error!(
            job = %job.name,
            store = %store.id,
            name = store.display_name(),
            failure = %failure,
            "routine failed for store"
        );
        report.failed.push(StoreFailure {
            store_id: store.id.clone(),
            kind: failure,
        });
    }

    /// Start polling on a background task.
    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let poll = self.settings.poll_interval;

        let join = tokio::spawn(async move {
            info!(jobs = self.jobs.len(), poll_secs = poll.as_secs(), "scheduler started");
            for job in &self.jobs {
                info!(job = %job.name, at = %job.at, "job scheduled");
            }

            let mut interval = tokio::time::interval(poll);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                }
            }
            info!("scheduler stopped");
        });

        SchedulerHandle {
            shutdown: Some(shutdown_tx),
            join,
        }
    }
}

/// Handle for the polling task.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop polling; a job already running is allowed to finish. Dropping the
    /// handle without calling this stops the task as well.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.join).await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
