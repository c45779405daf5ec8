use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Source of "now" for the scheduler and the agents.
///
/// `now` is the local wall clock the schedule table is written in;
/// `now_utc` stamps stored records.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;

    fn now_utc(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Local midnight of today, as a UTC instant.
    fn start_of_today_utc(&self) -> DateTime<Utc> {
        let now = self.now();
        self.now_utc() - (now - now.date().and_time(NaiveTime::MIN))
    }
}

/// Host clock in the process's local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests; local time is treated as UTC.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(23, 59, 30)
            .unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::seconds(45));

        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(
            clock.start_of_today_utc(),
            NaiveDate::from_ymd_opt(2026, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc()
        );
    }
}
