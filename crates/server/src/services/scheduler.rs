//! Daily trigger for the reminder job.
//!
//! The schedule is a wall-clock time in the host's local timezone. Each loop
//! iteration recomputes the next occurrence, so DST changes and clock jumps
//! are picked up on the following day. A slot fires at most once, even if
//! the wall clock reads earlier than the slot when the timer wakes.

use std::sync::Arc;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use tokio::task::JoinHandle;

use round_again_core::Clock;

use super::reminders::{ContactStore, Notifier, ReminderJob, RunOutcome};

/// Longest local-time gap searched when a scheduled time does not exist.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// Out-of-range hour or minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid time of day {hour:02}:{minute:02}")]
pub struct InvalidTimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

/// A fixed local time at which something happens once per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    /// # Errors
    ///
    /// Returns [`InvalidTimeOfDay`] unless `hour < 24` and `minute < 60`.
    pub fn new(hour: u32, minute: u32) -> Result<Self, InvalidTimeOfDay> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|time| Self { time })
            .ok_or(InvalidTimeOfDay { hour, minute })
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        chrono::Timelike::hour(&self.time)
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        chrono::Timelike::minute(&self.time)
    }

    /// The first occurrence strictly after `now`, in `now`'s timezone.
    ///
    /// A time skipped by a DST jump fires at the first instant after the gap.
    /// A repeated time fires at its earlier occurrence. Returns `None` only at
    /// the edge of the representable date range.
    #[must_use]
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let mut date = now.date_naive();
        // Today, tomorrow, and one spare day in case today's slot resolved
        // backwards onto `now`.
        for _ in 0..3 {
            let candidate = resolve_local(&tz, date.and_time(self.time))?;
            if candidate > *now {
                return Some(candidate);
            }
            date = date.succ_opt()?;
        }
        None
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self {
            time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Map a local wall-clock time to an instant.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(early, _) => Some(early),
        LocalResult::None => (1..=MAX_GAP_MINUTES).find_map(|minutes| {
            let shifted = naive.checked_add_signed(TimeDelta::minutes(minutes))?;
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt),
                LocalResult::None => None,
            }
        }),
    }
}

/// Run `job` every day at `schedule`, host local time.
///
/// The task runs until the returned handle is aborted.
pub fn spawn_daily<S, N, C>(job: Arc<ReminderJob<S, N, C>>, schedule: DailySchedule) -> JoinHandle<()>
where
    S: ContactStore + 'static,
    N: Notifier + 'static,
    C: Clock + 'static,
{
    tokio::spawn(run_daily(job, schedule, Local::now))
}

/// The scheduler loop, reading wall-clock time from `wall_clock`.
async fn run_daily<S, N, C, Tz, F>(
    job: Arc<ReminderJob<S, N, C>>,
    schedule: DailySchedule,
    wall_clock: F,
) where
    S: ContactStore,
    N: Notifier,
    C: Clock,
    Tz: TimeZone + Send + Sync,
    Tz::Offset: Send + Sync,
    F: Fn() -> DateTime<Tz> + Send,
{
    let mut last_fired: Option<DateTime<Tz>> = None;
    loop {
        let now = wall_clock();
        // Never search from before the slot that already fired.
        let from = match &last_fired {
            Some(fired) if *fired > now => fired.clone(),
            _ => now.clone(),
        };
        let Some(next) = schedule.next_after(&from) else {
            tracing::error!(
                now = %now.naive_local(),
                "no next reminder time could be computed, scheduler stopping"
            );
            return;
        };
        let wait = next
            .clone()
            .signed_duration_since(now)
            .to_std()
            .unwrap_or_default();
        tracing::info!(
            next_run = %next.naive_local(),
            wait_secs = wait.as_secs(),
            "Reminder job scheduled"
        );

        tokio::time::sleep(wait).await;

        match job.run().await {
            Ok(RunOutcome::Skipped) => {
                tracing::warn!("Scheduled reminder run skipped, another run is active");
            }
            Ok(outcome) => tracing::debug!(?outcome, "Scheduled reminder run finished"),
            Err(e) => {
                tracing::debug!(error = %e, "Scheduled reminder run aborted, retrying tomorrow");
            }
        }
        last_fired = Some(next);
    }
}
