//! Daily reminder job.
//!
//! One run:
//! 1. Sample `now` once from the clock
//! 2. Load every contact with its history
//! 3. Evaluate each contact against that `now`
//! 4. Keep those inside the reminder window, most overdue first
//! 5. Hand the list to the notifier in a single call (nothing if empty)
//!
//! Runs never overlap. A trigger that arrives while a run is active is
//! skipped rather than queued. The in-flight flag covers triggers inside one
//! process; the store's run lease covers every process sharing the store.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use round_again_core::{
    Clock, Contact, DueContact, ReminderWindow, SystemClock, select_for_reminder,
};

/// Read-only source of contacts for the job.
pub trait ContactStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Proof that this job holds the run. Dropping it releases the run.
    type RunLease: Send;

    /// Every contact, each with its interaction history attached.
    fn list_all_contacts(&self) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send;

    /// Claim the run for every job sharing this store.
    ///
    /// `Ok(None)` means another job already holds it.
    fn try_acquire_run(
        &self,
    ) -> impl Future<Output = Result<Option<Self::RunLease>, Self::Error>> + Send;
}

/// Delivers the reminder summary.
pub trait Notifier: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send one summary covering `contacts`, already in display order.
    fn send_reminder(
        &self,
        contacts: &[DueContact],
        generated_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// How a run ended without a store failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Another run was already in progress.
    Skipped,
    /// Nobody was inside the reminder window; nothing was sent.
    NothingDue,
    /// The notifier accepted the summary.
    Sent { count: usize },
    /// The notifier failed. The run still counts as complete.
    NotifyFailed { count: usize, error: String },
}

/// A run that was aborted before anything was sent.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to load contacts: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to claim the reminder run: {0}")]
    Lease(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The reminder job and its in-flight flag.
pub struct ReminderJob<S, N, C = SystemClock> {
    store: S,
    notifier: N,
    clock: C,
    window: ReminderWindow,
    running: AtomicBool,
}

impl<S, N> ReminderJob<S, N, SystemClock>
where
    S: ContactStore,
    N: Notifier,
{
    /// A job driven by the system clock.
    #[must_use]
    pub const fn new(store: S, notifier: N, window: ReminderWindow) -> Self {
        Self::with_clock(store, notifier, SystemClock, window)
    }
}

impl<S, N, C> ReminderJob<S, N, C>
where
    S: ContactStore,
    N: Notifier,
    C: Clock,
{
    #[must_use]
    pub const fn with_clock(store: S, notifier: N, clock: C, window: ReminderWindow) -> Self {
        Self {
            store,
            notifier,
            clock,
            window,
            running: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn window(&self) -> ReminderWindow {
        self.window
    }

    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Whether a run is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run the job once, unless a run is already active.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Lease`] if the store could not be asked for the
    /// run, and [`JobError::Store`] if contacts could not be loaded. Nothing
    /// is sent in either case. Notifier failures are reported through
    /// [`RunOutcome::NotifyFailed`] instead.
    #[instrument(skip(self), fields(window_start = self.window.start(), window_end = self.window.end()))]
    pub async fn run(&self) -> Result<RunOutcome, JobError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            info!("Reminder run already in progress, skipping trigger");
            return Ok(RunOutcome::Skipped);
        };
        let _lease = match self.store.try_acquire_run().await {
            Ok(Some(lease)) => lease,
            Ok(None) => {
                info!("Reminder run held by another process, skipping trigger");
                return Ok(RunOutcome::Skipped);
            }
            Err(e) => {
                let e = JobError::Lease(Box::new(e));
                error!(error = %e, "Reminder run aborted");
                return Err(e);
            }
        };

        let now = self.clock.now();
        let selected = match self.preview(now).await {
            Ok(selected) => selected,
            Err(e) => {
                error!(error = %e, "Reminder run aborted");
                return Err(e);
            }
        };

        if selected.is_empty() {
            info!(%now, "No contacts inside the reminder window");
            return Ok(RunOutcome::NothingDue);
        }

        let count = selected.len();
        match self.notifier.send_reminder(&selected, now).await {
            Ok(()) => {
                info!(count, "Reminder sent");
                Ok(RunOutcome::Sent { count })
            }
            Err(e) => {
                error!(count, error = %e, "Failed to send reminder");
                Ok(RunOutcome::NotifyFailed {
                    count,
                    error: e.to_string(),
                })
            }
        }
    }

    /// The contacts a run at `now` would send, in send order.
    ///
    /// Does not take the in-flight flag and never notifies.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Store`] if contacts could not be loaded.
    pub async fn preview(&self, now: DateTime<Utc>) -> Result<Vec<DueContact>, JobError> {
        collect_due(&self.store, now, self.window).await
    }
}

/// Load every contact from `store` and keep those inside `window` at `now`.
///
/// Contacts whose cadence cannot be evaluated are logged and left out.
///
/// # Errors
///
/// Returns [`JobError::Store`] if contacts could not be loaded.
pub async fn collect_due<S: ContactStore>(
    store: &S,
    now: DateTime<Utc>,
    window: ReminderWindow,
) -> Result<Vec<DueContact>, JobError> {
    let contacts = store
        .list_all_contacts()
        .await
        .map_err(|e| JobError::Store(Box::new(e)))?;

    let total = contacts.len();
    let evaluated: Vec<DueContact> = contacts
        .iter()
        .filter_map(|contact| match DueContact::evaluate(contact, now) {
            Ok(due) => Some(due),
            Err(e) => {
                warn!(contact_id = %contact.id, error = %e, "Skipping contact with unusable cadence");
                None
            }
        })
        .collect();

    let selected = select_for_reminder(evaluated, window);
    info!(total, selected = selected.len(), "Evaluated contacts for reminder");
    Ok(selected)
}

/// Holds the in-flight flag for the life of a run.
///
/// Released on drop, including when the run panics or its future is
/// dropped mid-await.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
