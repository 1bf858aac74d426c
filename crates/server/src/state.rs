//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use round_again_core::Clock;
use sqlx::PgPool;

use crate::db::PgContactStore;
use crate::services::email::EmailNotifier;
use crate::services::reminders::ReminderJob;

/// The reminder job as wired in production.
pub type ServerJob = ReminderJob<PgContactStore, EmailNotifier>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and the reminder job.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    job: Arc<ServerJob>,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The job is shared with the scheduler so manual and scheduled runs
    /// contend for the same in-flight flag.
    #[must_use]
    pub fn new(
        pool: PgPool,
        job: Arc<ServerJob>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                job,
                clock,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the shared reminder job.
    #[must_use]
    pub fn job(&self) -> &ServerJob {
        &self.inner.job
    }

    /// Sample the current time. Handlers call this once per request.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }
}
