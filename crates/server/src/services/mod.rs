//! Business logic services.
//!
//! # Services
//!
//! - `email` - Reminder and test emails via SMTP
//! - `reminders` - The daily reminder job and its collaborator traits
//! - `scheduler` - Fires the job once a day at a local wall-clock time

pub mod email;
pub mod reminders;
pub mod scheduler;

pub use email::{EmailError, EmailNotifier};
pub use reminders::{ContactStore, JobError, Notifier, ReminderJob, RunOutcome, collect_due};
pub use scheduler::{DailySchedule, spawn_daily};
