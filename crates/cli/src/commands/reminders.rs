//! Reminder job commands.
//!
//! `run` performs exactly what the scheduled job does, once. `preview` loads
//! the same selection and logs it without sending.

use chrono::Utc;
use tracing::info;

use round_again_server::config::{EmailConfig, ReminderConfig};
use round_again_server::db::{self, PgContactStore};
use round_again_server::services::email::ReminderLine;
use round_again_server::services::{EmailNotifier, ReminderJob, RunOutcome, collect_due};

/// Run the reminder job once.
///
/// # Errors
///
/// Returns an error if configuration is missing, contacts cannot be loaded,
/// or the reminder email fails to send.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;
    let email = EmailConfig::from_env()?;
    let reminders = ReminderConfig::from_env()?;

    let pool = db::create_pool(&database_url).await?;
    let notifier = EmailNotifier::new(&email)?;
    let job = ReminderJob::new(PgContactStore::new(pool), notifier, reminders.window);

    match job.run().await? {
        RunOutcome::NotifyFailed { count, error } => {
            Err(format!("reminder for {count} contacts was not sent: {error}").into())
        }
        outcome => {
            info!(?outcome, "Reminder run finished");
            Ok(())
        }
    }
}

/// Log who a run right now would remind.
///
/// # Errors
///
/// Returns an error if configuration is missing or contacts cannot be loaded.
pub async fn preview() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;
    let reminders = ReminderConfig::from_env()?;

    let pool = db::create_pool(&database_url).await?;
    let store = PgContactStore::new(pool);
    let selected = collect_due(&store, Utc::now(), reminders.window).await?;

    if selected.is_empty() {
        info!(
            window_start = reminders.window.start(),
            window_end = reminders.window.end(),
            "Nobody inside the reminder window"
        );
        return Ok(());
    }

    for contact in &selected {
        let line = ReminderLine::from_due(contact);
        info!(
            name = %line.name,
            status = %line.status,
            cadence = %line.cadence,
            last_contact = %line.last_contact,
            "Would remind"
        );
    }
    info!(count = selected.len(), "Preview complete");
    Ok(())
}
