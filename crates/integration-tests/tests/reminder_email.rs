//! The reminder job feeding the real email templates.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use round_again_core::{DueContact, EmailAddress, FixedClock, FrequencyUnit, ReminderWindow};
use round_again_integration_tests::{MemoryStore, contact, fixed_now};
use round_again_server::services::email::{EmailError, REMINDER_SUBJECT, render_daily_reminder};
use round_again_server::services::{Notifier, ReminderJob, RunOutcome};
use tokio::sync::Mutex;

/// Renders each summary with the production templates and keeps the bodies.
#[derive(Default)]
struct RenderingNotifier {
    bodies: Mutex<Vec<(String, String)>>,
}

impl Notifier for RenderingNotifier {
    type Error = EmailError;

    async fn send_reminder(
        &self,
        contacts: &[DueContact],
        generated_at: DateTime<Utc>,
    ) -> Result<(), EmailError> {
        let rendered = render_daily_reminder(contacts, generated_at)?;
        self.bodies.lock().await.push(rendered);
        Ok(())
    }
}

#[tokio::test]
async fn test_reminder_email_lists_contacts_in_send_order() {
    let now = fixed_now();
    let mut emily = contact(1, "Emily Johnson", 1, FrequencyUnit::Month, &[29], now);
    emily.email = Some(EmailAddress::parse("emily.j@example.com").unwrap());
    emily.phone = Some("555-987-6543".to_string());
    let john = contact(2, "John Smith", 2, FrequencyUnit::Week, &[18], now);

    let job = ReminderJob::with_clock(
        MemoryStore::new(vec![emily, john]),
        RenderingNotifier::default(),
        FixedClock(now),
        ReminderWindow::default(),
    );

    assert_eq!(job.run().await.unwrap(), RunOutcome::Sent { count: 2 });

    let bodies = job.notifier().bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    let (text, html) = &bodies[0];

    assert!(text.contains("Saturday, June 1, 2024"));
    let john_at = text.find("John Smith - Overdue by 4 days").unwrap();
    let emily_at = text.find("Emily Johnson - Due tomorrow").unwrap();
    assert!(john_at < emily_at);
    assert!(text.contains("emily.j@example.com | 555-987-6543"));
    assert!(text.contains("every 2 weeks"));

    assert!(html.contains("John Smith"));
    assert!(html.contains("Due tomorrow"));
}

#[test]
fn test_subject_line() {
    assert_eq!(REMINDER_SUBJECT, "Keep In Touch - Your Contact Reminders");
}
