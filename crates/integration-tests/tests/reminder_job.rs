//! End-to-end runs of the reminder job against in-memory collaborators.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::TimeDelta;
use round_again_core::{FixedClock, FrequencyUnit, ReminderWindow};
use round_again_integration_tests::{
    GatedNotifier, MemoryStore, RecordingNotifier, contact, fixed_now,
};
use round_again_server::services::{JobError, ReminderJob, RunOutcome, collect_due};

fn job<N>(store: MemoryStore, notifier: N) -> ReminderJob<MemoryStore, N, FixedClock>
where
    N: round_again_server::services::Notifier,
{
    ReminderJob::with_clock(
        store,
        notifier,
        FixedClock(fixed_now()),
        ReminderWindow::default(),
    )
}

#[tokio::test]
async fn test_weekly_contact_three_days_overdue_is_reminded() {
    let now = fixed_now();
    let store = MemoryStore::new(vec![contact(1, "Weekly", 1, FrequencyUnit::Week, &[10], now)]);
    let job = job(store, RecordingNotifier::new());

    let outcome = job.run().await.unwrap();

    assert_eq!(outcome, RunOutcome::Sent { count: 1 });
    let sent = job.notifier().sent().await;
    assert_eq!(sent.len(), 1);
    let due = &sent[0].contacts[0];
    assert_eq!(due.status.days_until_due, -3);
    assert!(due.status.is_due);
    assert_eq!(due.status.next_due_date, now - TimeDelta::days(3));
}

#[tokio::test]
async fn test_long_overdue_contact_falls_outside_window() {
    let now = fixed_now();
    let quarterly = contact(1, "Quarterly", 3, FrequencyUnit::Month, &[200], now);

    let status = quarterly.due_status(now).unwrap();
    assert_eq!(status.days_until_due, -110);
    assert!(status.is_due);

    let job = job(MemoryStore::new(vec![quarterly]), RecordingNotifier::new());
    assert_eq!(job.run().await.unwrap(), RunOutcome::NothingDue);
    assert!(job.notifier().sent().await.is_empty());
}

#[tokio::test]
async fn test_empty_selection_sends_nothing() {
    let now = fixed_now();
    let store = MemoryStore::new(vec![
        contact(1, "Recent", 1, FrequencyUnit::Month, &[2], now),
        contact(2, "Yearly", 1, FrequencyUnit::Year, &[30], now),
    ]);
    let job = job(store, RecordingNotifier::new());

    assert_eq!(job.run().await.unwrap(), RunOutcome::NothingDue);
    assert!(job.notifier().sent().await.is_empty());
}

#[tokio::test]
async fn test_single_notification_most_overdue_first() {
    let now = fixed_now();
    // Due tomorrow: 6 days into a weekly cadence.
    let tomorrow = contact(1, "Tomorrow", 1, FrequencyUnit::Week, &[6], now);
    // Two days overdue: 9 days into a weekly cadence.
    let overdue = contact(2, "Overdue", 1, FrequencyUnit::Week, &[9, 40], now);
    let job = job(
        MemoryStore::new(vec![tomorrow, overdue]),
        RecordingNotifier::new(),
    );

    assert_eq!(job.run().await.unwrap(), RunOutcome::Sent { count: 2 });

    let sent = job.notifier().sent().await;
    assert_eq!(sent.len(), 1);
    let days: Vec<i64> = sent[0]
        .contacts
        .iter()
        .map(|c| c.status.days_until_due)
        .collect();
    assert_eq!(days, [-2, 1]);
    assert_eq!(sent[0].contacts[0].name, "Overdue");
    assert_eq!(sent[0].generated_at, now);
}

#[tokio::test]
async fn test_store_failure_aborts_without_notifying() {
    let job = job(MemoryStore::failing("connection refused"), RecordingNotifier::new());

    let err = job.run().await.unwrap_err();

    assert!(matches!(err, JobError::Store(_)));
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "connection refused");
    assert!(job.notifier().sent().await.is_empty());
    assert!(!job.is_running());
}

#[tokio::test]
async fn test_notifier_failure_completes_run() {
    let now = fixed_now();
    let store = MemoryStore::new(vec![contact(1, "Weekly", 1, FrequencyUnit::Week, &[8], now)]);
    let job = job(store, RecordingNotifier::failing("smtp timeout"));

    let outcome = job.run().await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::NotifyFailed {
            count: 1,
            error: "smtp timeout".to_string()
        }
    );
    assert_eq!(job.notifier().sent().await.len(), 1);
    assert!(!job.is_running());

    // The next run is not blocked by the failed one.
    assert!(matches!(
        job.run().await.unwrap(),
        RunOutcome::NotifyFailed { .. }
    ));
}

#[tokio::test]
async fn test_overlapping_trigger_is_skipped() {
    let now = fixed_now();
    let store = MemoryStore::new(vec![contact(1, "Weekly", 1, FrequencyUnit::Week, &[8], now)]);
    let job = Arc::new(job(store, GatedNotifier::new()));

    let first = tokio::spawn({
        let job = Arc::clone(&job);
        async move { job.run().await }
    });

    job.notifier().wait_until_sending().await;
    assert!(job.is_running());
    assert_eq!(job.run().await.unwrap(), RunOutcome::Skipped);

    job.notifier().release();
    assert_eq!(first.await.unwrap().unwrap(), RunOutcome::Sent { count: 1 });
    assert_eq!(job.notifier().sends().await, 1);
    assert!(!job.is_running());
}

#[tokio::test]
async fn test_second_job_over_same_store_is_skipped() {
    let now = fixed_now();
    let store = MemoryStore::new(vec![contact(1, "Weekly", 1, FrequencyUnit::Week, &[8], now)]);
    let scheduled = Arc::new(job(store.clone(), GatedNotifier::new()));
    let manual = job(store.clone(), RecordingNotifier::new());

    let first = tokio::spawn({
        let scheduled = Arc::clone(&scheduled);
        async move { scheduled.run().await }
    });

    scheduled.notifier().wait_until_sending().await;
    assert!(store.is_run_claimed());
    assert!(!manual.is_running());
    assert_eq!(manual.run().await.unwrap(), RunOutcome::Skipped);
    assert!(manual.notifier().sent().await.is_empty());

    scheduled.notifier().release();
    assert_eq!(first.await.unwrap().unwrap(), RunOutcome::Sent { count: 1 });
    assert!(!store.is_run_claimed());

    // Once the first run is over the other job may run normally.
    assert_eq!(manual.run().await.unwrap(), RunOutcome::Sent { count: 1 });
    assert_eq!(scheduled.notifier().sends().await, 1);
}

#[tokio::test]
async fn test_invalid_cadence_does_not_block_others() {
    let now = fixed_now();
    let store = MemoryStore::new(vec![
        contact(1, "Broken", 0, FrequencyUnit::Week, &[8], now),
        contact(2, "Weekly", 1, FrequencyUnit::Week, &[8], now),
    ]);

    let selected = collect_due(&store, now, ReminderWindow::default())
        .await
        .unwrap();

    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].name, "Weekly");
}

#[tokio::test]
async fn test_custom_window_widens_selection() {
    let now = fixed_now();
    let store = MemoryStore::new(vec![
        contact(1, "Long overdue", 1, FrequencyUnit::Week, &[30], now),
        contact(2, "Next week", 1, FrequencyUnit::Week, &[1], now),
    ]);

    let narrow = collect_due(&store, now, ReminderWindow::default())
        .await
        .unwrap();
    assert!(narrow.is_empty());

    let wide = collect_due(&store, now, ReminderWindow::new(-30, 7).unwrap())
        .await
        .unwrap();
    let names: Vec<&str> = wide.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Long overdue", "Next week"]);
}

#[tokio::test]
async fn test_contact_without_history_is_due_now() {
    let now = fixed_now();
    let store = MemoryStore::new(vec![contact(1, "New", 2, FrequencyUnit::Week, &[], now)]);
    let job = job(store, RecordingNotifier::new());

    assert_eq!(job.run().await.unwrap(), RunOutcome::Sent { count: 1 });
    let sent = job.notifier().sent().await;
    let due = &sent[0].contacts[0];
    assert_eq!(due.status.days_until_due, 0);
    assert!(due.last_interaction.is_none());
}
