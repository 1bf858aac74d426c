//! Dashboard grouping and list filters over a realistic address book.

#![allow(clippy::unwrap_used)]

use round_again_core::policy::PRIORITY_LIMIT;
use round_again_core::{
    Contact, ContactFilter, DashboardSummary, DueContact, FrequencyUnit, ReminderWindow,
    select_for_reminder,
};
use round_again_integration_tests::{contact, fixed_now};

/// The bundled sample contacts, as they look right after seeding.
fn address_book() -> Vec<Contact> {
    let now = fixed_now();
    vec![
        contact(1, "John Smith", 2, FrequencyUnit::Week, &[20], now),
        contact(2, "Emily Johnson", 1, FrequencyUnit::Month, &[25], now),
        contact(3, "Michael Chen", 3, FrequencyUnit::Month, &[5, 90], now),
        contact(4, "Sarah Williams", 6, FrequencyUnit::Month, &[200], now),
        contact(5, "David Rodriguez", 1, FrequencyUnit::Week, &[2, 10, 30], now),
    ]
}

fn evaluated(contacts: &[Contact]) -> Vec<DueContact> {
    contacts
        .iter()
        .map(|c| DueContact::evaluate(c, fixed_now()).unwrap())
        .collect()
}

#[test]
fn test_sample_book_due_days() {
    let due = evaluated(&address_book());
    let days: Vec<(&str, i64)> = due
        .iter()
        .map(|c| (c.name.as_str(), c.status.days_until_due))
        .collect();

    assert_eq!(
        days,
        [
            ("John Smith", -6),
            ("Emily Johnson", 5),
            ("Michael Chen", 85),
            ("Sarah Williams", -20),
            ("David Rodriguez", 5),
        ]
    );
}

#[test]
fn test_dashboard_groups_overdue_and_due_soon() {
    let book = address_book();
    let summary = DashboardSummary::build(book.len(), &evaluated(&book), fixed_now());

    assert_eq!(summary.total_contacts, 5);
    assert_eq!(summary.overdue_count, 2);
    assert_eq!(summary.due_soon_count, 2);

    let priority: Vec<&str> = summary.priority.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        priority,
        ["Sarah Williams", "John Smith", "Emily Johnson", "David Rodriguez"]
    );
}

#[test]
fn test_dashboard_and_reminder_windows_differ() {
    let due = evaluated(&address_book());

    // John is six days overdue: on the dashboard, but past the reminder window.
    let reminded = select_for_reminder(due.clone(), ReminderWindow::default());
    assert!(reminded.is_empty());

    let summary = DashboardSummary::build(due.len(), &due, fixed_now());
    assert!(summary.priority.iter().any(|c| c.name == "John Smith"));
}

#[test]
fn test_priority_is_capped() {
    let now = fixed_now();
    let book: Vec<Contact> = (1..=8)
        .map(|id| {
            let days_ago = i64::from(id) + 1;
            contact(id, &format!("Friend {id}"), 1, FrequencyUnit::Day, &[days_ago], now)
        })
        .collect();

    let summary = DashboardSummary::build(book.len(), &evaluated(&book), now);

    assert_eq!(summary.overdue_count, 8);
    assert_eq!(summary.priority.len(), PRIORITY_LIMIT);
    assert_eq!(summary.priority[0].name, "Friend 8");
}

#[test]
fn test_list_filters() {
    let due = evaluated(&address_book());
    let names = |filter: ContactFilter| -> Vec<&str> {
        due.iter()
            .filter(|c| filter.matches(&c.status))
            .map(|c| c.name.as_str())
            .collect()
    };

    assert_eq!(names(ContactFilter::All).len(), 5);
    assert_eq!(names(ContactFilter::Overdue), ["John Smith", "Sarah Williams"]);
    assert_eq!(names(ContactFilter::Due), ["John Smith", "Sarah Williams"]);
}
