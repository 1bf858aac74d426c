//! Which contacts get surfaced, and where.
//!
//! Two separate policies live here. The daily reminder email uses a narrow
//! band of `days_until_due` ([`ReminderWindow`]). The dashboard groups
//! contacts by a wider look-ahead ([`DUE_SOON_HORIZON_DAYS`]). Changing one
//! does not affect the other.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::cadence::{Cadence, CadenceError};
use crate::due::DueStatus;
use crate::models::Contact;
use crate::types::{ContactId, EmailAddress};

/// Look-ahead used by the dashboard's "due soon" group.
pub const DUE_SOON_HORIZON_DAYS: i64 = 7;
/// Number of contacts shown in the dashboard priority list.
pub const PRIORITY_LIMIT: usize = 5;

/// Inclusive band of `days_until_due` values that earn a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderWindow {
    start: i64,
    end: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("reminder window start ({start}) is after its end ({end})")]
pub struct InvalidWindow {
    pub start: i64,
    pub end: i64,
}

impl ReminderWindow {
    /// Up to five days overdue through one day before due.
    pub const DEFAULT: Self = Self { start: -5, end: 1 };

    /// # Errors
    ///
    /// Returns [`InvalidWindow`] if `start > end`.
    pub const fn new(start: i64, end: i64) -> Result<Self, InvalidWindow> {
        if start > end {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(self) -> i64 {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> i64 {
        self.end
    }

    #[must_use]
    pub const fn contains(self, days_until_due: i64) -> bool {
        self.start <= days_until_due && days_until_due <= self.end
    }
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A contact paired with its due status at one evaluation time.
///
/// This is what reminders and the dashboard hand around: enough to render a
/// line about the contact without the full history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueContact {
    pub id: ContactId,
    pub name: String,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub cadence: Cadence,
    pub last_interaction: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub status: DueStatus,
}

impl DueContact {
    /// Evaluate `contact` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError`] if the contact's cadence is unusable.
    pub fn evaluate(contact: &Contact, now: DateTime<Utc>) -> Result<Self, CadenceError> {
        let cadence = contact.cadence()?;
        let status = crate::due::evaluate(cadence, &contact.interactions, now)?;
        Ok(Self {
            id: contact.id,
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            cadence,
            last_interaction: contact.latest_interaction().map(|i| i.interaction_date),
            status,
        })
    }

    #[must_use]
    pub const fn days_until_due(&self) -> i64 {
        self.status.days_until_due
    }
}

/// Keep the candidates inside `window`, most overdue first.
///
/// The sort is stable, so contacts with equal `days_until_due` stay in the
/// order they were supplied.
#[must_use]
pub fn select_for_reminder(candidates: Vec<DueContact>, window: ReminderWindow) -> Vec<DueContact> {
    let mut selected: Vec<DueContact> = candidates
        .into_iter()
        .filter(|c| window.contains(c.days_until_due()))
        .collect();
    selected.sort_by_key(DueContact::days_until_due);
    selected
}

/// Counts and priority list for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_contacts: usize,
    pub overdue_count: usize,
    pub due_soon_count: usize,
    /// Overdue and due-soon contacts, earliest due date first.
    pub priority: Vec<DueContact>,
}

impl DashboardSummary {
    /// Group already-evaluated contacts.
    ///
    /// `total_contacts` is supplied separately so contacts whose cadence
    /// failed to evaluate are still counted.
    #[must_use]
    pub fn build(total_contacts: usize, evaluated: &[DueContact], now: DateTime<Utc>) -> Self {
        let horizon = now + TimeDelta::days(DUE_SOON_HORIZON_DAYS);

        let overdue = evaluated.iter().filter(|c| c.status.is_due);
        let due_soon = evaluated
            .iter()
            .filter(|c| !c.status.is_due && c.status.next_due_date <= horizon);

        let overdue_count = overdue.clone().count();
        let due_soon_count = due_soon.clone().count();

        let mut priority: Vec<DueContact> = overdue.chain(due_soon).cloned().collect();
        priority.sort_by_key(|c| c.status.next_due_date);
        priority.truncate(PRIORITY_LIMIT);

        Self {
            total_contacts,
            overdue_count,
            due_soon_count,
            priority,
        }
    }
}

/// Narrowing applied by the contact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContactFilter {
    #[default]
    All,
    /// Due soon, which includes overdue.
    Due,
    Overdue,
}

impl ContactFilter {
    #[must_use]
    pub const fn matches(self, status: &DueStatus) -> bool {
        match self {
            Self::All => true,
            Self::Due => status.is_due_soon,
            Self::Overdue => status.is_due,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::cadence::FrequencyUnit;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 7, 0, 0).unwrap()
    }

    fn due_in(id: i32, days: i64) -> DueContact {
        DueContact {
            id: ContactId::new(id),
            name: format!("contact {id}"),
            email: None,
            phone: None,
            cadence: Cadence::new(1, FrequencyUnit::Week).unwrap(),
            last_interaction: None,
            status: DueStatus::at(now() + TimeDelta::days(days), now()),
        }
    }

    fn ids(contacts: &[DueContact]) -> Vec<i32> {
        contacts.iter().map(|c| c.id.as_i32()).collect()
    }

    #[test]
    fn test_default_window_bounds_are_inclusive() {
        let w = ReminderWindow::default();
        assert!(w.contains(-5));
        assert!(w.contains(1));
        assert!(!w.contains(-6));
        assert!(!w.contains(2));
        assert_eq!((w.start(), w.end()), (-5, 1));
    }

    #[test]
    fn test_window_rejects_inverted_bounds() {
        assert_eq!(
            ReminderWindow::new(3, -3),
            Err(InvalidWindow { start: 3, end: -3 })
        );
        assert!(ReminderWindow::new(0, 0).is_ok());
    }

    #[test]
    fn test_selection_filters_and_orders_most_overdue_first() {
        let candidates = vec![
            due_in(1, 1),
            due_in(2, -110),
            due_in(3, -2),
            due_in(4, 5),
            due_in(5, -5),
        ];
        let selected = select_for_reminder(candidates, ReminderWindow::default());
        assert_eq!(ids(&selected), vec![5, 3, 1]);
    }

    #[test]
    fn test_selection_ties_keep_input_order() {
        let candidates = vec![due_in(7, 0), due_in(3, -1), due_in(5, 0)];
        let selected = select_for_reminder(candidates, ReminderWindow::default());
        assert_eq!(ids(&selected), vec![3, 7, 5]);
    }

    #[test]
    fn test_dashboard_groups_and_priority() {
        let evaluated = vec![
            due_in(1, 30),
            due_in(2, -3),
            due_in(3, 6),
            due_in(4, 0),
            due_in(5, -40),
            due_in(6, 2),
            due_in(7, 7),
            due_in(8, 8),
        ];
        let summary = DashboardSummary::build(9, &evaluated, now());

        assert_eq!(summary.total_contacts, 9);
        assert_eq!(summary.overdue_count, 2);
        assert_eq!(summary.due_soon_count, 4);
        assert_eq!(ids(&summary.priority), vec![5, 2, 4, 6, 3]);
    }

    #[test]
    fn test_contact_filter() {
        let overdue = due_in(1, -1).status;
        let soon = due_in(2, 1).status;
        let later = due_in(3, 9).status;

        assert!(ContactFilter::All.matches(&later));
        assert!(ContactFilter::Due.matches(&overdue));
        assert!(ContactFilter::Due.matches(&soon));
        assert!(!ContactFilter::Due.matches(&later));
        assert!(ContactFilter::Overdue.matches(&overdue));
        assert!(!ContactFilter::Overdue.matches(&soon));
    }
}
