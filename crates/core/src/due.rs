//! Due-status calculator.
//!
//! Every field of a [`DueStatus`] is derived from the single `now` the caller
//! passes in. Nothing in this module reads a clock.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cadence::{Cadence, CadenceError};
use crate::models::Interaction;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// When a contact is next due and how close that is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DueStatus {
    pub next_due_date: DateTime<Utc>,
    /// Whole days from `now` to `next_due_date`, rounded toward negative
    /// infinity. Negative means overdue.
    pub days_until_due: i64,
    pub is_due: bool,
    pub is_due_soon: bool,
}

impl DueStatus {
    /// Derive the flags for a known due date.
    #[must_use]
    pub fn at(next_due_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let days_until_due = (next_due_date - now)
            .num_milliseconds()
            .div_euclid(MILLIS_PER_DAY);
        Self {
            next_due_date,
            days_until_due,
            is_due: days_until_due < 0,
            is_due_soon: days_until_due <= 1,
        }
    }
}

/// Compute due status from a cadence and an unordered interaction history.
///
/// Only the latest `interaction_date` matters. A contact with no history is
/// due at `now` itself: zero days out, due soon, not yet overdue.
///
/// # Errors
///
/// Returns [`CadenceError::OutOfRange`] when the due date would fall outside
/// the representable timestamp range.
pub fn evaluate(
    cadence: Cadence,
    interactions: &[Interaction],
    now: DateTime<Utc>,
) -> Result<DueStatus, CadenceError> {
    let latest = interactions.iter().map(|i| i.interaction_date).max();
    evaluate_from_latest(cadence, latest, now)
}

/// Same as [`evaluate`] when the caller already knows the latest date.
///
/// # Errors
///
/// See [`evaluate`].
pub fn evaluate_from_latest(
    cadence: Cadence,
    latest: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<DueStatus, CadenceError> {
    let Some(latest) = latest else {
        return Ok(DueStatus::at(now, now));
    };
    let next_due_date = latest
        .checked_add_signed(cadence.offset()?)
        .ok_or(CadenceError::OutOfRange {
            value: cadence.value(),
            unit: cadence.unit(),
        })?;
    Ok(DueStatus::at(next_due_date, now))
}
