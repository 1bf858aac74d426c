//! Test doubles for exercising the reminder pipeline without a database or
//! SMTP server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p round-again-integration-tests
//! ```
//!
//! # Fixtures
//!
//! - [`MemoryStore`] - In-memory [`ContactStore`], optionally failing. Clones
//!   share one run lease, like two processes sharing a database
//! - [`RecordingNotifier`] - Records every summary it is asked to send
//! - [`GatedNotifier`] - Blocks inside a send until released, for overlap tests
//! - [`contact`] - Builds a contact with history relative to a fixed `now`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, Notify};

use round_again_core::{
    Contact, ContactId, DueContact, FrequencyUnit, Interaction, InteractionId, InteractionType,
};
use round_again_server::services::{ContactStore, Notifier};

/// Error returned by the fakes when told to fail.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FakeError(pub String);

/// A fixed instant used as "now" across the tests.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Build a contact whose interactions happened `days_ago` days before `now`.
#[must_use]
pub fn contact(
    id: i32,
    name: &str,
    frequency_value: i32,
    frequency_unit: FrequencyUnit,
    days_ago: &[i64],
    now: DateTime<Utc>,
) -> Contact {
    let contact_id = ContactId::new(id);
    let interactions = days_ago
        .iter()
        .zip(1..)
        .map(|(&days, n)| Interaction {
            id: InteractionId::new(id * 100 + n),
            contact_id,
            interaction_type: InteractionType::Call,
            interaction_date: now - TimeDelta::days(days),
            notes: None,
        })
        .collect();

    let mut contact = Contact {
        id: contact_id,
        name: name.to_string(),
        email: None,
        phone: None,
        frequency_value,
        frequency_unit,
        notes: None,
        created_at: now - TimeDelta::days(365),
        updated_at: now - TimeDelta::days(365),
        interactions,
    };
    contact.sort_interactions();
    contact
}

/// In-memory contact store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    contacts: Vec<Contact>,
    failure: Option<String>,
    run_claimed: Arc<AtomicBool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            ..Self::default()
        }
    }

    /// A store whose every load fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Whether some job currently holds the run lease.
    #[must_use]
    pub fn is_run_claimed(&self) -> bool {
        self.run_claimed.load(Ordering::Acquire)
    }
}

/// Run lease handed out by [`MemoryStore`]; released on drop.
#[derive(Debug)]
pub struct MemoryLease(Arc<AtomicBool>);

impl Drop for MemoryLease {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ContactStore for MemoryStore {
    type Error = FakeError;
    type RunLease = MemoryLease;

    async fn list_all_contacts(&self) -> Result<Vec<Contact>, FakeError> {
        match &self.failure {
            Some(message) => Err(FakeError(message.clone())),
            None => Ok(self.contacts.clone()),
        }
    }

    async fn try_acquire_run(&self) -> Result<Option<MemoryLease>, FakeError> {
        let claimed = self
            .run_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        Ok(claimed.then(|| MemoryLease(Arc::clone(&self.run_claimed))))
    }
}

/// One summary handed to a notifier.
#[derive(Debug, Clone)]
pub struct SentSummary {
    pub contacts: Vec<DueContact>,
    pub generated_at: DateTime<Utc>,
}

/// Records every summary, optionally failing each send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentSummary>>,
    failure: Option<String>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that records the attempt and then fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::default(),
            failure: Some(message.to_string()),
        }
    }

    /// Everything sent so far, oldest first.
    pub async fn sent(&self) -> Vec<SentSummary> {
        self.sent.lock().await.clone()
    }
}

impl Notifier for RecordingNotifier {
    type Error = FakeError;

    async fn send_reminder(
        &self,
        contacts: &[DueContact],
        generated_at: DateTime<Utc>,
    ) -> Result<(), FakeError> {
        self.sent.lock().await.push(SentSummary {
            contacts: contacts.to_vec(),
            generated_at,
        });
        match &self.failure {
            Some(message) => Err(FakeError(message.clone())),
            None => Ok(()),
        }
    }
}

/// Parks inside `send_reminder` until [`GatedNotifier::release`] is called.
#[derive(Debug, Default)]
pub struct GatedNotifier {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    sends: Mutex<usize>,
}

impl GatedNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once a send has started.
    pub async fn wait_until_sending(&self) {
        self.entered.notified().await;
    }

    /// Let the parked send finish.
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub async fn sends(&self) -> usize {
        *self.sends.lock().await
    }
}

impl Notifier for GatedNotifier {
    type Error = FakeError;

    async fn send_reminder(
        &self,
        _contacts: &[DueContact],
        _generated_at: DateTime<Utc>,
    ) -> Result<(), FakeError> {
        *self.sends.lock().await += 1;
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}
