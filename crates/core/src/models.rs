//! Contacts and the interactions logged against them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cadence::{Cadence, CadenceError, FrequencyUnit, ParseEnumError};
use crate::due::{self, DueStatus};
use crate::types::{ContactId, EmailAddress, InteractionId};

/// Longest accepted contact name, in characters.
pub const MAX_NAME_LENGTH: usize = 100;
/// Longest accepted phone number, in characters.
pub const MAX_PHONE_LENGTH: usize = 20;

/// How a contact was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    #[default]
    Call,
    Video,
    Email,
    Text,
    InPerson,
    Other,
}

impl InteractionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Video => "video",
            Self::Email => "email",
            Self::Text => "text",
            Self::InPerson => "in_person",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "call" => Ok(Self::Call),
            "video" => Ok(Self::Video),
            "email" => Ok(Self::Email),
            "text" => Ok(Self::Text),
            "in_person" => Ok(Self::InPerson),
            "other" => Ok(Self::Other),
            other => Err(ParseEnumError {
                kind: "interaction type",
                value: other.to_owned(),
            }),
        }
    }
}

/// A single logged contact event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    pub contact_id: ContactId,
    pub interaction_type: InteractionType,
    pub interaction_date: DateTime<Utc>,
    pub notes: Option<String>,
}

/// A person to stay in touch with, plus their interaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    /// Raw stored value; validated by [`Contact::cadence`].
    pub frequency_value: i32,
    pub frequency_unit: FrequencyUnit,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Most recent first.
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Contact {
    /// The validated cadence built from the stored frequency fields.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError::NonPositive`] if the stored value is below 1.
    pub const fn cadence(&self) -> Result<Cadence, CadenceError> {
        Cadence::new(self.frequency_value, self.frequency_unit)
    }

    /// The interaction with the greatest `interaction_date`.
    #[must_use]
    pub fn latest_interaction(&self) -> Option<&Interaction> {
        self.interactions.iter().max_by_key(|i| i.interaction_date)
    }

    /// Due status as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`CadenceError`] when the cadence is invalid or its due date
    /// cannot be represented.
    pub fn due_status(&self, now: DateTime<Utc>) -> Result<DueStatus, CadenceError> {
        due::evaluate(self.cadence()?, &self.interactions, now)
    }

    /// Put the history into most-recent-first order.
    pub fn sort_interactions(&mut self) {
        self.interactions
            .sort_by(|a, b| b.interaction_date.cmp(&a.interaction_date));
    }
}

/// A rejected field on a contact create or update.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactFieldError {
    #[error("name is required")]
    EmptyName,
    #[error("name must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong,
    #[error("phone must be at most {MAX_PHONE_LENGTH} characters")]
    PhoneTooLong,
    #[error(transparent)]
    Cadence(#[from] CadenceError),
}

/// Editable contact fields, as submitted for create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDraft {
    pub name: String,
    #[serde(default)]
    pub email: Option<EmailAddress>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_frequency_value")]
    pub frequency_value: i32,
    #[serde(default)]
    pub frequency_unit: FrequencyUnit,
    #[serde(default)]
    pub notes: Option<String>,
}

const fn default_frequency_value() -> i32 {
    1
}

impl ContactDraft {
    /// Trim text fields, drop blank optionals, and check limits.
    ///
    /// The cadence must also convert to a representable duration, so a saved
    /// contact can always be evaluated.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContactFieldError`] found.
    pub fn validate(self) -> Result<Self, ContactFieldError> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(ContactFieldError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ContactFieldError::NameTooLong);
        }
        let phone = non_blank(self.phone);
        if phone
            .as_deref()
            .is_some_and(|p| p.chars().count() > MAX_PHONE_LENGTH)
        {
            return Err(ContactFieldError::PhoneTooLong);
        }
        Cadence::new(self.frequency_value, self.frequency_unit)?.offset()?;

        Ok(Self {
            name,
            email: self.email,
            phone,
            frequency_value: self.frequency_value,
            frequency_unit: self.frequency_unit,
            notes: non_blank(self.notes),
        })
    }
}

/// Fields for logging a new interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionDraft {
    #[serde(default)]
    pub interaction_type: InteractionType,
    /// Defaults to the time the interaction is recorded.
    #[serde(default)]
    pub interaction_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl InteractionDraft {
    /// Resolve the date against `now` and drop blank notes.
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>) -> (InteractionType, DateTime<Utc>, Option<String>) {
        (
            self.interaction_type,
            self.interaction_date.unwrap_or(now),
            non_blank(self.notes),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
