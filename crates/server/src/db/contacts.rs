//! Contact repository.
//!
//! Queries are built at runtime with `sqlx::query_as` and decoded into
//! private row types, then converted into core models. Enum columns are
//! stored as `TEXT` and parsed on the way out.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use round_again_core::{
    Contact, ContactDraft, ContactId, EmailAddress, FrequencyUnit, Interaction,
};

use super::RepositoryError;
use super::interactions::{INTERACTION_COLUMNS, InteractionRow};

const CONTACT_COLUMNS: &str = "id, name, email, phone, frequency_value, frequency_unit, \
                               notes, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` contact queries.
#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: i32,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    frequency_value: i32,
    frequency_unit: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = RepositoryError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .as_deref()
            .map(EmailAddress::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid email for contact {}: {e}",
                    row.id
                ))
            })?;
        let frequency_unit: FrequencyUnit = row.frequency_unit.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("contact {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ContactId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            frequency_value: row.frequency_value,
            frequency_unit,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            interactions: Vec::new(),
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for contact database operations.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every contact with its full history, most recent interaction first.
    ///
    /// Both reads run in one read-only repeatable-read transaction so the
    /// histories match the contact list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    #[instrument(skip(self))]
    pub async fn list_with_interactions(&self) -> Result<Vec<Contact>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let contact_rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY name, id"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let interaction_rows = sqlx::query_as::<_, InteractionRow>(&format!(
            "SELECT {INTERACTION_COLUMNS} FROM interactions \
             ORDER BY interaction_date DESC, id DESC"
        ))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut histories: HashMap<i32, Vec<_>> = HashMap::new();
        for row in interaction_rows {
            histories.entry(row.contact_id).or_default().push(row);
        }

        contact_rows
            .into_iter()
            .map(|row| -> Result<Contact, RepositoryError> {
                let history = histories.remove(&row.id).unwrap_or_default();
                let mut contact = Contact::try_from(row)?;
                contact.interactions = history
                    .into_iter()
                    .map(TryInto::try_into)
                    .collect::<Result<Vec<Interaction>, RepositoryError>>()?;
                Ok(contact)
            })
            .collect()
    }

    /// Get one contact with its history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    #[instrument(skip_all, fields(contact_id = %id))]
    pub async fn get(&self, id: ContactId) -> Result<Option<Contact>, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut contact = Contact::try_from(row)?;
        contact.interactions = super::InteractionRepository::new(self.pool)
            .list_for_contact(id)
            .await?;
        Ok(Some(contact))
    }

    /// Insert a contact. `draft` must already be validated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip_all, fields(name = %draft.name))]
    pub async fn create(
        &self,
        draft: &ContactDraft,
        now: DateTime<Utc>,
    ) -> Result<Contact, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "INSERT INTO contacts \
                 (name, email, phone, frequency_value, frequency_unit, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.email.as_ref().map(EmailAddress::as_str))
        .bind(draft.phone.as_deref())
        .bind(draft.frequency_value)
        .bind(draft.frequency_unit.as_str())
        .bind(draft.notes.as_deref())
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Contact::try_from(row)
    }

    /// Replace a contact's editable fields and refresh `updated_at`.
    ///
    /// The returned contact has no interactions attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such contact exists.
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip_all, fields(contact_id = %id))]
    pub async fn update(
        &self,
        id: ContactId,
        draft: &ContactDraft,
        now: DateTime<Utc>,
    ) -> Result<Contact, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "UPDATE contacts SET \
                 name = $2, email = $3, phone = $4, frequency_value = $5, \
                 frequency_unit = $6, notes = $7, updated_at = $8 \
             WHERE id = $1 \
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(&draft.name)
        .bind(draft.email.as_ref().map(EmailAddress::as_str))
        .bind(draft.phone.as_deref())
        .bind(draft.frequency_value)
        .bind(draft.frequency_unit.as_str())
        .bind(draft.notes.as_deref())
        .bind(now)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Contact::try_from(row)
    }

    /// Delete a contact. Its interactions go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such contact exists.
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip_all, fields(contact_id = %id))]
    pub async fn delete(&self, id: ContactId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(email: Option<&str>, unit: &str) -> ContactRow {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ContactRow {
            id: 4,
            name: "Michael Chen".to_string(),
            email: email.map(String::from),
            phone: Some("555-0102".to_string()),
            frequency_value: 3,
            frequency_unit: unit.to_string(),
            notes: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_row_converts() {
        let contact = Contact::try_from(row(Some("michael@example.com"), "month")).unwrap();
        assert_eq!(contact.id, ContactId::new(4));
        assert_eq!(contact.frequency_unit, FrequencyUnit::Month);
        assert_eq!(contact.email.unwrap().as_str(), "michael@example.com");
        assert!(contact.interactions.is_empty());
    }

    #[test]
    fn test_unknown_unit_is_corruption() {
        let err = Contact::try_from(row(None, "fortnight")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(msg) if msg.contains("fortnight")));
    }

    #[test]
    fn test_bad_email_is_corruption() {
        let err = Contact::try_from(row(Some("not an email"), "week")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
