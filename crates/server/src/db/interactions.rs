//! Interaction repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use round_again_core::{ContactId, Interaction, InteractionId, InteractionType};

use super::RepositoryError;

pub(super) const INTERACTION_COLUMNS: &str =
    "id, contact_id, interaction_type, interaction_date, notes";

/// Internal row type for `PostgreSQL` interaction queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct InteractionRow {
    pub(super) id: i32,
    pub(super) contact_id: i32,
    pub(super) interaction_type: String,
    pub(super) interaction_date: DateTime<Utc>,
    pub(super) notes: Option<String>,
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = RepositoryError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let interaction_type: InteractionType = row.interaction_type.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("interaction {}: {e}", row.id))
        })?;

        Ok(Self {
            id: InteractionId::new(row.id),
            contact_id: ContactId::new(row.contact_id),
            interaction_type,
            interaction_date: row.interaction_date,
            notes: row.notes,
        })
    }
}

/// An interaction together with the name of the contact it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct RecentInteraction {
    #[serde(flatten)]
    pub interaction: Interaction,
    pub contact_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct RecentInteractionRow {
    #[sqlx(flatten)]
    interaction: InteractionRow,
    contact_name: String,
}

/// Repository for interaction database operations.
pub struct InteractionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InteractionRepository<'a> {
    /// Create a new interaction repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A contact's history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored type is unknown.
    pub async fn list_for_contact(
        &self,
        contact_id: ContactId,
    ) -> Result<Vec<Interaction>, RepositoryError> {
        let rows = sqlx::query_as::<_, InteractionRow>(&format!(
            "SELECT {INTERACTION_COLUMNS} FROM interactions \
             WHERE contact_id = $1 \
             ORDER BY interaction_date DESC, id DESC"
        ))
        .bind(contact_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// The most recent interactions across all contacts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored type is unknown.
    pub async fn recent(&self, limit: i64) -> Result<Vec<RecentInteraction>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecentInteractionRow>(
            "SELECT i.id, i.contact_id, i.interaction_type, i.interaction_date, i.notes, \
                    c.name AS contact_name \
             FROM interactions i \
             JOIN contacts c ON c.id = i.contact_id \
             ORDER BY i.interaction_date DESC, i.id DESC \
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<RecentInteraction, RepositoryError> {
                Ok(RecentInteraction {
                    interaction: row.interaction.try_into()?,
                    contact_name: row.contact_name,
                })
            })
            .collect()
    }

    /// Log an interaction against an existing contact.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the contact does not exist.
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip_all, fields(contact_id = %contact_id, kind = %interaction_type))]
    pub async fn create(
        &self,
        contact_id: ContactId,
        interaction_type: InteractionType,
        interaction_date: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Interaction, RepositoryError> {
        let row = sqlx::query_as::<_, InteractionRow>(&format!(
            "INSERT INTO interactions (contact_id, interaction_type, interaction_date, notes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {INTERACTION_COLUMNS}"
        ))
        .bind(contact_id.as_i32())
        .bind(interaction_type.as_str())
        .bind(interaction_date)
        .bind(notes)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;

        row.try_into()
    }

    /// Delete one interaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such interaction exists.
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip_all, fields(interaction_id = %id))]
    pub async fn delete(&self, id: InteractionId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM interactions WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
