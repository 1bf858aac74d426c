//! Contact API handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use round_again_core::{
    Contact, ContactDraft, ContactFilter, ContactId, DueContact, DueStatus, Interaction,
    InteractionDraft,
};

use crate::db::{ContactRepository, InteractionRepository, RepositoryError};
use crate::error::AppError;
use crate::state::AppState;

/// Build the contacts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/contacts/{id}",
            get(show_contact).put(update_contact).delete(delete_contact),
        )
        .route("/api/contacts/{id}/interactions", post(add_interaction))
}

/// Query parameters for the contact list.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub filter: ContactFilter,
}

/// A contact with its history and due status.
#[derive(Debug, Serialize)]
pub struct ContactView {
    #[serde(flatten)]
    pub contact: Contact,
    /// `None` only if the stored cadence cannot be evaluated.
    pub due: Option<DueStatus>,
}

impl ContactView {
    fn new(contact: Contact, now: DateTime<Utc>) -> Self {
        let due = contact
            .due_status(now)
            .inspect_err(|e| warn!(contact_id = %contact.id, error = %e, "Cannot evaluate contact"))
            .ok();
        Self { contact, due }
    }
}

fn contact_not_found(id: ContactId) -> impl FnOnce(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => AppError::NotFound(format!("contact {id}")),
        other => other.into(),
    }
}

/// List contacts with their due status, optionally narrowed by `filter`.
///
/// # Errors
///
/// Returns an error if the contacts cannot be loaded.
#[instrument(skip(state))]
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DueContact>>, AppError> {
    let now = state.now();
    let contacts = ContactRepository::new(state.pool())
        .list_with_interactions()
        .await?;

    let listed = contacts
        .iter()
        .filter_map(|contact| {
            DueContact::evaluate(contact, now)
                .inspect_err(|e| warn!(contact_id = %contact.id, error = %e, "Cannot evaluate contact"))
                .ok()
        })
        .filter(|due| params.filter.matches(&due.status))
        .collect();

    Ok(Json(listed))
}

/// Create a contact.
///
/// # Errors
///
/// Returns `400` for invalid fields.
#[instrument(skip_all)]
pub async fn create_contact(
    State(state): State<AppState>,
    Json(draft): Json<ContactDraft>,
) -> Result<(StatusCode, Json<ContactView>), AppError> {
    let draft = draft.validate()?;
    let now = state.now();
    let contact = ContactRepository::new(state.pool())
        .create(&draft, now)
        .await?;

    tracing::info!(contact_id = %contact.id, "Contact created");
    Ok((StatusCode::CREATED, Json(ContactView::new(contact, now))))
}

/// Show one contact with its history, most recent first.
///
/// # Errors
///
/// Returns `404` if the contact does not exist.
#[instrument(skip(state))]
pub async fn show_contact(
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
) -> Result<Json<ContactView>, AppError> {
    let now = state.now();
    let contact = ContactRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("contact {id}")))?;

    Ok(Json(ContactView::new(contact, now)))
}

/// Replace a contact's editable fields.
///
/// # Errors
///
/// Returns `400` for invalid fields, `404` if the contact does not exist.
#[instrument(skip(state, draft))]
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
    Json(draft): Json<ContactDraft>,
) -> Result<Json<ContactView>, AppError> {
    let draft = draft.validate()?;
    let now = state.now();
    let mut contact = ContactRepository::new(state.pool())
        .update(id, &draft, now)
        .await
        .map_err(contact_not_found(id))?;
    contact.interactions = InteractionRepository::new(state.pool())
        .list_for_contact(id)
        .await?;

    tracing::info!(contact_id = %id, "Contact updated");
    Ok(Json(ContactView::new(contact, now)))
}

/// Delete a contact and its interactions.
///
/// # Errors
///
/// Returns `404` if the contact does not exist.
#[instrument(skip(state))]
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
) -> Result<StatusCode, AppError> {
    ContactRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(contact_not_found(id))?;

    tracing::info!(contact_id = %id, "Contact deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Log an interaction. The date defaults to now.
///
/// # Errors
///
/// Returns `404` if the contact does not exist.
#[instrument(skip(state, draft))]
pub async fn add_interaction(
    State(state): State<AppState>,
    Path(id): Path<ContactId>,
    Json(draft): Json<InteractionDraft>,
) -> Result<(StatusCode, Json<Interaction>), AppError> {
    let (interaction_type, interaction_date, notes) = draft.resolve(state.now());
    let interaction = InteractionRepository::new(state.pool())
        .create(id, interaction_type, interaction_date, notes.as_deref())
        .await
        .map_err(contact_not_found(id))?;

    tracing::info!(contact_id = %id, interaction_id = %interaction.id, "Interaction logged");
    Ok((StatusCode::CREATED, Json(interaction)))
}
