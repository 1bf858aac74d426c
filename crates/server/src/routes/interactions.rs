//! Interaction API handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use tracing::instrument;

use round_again_core::InteractionId;

use crate::db::interactions::RecentInteraction;
use crate::db::{InteractionRepository, RepositoryError};
use crate::error::AppError;
use crate::state::AppState;

/// How many interactions the recent list returns.
pub const RECENT_LIMIT: i64 = 5;

/// Build the interactions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/interactions/recent", get(recent_interactions))
        .route("/api/interactions/{id}", delete(delete_interaction))
}

/// The most recent interactions across all contacts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn recent_interactions(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecentInteraction>>, AppError> {
    let recent = InteractionRepository::new(state.pool())
        .recent(RECENT_LIMIT)
        .await?;
    Ok(Json(recent))
}

/// Delete one interaction.
///
/// # Errors
///
/// Returns `404` if the interaction does not exist.
#[instrument(skip(state))]
pub async fn delete_interaction(
    State(state): State<AppState>,
    Path(id): Path<InteractionId>,
) -> Result<StatusCode, AppError> {
    InteractionRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => AppError::NotFound(format!("interaction {id}")),
            other => other.into(),
        })?;

    tracing::info!(interaction_id = %id, "Interaction deleted");
    Ok(StatusCode::NO_CONTENT)
}
