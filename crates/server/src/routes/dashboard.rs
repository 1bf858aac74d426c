//! Dashboard handler.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::{instrument, warn};

use round_again_core::{DashboardSummary, DueContact};

use super::interactions::RECENT_LIMIT;
use crate::db::interactions::RecentInteraction;
use crate::db::{ContactRepository, InteractionRepository};
use crate::error::AppError;
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(dashboard))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub summary: DashboardSummary,
    pub recent_interactions: Vec<RecentInteraction>,
}

/// Overdue and due-soon counts, the priority list and recent activity.
///
/// # Errors
///
/// Returns an error if contacts or interactions cannot be loaded.
#[instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, AppError> {
    let now = state.now();
    let contacts = ContactRepository::new(state.pool())
        .list_with_interactions()
        .await?;

    let evaluated: Vec<DueContact> = contacts
        .iter()
        .filter_map(|contact| {
            DueContact::evaluate(contact, now)
                .inspect_err(|e| warn!(contact_id = %contact.id, error = %e, "Cannot evaluate contact"))
                .ok()
        })
        .collect();

    let summary = DashboardSummary::build(contacts.len(), &evaluated, now);
    let recent_interactions = InteractionRepository::new(state.pool())
        .recent(RECENT_LIMIT)
        .await?;

    Ok(Json(DashboardResponse {
        summary,
        recent_interactions,
    }))
}
