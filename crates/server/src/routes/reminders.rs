//! Manual trigger for the reminder job.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use tracing::instrument;

use crate::error::AppError;
use crate::services::reminders::RunOutcome;
use crate::state::AppState;

/// Build the reminders router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/reminders/run", post(run_reminders))
}

/// Run the reminder job now.
///
/// Shares the in-flight flag with the daily schedule; a request that lands
/// during a run gets `409 Conflict`.
///
/// # Errors
///
/// Returns `500` if contacts cannot be loaded.
#[instrument(skip(state))]
pub async fn run_reminders(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RunOutcome>), AppError> {
    let outcome = state.job().run().await?;
    let status = match outcome {
        RunOutcome::Skipped => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}
