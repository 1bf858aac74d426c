//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (database reachable)
//!
//! # Dashboard
//! GET    /api/dashboard                   - Overdue/due-soon counts, priority list, recent activity
//!
//! # Contacts
//! GET    /api/contacts?filter=all|due|overdue
//! POST   /api/contacts                    - Create contact
//! GET    /api/contacts/{id}               - Contact, due status and history
//! PUT    /api/contacts/{id}               - Update contact
//! DELETE /api/contacts/{id}               - Delete contact and its interactions
//! POST   /api/contacts/{id}/interactions  - Log interaction
//!
//! # Interactions
//! GET    /api/interactions/recent         - Five most recent interactions
//! DELETE /api/interactions/{id}           - Delete interaction
//!
//! # Reminders
//! POST   /api/reminders/run               - Run the reminder job now
//! ```
//!
//! The health routes live in `main.rs`.

pub mod contacts;
pub mod dashboard;
pub mod interactions;
pub mod reminders;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(contacts::router())
        .merge(interactions::router())
        .merge(reminders::router())
}
