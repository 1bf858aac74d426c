//! Database operations for the Round Again `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `contacts` - People to stay in touch with and their cadence
//! - `interactions` - Logged contact events (`ON DELETE CASCADE` from contacts)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p round-again-cli -- migrate
//! ```
//!
//! They are never applied on server startup.

pub mod contacts;
pub mod interactions;

use std::time::Duration;

use round_again_core::Contact;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

pub use contacts::ContactRepository;
pub use interactions::InteractionRepository;

use crate::services::reminders::ContactStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Advisory lock key serializing reminder runs across processes.
const REMINDER_RUN_LOCK_KEY: i64 = 0x5241_5255_4E00;

/// The reminder job's view of the database.
///
/// Owns a pool handle so it can live inside the job for the life of the
/// process. The run lease is a transaction holding a transaction-scoped
/// advisory lock, so the server and the CLI never run the job at the same
/// time. Dropping the lease rolls the transaction back, which releases the
/// lock.
#[derive(Debug, Clone)]
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ContactStore for PgContactStore {
    type Error = RepositoryError;
    type RunLease = Transaction<'static, Postgres>;

    async fn list_all_contacts(&self) -> Result<Vec<Contact>, RepositoryError> {
        ContactRepository::new(&self.pool).list_with_interactions().await
    }

    async fn try_acquire_run(&self) -> Result<Option<Self::RunLease>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(REMINDER_RUN_LOCK_KEY)
            .fetch_one(&mut *tx)
            .await?;
        Ok(acquired.then_some(tx))
    }
}
