//! Subcommand implementations.

pub mod email;
pub mod migrate;
pub mod reminders;
pub mod seed;

use secrecy::SecretString;

/// Load `.env` and read `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "DATABASE_URL not set".into())
}
