//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `SMTP_HOST` - SMTP server hostname
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//! - `SMTP_FROM` - Email sender address
//! - `USER_EMAIL` - Where reminder emails are delivered
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 5000)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `REMINDER_HOUR` / `REMINDER_MINUTE` - Local time of the daily run (default: 07:00)
//! - `REMINDER_WINDOW_START` / `REMINDER_WINDOW_END` - Inclusive `days_until_due`
//!   band that earns a reminder (default: -5 / 1)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use round_again_core::{EmailAddress, ReminderWindow};
use secrecy::SecretString;
use thiserror::Error;

use crate::services::scheduler::DailySchedule;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Outgoing email
    pub email: EmailConfig,
    /// When and what the daily reminder job sends
    pub reminders: ReminderConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// Emit JSON log lines instead of text
    pub json_logs: bool,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Recipient of the daily reminder
    pub user_email: EmailAddress,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("user_email", &self.user_email)
            .finish()
    }
}

/// Daily reminder job settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReminderConfig {
    pub schedule: DailySchedule,
    pub window: ReminderWindow,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host: IpAddr = parse_env_or_default("HOST", "127.0.0.1")?;
        let port: u16 = parse_env_or_default("PORT", "5000")?;
        let email = EmailConfig::from_env()?;
        let reminders = ReminderConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        Ok(Self {
            database_url,
            host,
            port,
            email,
            reminders,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            json_logs,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    /// Load only the email settings.
    ///
    /// The CLI uses this for commands that send mail without a full server
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let user_email = get_required_env("USER_EMAIL")?;
        let user_email = EmailAddress::parse(&user_email)
            .map_err(|e| ConfigError::InvalidEnvVar("USER_EMAIL".to_string(), e.to_string()))?;

        Ok(Self {
            smtp_host: get_required_env("SMTP_HOST")?,
            smtp_port: parse_env_or_default("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password: get_required_secret("SMTP_PASSWORD")?,
            from_address: get_required_env("SMTP_FROM")?,
            user_email,
        })
    }
}

impl ReminderConfig {
    /// Load the schedule and window, falling back to 07:00 and `-5..=1`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for out-of-range times or an
    /// inverted window.
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        let hour: u32 = parse_env_or_default("REMINDER_HOUR", &default.schedule.hour().to_string())?;
        let minute: u32 =
            parse_env_or_default("REMINDER_MINUTE", &default.schedule.minute().to_string())?;
        let schedule = DailySchedule::new(hour, minute).map_err(|e| {
            ConfigError::InvalidEnvVar("REMINDER_HOUR/REMINDER_MINUTE".to_string(), e.to_string())
        })?;

        let start: i64 =
            parse_env_or_default("REMINDER_WINDOW_START", &default.window.start().to_string())?;
        let end: i64 = parse_env_or_default("REMINDER_WINDOW_END", &default.window.end().to_string())?;
        let window = ReminderWindow::new(start, end).map_err(|e| {
            ConfigError::InvalidEnvVar("REMINDER_WINDOW_*".to_string(), e.to_string())
        })?;

        Ok(Self { schedule, window })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
