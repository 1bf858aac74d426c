//! Email commands.

use tracing::info;

use round_again_server::config::EmailConfig;
use round_again_server::services::EmailNotifier;

/// Send the test email to `to`, or to `USER_EMAIL` when omitted.
///
/// # Errors
///
/// Returns an error if SMTP settings are missing or the send fails.
pub async fn test(to: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = EmailConfig::from_env()?;
    let notifier = EmailNotifier::new(&config)?;

    let recipient = to.unwrap_or_else(|| config.user_email.as_str());
    info!(to = %recipient, host = %config.smtp_host, "Sending test email");
    notifier.send_test_email(recipient).await?;
    info!("Test email sent");
    Ok(())
}
