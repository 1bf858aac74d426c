//! Reminder and test emails.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain text
//! templates.

use askama::Template;
use chrono::{DateTime, Utc};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use round_again_core::{DueContact, EmailAddress};
use secrecy::ExposeSecret;
use thiserror::Error;

use super::reminders::Notifier;
use crate::config::EmailConfig;

pub const REMINDER_SUBJECT: &str = "Keep In Touch - Your Contact Reminders";
pub const TEST_SUBJECT: &str = "Keep In Touch - Test Email";

/// One contact as shown in the reminder email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderLine {
    pub name: String,
    /// Email and phone joined for display, empty if neither is known.
    pub reach: String,
    pub cadence: String,
    pub status: String,
    pub last_contact: String,
    pub overdue: bool,
}

impl ReminderLine {
    #[must_use]
    pub fn from_due(contact: &DueContact) -> Self {
        let days = contact.days_until_due();
        let status = match days {
            ..=-2 => format!("Overdue by {} days", -days),
            -1 => "Overdue by 1 day".to_string(),
            0 => "Due today".to_string(),
            1 => "Due tomorrow".to_string(),
            _ => format!("Due in {days} days"),
        };
        let reach = [
            contact.email.as_ref().map(EmailAddress::as_str),
            contact.phone.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" | ");
        Self {
            name: contact.name.clone(),
            reach,
            cadence: contact.cadence.to_string(),
            status,
            last_contact: contact.last_interaction.map_or_else(
                || "Never".to_string(),
                |at| at.format("%b %-d, %Y").to_string(),
            ),
            overdue: contact.status.is_due,
        }
    }
}

/// HTML template for the daily reminder.
#[derive(Template)]
#[template(path = "email/daily_reminder.html")]
struct DailyReminderHtml<'a> {
    today: &'a str,
    contacts: &'a [ReminderLine],
}

/// Plain text template for the daily reminder.
#[derive(Template)]
#[template(path = "email/daily_reminder.txt")]
struct DailyReminderText<'a> {
    today: &'a str,
    contacts: &'a [ReminderLine],
}

/// HTML template for the configuration test email.
#[derive(Template)]
#[template(path = "email/test_email.html")]
struct TestEmailHtml;

/// Plain text template for the configuration test email.
#[derive(Template)]
#[template(path = "email/test_email.txt")]
struct TestEmailText;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends reminder summaries to the configured user over SMTP.
#[derive(Clone)]
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    user_email: EmailAddress,
}

impl EmailNotifier {
    /// Create a notifier from configuration.
    ///
    /// No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            user_email: config.user_email.clone(),
        })
    }

    /// Send the daily reminder to the configured user.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_daily_reminder(
        &self,
        contacts: &[DueContact],
        generated_at: DateTime<Utc>,
    ) -> Result<(), EmailError> {
        let (text, html) = render_daily_reminder(contacts, generated_at)?;
        self.send_multipart_email(self.user_email.as_str(), REMINDER_SUBJECT, &text, &html)
            .await
    }

    /// Send a test email to verify the SMTP settings.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_test_email(&self, to: &str) -> Result<(), EmailError> {
        let html = TestEmailHtml.render()?;
        let text = TestEmailText.render()?;
        self.send_multipart_email(to, TEST_SUBJECT, &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

impl Notifier for EmailNotifier {
    type Error = EmailError;

    async fn send_reminder(
        &self,
        contacts: &[DueContact],
        generated_at: DateTime<Utc>,
    ) -> Result<(), EmailError> {
        self.send_daily_reminder(contacts, generated_at).await
    }
}

/// Render the plain text and HTML bodies of the daily reminder.
///
/// # Errors
///
/// Returns error if a template fails to render.
pub fn render_daily_reminder(
    contacts: &[DueContact],
    generated_at: DateTime<Utc>,
) -> Result<(String, String), EmailError> {
    let lines: Vec<ReminderLine> = contacts.iter().map(ReminderLine::from_due).collect();
    let today = generated_at.format("%A, %B %-d, %Y").to_string();

    let text = DailyReminderText {
        today: &today,
        contacts: &lines,
    }
    .render()?;
    let html = DailyReminderHtml {
        today: &today,
        contacts: &lines,
    }
    .render()?;
    Ok((text, html))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use round_again_core::{Cadence, ContactId, DueStatus, FrequencyUnit};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 4, 7, 0, 0).unwrap()
    }

    fn due(name: &str, days: i64, last: Option<i64>) -> DueContact {
        DueContact {
            id: ContactId::new(1),
            name: name.to_string(),
            email: Some(EmailAddress::parse("friend@example.com").unwrap()),
            phone: None,
            cadence: Cadence::new(2, FrequencyUnit::Week).unwrap(),
            last_interaction: last.map(|d| now() - TimeDelta::days(d)),
            status: DueStatus::at(now() + TimeDelta::days(days), now()),
        }
    }

    #[test]
    fn test_status_wording() {
        assert_eq!(ReminderLine::from_due(&due("a", -4, None)).status, "Overdue by 4 days");
        assert_eq!(ReminderLine::from_due(&due("a", -1, None)).status, "Overdue by 1 day");
        assert_eq!(ReminderLine::from_due(&due("a", 0, None)).status, "Due today");
        assert_eq!(ReminderLine::from_due(&due("a", 1, None)).status, "Due tomorrow");
        assert_eq!(ReminderLine::from_due(&due("a", 5, None)).status, "Due in 5 days");
    }

    #[test]
    fn test_line_fields() {
        let line = ReminderLine::from_due(&due("Sarah Williams", -2, Some(16)));
        assert_eq!(line.cadence, "every 2 weeks");
        assert_eq!(line.last_contact, "Jun 18, 2024");
        assert_eq!(line.reach, "friend@example.com");
        assert!(line.overdue);

        let never = ReminderLine::from_due(&due("New Friend", 0, None));
        assert_eq!(never.last_contact, "Never");
        assert!(!never.overdue);
    }

    #[test]
    fn test_render_keeps_order_and_escapes_html() {
        let contacts = [due("Tom & Jerry", -2, Some(16)), due("Zed", 1, Some(13))];
        let (text, html) = render_daily_reminder(&contacts, now()).unwrap();

        assert!(text.contains("Thursday, July 4, 2024"));
        let tom = text.find("Tom & Jerry").unwrap();
        let zed = text.find("Zed").unwrap();
        assert!(tom < zed);

        assert!(html.contains("Tom &#38; Jerry") || html.contains("Tom &amp; Jerry"));
        assert!(html.contains("Overdue by 2 days"));
        assert!(html.contains("Due tomorrow"));
    }

    #[test]
    fn test_test_email_renders() {
        let html = TestEmailHtml.render().unwrap();
        let text = TestEmailText.render().unwrap();
        assert!(html.contains("Test Email"));
        assert!(text.contains("email configuration is working"));
    }
}
