/// Outgoing email
///
/// The application only ever sends one kind of email, the password recovery
/// link, but handlers depend on the [`Mailer`] trait so a real transport can
/// be plugged in without touching them. [`LogMailer`] writes messages to the
/// log instead of delivering them.
///
/// # Example
///
/// ```
/// use taskboard_shared::mail::{recovery_email, LogMailer, Mailer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let email = recovery_email("ada@example.com", "Ada", "http://localhost:8080", "abc123");
/// assert!(email.body.contains("http://localhost:8080/reset-password/abc123"));
///
/// LogMailer.send(email).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use serde::Serialize;

use crate::auth::reset_token::RESET_TOKEN_TTL_MINUTES;

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Recipient address rejected
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// Transport failed
    #[error("Failed to send email: {0}")]
    Transport(String),
}

/// A message ready to send
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Mailer that records messages through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if !email.to.contains('@') {
            return Err(MailError::InvalidRecipient(email.to));
        }

        // The body carries live reset links
        tracing::info!(to = %email.to, subject = %email.subject, "Email queued for delivery");
        tracing::debug!(to = %email.to, body = %email.body, "Email body");

        Ok(())
    }
}

/// Builds the password recovery email
///
/// # Arguments
///
/// * `to` - Recipient address
/// * `name` - Recipient display name
/// * `public_base_url` - Externally visible base URL, without trailing slash
/// * `token` - Plaintext reset token
pub fn recovery_email(to: &str, name: &str, public_base_url: &str, token: &str) -> OutgoingEmail {
    let link = format!(
        "{}/reset-password/{}",
        public_base_url.trim_end_matches('/'),
        token
    );

    let body = format!(
        "Hello {name},\n\n\
         We received a request to reset your Taskboard password.\n\
         Open the link below to choose a new one:\n\n\
         {link}\n\n\
         The link expires in {hours} hour(s). If you did not ask for a reset, \
         you can ignore this message.\n",
        name = name,
        link = link,
        hours = RESET_TOKEN_TTL_MINUTES / 60,
    );

    OutgoingEmail {
        to: to.to_string(),
        subject: "Reset your Taskboard password".to_string(),
        body,
    }
}
