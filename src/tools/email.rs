//! Email submission for the email intent
//!
//! Plain-text messages go out through the configured SMTP relay with
//! STARTTLS and AUTH. The transport is built per send; SMTP failures are
//! spoken by the handler, never fatal.

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};

use crate::Result;
use crate::config::EmailConfig;

/// Sends plain-text email through an SMTP submission relay
pub struct Mailer {
    server: String,
    port: u16,
    address: String,
    password: SecretString,
}

impl Mailer {
    /// Build a mailer from the email configuration
    ///
    /// Returns `None` when the sending credentials are not configured; the
    /// email intent is disabled in that case.
    #[must_use]
    pub fn from_config(config: &EmailConfig) -> Option<Self> {
        let address = config.address.clone()?;
        let password = config.password.clone()?;
        Some(Self {
            server: config.server.clone(),
            port: config.port,
            address,
            password,
        })
    }

    /// Submit one plain-text message
    ///
    /// Empty subjects and bodies are accepted as-is; the relay enforces
    /// whatever it enforces.
    ///
    /// # Errors
    ///
    /// Returns an error if an address does not parse, the message cannot be
    /// built, or the SMTP session fails.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.address.parse::<Mailbox>()?)
            .to(to.trim().parse::<Mailbox>()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let credentials =
            Credentials::new(self.address.clone(), self.password.expose_secret().to_string());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.server)?
            .port(self.port)
            .credentials(credentials)
            .build();

        transport.send(message).await?;
        tracing::info!(to = %to.trim(), "email submitted");
        Ok(())
    }
}
