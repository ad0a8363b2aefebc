//! Outbound email delivery for status-change alerts and the daily digest.

mod email;
mod resend;
pub mod templates;

pub use email::SmtpNotifier;
pub use resend::ResendNotifier;

use crate::config::{EmailConfig, EmailTransport};

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// A rendered email for a single recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// A delivery channel for rendered emails.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g. "smtp", "resend").
    fn channel_name(&self) -> &str;
}

/// Builds the configured transport, or `None` when email is not configured.
pub fn from_config(config: Option<&EmailConfig>) -> Result<Option<Box<dyn Notifier>>, NotifyError> {
    let Some(config) = config else {
        return Ok(None);
    };

    let notifier: Box<dyn Notifier> = match &config.transport {
        EmailTransport::Smtp(smtp) => Box::new(SmtpNotifier::from_config(
            smtp,
            &config.sender,
            config.timeout(),
        )?),
        EmailTransport::Resend(resend) => Box::new(ResendNotifier::new(
            &resend.api_key,
            &config.sender,
            config.timeout(),
        )?),
    };

    tracing::debug!(channel = notifier.channel_name(), "Email notifier configured");
    Ok(Some(notifier))
}
