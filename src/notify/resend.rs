use super::email::parse_mailbox;
use super::{EmailMessage, Notifier, NotifyError};
use serde::Serialize;
use std::time::Duration;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Delivers emails through the Resend HTTP API.
pub struct ResendNotifier {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

impl ResendNotifier {
    pub fn new(api_key: &str, sender: &str, timeout: Duration) -> Result<Self, NotifyError> {
        if api_key.trim().is_empty() {
            return Err(NotifyError::Config("Resend API key is empty".into()));
        }
        parse_mailbox(sender)?;

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            from: sender.to_string(),
        })
    }

    fn request_body<'a>(&'a self, message: &'a EmailMessage) -> ResendRequest<'a> {
        ResendRequest {
            from: &self.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            text: &message.text_body,
            html: &message.html_body,
        }
    }

    async fn post(&self, url: &str, message: &EmailMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResendNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendNotifier")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Notifier for ResendNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        parse_mailbox(&message.to)?;
        self.post(RESEND_API_URL, message).await?;

        tracing::info!(
            channel = "resend",
            to = %message.to,
            subject = %message.subject,
            "Email delivered"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "resend"
    }
}
