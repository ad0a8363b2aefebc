use super::{EmailMessage, Notifier, NotifyError};
use crate::config::SmtpConfig;
use std::time::Duration;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Delivers emails through an SMTP relay.
#[derive(Debug)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Port 465 connects with implicit TLS; other ports use STARTTLS when
    /// `use_tls` is set and plain SMTP otherwise.
    pub fn from_config(
        config: &SmtpConfig,
        sender: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let from = parse_mailbox(sender)?;

        let mut builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(config.port)
        } else if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(config.port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        builder = builder.timeout(Some(timeout));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

pub(super) fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait::async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(&message.subject)
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "smtp",
            to = %message.to,
            subject = %message.subject,
            "Email delivered"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn smtp(port: u16, use_tls: bool) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".into(),
            port,
            username: Some("alerts".into()),
            password: Some("secret".into()),
            use_tls,
        }
    }

    #[test]
    fn parses_display_name_sender() {
        let mailbox = parse_mailbox("Weather Alerts <alerts@example.com>").unwrap();
        assert_eq!(mailbox.email.to_string(), "alerts@example.com");
    }

    #[test]
    fn builds_for_each_tls_mode() {
        assert!(SmtpNotifier::from_config(&smtp(587, true), "alerts@example.com", TIMEOUT).is_ok());
        assert!(SmtpNotifier::from_config(&smtp(465, true), "alerts@example.com", TIMEOUT).is_ok());
        assert!(SmtpNotifier::from_config(&smtp(25, false), "alerts@example.com", TIMEOUT).is_ok());
    }

    #[test]
    fn invalid_sender_fails() {
        let err = SmtpNotifier::from_config(&smtp(587, true), "bad-address", TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("bad-address"), "got: {err}");
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_connecting() {
        let notifier = SmtpNotifier::from_config(&smtp(587, true), "alerts@example.com", TIMEOUT).unwrap();
        let message = EmailMessage {
            to: "nobody".into(),
            subject: "s".into(),
            text_body: "t".into(),
            html_body: "<p>t</p>".into(),
        };
        assert!(matches!(
            notifier.send(&message).await,
            Err(NotifyError::Address { .. })
        ));
    }
}
