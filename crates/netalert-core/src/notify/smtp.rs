//! SMTP delivery channel.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{Channel, RenderedAlert};
use crate::config::SmtpConfig;
use crate::error::{Error, Result};

/// SMTP mail transport channel.
///
/// Builds one multipart message (plaintext + HTML alternative parts)
/// addressed to all recipients, authenticates with login credentials, and
/// negotiates STARTTLS before authenticating when `use_tls` is set.
pub struct SmtpChannel {
    config: SmtpConfig,
}

impl SmtpChannel {
    /// Create a new SMTP channel.
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());
        let builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| Error::transport(format!("failed to set up SMTP relay: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
        };
        Ok(builder.port(self.config.port).credentials(creds).build())
    }
}

#[async_trait]
impl Channel for SmtpChannel {
    fn channel_name(&self) -> &'static str {
        "smtp"
    }

    fn validate(&self) -> Result<()> {
        if self.config.host.is_empty()
            || self.config.username.is_empty()
            || self.config.password.is_empty()
        {
            return Err(Error::config(
                "SMTP channel not configured (host, username, and password are required)",
            ));
        }
        Ok(())
    }

    async fn deliver(
        &self,
        message: &RenderedAlert,
        from: &str,
        recipients: &[String],
    ) -> Result<()> {
        let sender: Mailbox = from
            .parse()
            .map_err(|e| Error::config(format!("invalid from address {from:?}: {e}")))?;

        let mut builder = Message::builder()
            .from(sender)
            .subject(message.subject.clone());
        for recipient in recipients {
            let to: Mailbox = recipient.parse().map_err(|e| {
                Error::config(format!("invalid recipient address {recipient:?}: {e}"))
            })?;
            builder = builder.to(to);
        }

        let email = builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )
            .map_err(|e| Error::transport(format!("failed to build mail message: {e}")))?;

        self.transport()?
            .send(email)
            .await
            .map_err(|e| Error::transport(format!("SMTP send failed: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_channel_fails_validation() {
        let channel = SmtpChannel::new(SmtpConfig::default());
        assert!(matches!(channel.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn configured_channel_passes_validation() {
        let channel = SmtpChannel::new(SmtpConfig {
            host: "smtp.example.com".to_string(),
            username: "mailer".to_string(),
            password: "secret".to_string(),
            ..SmtpConfig::default()
        });
        channel.validate().unwrap();
        assert_eq!(channel.channel_name(), "smtp");
    }
}
