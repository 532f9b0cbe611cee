//! HTTP transactional-mail channel (SendGrid-shaped API).

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{Channel, RenderedAlert};
use crate::config::SendGridConfig;
use crate::error::{Error, Result};

/// Default HTTP timeout for mail-send API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// SendGrid-style transactional-mail channel.
///
/// Posts one JSON mail-send request per delivery attempt: a personalization
/// block carrying the recipient list, the from-address, the subject, and a
/// two-element content array (plain + HTML), authenticated with a bearer
/// token. Any non-2xx response is a transport failure.
pub struct SendGridChannel {
    config: SendGridConfig,
    client: reqwest::Client,
}

impl SendGridChannel {
    /// Create a new SendGrid channel.
    pub fn new(config: SendGridConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }
}

#[async_trait]
impl Channel for SendGridChannel {
    fn channel_name(&self) -> &'static str {
        "sendgrid"
    }

    fn validate(&self) -> Result<()> {
        if self.config.api_key.is_empty() {
            return Err(Error::config("SendGrid API key not configured"));
        }
        Ok(())
    }

    async fn deliver(
        &self,
        message: &RenderedAlert,
        from: &str,
        recipients: &[String],
    ) -> Result<()> {
        let to: Vec<_> = recipients.iter().map(|r| json!({ "email": r })).collect();
        let body = json!({
            "personalizations": [{ "to": to }],
            "from": { "email": from },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.text },
                { "type": "text/html", "value": message.html },
            ],
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport(format!("mail API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::transport(format!(
                "mail API returned {status}: {detail}"
            )));
        }

        Ok(())
    }
}
