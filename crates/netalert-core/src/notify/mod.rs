//! Alarm notification
//!
//! The [`Notifier`] turns one alarm into a delivered message: it renders a
//! subject/plaintext/HTML triple and pushes it through the single configured
//! [`Channel`], retrying transient transport failures with exponential
//! backoff. Channels are single-shot transports — one delivery attempt per
//! call, no retry, no backoff of their own; the notifier owns the retry
//! policy so every channel behaves the same way under failure.
//!
//! ## Retry policy
//!
//! Up to [`MAX_DELIVERY_ATTEMPTS`] attempts. After failed attempt `n` the
//! notifier waits [`backoff_delay`]`(n)` before trying again; the wait is a
//! cancellable timer, not a thread block. Configuration problems (empty
//! recipient list, incomplete channel credentials, unparseable addresses)
//! fail immediately and never consume an attempt.

pub mod sendgrid;
pub mod smtp;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::alarm::Alarm;
use crate::config::{ChannelKind, NotifierConfig};
use crate::error::{Error, Result};

pub use sendgrid::SendGridChannel;
pub use smtp::SmtpChannel;

/// Total delivery attempts per send, first try included
pub const MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Backoff delay inserted after failed attempt `attempt` (1-based):
/// `2^attempt + attempt * 0.3` seconds. Pure function of the attempt number.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs_f64((1u64 << attempt) as f64 + f64::from(attempt) * 0.3)
}

/// A rendered notification: subject plus plaintext and HTML bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAlert {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Trait for delivery channel implementations
///
/// A channel performs exactly one delivery attempt per
/// [`deliver`](Channel::deliver) call and reports the outcome; the
/// [`Notifier`] decides
/// whether and when to try again. [`validate`](Channel::validate) checks
/// configuration completeness without any I/O, so a misconfigured channel
/// fails before the first network call.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name for logging (e.g. "smtp", "sendgrid")
    fn channel_name(&self) -> &'static str;

    /// Check that the channel has the configuration it needs. No I/O.
    fn validate(&self) -> Result<()>;

    /// Perform a single delivery attempt to all recipients.
    async fn deliver(
        &self,
        message: &RenderedAlert,
        from: &str,
        recipients: &[String],
    ) -> Result<()>;
}

/// Renders alarms and delivers them over the preferred channel with retry.
///
/// Holds only its resolved configuration; all persistent state lives in the
/// dedup ledger.
pub struct Notifier {
    config: NotifierConfig,
    channel: Box<dyn Channel>,
}

impl Notifier {
    /// Build a notifier with the channel selected by `config.prefer`.
    pub fn from_config(config: NotifierConfig) -> Self {
        let channel: Box<dyn Channel> = match config.prefer {
            ChannelKind::Smtp => Box::new(SmtpChannel::new(config.smtp.clone())),
            ChannelKind::Sendgrid => Box::new(SendGridChannel::new(config.sendgrid.clone())),
        };
        Self { config, channel }
    }

    /// Build a notifier around an explicit channel implementation.
    pub fn with_channel(config: NotifierConfig, channel: Box<dyn Channel>) -> Self {
        Self { config, channel }
    }

    /// Render `alarm` into subject, plaintext, and HTML. Deterministic for
    /// a given alarm and configuration.
    pub fn render(&self, alarm: &Alarm) -> RenderedAlert {
        RenderedAlert {
            subject: self.subject(alarm),
            text: self.body_text(alarm),
            html: self.body_html(alarm),
        }
    }

    fn subject(&self, alarm: &Alarm) -> String {
        format!(
            "[{}] {} - {} @ {}",
            self.config.subject_tag,
            alarm.severity.as_deref().unwrap_or("?"),
            alarm.alarm_type.as_deref().unwrap_or("?"),
            alarm.network_element.as_deref().unwrap_or("?"),
        )
    }

    fn body_text(&self, alarm: &Alarm) -> String {
        let mut text = format!(
            "{} Alarm\nSeverity: {}\nType: {}\nTimestamp: {}\nElement: {}\nSuggested Action: {}\n",
            self.config.subject_tag,
            alarm.severity.as_deref().unwrap_or("?"),
            alarm.alarm_type.as_deref().unwrap_or("?"),
            alarm.timestamp.as_deref().unwrap_or("?"),
            alarm.network_element.as_deref().unwrap_or("?"),
            alarm.suggested_action.as_deref().unwrap_or(""),
        );
        for (key, value) in &alarm.extra {
            text.push_str(&format!("{key}: {value}\n"));
        }
        text
    }

    fn body_html(&self, alarm: &Alarm) -> String {
        let severity = alarm.severity.as_deref().unwrap_or("?");
        let extras: String = alarm
            .extra
            .iter()
            .map(|(key, value)| format!("        <li><b>{key}</b>: {value}</li>\n"))
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 20px; }}
        .header {{ background-color: {color}; color: white; padding: 15px; border-radius: 5px; }}
        .content {{ padding: 20px; background-color: #f9f9f9; border-radius: 5px; margin-top: 10px; }}
        .footer {{ color: #666; font-size: 12px; margin-top: 20px; }}
    </style>
</head>
<body>
    <div class="header">
        <h2>{severity} - {alarm_type}</h2>
    </div>
    <div class="content">
        <p>Element: {element}</p>
        <p>Timestamp: {timestamp}</p>
        <p>Suggested Action: {action}</p>
        <ul>
{extras}        </ul>
    </div>
    <div class="footer">
        <p>Severity: {severity} | Type: {alarm_type} | Element: {element}</p>
    </div>
</body>
</html>"#,
            color = severity_color(severity),
            severity = severity,
            alarm_type = alarm.alarm_type.as_deref().unwrap_or("?"),
            element = alarm.network_element.as_deref().unwrap_or("?"),
            timestamp = alarm.timestamp.as_deref().unwrap_or("?"),
            action = alarm.suggested_action.as_deref().unwrap_or(""),
            extras = extras,
        )
    }

    /// Deliver one alarm, exactly once per call, with bounded retries.
    ///
    /// Fails immediately (no attempt made) when the recipient list is empty
    /// or the channel configuration is incomplete. On transport failure,
    /// retries per the backoff policy; the uniform transport error of the
    /// final attempt is returned when all attempts are exhausted, and the
    /// caller decides whether to mark the alarm as sent (it must not, so the
    /// alarm is retried on the next fetch cycle).
    pub async fn send(&self, alarm: &Alarm) -> Result<()> {
        if self.config.recipients.is_empty() {
            return Err(Error::config("no recipients configured"));
        }
        self.channel.validate()?;

        let message = self.render(alarm);

        let mut last_error = None;
        for attempt in 1..=MAX_DELIVERY_ATTEMPTS {
            match self
                .channel
                .deliver(&message, &self.config.from_email, &self.config.recipients)
                .await
            {
                Ok(()) => {
                    info!(
                        "alert sent via {}: {} -> {:?}",
                        self.channel.channel_name(),
                        message.subject,
                        self.config.recipients
                    );
                    return Ok(());
                }
                // Configuration problems are not transient; surface them
                // without consuming further attempts.
                Err(err @ Error::Config(_)) => return Err(err),
                Err(err) => {
                    let err = match err {
                        Error::Transport(_) => err,
                        other => Error::transport(other.to_string()),
                    };
                    if attempt < MAX_DELIVERY_ATTEMPTS {
                        let delay = backoff_delay(attempt);
                        warn!(
                            "delivery attempt {}/{} failed: {}; retrying in {:.1}s",
                            attempt,
                            MAX_DELIVERY_ATTEMPTS,
                            err,
                            delay.as_secs_f64()
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        warn!(
                            "delivery attempt {}/{} failed: {}; giving up",
                            attempt, MAX_DELIVERY_ATTEMPTS, err
                        );
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::transport("delivery failed")))
    }
}

fn severity_color(severity: &str) -> &'static str {
    match severity.to_lowercase().as_str() {
        "critical" => "#e74c3c",
        "major" => "#f39c12",
        "minor" => "#3498db",
        _ => "#808080",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifierConfig;

    struct NullChannel;

    #[async_trait]
    impl Channel for NullChannel {
        fn channel_name(&self) -> &'static str {
            "null"
        }

        fn validate(&self) -> Result<()> {
            Ok(())
        }

        async fn deliver(&self, _: &RenderedAlert, _: &str, _: &[String]) -> Result<()> {
            Ok(())
        }
    }

    fn notifier() -> Notifier {
        Notifier::with_channel(NotifierConfig::default(), Box::new(NullChannel))
    }

    fn parse(json: &str) -> Alarm {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn subject_includes_severity_type_and_element() {
        let alarm = parse(
            r#"{"alarm_type":"LinkDown","severity":"Critical","network_element":"OLT-12"}"#,
        );
        assert_eq!(
            notifier().subject(&alarm),
            "[NETALERT] Critical - LinkDown @ OLT-12"
        );
    }

    #[test]
    fn subject_uses_placeholders_for_missing_fields() {
        let alarm = parse("{}");
        assert_eq!(notifier().subject(&alarm), "[NETALERT] ? - ? @ ?");
    }

    #[test]
    fn render_is_deterministic() {
        let alarm = parse(
            r#"{"alarm_type":"LinkDown","severity":"Major","network_element":"OLT-3","timestamp":"2025-08-01T12:00:00Z","suggested_action":"Check fiber."}"#,
        );
        let notifier = notifier();
        assert_eq!(notifier.render(&alarm), notifier.render(&alarm));
    }

    #[test]
    fn render_carries_extra_fields() {
        let alarm = parse(r#"{"alarm_type":"LinkDown","site":"HQ","slot":4}"#);
        let rendered = notifier().render(&alarm);
        assert!(rendered.text.contains("site"));
        assert!(rendered.text.contains("HQ"));
        assert!(rendered.html.contains("slot"));
    }

    #[test]
    fn backoff_delays_increase_strictly() {
        let delays: Vec<Duration> = (1..=3).map(backoff_delay).collect();
        assert!((delays[0].as_secs_f64() - 2.3).abs() < 1e-9);
        assert!((delays[1].as_secs_f64() - 4.6).abs() < 1e-9);
        assert!((delays[2].as_secs_f64() - 8.9).abs() < 1e-9);
        assert!(delays.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
