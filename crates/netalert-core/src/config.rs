//! Configuration types for the alarm notification pipeline
//!
//! Configuration is resolved exactly once, before any component is
//! constructed: load the file with [`NetalertConfig::load`], apply
//! environment precedence with [`NetalertConfig::apply_env_overrides`],
//! then validate. Components receive the resolved, immutable values and
//! never consult the environment themselves.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetalertConfig {
    /// Alarm source configuration
    pub provider: ProviderConfig,

    /// Dedup ledger configuration
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Notifier configuration
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl NetalertConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::config(format!("failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Apply environment-variable precedence over file values.
    ///
    /// This is the single resolution step: environment values override the
    /// file for recipients, preferred channel, from-address, all channel
    /// credentials, and the poll interval.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Like [`apply_env_overrides`](Self::apply_env_overrides), but with an
    /// injectable lookup (used by tests to stay independent of process
    /// environment).
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = get("NETALERT_RECIPIENTS") {
            self.notifier.recipients = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(raw) = get("NETALERT_CHANNEL") {
            match raw.to_lowercase().as_str() {
                "smtp" => self.notifier.prefer = ChannelKind::Smtp,
                "sendgrid" => self.notifier.prefer = ChannelKind::Sendgrid,
                other => tracing::warn!("ignoring unknown NETALERT_CHANNEL value: {}", other),
            }
        }

        if let Some(from) = get("NETALERT_FROM_EMAIL") {
            self.notifier.from_email = from;
        }

        if let Some(host) = get("NETALERT_SMTP_HOST") {
            self.notifier.smtp.host = host;
        }
        if let Some(raw) = get("NETALERT_SMTP_PORT") {
            match raw.parse() {
                Ok(port) => self.notifier.smtp.port = port,
                Err(_) => tracing::warn!("ignoring invalid NETALERT_SMTP_PORT value: {}", raw),
            }
        }
        if let Some(username) = get("NETALERT_SMTP_USERNAME") {
            self.notifier.smtp.username = username;
        }
        if let Some(password) = get("NETALERT_SMTP_PASSWORD") {
            self.notifier.smtp.password = password;
        }
        if let Some(raw) = get("NETALERT_SMTP_TLS") {
            self.notifier.smtp.use_tls = raw.eq_ignore_ascii_case("true") || raw == "1";
        }

        if let Some(key) = get("NETALERT_SENDGRID_API_KEY") {
            self.notifier.sendgrid.api_key = key;
        }

        if let Some(raw) = get("NETALERT_POLL_INTERVAL_SECS") {
            match raw.parse() {
                Ok(secs) => self.engine.poll_interval_secs = secs,
                Err(_) => {
                    tracing::warn!("ignoring invalid NETALERT_POLL_INTERVAL_SECS value: {}", raw)
                }
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.ledger.validate()?;
        self.notifier.validate()?;

        if self.engine.poll_interval_secs == 0 {
            return Err(Error::config("engine.poll_interval_secs must be > 0"));
        }

        Ok(())
    }
}

/// Alarm source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// File-backed simulator reading a JSON array of alarms
    JsonFile {
        /// Path to the JSON file
        path: String,
    },

    /// Remote NMS alarm API (extension point, currently a stub)
    NmsApi {
        /// Base URL of the NMS REST API
        base_url: String,
        /// API token, if the deployment has one provisioned
        #[serde(default)]
        api_token: String,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::JsonFile { path } => {
                if path.is_empty() {
                    return Err(Error::config("provider.path cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::NmsApi { base_url, .. } => {
                if base_url.is_empty() {
                    return Err(Error::config("provider.base_url cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderConfig::JsonFile { .. } => "json_file",
            ProviderConfig::NmsApi { .. } => "nms_api",
        }
    }
}

/// Dedup ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerConfig {
    /// SQLite-backed durable ledger
    Sqlite {
        /// Path to the database file
        path: String,
    },

    /// In-memory ledger (not persistent; duplicates after restart)
    Memory,
}

impl LedgerConfig {
    /// Validate the ledger configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            LedgerConfig::Sqlite { path } => {
                if path.is_empty() {
                    return Err(Error::config("ledger.path cannot be empty"));
                }
                Ok(())
            }
            LedgerConfig::Memory => Ok(()),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig::Sqlite {
            path: "sent_alerts.db".to_string(),
        }
    }
}

/// Delivery channel selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// SMTP mail transport
    #[default]
    Smtp,
    /// SendGrid-style HTTP transactional-mail API
    Sendgrid,
}

/// Notifier configuration
///
/// Immutable for the lifetime of the notifier once resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Recipient addresses; must be non-empty to send
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Preferred delivery channel (no automatic fallback)
    #[serde(default)]
    pub prefer: ChannelKind,

    /// From-address placed on outgoing messages
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// Tag prefixed to every subject line
    #[serde(default = "default_subject_tag")]
    pub subject_tag: String,

    /// SMTP channel settings
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// SendGrid channel settings
    #[serde(default)]
    pub sendgrid: SendGridConfig,
}

impl NotifierConfig {
    /// Validate the notifier configuration
    pub fn validate(&self) -> Result<()> {
        if self.from_email.is_empty() {
            return Err(Error::config("notifier.from_email cannot be empty"));
        }
        Ok(())
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            prefer: ChannelKind::default(),
            from_email: default_from_email(),
            subject_tag: default_subject_tag(),
            smtp: SmtpConfig::default(),
            sendgrid: SendGridConfig::default(),
        }
    }
}

/// SMTP channel settings
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server host
    #[serde(default)]
    pub host: String,

    /// SMTP server port
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Login username
    #[serde(default)]
    pub username: String,

    /// Login password
    #[serde(default)]
    pub password: String,

    /// Negotiate STARTTLS before authenticating
    #[serde(default = "default_true")]
    pub use_tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            use_tls: true,
        }
    }
}

// Credentials never appear in logs
impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

/// SendGrid channel settings
#[derive(Clone, Serialize, Deserialize)]
pub struct SendGridConfig {
    /// Bearer credential for the mail-send API
    #[serde(default)]
    pub api_key: String,

    /// Mail-send endpoint URL
    #[serde(default = "default_sendgrid_endpoint")]
    pub endpoint: String,
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_sendgrid_endpoint(),
        }
    }
}

impl std::fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between fetch cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Capacity of the engine event channel; events are dropped (with a
    /// warning log) when full
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_from_email() -> String {
    "alerts@example.com".to_string()
}

fn default_subject_tag() -> String {
    "NETALERT".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

fn default_sendgrid_endpoint() -> String {
    "https://api.sendgrid.com/v3/mail/send".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_config() -> NetalertConfig {
        toml::from_str(
            r#"
            [provider]
            type = "json_file"
            path = "sample_data/alarms.json"

            [notifier]
            recipients = ["noc@example.com"]

            [notifier.smtp]
            host = "smtp.example.com"
            username = "mailer"
            password = "file-secret"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = base_config();
        assert!(matches!(config.ledger, LedgerConfig::Sqlite { .. }));
        assert_eq!(config.notifier.prefer, ChannelKind::Smtp);
        assert_eq!(config.notifier.smtp.port, 587);
        assert!(config.notifier.smtp.use_tls);
        assert_eq!(config.engine.poll_interval_secs, 60);
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_take_precedence_over_file() {
        let mut config = base_config();
        let env: HashMap<&str, &str> = HashMap::from([
            ("NETALERT_RECIPIENTS", "a@example.com, b@example.com ,"),
            ("NETALERT_CHANNEL", "sendgrid"),
            ("NETALERT_SMTP_PASSWORD", "env-secret"),
            ("NETALERT_SENDGRID_API_KEY", "SG.key"),
            ("NETALERT_SMTP_TLS", "false"),
        ]);

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.notifier.recipients, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.notifier.prefer, ChannelKind::Sendgrid);
        assert_eq!(config.notifier.smtp.password, "env-secret");
        assert_eq!(config.notifier.sendgrid.api_key, "SG.key");
        assert!(!config.notifier.smtp.use_tls);
    }

    #[test]
    fn file_values_survive_when_env_is_absent() {
        let mut config = base_config();
        config.apply_overrides(|_| None);

        assert_eq!(config.notifier.recipients, vec!["noc@example.com"]);
        assert_eq!(config.notifier.smtp.password, "file-secret");
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut config = base_config();
        let env: HashMap<&str, &str> = HashMap::from([("NETALERT_SMTP_PORT", "not-a-port")]);

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.notifier.smtp.port, 587);
    }

    #[test]
    fn empty_provider_path_is_rejected() {
        let config: NetalertConfig = toml::from_str(
            r#"
            [provider]
            type = "json_file"
            path = ""
            "#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn smtp_debug_redacts_password() {
        let config = base_config();
        let rendered = format!("{:?}", config.notifier.smtp);
        assert!(rendered.contains("<REDACTED>"));
        assert!(!rendered.contains("file-secret"));
    }
}
