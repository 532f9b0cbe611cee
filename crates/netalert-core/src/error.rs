//! Error types for the alarm notification pipeline
//!
//! The enum deliberately separates the two failure families callers branch
//! on: [`Error::Config`] is raised before any network attempt and is never
//! retried, while [`Error::Transport`] is the uniform wrapper around channel
//! failures and is subject to the notifier's retry policy.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the alarm notification pipeline
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (no recipients, absent credentials).
    /// Raised synchronously, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Delivery transport failure (network error, SMTP protocol error,
    /// non-2xx API response). Retried with backoff by the notifier.
    #[error("transport error: {0}")]
    Transport(String),

    /// Alarm provider failure
    #[error("provider error: {0}")]
    Provider(String),

    /// Dedup ledger failure
    #[error("ledger error: {0}")]
    Ledger(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a ledger error
    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    /// Whether the notifier's retry policy applies to this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Ledger(err.to_string())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Provider(err.to_string())
    }
}
