// # Dedup Store Trait
//
// Defines the interface for the durable ledger of already-notified alarms.
//
// ## Purpose
//
// The ledger enforces at-most-once notification per unique alarm content:
// the engine computes each alarm's digest, skips it when the ledger already
// holds that digest, and records the digest only after a successful send.
// Because the ledger is durable, the guarantee holds across process
// restarts, not just within one run.
//
// ## Implementations
//
// - SQLite-backed: [`crate::ledger::SqliteLedger`]
// - In-memory: [`crate::ledger::MemoryLedger`] (tests, ephemeral runs)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::alarm::Alarm;
use crate::error::Result;

/// One persisted ledger row: an alarm digest that has been notified.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SentAlertRecord {
    /// Content digest of the alarm (primary key)
    pub digest: String,
    /// Serialized snapshot of the alarm at send time
    pub payload: String,
    /// When the notification was recorded
    pub sent_at: DateTime<Utc>,
}

impl SentAlertRecord {
    /// Build a fresh record for `alarm` under `digest`.
    pub(crate) fn new(digest: &str, alarm: &Alarm) -> Result<Self> {
        Ok(Self {
            digest: digest.to_string(),
            payload: serde_json::to_string(alarm)?,
            sent_at: Utc::now(),
        })
    }
}

/// Trait for dedup ledger implementations
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Durable implementations must make [`mark_sent`](DedupStore::mark_sent) an
/// atomic upsert — that atomicity is the only cross-process guarantee the
/// pipeline relies on when several independently-deployed drivers share one
/// ledger.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Whether `digest` has already triggered a notification.
    ///
    /// Returns `false` for digests the ledger has never recorded.
    async fn already_sent(&self, digest: &str) -> Result<bool>;

    /// Record that the alarm behind `digest` has been notified.
    ///
    /// Upserts the row, overwriting any prior entry for the same digest
    /// with a fresh `sent_at`. Idempotent: marking twice leaves exactly one
    /// row.
    async fn mark_sent(&self, digest: &str, alarm: &Alarm) -> Result<()>;

    /// Fetch the full ledger row for `digest`, if any.
    async fn get_record(&self, digest: &str) -> Result<Option<SentAlertRecord>>;

    /// Number of rows in the ledger.
    async fn count(&self) -> Result<u64>;
}
