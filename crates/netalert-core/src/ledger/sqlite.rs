// # SQLite Dedup Ledger
//
// Durable single-file implementation of DedupStore.
//
// ## Schema
//
// ```sql
// CREATE TABLE IF NOT EXISTS sent_alerts (
//     digest  TEXT PRIMARY KEY,
//     payload TEXT NOT NULL,
//     sent_at TEXT NOT NULL
// )
// ```
//
// `digest` is the alarm content digest, `payload` the serialized alarm
// snapshot, `sent_at` an RFC 3339 UTC timestamp.
//
// ## Concurrency
//
// `mark_sent` is `INSERT OR REPLACE`, so concurrent writers for the same
// digest converge on a single row; SQLite's own upsert atomicity is the only
// cross-process guarantee this ledger provides.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::alarm::Alarm;
use crate::error::{Error, Result};
use crate::traits::dedup_store::{DedupStore, SentAlertRecord};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sent_alerts (
    digest  TEXT PRIMARY KEY,
    payload TEXT NOT NULL,
    sent_at TEXT NOT NULL
)";

/// SQLite-backed dedup ledger
///
/// Opens (or creates) a single database file and ensures the `sent_alerts`
/// table exists. All operations are point lookups or single-row writes, so
/// the connection sits behind a plain mutex.
#[derive(Debug)]
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open or create the ledger database at `path`.
    ///
    /// Creates parent directories if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ledger(format!(
                    "failed to create ledger directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::ledger("ledger connection mutex poisoned"))
    }
}

#[async_trait]
impl DedupStore for SqliteLedger {
    async fn already_sent(&self, digest: &str) -> Result<bool> {
        let conn = self.lock()?;
        let hit: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM sent_alerts WHERE digest = ?1",
                params![digest],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    async fn mark_sent(&self, digest: &str, alarm: &Alarm) -> Result<()> {
        let record = SentAlertRecord::new(digest, alarm)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO sent_alerts (digest, payload, sent_at) VALUES (?1, ?2, ?3)",
            params![record.digest, record.payload, record.sent_at.to_rfc3339()],
        )?;
        Ok(())
    }

    async fn get_record(&self, digest: &str) -> Result<Option<SentAlertRecord>> {
        let conn = self.lock()?;
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT digest, payload, sent_at FROM sent_alerts WHERE digest = ?1",
                params![digest],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(digest, payload, sent_at)| {
            let sent_at = DateTime::parse_from_rfc3339(&sent_at)
                .map_err(|e| Error::ledger(format!("invalid sent_at timestamp: {e}")))?
                .with_timezone(&Utc);
            Ok(SentAlertRecord {
                digest,
                payload,
                sent_at,
            })
        })
        .transpose()
    }

    async fn count(&self) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sent_alerts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_alarm() -> Alarm {
        serde_json::from_str(
            r#"{"timestamp":"2025-08-01T12:00:00Z","alarm_type":"LinkDown","severity":"Critical","network_element":"OLT-12","suggested_action":""}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn unknown_digest_is_not_sent() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("ledger.db")).unwrap();

        assert!(!ledger.already_sent("deadbeef").await.unwrap());
        assert!(ledger.get_record("deadbeef").await.unwrap().is_none());
        assert_eq!(ledger.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_sent_then_already_sent() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("ledger.db")).unwrap();

        let alarm = sample_alarm();
        let digest = alarm.digest().unwrap();

        assert!(!ledger.already_sent(&digest).await.unwrap());
        ledger.mark_sent(&digest, &alarm).await.unwrap();
        assert!(ledger.already_sent(&digest).await.unwrap());

        let record = ledger.get_record(&digest).await.unwrap().unwrap();
        assert_eq!(record.digest, digest);
        let snapshot: Alarm = serde_json::from_str(&record.payload).unwrap();
        assert_eq!(snapshot, alarm);
    }

    #[tokio::test]
    async fn mark_sent_is_idempotent() {
        let dir = tempdir().unwrap();
        let ledger = SqliteLedger::open(dir.path().join("ledger.db")).unwrap();

        let alarm = sample_alarm();
        let digest = alarm.digest().unwrap();

        ledger.mark_sent(&digest, &alarm).await.unwrap();
        ledger.mark_sent(&digest, &alarm).await.unwrap();

        assert_eq!(ledger.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ledger_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.db");

        let alarm = sample_alarm();
        let digest = alarm.digest().unwrap();

        {
            let ledger = SqliteLedger::open(&path).unwrap();
            ledger.mark_sent(&digest, &alarm).await.unwrap();
        }

        let reopened = SqliteLedger::open(&path).unwrap();
        assert!(reopened.already_sent(&digest).await.unwrap());
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("ledger.db");

        let ledger = SqliteLedger::open(&path).unwrap();
        assert_eq!(ledger.count().await.unwrap(), 0);
        assert!(path.exists());
    }
}
