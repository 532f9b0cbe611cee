// # Memory Dedup Ledger
//
// In-memory implementation of DedupStore.
//
// ## Crash Behavior
//
// All state is lost on restart, so at-most-once notification only holds
// within one process lifetime. The first cycle after a restart re-notifies
// every alarm still present at the source.
//
// ## When to Use
//
// - Testing environments
// - Deployments where duplicate notifications after a restart are acceptable

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::alarm::Alarm;
use crate::error::Result;
use crate::traits::dedup_store::{DedupStore, SentAlertRecord};

/// In-memory dedup ledger
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<RwLock<HashMap<String, SentAlertRecord>>>,
}

impl MemoryLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DedupStore for MemoryLedger {
    async fn already_sent(&self, digest: &str) -> Result<bool> {
        Ok(self.inner.read().await.contains_key(digest))
    }

    async fn mark_sent(&self, digest: &str, alarm: &Alarm) -> Result<()> {
        let record = SentAlertRecord::new(digest, alarm)?;
        self.inner.write().await.insert(digest.to_string(), record);
        Ok(())
    }

    async fn get_record(&self, digest: &str) -> Result<Option<SentAlertRecord>> {
        Ok(self.inner.read().await.get(digest).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.read().await.len() as u64)
    }
}
