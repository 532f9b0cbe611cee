//! Test doubles and common utilities for pipeline contract tests
//!
//! These doubles count calls rather than implement real transports, so the
//! tests can verify the pipeline's ordering and retry contracts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use netalert_core::error::{Error, Result};
use netalert_core::notify::{Channel, RenderedAlert};
use netalert_core::traits::AlarmProvider;
use netalert_core::{Alarm, NotifierConfig};

/// A provider that serves pre-scripted batches, one per fetch call.
///
/// Once the script is exhausted, further fetches return empty batches.
#[derive(Clone)]
pub struct ScriptedProvider {
    batches: Arc<Mutex<VecDeque<Vec<Alarm>>>>,
    fetch_count: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new(batches: Vec<Vec<Alarm>>) -> Self {
        Self {
            batches: Arc::new(Mutex::new(batches.into())),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times fetch() was called
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlarmProvider for ScriptedProvider {
    async fn fetch(&self) -> Result<Vec<Alarm>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// A channel that fails the first `fail_times` delivery attempts with a
/// transport error and succeeds afterwards, recording every attempt.
///
/// Clones share counters, so a test can keep a handle after moving the
/// channel into a notifier.
#[derive(Clone)]
pub struct FlakyChannel {
    fail_times: usize,
    deliver_count: Arc<AtomicUsize>,
    delivered: Arc<Mutex<Vec<RenderedAlert>>>,
}

impl FlakyChannel {
    pub fn new(fail_times: usize) -> Self {
        Self {
            fail_times,
            deliver_count: Arc::new(AtomicUsize::new(0)),
            delivered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of delivery attempts made
    pub fn deliver_count(&self) -> usize {
        self.deliver_count.load(Ordering::SeqCst)
    }

    /// Messages that were delivered successfully
    pub fn delivered(&self) -> Vec<RenderedAlert> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for FlakyChannel {
    fn channel_name(&self) -> &'static str {
        "flaky"
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    async fn deliver(
        &self,
        message: &RenderedAlert,
        _from: &str,
        _recipients: &[String],
    ) -> Result<()> {
        let attempt = self.deliver_count.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_times {
            return Err(Error::transport(format!(
                "scripted failure on attempt {attempt}"
            )));
        }
        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Minimal notifier config with one recipient.
pub fn test_notifier_config() -> NotifierConfig {
    NotifierConfig {
        recipients: vec!["noc@example.com".to_string()],
        ..NotifierConfig::default()
    }
}

pub fn alarm_from_json(json: &str) -> Alarm {
    serde_json::from_str(json).expect("test alarm JSON is valid")
}
