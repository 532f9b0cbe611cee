// # JSON File Alarm Source
//
// This crate provides a file-backed simulator source for the netalert
// pipeline.
//
// ## Purpose
//
// Reads a JSON array of alarm objects from a configured path. Intended for
// demos, integration testing, and validating notifier configuration without
// a live alarm feed. Example element:
//
// ```json
// {
//   "timestamp": "2025-08-01T12:00:00Z",
//   "alarm_type": "LinkDown",
//   "severity": "Critical",
//   "network_element": "OLT-12",
//   "suggested_action": "Dispatch field tech to site."
// }
// ```
//
// ## Normalization
//
// - A missing file is not an error: the fetch logs a warning and returns an
//   empty batch, so the engine continues with the next cycle
// - Array elements that are not objects are silently skipped
// - `suggested_action` defaults to an empty string when absent
// - A `timestamp` that is present as a string is kept verbatim; a missing or
//   non-string timestamp is replaced with the current UTC time
// - Extra keys on an element are preserved verbatim on the alarm

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use netalert_core::traits::AlarmProvider;
use netalert_core::{Alarm, Error, Result};
use serde_json::Value;
use tracing::{info, warn};

/// File-backed simulator alarm source.
///
/// Each [`fetch`](AlarmProvider::fetch) call re-reads the file, so edits to
/// the file between cycles are picked up without restarting.
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    /// Create a provider reading from `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Apply the normalization rules to one array element and deserialize
    /// it into an [`Alarm`].
    fn normalize(mut object: serde_json::Map<String, Value>) -> Option<Alarm> {
        object
            .entry("suggested_action")
            .or_insert_with(|| Value::String(String::new()));

        // Keep string timestamps verbatim; anything else becomes "now".
        match object.get("timestamp") {
            Some(Value::String(_)) => {}
            _ => {
                object.insert(
                    "timestamp".to_string(),
                    Value::String(Utc::now().to_rfc3339()),
                );
            }
        }

        match serde_json::from_value(Value::Object(object)) {
            Ok(alarm) => Some(alarm),
            Err(e) => {
                warn!("skipping malformed alarm entry: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl AlarmProvider for JsonFileProvider {
    async fn fetch(&self) -> Result<Vec<Alarm>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("simulator file not found: {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::provider(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let data: Value = serde_json::from_str(&content)?;
        let Value::Array(items) = data else {
            return Err(Error::provider(format!(
                "{} does not contain a JSON array",
                self.path.display()
            )));
        };

        let alarms: Vec<Alarm> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(object) => Self::normalize(object),
                _ => None,
            })
            .collect();

        info!(
            "fetched {} alarms from simulator {}",
            alarms.len(),
            self.path.display()
        );
        Ok(alarms)
    }

    fn provider_name(&self) -> &'static str {
        "json-file"
    }
}
