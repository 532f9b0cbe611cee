// # NMS API Alarm Source
//
// Placeholder for live network-management-system integration.
//
// ## Status
//
// This is a documented extension point: the `fetch()` contract is fixed,
// but the implementation performs no network I/O and returns no alarms. A
// real implementation must add:
//
// - authentication against the NMS (token provisioning and refresh)
// - incremental fetch, e.g. a `since` cursor over the alarm endpoint
// - mapping of the upstream alarm schema onto [`Alarm`]
//
// The upstream API surface is deliberately not designed here; until it is,
// this provider logs that it is unconfigured and yields an empty batch so
// the rest of the pipeline keeps cycling.
//
// ## Security
//
// The API token never appears in logs; the Debug implementation redacts it.

use async_trait::async_trait;
use netalert_core::traits::AlarmProvider;
use netalert_core::{Alarm, Result};
use tracing::info;

/// Remote NMS alarm source (stub).
pub struct NmsApiProvider {
    /// Base URL of the NMS REST API
    base_url: String,

    /// API token for the future authenticated implementation
    /// Never log this value
    api_token: String,
}

impl NmsApiProvider {
    /// Create a provider for the NMS at `base_url`.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }
}

impl std::fmt::Debug for NmsApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NmsApiProvider")
            .field("base_url", &self.base_url)
            .field("api_token", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl AlarmProvider for NmsApiProvider {
    async fn fetch(&self) -> Result<Vec<Alarm>> {
        info!("NMS API provider not configured; returning no alarms");
        Ok(Vec::new())
    }

    fn provider_name(&self) -> &'static str {
        "nms-api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_returns_no_alarms() {
        let provider = NmsApiProvider::new("https://nms.example.com/api", "token-1234");
        assert!(provider.fetch().await.unwrap().is_empty());
    }

    #[test]
    fn debug_redacts_api_token() {
        let provider = NmsApiProvider::new("https://nms.example.com/api", "token-1234");
        let rendered = format!("{provider:?}");
        assert!(rendered.contains("<REDACTED>"));
        assert!(!rendered.contains("token-1234"));
    }
}
