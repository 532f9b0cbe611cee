// # Alarm Provider Trait
//
// Defines the interface for fetching alarms from a source.
//
// ## Implementations
//
// - JSON file simulator: `netalert-source-json` crate
// - Remote NMS API (extension point): `netalert-source-nms` crate

use async_trait::async_trait;

use crate::alarm::Alarm;
use crate::error::Result;

/// Trait for alarm source implementations
///
/// Each call to [`fetch`](AlarmProvider::fetch) re-reads the source and
/// returns a finite, ordered batch of alarms. Absence of data is not an
/// error: implementations log a warning and return an empty batch so the
/// engine can continue with the next cycle. Errors are reserved for
/// conditions the caller may want to act on (unreadable source, malformed
/// payload as a whole).
///
/// Providers are observers, not decision-makers: they must not deduplicate,
/// deliver notifications, or touch the ledger. The engine owns the
/// fetch → dedup → notify flow.
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait AlarmProvider: Send + Sync {
    /// Fetch the current batch of alarms from the source.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Alarm>)`: the alarms found this cycle (possibly empty)
    /// - `Err(Error)`: the source exists but could not be read or parsed
    async fn fetch(&self) -> Result<Vec<Alarm>>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
