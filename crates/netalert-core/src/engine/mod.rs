//! Core alert engine
//!
//! The AlertEngine is responsible for:
//! - Fetching alarm batches via AlarmProvider
//! - Checking the dedup ledger for idempotency
//! - Delivering notifications via the Notifier
//! - Recording digests after successful delivery
//!
//! ## Control Flow
//!
//! ```text
//! ┌───────────────┐
//! │ AlarmProvider │─── Vec<Alarm> ───┐
//! └───────────────┘                  │
//!                                    ▼
//!                           ┌───────────────┐
//!                           │  AlertEngine  │
//!                           └───────────────┘
//!                                    │
//!        ┌───────────────────────────┼───────────────────────────┐
//!        │                           │                           │
//!        ▼                           ▼                           ▼
//! ┌─────────────┐           ┌───────────────┐           ┌─────────────┐
//! │ DedupStore  │           │   Notifier    │           │   Events    │
//! │ (check/mark)│           │ (send+retry)  │           │  (observe)  │
//! └─────────────┘           └───────────────┘           └─────────────┘
//! ```
//!
//! Per alarm: compute digest → skip if `already_sent` → `send` →
//! `mark_sent`. An alarm whose delivery exhausts all retry attempts is NOT
//! marked sent, so it is picked up again on the next fetch cycle.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::notify::Notifier;
use crate::traits::{AlarmProvider, DedupStore};

/// Events emitted by the AlertEngine for external observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// An alarm's digest was already in the ledger; no notification sent
    AlarmSkipped { digest: String },

    /// An alarm was delivered and recorded in the ledger
    AlarmNotified { digest: String },

    /// Delivery failed after all retry attempts; the alarm stays unmarked
    NotificationFailed { digest: String, error: String },

    /// One fetch cycle finished
    CycleCompleted { summary: CycleSummary },
}

/// Counters for one fetch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Alarms returned by the provider
    pub fetched: usize,
    /// Alarms delivered and marked sent
    pub sent: usize,
    /// Alarms skipped because their digest was already recorded
    pub skipped: usize,
    /// Alarms whose delivery exhausted all attempts
    pub failed: usize,
}

/// Orchestrates the fetch → dedup → notify → mark-sent pipeline.
///
/// The engine depends only on the [`AlarmProvider`] and [`DedupStore`]
/// capabilities, never on a concrete source or ledger. One cycle processes
/// alarms strictly sequentially; a delivery failure for one alarm is logged
/// and does not stop the rest of the batch.
pub struct AlertEngine {
    /// Alarm source
    provider: Box<dyn AlarmProvider>,

    /// Ledger of already-notified digests
    ledger: Box<dyn DedupStore>,

    /// Renders and delivers notifications
    notifier: Notifier,

    /// Delay between fetch cycles
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl AlertEngine {
    /// Create a new engine.
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver); the receiver yields
    /// [`EngineEvent`]s as the pipeline processes alarms.
    pub fn new(
        provider: Box<dyn AlarmProvider>,
        ledger: Box<dyn DedupStore>,
        notifier: Notifier,
        config: &EngineConfig,
    ) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            provider,
            ledger,
            notifier,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            event_tx: tx,
        };

        (engine, rx)
    }

    /// Run one fetch → dedup → notify → mark-sent pass.
    ///
    /// Returns the cycle counters. Errors from the provider or the ledger
    /// abort the cycle; a delivery failure only fails that alarm.
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let alarms = self.provider.fetch().await?;

        let mut summary = CycleSummary {
            fetched: alarms.len(),
            ..CycleSummary::default()
        };

        for alarm in &alarms {
            let digest = alarm.digest()?;

            if self.ledger.already_sent(&digest).await? {
                debug!("alarm {} already notified, skipping", digest);
                summary.skipped += 1;
                self.emit_event(EngineEvent::AlarmSkipped { digest });
                continue;
            }

            match self.notifier.send(alarm).await {
                Ok(()) => {
                    self.ledger.mark_sent(&digest, alarm).await?;
                    summary.sent += 1;
                    self.emit_event(EngineEvent::AlarmNotified { digest });
                }
                Err(e) => {
                    // Deliberately not marked sent: the next cycle retries it.
                    error!("failed to notify alarm {}: {}", digest, e);
                    summary.failed += 1;
                    self.emit_event(EngineEvent::NotificationFailed {
                        digest,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "cycle complete: {} fetched, {} sent, {} skipped, {} failed",
            summary.fetched, summary.sent, summary.skipped, summary.failed
        );
        self.emit_event(EngineEvent::CycleCompleted { summary });

        Ok(summary)
    }

    /// Run the engine's periodic loop until a shutdown signal arrives.
    ///
    /// The first cycle runs immediately; subsequent cycles follow the
    /// configured poll interval. Cycle errors are logged and the loop
    /// continues with the next tick.
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Like [`run`](Self::run), but with a programmatic shutdown signal
    /// instead of ctrl-c. Intended for tests and embedders that manage
    /// their own signal handling.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        info!(
            "starting alert engine (provider={}, interval={:?})",
            self.provider.provider_name(),
            self.poll_interval
        );

        let mut ticker = tokio::time::interval(self.poll_interval);

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_cycle().await {
                            error!("fetch cycle failed: {}", e);
                        }
                    }
                    _ = &mut rx => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_cycle().await {
                            error!("fetch cycle failed: {}", e);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        break;
                    }
                }
            }
        }

        info!("alert engine stopped");
        Ok(())
    }

    fn emit_event(&self, event: EngineEvent) {
        // Drop on full rather than block the pipeline; observation is
        // best-effort.
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping engine event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_summary_defaults_to_zero() {
        let summary = CycleSummary::default();
        assert_eq!(summary.fetched + summary.sent + summary.skipped + summary.failed, 0);
    }

    #[test]
    fn engine_events_compare_by_content() {
        let event = EngineEvent::AlarmNotified {
            digest: "abc".to_string(),
        };
        assert_eq!(event.clone(), event);
    }
}
