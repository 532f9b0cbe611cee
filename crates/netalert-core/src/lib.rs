// # netalert-core
//
// Core library for the alarm notification pipeline.
//
// ## Architecture Overview
//
// This library provides the core functionality for alarm notification:
// - **AlarmProvider**: Trait for fetching alarm batches from a source
// - **DedupStore**: Trait for the durable ledger of already-notified alarms
// - **Notifier**: Renders alarms and delivers them over a configured channel
//   with bounded retry and exponential backoff
// - **AlertEngine**: Orchestrates the fetch → dedup → notify → mark-sent flow
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations;
//    alarm sources live in satellite crates behind the AlarmProvider trait
// 2. **Single-Shot Channels**: Delivery channels perform one attempt per
//    call; retry policy is owned by the Notifier
// 3. **Idempotency**: The content-digest ledger guarantees at-most-once
//    notification per unique alarm across process restarts
// 4. **Library-First**: All core functionality can be used without the
//    daemon binary

pub mod alarm;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod notify;
pub mod traits;

// Re-export core types for convenience
pub use alarm::Alarm;
pub use config::{
    ChannelKind, EngineConfig, LedgerConfig, NetalertConfig, NotifierConfig, ProviderConfig,
};
pub use engine::{AlertEngine, CycleSummary, EngineEvent};
pub use error::{Error, Result};
pub use ledger::{MemoryLedger, SqliteLedger};
pub use notify::{Channel, Notifier, RenderedAlert};
pub use traits::{AlarmProvider, DedupStore, SentAlertRecord};
