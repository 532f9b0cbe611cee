//! Core traits for the alarm notification pipeline
//!
//! This module defines the abstract interfaces concrete implementations
//! must follow.
//!
//! - [`AlarmProvider`]: produce batches of alarms from some source
//! - [`DedupStore`]: durable ledger of already-notified alarm digests

pub mod alarm_provider;
pub mod dedup_store;

pub use alarm_provider::AlarmProvider;
pub use dedup_store::{DedupStore, SentAlertRecord};
