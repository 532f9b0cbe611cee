// # Dedup Ledger Implementations
//
// This module provides implementations of the DedupStore trait for
// different persistence strategies.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
