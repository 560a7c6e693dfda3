//! ticjar-core - ledger store and report aggregation
//!
//! This crate provides:
//! - The `TicJar` store: a file-backed ledger of per-user, per-month tic
//!   counts, rewritten in full after every mutation
//! - `MonthKey`, the typed `YYYY-MM` bucketing key
//! - Report aggregation: per-user history and cross-user month-range
//!   reports, with cost computed from the configured rate at read time

pub mod ledger;
pub mod month;
pub mod report;

// Re-export main types for convenience
pub use ledger::{LedgerMap, TicJar, TicReceipt};
pub use month::{MonthKey, ParseMonthError};
pub use report::{MonthlyEntry, RangeReport, UserHistory, UserTotals};
