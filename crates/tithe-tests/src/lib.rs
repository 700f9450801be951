//! Cross-crate test suite for Tithe.
//!
//! Integration tests under `tests/` drive full ledger closes through
//! [`tithe_ledger::LedgerManager`]: the weekly inflation scenarios, and
//! property tests that try to break conservation, epoch monotonicity, and
//! determinism under randomized transaction sets.

pub mod helpers;
