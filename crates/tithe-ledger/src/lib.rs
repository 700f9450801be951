//! # tithe-ledger: Transaction application and ledger close.
//!
//! Composes the in-memory ledger from `tithe-core` with the inflation engine
//! from `tithe-inflation`:
//! - [`Transaction`] / [`Operation`]: account creation, payments, inflation
//!   votes, and the inflation request itself.
//! - [`LedgerManager::close_ledger`]: applies a transaction set atomically,
//!   charging fees into the fee pool and checking conservation at the end.
//! - [`LedgerConfig`]: network selection and logging, from TOML and `TITHE_*`
//!   environment variables.

pub mod config;
pub mod manager;
pub mod transaction;

pub use config::{ConfigError, LedgerConfig, LogFormat};
pub use manager::{LedgerCloseResult, LedgerManager};
pub use transaction::{Operation, Transaction, TxResult};
