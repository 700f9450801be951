//! Error types for the Tithe protocol.
use thiserror::Error;

/// Failure of an inflation request.
///
/// Only [`NotYetDue`](InflationError::NotYetDue) is an ordinary, user-visible
/// outcome. [`InvariantViolation`](InflationError::InvariantViolation) means
/// the computed round would break conservation or epoch monotonicity and must
/// stop ledger processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InflationError {
    #[error("inflation not yet due: close time {close_time} < next eligible {next_eligible}")]
    NotYetDue { close_time: u64, next_eligible: u64 },
    #[error("internal invariant violation: {0}")]
    InvariantViolation(String),
    #[error("invalid inflation parameters: {0}")]
    InvalidParams(String),
}

impl InflationError {
    /// Whether this error must abort the enclosing ledger close.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NotYetDue { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account not found: {0}")] AccountNotFound(String),
    #[error("conservation violated: total {total_coins} != fee pool {fee_pool} + balances {balances}")]
    ConservationViolated { total_coins: u64, fee_pool: u64, balances: u128 },
    #[error("unbalanced delta: balances move {balances}, fee pool {fee_pool}, total {total}")]
    UnbalancedDelta { balances: i128, fee_pool: i128, total: i128 },
    #[error("inflation epoch went backwards: {prev} -> {next}")] EpochRegressed { prev: u64, next: u64 },
    #[error("delta base mismatch: expected ledger {expected}, got {got}")] StaleDelta { expected: u64, got: u64 },
    #[error("close time went backwards: {prev} -> {next}")] CloseTimeRegressed { prev: u64, next: u64 },
    #[error("checkpoint {0} is ahead of the undo journal")] UnknownCheckpoint(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("source account not found: {0}")] NoSourceAccount(String),
    #[error("fee {fee} below base fee {base_fee}")] InsufficientFee { fee: u64, base_fee: u64 },
    #[error("insufficient balance: have {have}, need {need}")] Underfunded { have: u64, need: u64 },
    #[error("destination not found: {0}")] NoDestination(String),
    #[error("starting balance {got} below minimum {min}")] LowReserve { got: u64, min: u64 },
    #[error("account already exists: {0}")] AlreadyExists(String),
    #[error("destination balance would overflow: {0}")] LineFull(String),
    #[error("malformed: {0}")] Malformed(String),
    #[error(transparent)] Inflation(#[from] InflationError),
}

#[derive(Error, Debug)]
pub enum TitheError {
    #[error(transparent)] Inflation(#[from] InflationError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Transaction(#[from] TransactionError),
    #[error("serialization: {0}")] Serialization(String),
}
