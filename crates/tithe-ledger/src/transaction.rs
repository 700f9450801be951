//! Transactions and per-transaction results.

use serde::{Deserialize, Serialize};
use tithe_core::constants::BASE_FEE;
use tithe_core::error::TransactionError;
use tithe_core::types::AccountId;

/// The single operation a transaction carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Fund a new account from the source.
    CreateAccount { destination: AccountId, starting_balance: u64 },
    /// Move `amount` from the source to an existing account.
    Payment { destination: AccountId, amount: u64 },
    /// Name (or clear) the account the source votes for.
    SetInflationDestination { destination: Option<AccountId> },
    /// Run the weekly inflation round if it is due.
    Inflation,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateAccount { .. } => "create_account",
            Self::Payment { .. } => "payment",
            Self::SetInflationDestination { .. } => "set_inflation_destination",
            Self::Inflation => "inflation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub source: AccountId,
    /// Fee offered, charged into the fee pool before the operation runs.
    pub fee: u64,
    pub op: Operation,
}

impl Transaction {
    /// A transaction offering the base fee.
    pub fn new(source: AccountId, op: Operation) -> Self {
        Self { source, fee: BASE_FEE, op }
    }

    pub fn with_fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    pub fn create_account(source: AccountId, destination: AccountId, starting_balance: u64) -> Self {
        Self::new(source, Operation::CreateAccount { destination, starting_balance })
    }

    pub fn payment(source: AccountId, destination: AccountId, amount: u64) -> Self {
        Self::new(source, Operation::Payment { destination, amount })
    }

    pub fn set_inflation_destination(source: AccountId, destination: Option<AccountId>) -> Self {
        Self::new(source, Operation::SetInflationDestination { destination })
    }

    pub fn inflation(source: AccountId) -> Self {
        Self::new(source, Operation::Inflation)
    }
}

/// Outcome of one transaction inside a ledger close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResult {
    /// Fee moved into the fee pool. Zero when the fee could not be charged.
    pub fee_charged: u64,
    pub result: Result<(), TransactionError>,
}

impl TxResult {
    pub fn success(fee_charged: u64) -> Self {
        Self { fee_charged, result: Ok(()) }
    }

    pub fn failed(fee_charged: u64, error: TransactionError) -> Self {
        Self { fee_charged, result: Err(error) }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&TransactionError> {
        self.result.as_ref().err()
    }
}
