//! Ledger close: apply an ordered transaction set to the ledger.
//!
//! Each transaction first pays its fee into the fee pool, then runs its
//! operation. An operation that fails keeps the fee and leaves no other
//! trace. A fatal error (a broken invariant anywhere in the close) reverts
//! the whole ledger through the undo journal, so a close either commits in
//! full or not at all.

use std::sync::Arc;

use parking_lot::RwLock;
use tithe_core::constants::NetworkType;
use tithe_core::error::{InflationError, LedgerError, TitheError, TransactionError};
use tithe_core::genesis::genesis_ledger;
use tithe_core::ledger::{LedgerStore, MemoryLedger};
use tithe_core::traits::{AccountStore, InflationProcessor};
use tithe_core::types::{Account, AccountId, Hash256, HeaderUpdate, LedgerDelta, LedgerHeader};
use tithe_inflation::{InflationEngine, InflationParams};
use tracing::{debug, error, info};

use crate::transaction::{Operation, Transaction, TxResult};

/// Result of closing one ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerCloseResult {
    pub ledger_seq: u64,
    pub close_time: u64,
    /// Hash of the header after the close.
    pub header_hash: Hash256,
    /// One entry per transaction, in application order.
    pub results: Vec<TxResult>,
    /// Deltas of the inflation rounds applied in this ledger.
    pub inflation: Vec<LedgerDelta>,
}

impl LedgerCloseResult {
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    pub fn fees_charged(&self) -> u64 {
        self.results.iter().map(|r| r.fee_charged).sum()
    }
}

/// Why an operation produced no delta.
enum Rejection {
    /// The transaction fails; the ledger close continues.
    Tx(TransactionError),
    /// The ledger close must be abandoned.
    Fatal(TitheError),
}

impl From<TransactionError> for Rejection {
    fn from(e: TransactionError) -> Self {
        Self::Tx(e)
    }
}

impl From<LedgerError> for Rejection {
    fn from(e: LedgerError) -> Self {
        Self::Fatal(e.into())
    }
}

impl From<InflationError> for Rejection {
    fn from(e: InflationError) -> Self {
        if e.is_fatal() {
            Self::Fatal(e.into())
        } else {
            Self::Tx(e.into())
        }
    }
}

/// Owns the ledger and applies ledger closes to it.
///
/// The ledger sits behind a `RwLock`: closes take the write lock for their
/// full duration, readers never see a half-applied ledger.
pub struct LedgerManager {
    ledger: RwLock<MemoryLedger>,
    inflation: Arc<dyn InflationProcessor>,
}

impl LedgerManager {
    pub fn new(ledger: MemoryLedger, inflation: Arc<dyn InflationProcessor>) -> Self {
        Self { ledger: RwLock::new(ledger), inflation }
    }

    /// A manager over the genesis ledger of `network`.
    pub fn genesis(network: NetworkType, params: InflationParams) -> Result<Self, InflationError> {
        let engine = InflationEngine::new(params)?;
        Ok(Self::new(genesis_ledger(network), Arc::new(engine)))
    }

    /// Snapshot of the current header.
    pub fn header(&self) -> LedgerHeader {
        self.ledger.read().header().clone()
    }

    /// Look up an account.
    ///
    /// # Errors
    ///
    /// [`LedgerError::AccountNotFound`] if it does not exist.
    pub fn account(&self, id: &AccountId) -> Result<Account, LedgerError> {
        self.ledger
            .read()
            .get_account(id)?
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    pub fn account_count(&self) -> usize {
        self.ledger.read().account_count()
    }

    /// Run `f` against the ledger under a read lock.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&MemoryLedger) -> R) -> R {
        f(&self.ledger.read())
    }

    pub fn check_conservation(&self) -> Result<(), LedgerError> {
        self.ledger.read().check_conservation()
    }

    /// Close the next ledger at `close_time`, applying `txs` in order.
    ///
    /// # Errors
    ///
    /// Any error leaves the ledger exactly as it was before the call:
    /// - [`LedgerError::CloseTimeRegressed`] if `close_time` is earlier than
    ///   the previous close
    /// - a fatal [`InflationError`] or any [`LedgerError`] raised while
    ///   applying transactions, including the final conservation check
    pub fn close_ledger(
        &self,
        close_time: u64,
        txs: &[Transaction],
    ) -> Result<LedgerCloseResult, TitheError> {
        let mut ledger = self.ledger.write();
        let checkpoint = ledger.checkpoint();

        match apply_ledger(&mut ledger, self.inflation.as_ref(), close_time, txs) {
            Ok(result) => {
                ledger.forget_history();
                info!(
                    ledger = result.ledger_seq,
                    close_time,
                    txs = txs.len(),
                    failed = result.failed_count(),
                    inflation_rounds = result.inflation.len(),
                    "ledger closed"
                );
                Ok(result)
            }
            Err(e) => {
                let reverted = ledger.rollback_to(checkpoint)?;
                error!(
                    ledger = ledger.header().ledger_seq + 1,
                    close_time,
                    reverted,
                    error = %e,
                    "ledger close aborted"
                );
                Err(e)
            }
        }
    }
}

fn apply_ledger(
    ledger: &mut MemoryLedger,
    inflation: &dyn InflationProcessor,
    close_time: u64,
    txs: &[Transaction],
) -> Result<LedgerCloseResult, TitheError> {
    ledger.begin_ledger(close_time)?;

    let mut results = Vec::with_capacity(txs.len());
    let mut rounds = Vec::new();
    for (index, tx) in txs.iter().enumerate() {
        let result = apply_transaction(ledger, inflation, tx, close_time, &mut rounds)?;
        debug!(
            index,
            op = tx.op.name(),
            source = %tx.source.short(),
            fee = result.fee_charged,
            ok = result.is_success(),
            "transaction applied"
        );
        results.push(result);
    }
    ledger.check_conservation()?;

    let header = ledger.header();
    Ok(LedgerCloseResult {
        ledger_seq: header.ledger_seq,
        close_time: header.close_time,
        header_hash: header.hash(),
        results,
        inflation: rounds,
    })
}

/// Charge the fee, then run the operation. `Err` only for fatal errors.
fn apply_transaction(
    ledger: &mut MemoryLedger,
    inflation: &dyn InflationProcessor,
    tx: &Transaction,
    close_time: u64,
    rounds: &mut Vec<LedgerDelta>,
) -> Result<TxResult, TitheError> {
    let fee_delta = match charge_fee(ledger, tx) {
        Ok(delta) => delta,
        Err(Rejection::Tx(e)) => return Ok(TxResult::failed(0, e)),
        Err(Rejection::Fatal(e)) => return Err(e),
    };
    ledger.apply_delta(&fee_delta)?;

    let op_delta = match operation_delta(ledger, inflation, tx, close_time) {
        Ok(delta) => delta,
        Err(Rejection::Tx(e)) => return Ok(TxResult::failed(tx.fee, e)),
        Err(Rejection::Fatal(e)) => return Err(e),
    };
    ledger.apply_delta(&op_delta)?;
    if tx.op == Operation::Inflation {
        rounds.push(op_delta);
    }
    Ok(TxResult::success(tx.fee))
}

fn source_account(ledger: &MemoryLedger, tx: &Transaction) -> Result<Account, Rejection> {
    ledger
        .get_account(&tx.source)?
        .ok_or_else(|| TransactionError::NoSourceAccount(tx.source.to_string()).into())
}

/// Move the fee from the source into the fee pool.
fn charge_fee(ledger: &MemoryLedger, tx: &Transaction) -> Result<LedgerDelta, Rejection> {
    let header = ledger.header();
    if tx.fee < header.base_fee {
        return Err(TransactionError::InsufficientFee { fee: tx.fee, base_fee: header.base_fee }.into());
    }
    let mut source = source_account(ledger, tx)?;
    source.balance = source
        .balance
        .checked_sub(tx.fee)
        .ok_or(TransactionError::Underfunded { have: source.balance, need: tx.fee })?;

    let mut update = HeaderUpdate::from(header);
    // fee_pool + fee <= total_coins whenever conservation holds.
    update.fee_pool = update.fee_pool.checked_add(tx.fee).ok_or_else(|| {
        LedgerError::ConservationViolated {
            total_coins: header.total_coins,
            fee_pool: header.fee_pool,
            balances: ledger.total_balances(),
        }
    })?;

    let mut delta = LedgerDelta::new(header.ledger_seq);
    delta.put_account(source);
    delta.header = Some(update);
    Ok(delta)
}

fn operation_delta(
    ledger: &MemoryLedger,
    inflation: &dyn InflationProcessor,
    tx: &Transaction,
    close_time: u64,
) -> Result<LedgerDelta, Rejection> {
    let header = ledger.header();
    let mut delta = LedgerDelta::new(header.ledger_seq);

    match &tx.op {
        Operation::CreateAccount { destination, starting_balance } => {
            if ledger.contains_account(destination)? {
                return Err(TransactionError::AlreadyExists(destination.to_string()).into());
            }
            let min = header.min_balance(0);
            if *starting_balance < min {
                return Err(TransactionError::LowReserve { got: *starting_balance, min }.into());
            }
            let mut source = source_account(ledger, tx)?;
            let available = source.balance.saturating_sub(min);
            if *starting_balance > available {
                return Err(TransactionError::Underfunded {
                    have: available,
                    need: *starting_balance,
                }
                .into());
            }
            source.balance -= starting_balance;
            delta.put_account(source);
            delta.put_account(Account::new(*destination, *starting_balance));
        }
        Operation::Payment { destination, amount } => {
            if *amount == 0 {
                return Err(TransactionError::Malformed("payment amount must be positive".into()).into());
            }
            let mut source = source_account(ledger, tx)?;
            let available = source.balance.saturating_sub(header.min_balance(0));
            if *amount > available {
                return Err(TransactionError::Underfunded { have: available, need: *amount }.into());
            }
            if *destination == source.id {
                return Ok(delta);
            }
            let mut target = ledger
                .get_account(destination)?
                .ok_or_else(|| TransactionError::NoDestination(destination.to_string()))?;
            target.balance = target
                .balance
                .checked_add(*amount)
                .ok_or_else(|| TransactionError::LineFull(destination.to_string()))?;
            source.balance -= amount;
            delta.put_account(source);
            delta.put_account(target);
        }
        Operation::SetInflationDestination { destination } => {
            let mut source = source_account(ledger, tx)?;
            source.inflation_dest = *destination;
            delta.put_account(source);
        }
        Operation::Inflation => {
            delta = inflation.apply_inflation(header, ledger, close_time)?;
        }
    }
    Ok(delta)
}
