//! Shared fixtures for the integration tests.

use std::sync::Arc;

use tithe_core::constants::{BASE_RESERVE, NetworkType};
use tithe_core::genesis::{close_time_on, genesis_ledger, root_account_id};
use tithe_core::ledger::LedgerStore;
use tithe_core::types::AccountId;
use tithe_inflation::{InflationEngine, InflationParams};
use tithe_ledger::{LedgerCloseResult, LedgerManager, Transaction};

/// Minimum balance of an account without subentries.
pub const MIN_BALANCE: u64 = 2 * BASE_RESERVE;

/// Standalone network: no issuance, only fees are redistributed.
pub fn standalone_manager() -> LedgerManager {
    LedgerManager::genesis(
        NetworkType::Standalone,
        InflationParams::for_network(NetworkType::Standalone),
    )
    .unwrap()
}

/// Standalone genesis ledger running the mainnet inflation parameters.
pub fn issuing_manager() -> LedgerManager {
    LedgerManager::new(
        genesis_ledger(NetworkType::Standalone),
        Arc::new(InflationEngine::for_network(NetworkType::Mainnet)),
    )
}

pub fn root() -> AccountId {
    root_account_id(NetworkType::Standalone)
}

/// Account id derived from a name, like a keypair from a seed phrase.
pub fn named(name: &str) -> AccountId {
    AccountId::from_seed(name.as_bytes())
}

/// Midnight UTC of a calendar date, as a close time.
pub fn date(day: u32, month: u32, year: i32) -> u64 {
    close_time_on(day, month, year).unwrap()
}

/// Close the next ledger at midnight of the given date.
pub fn close_on(
    manager: &LedgerManager,
    day: u32,
    month: u32,
    year: i32,
    txs: &[Transaction],
) -> LedgerCloseResult {
    manager.close_ledger(date(day, month, year), txs).unwrap()
}

/// `fee_pool + Σ balance`, widened.
pub fn accounted_coins(manager: &LedgerManager) -> u128 {
    manager.with_ledger(|l| u128::from(l.header().fee_pool) + l.total_balances())
}
