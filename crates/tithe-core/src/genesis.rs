//! Genesis ledger definition.
//!
//! The genesis ledger (sequence 1) holds a single root account owning
//! [`GENESIS_TOTAL_COINS`]. The root id is derived from the network
//! passphrase, so every node on a network computes the identical ledger.

use chrono::NaiveDate;

use crate::constants::{BASE_FEE, BASE_RESERVE, GENESIS_TOTAL_COINS, NetworkType};
use crate::ledger::MemoryLedger;
use crate::types::{Account, AccountId, LedgerHeader};

/// Close time recorded in the genesis header: 2014-06-30T00:00:00Z.
pub const GENESIS_CLOSE_TIME: u64 = 1_404_086_400;

/// Id of the root account for a network.
pub fn root_account_id(network: NetworkType) -> AccountId {
    AccountId::from_seed(network.passphrase().as_bytes())
}

/// Header of the genesis ledger.
pub fn genesis_header() -> LedgerHeader {
    LedgerHeader {
        ledger_seq: 1,
        close_time: GENESIS_CLOSE_TIME,
        inflation_seq: 0,
        total_coins: GENESIS_TOTAL_COINS,
        fee_pool: 0,
        base_fee: BASE_FEE,
        base_reserve: BASE_RESERVE,
    }
}

/// Build the genesis ledger for a network.
pub fn genesis_ledger(network: NetworkType) -> MemoryLedger {
    MemoryLedger::new(
        genesis_header(),
        [Account::new(root_account_id(network), GENESIS_TOTAL_COINS)],
    )
}

/// Unix time of midnight UTC on a calendar date.
///
/// Returns `None` for invalid dates and dates before 1970.
pub fn close_time_on(day: u32, month: u32, year: i32) -> Option<u64> {
    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    u64::try_from(midnight.and_utc().timestamp()).ok()
}
