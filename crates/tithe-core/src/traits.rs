//! Trait interfaces for the Tithe protocol.
//!
//! These traits define the contracts between crates:
//! - [`AccountStore`]: read/enumerate view of the account population
//!   (the in-memory ledger implements it)
//! - [`InflationProcessor`]: the inflation state transition (tithe-inflation implements)

use crate::error::{InflationError, LedgerError};
use crate::types::{Account, AccountId, LedgerDelta, LedgerHeader};

/// Read-only view of the account population at a ledger boundary.
///
/// Implementations must present a stable snapshot: nothing ordered later in
/// the same ledger may be observed through it.
pub trait AccountStore: Send + Sync {
    /// Look up an account by id. Returns `None` if it does not exist.
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, LedgerError>;

    /// Whether an account exists.
    ///
    /// Default implementation delegates to [`get_account`](Self::get_account).
    fn contains_account(&self, id: &AccountId) -> Result<bool, LedgerError> {
        Ok(self.get_account(id)?.is_some())
    }

    /// Every account, in ascending id order.
    fn iter_accounts(&self) -> Result<Vec<Account>, LedgerError>;

    /// Number of accounts in the population.
    fn account_count(&self) -> usize;
}

/// The inflation state transition.
///
/// A pure function of `(header, accounts, close_time)`: it never mutates
/// either input and performs no I/O. The returned delta is committed by the
/// caller through [`LedgerStore::apply_delta`](crate::ledger::LedgerStore::apply_delta).
pub trait InflationProcessor: Send + Sync {
    /// Compute the delta for one inflation round.
    ///
    /// # Errors
    ///
    /// - [`InflationError::NotYetDue`] if `close_time` is before the next
    ///   eligible round. Nothing is computed.
    /// - [`InflationError::InvariantViolation`] if the computed round would
    ///   break conservation or epoch monotonicity.
    fn apply_inflation(
        &self,
        header: &LedgerHeader,
        accounts: &dyn AccountStore,
        close_time: u64,
    ) -> Result<LedgerDelta, InflationError>;
}
