//! Ledger state storage interface and in-memory implementation.
//!
//! Provides the [`LedgerStore`] trait: the commit boundary for
//! [`LedgerDelta`]s, plus ledger sequencing and an undo journal so any suffix
//! of applied changes can be reverted. [`MemoryLedger`] keeps everything in
//! ordered maps and is what the ledger manager and the tests run on.
//!
//! Deltas passed to [`LedgerStore::apply_delta`] are checked for balance
//! (every stroop moved is accounted for) and then written in full, or not at
//! all.

use std::collections::BTreeMap;

use crate::error::LedgerError;
use crate::traits::AccountStore;
use crate::types::{Account, AccountId, LedgerDelta, LedgerHeader};

/// Result of applying a delta to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyDeltaResult {
    /// Number of accounts that did not exist before the delta.
    pub accounts_created: usize,
    /// Number of existing accounts whose entry was replaced.
    pub accounts_updated: usize,
}

/// Undo data for reverting one journal step.
///
/// Stores the previous header and the pre-image of every touched account
/// (`None` for accounts the step created).
#[derive(Clone, Debug)]
struct LedgerUndo {
    header: LedgerHeader,
    accounts: Vec<(AccountId, Option<Account>)>,
}

/// Mutable ledger storage interface.
///
/// Not thread-safe; callers wrap it in a lock when sharing.
pub trait LedgerStore: AccountStore {
    /// The header of the ledger currently being built.
    fn header(&self) -> &LedgerHeader;

    /// Start the next ledger: bump `ledger_seq` and set its close time.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::CloseTimeRegressed`] if `close_time` is before the
    ///   previous ledger's close time
    fn begin_ledger(&mut self, close_time: u64) -> Result<(), LedgerError>;

    /// Atomically apply a delta computed against the current ledger.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::StaleDelta`] if the delta was built against another ledger
    /// - [`LedgerError::UnbalancedDelta`] if the balance changes, fee pool
    ///   change, and total coin change do not sum to zero
    /// - [`LedgerError::EpochRegressed`] if the inflation epoch would decrease
    fn apply_delta(&mut self, delta: &LedgerDelta) -> Result<ApplyDeltaResult, LedgerError>;

    /// Opaque position in the undo journal.
    fn checkpoint(&self) -> usize;

    /// Revert every step recorded after `checkpoint`. Returns the number of
    /// steps reverted.
    fn rollback_to(&mut self, checkpoint: usize) -> Result<usize, LedgerError>;

    /// Full scan: `total_coins == fee_pool + Σ balance`.
    fn check_conservation(&self) -> Result<(), LedgerError>;
}

/// In-memory ledger keyed by account id.
///
/// `BTreeMap` storage makes enumeration order the canonical id order.
#[derive(Clone, Debug)]
pub struct MemoryLedger {
    accounts: BTreeMap<AccountId, Account>,
    header: LedgerHeader,
    journal: Vec<LedgerUndo>,
}

impl MemoryLedger {
    /// Create a ledger from a header and an initial account set.
    ///
    /// No conservation check is made here; call
    /// [`check_conservation`](LedgerStore::check_conservation) when the
    /// inputs are not trusted.
    pub fn new(header: LedgerHeader, accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
            header,
            journal: Vec::new(),
        }
    }

    /// Number of undo records held.
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Drop undo records, keeping the current state. Called once a ledger is
    /// final and can no longer be reverted.
    pub fn forget_history(&mut self) {
        self.journal.clear();
    }

    /// Sum of all balances, widened so it cannot overflow.
    pub fn total_balances(&self) -> u128 {
        self.accounts.values().map(|a| u128::from(a.balance)).sum()
    }

    /// Net balance movement of a delta against the current state.
    fn balance_change(&self, delta: &LedgerDelta) -> i128 {
        delta
            .accounts
            .iter()
            .map(|(id, post)| {
                let pre = self.accounts.get(id).map_or(0, |a| a.balance);
                i128::from(post.balance) - i128::from(pre)
            })
            .sum()
    }
}

impl AccountStore for MemoryLedger {
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.accounts.get(id).cloned())
    }

    fn iter_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.accounts.values().cloned().collect())
    }

    fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

impl LedgerStore for MemoryLedger {
    fn header(&self) -> &LedgerHeader {
        &self.header
    }

    fn begin_ledger(&mut self, close_time: u64) -> Result<(), LedgerError> {
        if close_time < self.header.close_time {
            return Err(LedgerError::CloseTimeRegressed {
                prev: self.header.close_time,
                next: close_time,
            });
        }
        self.journal.push(LedgerUndo {
            header: self.header.clone(),
            accounts: Vec::new(),
        });
        self.header.ledger_seq += 1;
        self.header.close_time = close_time;
        Ok(())
    }

    fn apply_delta(&mut self, delta: &LedgerDelta) -> Result<ApplyDeltaResult, LedgerError> {
        if delta.base_seq != self.header.ledger_seq {
            return Err(LedgerError::StaleDelta {
                expected: self.header.ledger_seq,
                got: delta.base_seq,
            });
        }

        // Validate everything before the first write.
        let balances = self.balance_change(delta);
        let (fee_pool, total) = match &delta.header {
            Some(update) => {
                if update.inflation_seq < self.header.inflation_seq {
                    return Err(LedgerError::EpochRegressed {
                        prev: self.header.inflation_seq,
                        next: update.inflation_seq,
                    });
                }
                (
                    i128::from(update.fee_pool) - i128::from(self.header.fee_pool),
                    i128::from(update.total_coins) - i128::from(self.header.total_coins),
                )
            }
            None => (0, 0),
        };
        if balances + fee_pool != total {
            return Err(LedgerError::UnbalancedDelta { balances, fee_pool, total });
        }

        let mut undo = LedgerUndo {
            header: self.header.clone(),
            accounts: Vec::with_capacity(delta.accounts.len()),
        };
        let mut created = 0;
        let mut updated = 0;
        for (id, post) in &delta.accounts {
            let pre = self.accounts.insert(*id, post.clone());
            if pre.is_some() {
                updated += 1;
            } else {
                created += 1;
            }
            undo.accounts.push((*id, pre));
        }
        if let Some(update) = &delta.header {
            self.header.inflation_seq = update.inflation_seq;
            self.header.total_coins = update.total_coins;
            self.header.fee_pool = update.fee_pool;
        }
        self.journal.push(undo);

        Ok(ApplyDeltaResult {
            accounts_created: created,
            accounts_updated: updated,
        })
    }

    fn checkpoint(&self) -> usize {
        self.journal.len()
    }

    fn rollback_to(&mut self, checkpoint: usize) -> Result<usize, LedgerError> {
        if checkpoint > self.journal.len() {
            return Err(LedgerError::UnknownCheckpoint(checkpoint));
        }
        let mut reverted = 0;
        while self.journal.len() > checkpoint {
            let Some(undo) = self.journal.pop() else { break };
            // Reverse order so an account touched twice ends at its oldest image.
            for (id, pre) in undo.accounts.into_iter().rev() {
                match pre {
                    Some(account) => {
                        self.accounts.insert(id, account);
                    }
                    None => {
                        self.accounts.remove(&id);
                    }
                }
            }
            self.header = undo.header;
            reverted += 1;
        }
        Ok(reverted)
    }

    fn check_conservation(&self) -> Result<(), LedgerError> {
        let balances = self.total_balances();
        if u128::from(self.header.total_coins) != u128::from(self.header.fee_pool) + balances {
            return Err(LedgerError::ConservationViolated {
                total_coins: self.header.total_coins,
                fee_pool: self.header.fee_pool,
                balances,
            });
        }
        Ok(())
    }
}
