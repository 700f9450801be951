//! Vote tally: accumulated balance weight per inflation destination.
//!
//! Every account naming a destination adds its full balance to that
//! destination. Destinations are not resolved here; missing and
//! self-referencing destinations accumulate like any other.

use std::collections::BTreeMap;

use tithe_core::types::{Account, AccountId};

/// Weights keyed by destination, plus the grand total across all of them.
///
/// Weights are u128 so the grand total cannot overflow whatever the account
/// population. Addition is commutative and storage ordered, so the tally is
/// independent of enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    weights: BTreeMap<AccountId, u128>,
    total: u128,
    voters: usize,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally every account that names a destination.
    pub fn from_accounts<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Self {
        let mut tally = Self::new();
        for account in accounts {
            if let Some(dest) = account.inflation_dest {
                tally.add_vote(dest, account.balance);
            }
        }
        tally
    }

    /// Credit `balance` of voting weight to `destination`.
    pub fn add_vote(&mut self, destination: AccountId, balance: u64) {
        *self.weights.entry(destination).or_insert(0) += u128::from(balance);
        self.total += u128::from(balance);
        self.voters += 1;
    }

    /// Accumulated weight of a destination (0 if nobody named it).
    pub fn weight(&self, destination: &AccountId) -> u128 {
        self.weights.get(destination).copied().unwrap_or(0)
    }

    /// Sum of all weights across all destinations.
    pub fn total_weight(&self) -> u128 {
        self.total
    }

    /// Number of accounts that named a destination.
    pub fn voter_count(&self) -> usize {
        self.voters
    }

    /// Number of distinct destinations named.
    pub fn destination_count(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// `(destination, weight)` pairs in ascending destination order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, &u128)> {
        self.weights.iter()
    }
}
