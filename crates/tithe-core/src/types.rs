//! Core protocol types: accounts, the ledger header, and ledger deltas.
//!
//! All monetary values are in stroops (1 TITHE = 10^7 stroops).
//! Balances and header amounts are u64; aggregate sums use u128.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TitheError;

/// A 32-byte hash value.
///
/// Used for ledger header hashes (SHA-256) and delta digests (BLAKE3).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Identifier of an account: a 32-byte public key.
///
/// Ordering is bytewise, which is the canonical enumeration order of the
/// account population.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// Deterministic id derived from an arbitrary seed (SHA-256 of the seed).
    ///
    /// Test fixtures and the genesis root use this; real accounts carry keys
    /// produced by a wallet outside this crate.
    pub fn from_seed(seed: &[u8]) -> Self {
        Self(Sha256::digest(seed).into())
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A ledger account entry.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Account {
    pub id: AccountId,
    /// Balance in stroops.
    pub balance: u64,
    /// Account that receives this account's voting weight in inflation rounds.
    /// Not validated: it may name this account or an account that does not exist.
    pub inflation_dest: Option<AccountId>,
}

impl Account {
    pub fn new(id: AccountId, balance: u64) -> Self {
        Self { id, balance, inflation_dest: None }
    }

    pub fn with_inflation_dest(mut self, dest: AccountId) -> Self {
        self.inflation_dest = Some(dest);
        self
    }
}

/// Header of a closed ledger. Replaced wholesale at every close.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct LedgerHeader {
    pub ledger_seq: u64,
    /// Agreed close time, Unix seconds. Never wall-clock time.
    pub close_time: u64,
    /// Number of inflation rounds applied so far.
    pub inflation_seq: u64,
    /// Total currency in existence: fee pool plus every balance.
    pub total_coins: u64,
    /// Fees collected since the last inflation round that paid out.
    pub fee_pool: u64,
    pub base_fee: u64,
    pub base_reserve: u64,
}

impl LedgerHeader {
    /// Header size in bytes when serialized for hashing (7 u64 fields).
    const HASH_SIZE: usize = 7 * 8;

    /// SHA-256 over a fixed little-endian field layout.
    pub fn hash(&self) -> Hash256 {
        let mut data = Vec::with_capacity(Self::HASH_SIZE);
        data.extend_from_slice(&self.ledger_seq.to_le_bytes());
        data.extend_from_slice(&self.close_time.to_le_bytes());
        data.extend_from_slice(&self.inflation_seq.to_le_bytes());
        data.extend_from_slice(&self.total_coins.to_le_bytes());
        data.extend_from_slice(&self.fee_pool.to_le_bytes());
        data.extend_from_slice(&self.base_fee.to_le_bytes());
        data.extend_from_slice(&self.base_reserve.to_le_bytes());
        Hash256(Sha256::digest(&data).into())
    }

    /// Minimum balance for an account owning `subentries` extra ledger entries.
    pub fn min_balance(&self, subentries: u64) -> u64 {
        (2 + subentries).saturating_mul(self.base_reserve)
    }
}

/// New values for the monetary header fields.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct HeaderUpdate {
    pub inflation_seq: u64,
    pub total_coins: u64,
    pub fee_pool: u64,
}

impl From<&LedgerHeader> for HeaderUpdate {
    fn from(h: &LedgerHeader) -> Self {
        Self {
            inflation_seq: h.inflation_seq,
            total_coins: h.total_coins,
            fee_pool: h.fee_pool,
        }
    }
}

/// An immutable set of ledger changes, committed atomically by a
/// [`LedgerStore`](crate::ledger::LedgerStore).
///
/// Account entries are full post-images keyed by id, so the encoding is
/// canonical: two nodes computing the same change produce identical bytes.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct LedgerDelta {
    /// Ledger sequence the delta was computed against.
    pub base_seq: u64,
    pub header: Option<HeaderUpdate>,
    pub accounts: BTreeMap<AccountId, Account>,
}

impl LedgerDelta {
    pub fn new(base_seq: u64) -> Self {
        Self { base_seq, header: None, accounts: BTreeMap::new() }
    }

    /// Insert or replace the post-image of an account.
    pub fn put_account(&mut self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    /// Post-image of `id` if this delta touches it.
    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.accounts.is_empty()
    }

    /// Canonical bincode encoding.
    pub fn encode(&self) -> Result<Vec<u8>, TitheError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TitheError::Serialization(e.to_string()))
    }

    /// BLAKE3 digest of the canonical encoding.
    pub fn digest(&self) -> Result<Hash256, TitheError> {
        Ok(Hash256(blake3::hash(&self.encode()?).into()))
    }
}
