//! Adversarial property-based tests for the inflation pipeline.
//!
//! Randomized transaction sets and account populations try to break:
//! - Conservation (`total_coins == fee_pool + Σ balance`) across ledger closes
//! - Epoch monotonicity (one step per applied round, never backwards)
//! - Determinism (same history, same header hashes and delta digests)
//! - Atomicity (a failed close leaves no trace)
//! - The winner cap and vote threshold under vote stuffing

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;
use tithe_core::constants::{INFLATION_START_TIME, MAX_INFLATION_WINNERS, NetworkType, TRILLION};
use tithe_core::error::{InflationError, TitheError};
use tithe_core::genesis::{GENESIS_CLOSE_TIME, genesis_header, genesis_ledger};
use tithe_core::ledger::{LedgerStore, MemoryLedger};
use tithe_core::traits::{AccountStore, InflationProcessor};
use tithe_core::types::{Account, AccountId, Hash256, LedgerDelta, LedgerHeader};
use tithe_inflation::{InflationEngine, InflationParams, winners::meets_threshold};
use tithe_ledger::{LedgerManager, Transaction};
use tithe_tests::helpers::*;

const WEEK: u64 = 604_800;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Participants: root plus a handful of named accounts.
fn participant(i: u8) -> AccountId {
    if i == 0 { root() } else { named(&format!("p{i}")) }
}

fn arb_tx() -> impl Strategy<Value = Transaction> {
    let who = 0u8..6;
    prop_oneof![
        (who.clone(), who.clone(), 0u64..4).prop_map(|(s, d, k)| {
            Transaction::create_account(participant(s), participant(d), MIN_BALANCE * (k + 1))
        }),
        (who.clone(), who.clone(), 0u64..1_000_000_000).prop_map(|(s, d, a)| {
            Transaction::payment(participant(s), participant(d), a)
        }),
        (who.clone(), proptest::option::of(0u8..8)).prop_map(|(s, d)| {
            Transaction::set_inflation_destination(participant(s), d.map(participant))
        }),
        who.clone().prop_map(|s| Transaction::inflation(participant(s))),
        (who, 0u64..10_000).prop_map(|(s, f)| {
            Transaction::inflation(participant(s)).with_fee(f)
        }),
    ]
}

/// A history: per ledger, a close-time step and a transaction set.
fn arb_history() -> impl Strategy<Value = Vec<(u64, Vec<Transaction>)>> {
    proptest::collection::vec(
        (0u64..2 * WEEK, proptest::collection::vec(arb_tx(), 0..12)),
        1..8,
    )
}

fn replay(manager: &LedgerManager, history: &[(u64, Vec<Transaction>)]) -> Vec<LedgerCloseSummary> {
    let mut close_time = GENESIS_CLOSE_TIME;
    history
        .iter()
        .map(|(step, txs)| {
            close_time += step;
            let r = manager.close_ledger(close_time, txs).unwrap();
            LedgerCloseSummary {
                header_hash: r.header_hash,
                inflation_digests: r.inflation.iter().map(|d| d.digest().unwrap()).collect(),
            }
        })
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
struct LedgerCloseSummary {
    header_hash: Hash256,
    inflation_digests: Vec<Hash256>,
}

/// Processor that always reports a broken invariant.
struct Corrupt;

impl InflationProcessor for Corrupt {
    fn apply_inflation(
        &self,
        _header: &LedgerHeader,
        _accounts: &dyn AccountStore,
        _close_time: u64,
    ) -> Result<LedgerDelta, InflationError> {
        Err(InflationError::InvariantViolation("corrupt".into()))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // -----------------------------------------------------------------------
    // Conservation and monotonicity across random histories
    // -----------------------------------------------------------------------

    #[test]
    fn random_histories_conserve_supply(history in arb_history()) {
        let m = issuing_manager();
        let mut close_time = GENESIS_CLOSE_TIME;
        let mut epoch = 0;
        let mut total = m.header().total_coins;
        for (step, txs) in &history {
            close_time += step;
            let r = m.close_ledger(close_time, txs).unwrap();

            let header = m.header();
            prop_assert_eq!(accounted_coins(&m), u128::from(header.total_coins));
            prop_assert_eq!(header.inflation_seq, epoch + r.inflation.len() as u64);
            prop_assert!(header.total_coins >= total);
            for delta in &r.inflation {
                prop_assert!(delta.header.is_some());
            }
            epoch = header.inflation_seq;
            total = header.total_coins;
        }
    }

    #[test]
    fn rounds_never_outrun_the_calendar(history in arb_history()) {
        let m = standalone_manager();
        let mut close_time = GENESIS_CLOSE_TIME;
        for (step, txs) in &history {
            close_time += step;
            m.close_ledger(close_time, txs).unwrap();
            let seq = m.header().inflation_seq;
            // Round seq-1 was applied, so its start time had been reached.
            if seq > 0 {
                prop_assert!(INFLATION_START_TIME + (seq - 1) * WEEK <= close_time);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn replicas_agree(history in arb_history()) {
        let a = replay(&issuing_manager(), &history);
        let b = replay(&issuing_manager(), &history);
        prop_assert_eq!(a, b);
    }

    // -----------------------------------------------------------------------
    // Atomicity
    // -----------------------------------------------------------------------

    #[test]
    fn fatal_round_leaves_no_trace(
        txs in proptest::collection::vec(arb_tx(), 0..12),
    ) {
        let m = LedgerManager::new(genesis_ledger(NetworkType::Standalone), Arc::new(Corrupt));
        let before = m.header();
        let count = m.account_count();

        let mut txs = txs;
        txs.push(Transaction::inflation(root()));
        let err = m.close_ledger(INFLATION_START_TIME, &txs).unwrap_err();
        prop_assert!(matches!(err, TitheError::Inflation(InflationError::InvariantViolation(_))));
        prop_assert_eq!(m.header(), before);
        prop_assert_eq!(m.account_count(), count);
        prop_assert!(m.check_conservation().is_ok());
    }

    // -----------------------------------------------------------------------
    // Vote stuffing
    // -----------------------------------------------------------------------

    #[test]
    fn winner_cap_and_threshold_hold(
        voters in proptest::collection::vec((any::<[u8; 8]>(), 1u64..1_000_000_000, 0u16..3_000), 1..400),
        fee_pool in 0u64..1_000_000_000_000,
    ) {
        // Keyed by id so duplicate seeds collapse before the total is taken.
        let accounts: BTreeMap<AccountId, Account> = voters
            .iter()
            .map(|(seed, balance, dest)| {
                let mut dest_id = [0xD0u8; 32];
                dest_id[..2].copy_from_slice(&dest.to_be_bytes());
                let account = Account::new(AccountId::from_seed(seed), *balance)
                    .with_inflation_dest(AccountId(dest_id));
                (account.id, account)
            })
            .collect();
        let mut header = genesis_header();
        header.fee_pool = fee_pool;
        header.total_coins = fee_pool + accounts.values().map(|a| a.balance).sum::<u64>();
        let ledger = MemoryLedger::new(header, accounts.into_values());

        let engine = InflationEngine::new(InflationParams {
            max_winners: 50,
            ..InflationParams::for_network(NetworkType::Standalone)
        }).unwrap();
        let outcome = engine.run_round(ledger.header(), &ledger, INFLATION_START_TIME).unwrap();

        prop_assert!(outcome.winners.len() <= 50);
        for w in &outcome.winners {
            prop_assert!(meets_threshold(
                w.weight,
                outcome.total_votes,
                engine.params().min_vote_fraction_trillionths,
            ));
        }
        // Destinations do not exist, so the whole pot stays put.
        prop_assert_eq!(outcome.retained, fee_pool);
        prop_assert!(outcome.delta.accounts.is_empty());
    }
}

#[test]
fn mainnet_cap_bounds_winner_set() {
    // 2500 funded destinations, each with one voter above the threshold.
    let mut accounts = Vec::new();
    for i in 0..2_500u32 {
        let mut dest = [0u8; 32];
        dest[..4].copy_from_slice(&i.to_be_bytes());
        accounts.push(Account::new(AccountId(dest), 1));
        let mut voter = [0xFFu8; 32];
        voter[..4].copy_from_slice(&i.to_be_bytes());
        accounts.push(
            Account::new(AccountId(voter), 1_000_000 + u64::from(i))
                .with_inflation_dest(AccountId(dest)),
        );
    }
    let mut header = genesis_header();
    header.fee_pool = 1_000_000_000;
    header.total_coins = header.fee_pool + accounts.iter().map(|a| a.balance).sum::<u64>();
    let mut ledger = MemoryLedger::new(header, accounts);

    let engine = InflationEngine::new(InflationParams {
        min_vote_fraction_trillionths: TRILLION / 10_000,
        ..InflationParams::for_network(NetworkType::Standalone)
    })
    .unwrap();
    let outcome = engine.run_round(ledger.header(), &ledger, INFLATION_START_TIME).unwrap();
    assert_eq!(outcome.winners.len(), MAX_INFLATION_WINNERS);
    assert_eq!(outcome.credits.len(), MAX_INFLATION_WINNERS);
    // The heaviest 2000 voters are the last 2000 indices.
    assert_eq!(outcome.winners[0].weight, 1_000_000 + 2_499);
    assert_eq!(outcome.winners[MAX_INFLATION_WINNERS - 1].weight, 1_000_000 + 500);

    ledger.apply_delta(&outcome.delta).unwrap();
    ledger.check_conservation().unwrap();
    assert_eq!(ledger.header().fee_pool, 0);
}
