//! Ledger mutator: turn a payout plan into one atomic [`LedgerDelta`].
//!
//! Destinations are resolved here. A winner whose account does not exist is
//! never created; its share joins the undistributed remainder. The whole
//! remainder goes to the highest-ranked winner that was credited. If nobody
//! could be credited the entire pot stays in the fee pool.

use tithe_core::error::{InflationError, LedgerError};
use tithe_core::traits::AccountStore;
use tithe_core::types::{AccountId, HeaderUpdate, LedgerDelta, LedgerHeader};
use tracing::warn;

use crate::payout::{Payout, PayoutPlan};

/// Balance credited to one destination account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub destination: AccountId,
    pub amount: u64,
}

/// The delta for a round plus what it did, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundMutation {
    pub delta: LedgerDelta,
    /// Credits in rank order. The first carries the remainder.
    pub credits: Vec<Credit>,
    /// Planned payouts whose destination account does not exist.
    pub dropped: Vec<Payout>,
    /// Amount left in the fee pool after the round.
    pub retained: u64,
}

fn store_error(e: LedgerError) -> InflationError {
    InflationError::InvariantViolation(format!("account store: {e}"))
}

fn overflow(what: &str) -> InflationError {
    InflationError::InvariantViolation(format!("{what} overflow"))
}

/// Build the delta that applies `plan` on top of `header`.
pub fn build_delta(
    header: &LedgerHeader,
    accounts: &dyn AccountStore,
    plan: &PayoutPlan,
) -> Result<RoundMutation, InflationError> {
    let mut credits = Vec::with_capacity(plan.payouts.len());
    let mut dropped = Vec::new();
    let mut undistributed = plan.remainder;

    for payout in &plan.payouts {
        if accounts.contains_account(&payout.destination).map_err(store_error)? {
            credits.push(Credit { destination: payout.destination, amount: payout.amount });
        } else {
            warn!(
                destination = %payout.destination.short(),
                amount = payout.amount,
                "inflation: winner account missing, share retained"
            );
            undistributed = undistributed
                .checked_add(payout.amount)
                .ok_or_else(|| overflow("undistributed"))?;
            dropped.push(*payout);
        }
    }

    let retained = match credits.first_mut() {
        Some(top) => {
            top.amount = top.amount.checked_add(undistributed).ok_or_else(|| overflow("credit"))?;
            0
        }
        None => plan.pot,
    };

    let mut delta = LedgerDelta::new(header.ledger_seq);
    for credit in credits.iter().filter(|c| c.amount > 0) {
        let mut account = accounts
            .get_account(&credit.destination)
            .map_err(store_error)?
            .ok_or_else(|| {
                InflationError::InvariantViolation(format!(
                    "winner {} vanished during the round",
                    credit.destination
                ))
            })?;
        account.balance = account
            .balance
            .checked_add(credit.amount)
            .ok_or_else(|| overflow("balance"))?;
        delta.put_account(account);
    }
    delta.header = Some(HeaderUpdate {
        inflation_seq: header.inflation_seq.checked_add(1).ok_or_else(|| overflow("epoch"))?,
        total_coins: header
            .total_coins
            .checked_add(plan.issuance)
            .ok_or_else(|| overflow("total coins"))?,
        fee_pool: retained,
    });

    let mutation = RoundMutation { delta, credits, dropped, retained };
    verify(header, plan, &mutation)?;
    Ok(mutation)
}

/// Check the round against conservation and epoch monotonicity.
///
/// `Σ credits + retained == fee_pool + issuance`, the total rises by exactly
/// the issuance, and the epoch by exactly one.
pub fn verify(
    header: &LedgerHeader,
    plan: &PayoutPlan,
    mutation: &RoundMutation,
) -> Result<(), InflationError> {
    let Some(update) = mutation.delta.header else {
        return Err(InflationError::InvariantViolation("round without header update".into()));
    };

    let credited: u128 = mutation.credits.iter().map(|c| u128::from(c.amount)).sum();
    let inflow = u128::from(header.fee_pool) + u128::from(plan.issuance);
    if credited + u128::from(mutation.retained) != inflow {
        return Err(InflationError::InvariantViolation(format!(
            "credited {credited} + retained {} != fee pool {} + issuance {}",
            mutation.retained, header.fee_pool, plan.issuance
        )));
    }
    if u128::from(update.total_coins) != u128::from(header.total_coins) + u128::from(plan.issuance) {
        return Err(InflationError::InvariantViolation(format!(
            "total coins {} -> {} does not match issuance {}",
            header.total_coins, update.total_coins, plan.issuance
        )));
    }
    if update.inflation_seq != header.inflation_seq + 1 {
        return Err(InflationError::InvariantViolation(format!(
            "epoch {} -> {} is not a single step",
            header.inflation_seq, update.inflation_seq
        )));
    }
    if update.fee_pool != 0 && !mutation.credits.is_empty() {
        return Err(InflationError::InvariantViolation(
            "fee pool not cleared after a distribution".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tithe_core::ledger::{LedgerStore, MemoryLedger};
    use tithe_core::types::Account;

    use crate::payout::split_pot;
    use crate::winners::Winner;

    fn id(seed: u8) -> AccountId {
        AccountId([seed; 32])
    }

    fn header(total_coins: u64, fee_pool: u64) -> LedgerHeader {
        LedgerHeader {
            ledger_seq: 4,
            close_time: 0,
            inflation_seq: 2,
            total_coins,
            fee_pool,
            base_fee: 100,
            base_reserve: 1,
        }
    }

    fn plan(pot: u64, weights: &[(u8, u128)]) -> PayoutPlan {
        let winners: Vec<Winner> = weights
            .iter()
            .map(|(s, w)| Winner { destination: id(*s), weight: *w })
            .collect();
        split_pot(pot, &winners).unwrap()
    }

    fn balances(m: &RoundMutation) -> BTreeMap<AccountId, u64> {
        m.delta.accounts.iter().map(|(k, a)| (*k, a.balance)).collect()
    }

    #[test]
    fn credits_existing_winners() {
        let h = header(1_100, 100);
        let store = MemoryLedger::new(h.clone(), [Account::new(id(1), 500), Account::new(id(2), 500)]);
        let m = build_delta(&h, &store, &plan(100, &[(1, 3), (2, 1)])).unwrap();
        assert_eq!(balances(&m), BTreeMap::from([(id(1), 575), (id(2), 525)]));
        assert_eq!(m.retained, 0);
        assert!(m.dropped.is_empty());
        assert_eq!(
            m.delta.header,
            Some(HeaderUpdate { inflation_seq: 3, total_coins: 1_100, fee_pool: 0 })
        );
    }

    #[test]
    fn remainder_goes_to_top_winner() {
        let h = header(1_100, 100);
        let store = MemoryLedger::new(
            h.clone(),
            [Account::new(id(1), 300), Account::new(id(2), 300), Account::new(id(3), 400)],
        );
        let m = build_delta(&h, &store, &plan(100, &[(1, 1), (2, 1), (3, 1)])).unwrap();
        assert_eq!(m.credits[0], Credit { destination: id(1), amount: 34 });
        assert_eq!(balances(&m), BTreeMap::from([(id(1), 334), (id(2), 333), (id(3), 433)]));
    }

    #[test]
    fn missing_destination_share_goes_to_top_credited() {
        let h = header(1_100, 100);
        // id(1) ranks first but does not exist.
        let store = MemoryLedger::new(h.clone(), [Account::new(id(2), 1_000)]);
        let m = build_delta(&h, &store, &plan(100, &[(1, 3), (2, 1)])).unwrap();
        assert_eq!(m.dropped.len(), 1);
        assert_eq!(m.dropped[0].destination, id(1));
        assert_eq!(m.credits, vec![Credit { destination: id(2), amount: 100 }]);
        assert!(m.delta.account(&id(1)).is_none());
        assert_eq!(m.retained, 0);
    }

    #[test]
    fn all_missing_retains_pot() {
        let h = header(1_000, 100);
        let store = MemoryLedger::new(h.clone(), [Account::new(id(5), 900)]);
        let m = build_delta(&h, &store, &plan(100, &[(1, 3), (2, 1)])).unwrap();
        assert!(m.credits.is_empty());
        assert!(m.delta.accounts.is_empty());
        assert_eq!(m.retained, 100);
        assert_eq!(
            m.delta.header,
            Some(HeaderUpdate { inflation_seq: 3, total_coins: 1_000, fee_pool: 100 })
        );
    }

    #[test]
    fn issuance_without_winners_stays_in_pool() {
        let h = header(1_000, 100);
        let store = MemoryLedger::new(h.clone(), [Account::new(id(5), 900)]);
        let mut p = plan(150, &[]);
        p.issuance = 50;
        let m = build_delta(&h, &store, &p).unwrap();
        assert_eq!(
            m.delta.header,
            Some(HeaderUpdate { inflation_seq: 3, total_coins: 1_050, fee_pool: 150 })
        );
    }

    #[test]
    fn delta_commits_and_conserves() {
        let h = header(1_000, 100);
        let mut store = MemoryLedger::new(
            h.clone(),
            [Account::new(id(1), 450), Account::new(id(2), 450)],
        );
        let m = build_delta(&h, &store, &plan(100, &[(1, 2), (2, 1)])).unwrap();
        store.apply_delta(&m.delta).unwrap();
        store.check_conservation().unwrap();
        assert_eq!(store.header().fee_pool, 0);
        assert_eq!(store.header().inflation_seq, 3);
    }

    #[test]
    fn balance_overflow_is_invariant_violation() {
        let h = header(u64::MAX, 100);
        let store = MemoryLedger::new(h.clone(), [Account::new(id(1), u64::MAX - 50)]);
        let err = build_delta(&h, &store, &plan(100, &[(1, 1)])).unwrap_err();
        assert!(matches!(err, InflationError::InvariantViolation(_)));
    }

    #[test]
    fn verify_rejects_tampered_round() {
        let h = header(1_000, 100);
        let store = MemoryLedger::new(h.clone(), [Account::new(id(1), 900)]);
        let p = plan(100, &[(1, 1)]);
        let mut m = build_delta(&h, &store, &p).unwrap();

        m.credits[0].amount += 1;
        assert!(verify(&h, &p, &m).is_err());
        m.credits[0].amount -= 1;

        if let Some(update) = m.delta.header.as_mut() {
            update.inflation_seq += 1;
        }
        assert!(verify(&h, &p, &m).is_err());
    }
}
