//! Winner selection: rank the tally, cap it, and apply the vote threshold.
//!
//! Ranking is a total order: weight descending, then destination id
//! ascending. A destination wins only if it is within the first
//! `max_winners` and holds at least `min_vote_fraction` of the total vote.

use std::cmp::Ordering;

use tithe_core::constants::TRILLION;
use tithe_core::types::AccountId;

use crate::params::InflationParams;
use crate::tally::VoteTally;

/// A ranked destination and its accumulated weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Winner {
    pub destination: AccountId,
    pub weight: u128,
}

/// Total ranking order: heavier first, ties broken by lower id.
fn rank_order(a: &Winner, b: &Winner) -> Ordering {
    b.weight
        .cmp(&a.weight)
        .then_with(|| a.destination.cmp(&b.destination))
}

/// Whether `weight` reaches `fraction_trillionths` of `total`.
///
/// Evaluated as `weight * 10^12 >= total * fraction` without division.
pub fn meets_threshold(weight: u128, total: u128, fraction_trillionths: u64) -> bool {
    let lhs = weight.checked_mul(u128::from(TRILLION));
    let rhs = total.checked_mul(u128::from(fraction_trillionths));
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => lhs >= rhs,
        // Only reachable with totals beyond any u64 supply.
        _ => weight >= total / u128::from(TRILLION) * u128::from(fraction_trillionths),
    }
}

/// The top `limit` destinations of a tally in rank order.
pub fn rank(tally: &VoteTally, limit: usize) -> Vec<Winner> {
    let mut ranked: Vec<Winner> = tally
        .iter()
        .map(|(destination, weight)| Winner { destination: *destination, weight: *weight })
        .collect();
    if limit == 0 {
        return Vec::new();
    }
    if ranked.len() > limit {
        // Partition around the cut first so only the kept prefix is sorted.
        ranked.select_nth_unstable_by(limit - 1, rank_order);
        ranked.truncate(limit);
    }
    ranked.sort_unstable_by(rank_order);
    ranked
}

/// The bounded winner set for a round.
///
/// Empty when nobody voted or no destination meets the threshold. Entries
/// with zero weight never win.
pub fn select_winners(tally: &VoteTally, params: &InflationParams) -> Vec<Winner> {
    let total = tally.total_weight();
    if total == 0 {
        return Vec::new();
    }
    rank(tally, params.max_winners)
        .into_iter()
        .filter(|w| w.weight > 0)
        .filter(|w| meets_threshold(w.weight, total, params.min_vote_fraction_trillionths))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn id(seed: u8) -> AccountId {
        AccountId([seed; 32])
    }

    fn tally(votes: &[(u8, u64)]) -> VoteTally {
        let mut t = VoteTally::new();
        for (dest, weight) in votes {
            t.add_vote(id(*dest), *weight);
        }
        t
    }

    fn params(max_winners: usize, fraction: u64) -> InflationParams {
        InflationParams {
            max_winners,
            min_vote_fraction_trillionths: fraction,
            ..InflationParams::default()
        }
    }

    fn destinations(winners: &[Winner]) -> Vec<AccountId> {
        winners.iter().map(|w| w.destination).collect()
    }

    // --- meets_threshold ---

    #[test]
    fn threshold_inclusive() {
        // 5 of 10_000 is exactly 0.05%.
        assert!(meets_threshold(5, 10_000, 500_000_000));
        assert!(!meets_threshold(4, 10_000, 500_000_000));
    }

    #[test]
    fn zero_fraction_admits_everything() {
        assert!(meets_threshold(0, 1_000, 0));
    }

    #[test]
    fn full_fraction_requires_all() {
        assert!(meets_threshold(1_000, 1_000, TRILLION));
        assert!(!meets_threshold(999, 1_000, TRILLION));
    }

    // --- rank ---

    #[test]
    fn rank_by_weight_descending() {
        let ranked = rank(&tally(&[(1, 10), (2, 30), (3, 20)]), 10);
        assert_eq!(destinations(&ranked), vec![id(2), id(3), id(1)]);
    }

    #[test]
    fn ties_broken_by_lower_id() {
        let ranked = rank(&tally(&[(7, 50), (3, 50), (5, 50)]), 10);
        assert_eq!(destinations(&ranked), vec![id(3), id(5), id(7)]);
    }

    #[test]
    fn rank_truncates_to_limit() {
        let ranked = rank(&tally(&[(1, 1), (2, 2), (3, 3), (4, 4)]), 2);
        assert_eq!(destinations(&ranked), vec![id(4), id(3)]);
    }

    #[test]
    fn rank_zero_limit_is_empty() {
        assert!(rank(&tally(&[(1, 1)]), 0).is_empty());
    }

    #[test]
    fn rank_tie_at_the_cut_keeps_lower_id() {
        let ranked = rank(&tally(&[(9, 5), (4, 5), (1, 10)]), 2);
        assert_eq!(destinations(&ranked), vec![id(1), id(4)]);
    }

    // --- select_winners ---

    #[test]
    fn no_votes_no_winners() {
        assert!(select_winners(&VoteTally::new(), &params(2000, 0)).is_empty());
    }

    #[test]
    fn all_zero_weight_no_winners() {
        assert!(select_winners(&tally(&[(1, 0), (2, 0)]), &params(2000, 0)).is_empty());
    }

    #[test]
    fn below_threshold_excluded_within_cap() {
        // id(2) holds 4 / 10_000 = 0.04% < 0.05%.
        let t = tally(&[(1, 9_996), (2, 4)]);
        let winners = select_winners(&t, &params(2000, 500_000_000));
        assert_eq!(destinations(&winners), vec![id(1)]);
    }

    #[test]
    fn cap_applies_before_threshold() {
        let t = tally(&[(1, 40), (2, 30), (3, 20), (4, 10)]);
        let winners = select_winners(&t, &params(3, 150_000_000_000));
        // Top 3 are 1,2,3; id(3) has 20% >= 15%, id(4) was cut by the cap anyway.
        assert_eq!(destinations(&winners), vec![id(1), id(2), id(3)]);
        let winners = select_winners(&t, &params(3, 250_000_000_000));
        assert_eq!(destinations(&winners), vec![id(1), id(2)]);
    }

    #[test]
    fn winners_carry_weights() {
        let winners = select_winners(&tally(&[(1, 70), (2, 30)]), &params(2000, 0));
        assert_eq!(
            winners,
            vec![
                Winner { destination: id(1), weight: 70 },
                Winner { destination: id(2), weight: 30 },
            ]
        );
    }

    #[test]
    fn mainnet_cap_is_two_thousand() {
        let mut t = VoteTally::new();
        for i in 0..2_500u32 {
            let mut bytes = [0u8; 32];
            bytes[..4].copy_from_slice(&i.to_be_bytes());
            t.add_vote(AccountId(bytes), 1_000 + u64::from(i));
        }
        let winners = select_winners(&t, &params(2000, 0));
        assert_eq!(winners.len(), 2000);
        assert_eq!(winners[0].weight, 1_000 + 2_499);
        assert_eq!(winners[1999].weight, 1_000 + 500);
    }

    proptest! {
        #[test]
        fn rank_matches_full_sort(
            votes in proptest::collection::vec((0u8..64, 0u64..100), 0..200),
            limit in 1usize..80,
        ) {
            let t = tally(&votes);
            let mut full: Vec<Winner> = t
                .iter()
                .map(|(d, w)| Winner { destination: *d, weight: *w })
                .collect();
            full.sort_by(rank_order);
            full.truncate(limit);
            prop_assert_eq!(rank(&t, limit), full);
        }

        #[test]
        fn winners_meet_threshold(
            votes in proptest::collection::vec((0u8..64, 0u64..1_000_000), 1..200),
            fraction in 0u64..=TRILLION / 10,
        ) {
            let t = tally(&votes);
            let p = params(2000, fraction);
            for w in select_winners(&t, &p) {
                prop_assert!(w.weight > 0);
                prop_assert!(meets_threshold(w.weight, t.total_weight(), fraction));
            }
        }
    }
}
