//! Payout calculation: issuance, pot, and the proportional split.
//!
//! All arithmetic is integer with u128 intermediates. Issuance and every
//! share are floored; what flooring leaves over is reported as the
//! remainder and assigned by the mutator, never lost.

use tithe_core::constants::TRILLION;
use tithe_core::error::InflationError;
use tithe_core::types::AccountId;

use crate::winners::Winner;

/// A winner's share of the pot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub destination: AccountId,
    pub weight: u128,
    pub amount: u64,
}

/// The computed distribution for one round, before destinations are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutPlan {
    /// Newly issued currency.
    pub issuance: u64,
    /// Fee pool plus issuance.
    pub pot: u64,
    /// One entry per winner, in rank order.
    pub payouts: Vec<Payout>,
    /// `pot - Σ payouts`.
    pub remainder: u64,
}

impl PayoutPlan {
    pub fn distributed(&self) -> u64 {
        self.pot - self.remainder
    }
}

/// Currency issued by one round: `floor(total_coins * rate / 10^12)`.
///
/// # Errors
///
/// [`InflationError::InvariantViolation`] if the result does not fit in u64.
pub fn issuance(total_coins: u64, rate_trillionths: u64) -> Result<u64, InflationError> {
    let minted = u128::from(total_coins) * u128::from(rate_trillionths) / u128::from(TRILLION);
    u64::try_from(minted)
        .map_err(|_| InflationError::InvariantViolation(format!("issuance {minted} exceeds u64")))
}

/// Split `pot` across `winners` in proportion to weight.
///
/// Each share is `floor(pot * weight / Σ weight)`. With no winners (or no
/// weight) nothing is paid and the whole pot is the remainder.
///
/// # Errors
///
/// [`InflationError::InvariantViolation`] on arithmetic overflow or if the
/// shares exceed the pot.
pub fn split_pot(pot: u64, winners: &[Winner]) -> Result<PayoutPlan, InflationError> {
    let total_weight = winners
        .iter()
        .try_fold(0u128, |acc, w| acc.checked_add(w.weight))
        .ok_or_else(|| InflationError::InvariantViolation("winner weight overflow".into()))?;

    if total_weight == 0 {
        return Ok(PayoutPlan { issuance: 0, pot, payouts: Vec::new(), remainder: pot });
    }

    let mut payouts = Vec::with_capacity(winners.len());
    let mut distributed: u64 = 0;
    for w in winners {
        let amount = u128::from(pot)
            .checked_mul(w.weight)
            .ok_or_else(|| {
                InflationError::InvariantViolation(format!("share overflow for {}", w.destination))
            })?
            / total_weight;
        // amount <= pot because weight <= total_weight.
        let amount = u64::try_from(amount)
            .map_err(|_| InflationError::InvariantViolation("share exceeds u64".into()))?;
        distributed = distributed
            .checked_add(amount)
            .ok_or_else(|| InflationError::InvariantViolation("payout sum overflow".into()))?;
        payouts.push(Payout { destination: w.destination, weight: w.weight, amount });
    }

    let remainder = pot.checked_sub(distributed).ok_or_else(|| {
        InflationError::InvariantViolation(format!("payouts {distributed} exceed pot {pot}"))
    })?;

    Ok(PayoutPlan { issuance: 0, pot, payouts, remainder })
}

/// Full payout computation for a round.
pub fn plan_payouts(
    fee_pool: u64,
    total_coins: u64,
    rate_trillionths: u64,
    winners: &[Winner],
) -> Result<PayoutPlan, InflationError> {
    let issued = issuance(total_coins, rate_trillionths)?;
    let pot = fee_pool
        .checked_add(issued)
        .ok_or_else(|| InflationError::InvariantViolation("pot overflow".into()))?;
    let mut plan = split_pot(pot, winners)?;
    plan.issuance = issued;
    Ok(plan)
}
