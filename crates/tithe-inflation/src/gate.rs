//! Epoch gate: is an inflation round due at this close time?
//!
//! Round `n` may close no earlier than `epoch_start + n * epoch_length`.
//! The boundary is inclusive. Only ledger close time is consulted.

use tithe_core::error::InflationError;

use crate::params::InflationParams;

/// Earliest close time at which round `inflation_seq` may apply.
///
/// Returns `None` if the time is not representable, i.e. the round can
/// never become due.
pub fn next_eligible_time(params: &InflationParams, inflation_seq: u64) -> Option<u64> {
    inflation_seq
        .checked_mul(params.epoch_length)?
        .checked_add(params.epoch_start)
}

/// Pure eligibility predicate.
///
/// # Errors
///
/// [`InflationError::NotYetDue`] if `close_time` is before the next eligible
/// time (or that time overflows).
pub fn check_due(
    params: &InflationParams,
    inflation_seq: u64,
    close_time: u64,
) -> Result<(), InflationError> {
    match next_eligible_time(params, inflation_seq) {
        Some(next_eligible) if close_time >= next_eligible => Ok(()),
        next => Err(InflationError::NotYetDue {
            close_time,
            next_eligible: next.unwrap_or(u64::MAX),
        }),
    }
}
