//! Inflation engine implementing the [`InflationProcessor`] trait.
//!
//! One round runs the pipeline gate → tally → winners → payout → mutator
//! against a snapshot of the ledger and returns the resulting delta without
//! touching the snapshot. Committing the delta is the caller's job.

use tithe_core::constants::NetworkType;
use tithe_core::error::InflationError;
use tithe_core::traits::{AccountStore, InflationProcessor};
use tithe_core::types::{LedgerDelta, LedgerHeader};
use tracing::{debug, error, info};

use crate::gate::{check_due, next_eligible_time};
use crate::mutator::{Credit, build_delta};
use crate::params::InflationParams;
use crate::payout::{Payout, PayoutPlan, plan_payouts};
use crate::tally::VoteTally;
use crate::winners::{Winner, select_winners};

/// Everything a round computed, alongside the delta itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InflationOutcome {
    pub delta: LedgerDelta,
    /// Epoch the round was applied for (before the increment).
    pub inflation_seq: u64,
    pub voters: usize,
    pub total_votes: u128,
    pub winners: Vec<Winner>,
    pub plan: PayoutPlan,
    pub credits: Vec<Credit>,
    pub dropped: Vec<Payout>,
    /// Left in the fee pool after the round.
    pub retained: u64,
}

/// The production inflation processor.
#[derive(Debug, Clone, Default)]
pub struct InflationEngine {
    params: InflationParams,
}

impl InflationEngine {
    /// Create an engine with validated parameters.
    pub fn new(params: InflationParams) -> Result<Self, InflationError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Engine with the parameters every node on `network` uses.
    pub fn for_network(network: NetworkType) -> Self {
        Self { params: InflationParams::for_network(network) }
    }

    pub fn params(&self) -> &InflationParams {
        &self.params
    }

    /// Earliest close time at which the next round may apply.
    pub fn next_eligible(&self, header: &LedgerHeader) -> Option<u64> {
        next_eligible_time(&self.params, header.inflation_seq)
    }

    /// Whether a round is due at `close_time`.
    pub fn is_due(&self, header: &LedgerHeader, close_time: u64) -> bool {
        check_due(&self.params, header.inflation_seq, close_time).is_ok()
    }

    /// Run one round and report what it did.
    ///
    /// # Errors
    ///
    /// See [`InflationProcessor::apply_inflation`].
    pub fn run_round(
        &self,
        header: &LedgerHeader,
        accounts: &dyn AccountStore,
        close_time: u64,
    ) -> Result<InflationOutcome, InflationError> {
        if let Err(e) = check_due(&self.params, header.inflation_seq, close_time) {
            debug!(
                inflation_seq = header.inflation_seq,
                close_time, "inflation: round not due"
            );
            return Err(e);
        }

        let result = self.compute(header, accounts);
        match &result {
            Ok(outcome) => info!(
                ledger = header.ledger_seq,
                inflation_seq = outcome.inflation_seq,
                voters = outcome.voters,
                winners = outcome.winners.len(),
                credited = outcome.credits.len(),
                dropped = outcome.dropped.len(),
                issuance = outcome.plan.issuance,
                pot = outcome.plan.pot,
                retained = outcome.retained,
                "inflation: round applied"
            ),
            Err(e) => error!(
                ledger = header.ledger_seq,
                inflation_seq = header.inflation_seq,
                error = %e,
                "inflation: round aborted"
            ),
        }
        result
    }

    fn compute(
        &self,
        header: &LedgerHeader,
        accounts: &dyn AccountStore,
    ) -> Result<InflationOutcome, InflationError> {
        let population = accounts.iter_accounts().map_err(|e| {
            InflationError::InvariantViolation(format!("account enumeration failed: {e}"))
        })?;
        let tally = VoteTally::from_accounts(&population);
        let winners = select_winners(&tally, &self.params);
        debug!(
            voters = tally.voter_count(),
            destinations = tally.destination_count(),
            winners = winners.len(),
            "inflation: tally complete"
        );

        let plan = plan_payouts(
            header.fee_pool,
            header.total_coins,
            self.params.rate_trillionths,
            &winners,
        )?;
        let mutation = build_delta(header, accounts, &plan)?;

        Ok(InflationOutcome {
            delta: mutation.delta,
            inflation_seq: header.inflation_seq,
            voters: tally.voter_count(),
            total_votes: tally.total_weight(),
            winners,
            plan,
            credits: mutation.credits,
            dropped: mutation.dropped,
            retained: mutation.retained,
        })
    }
}

impl InflationProcessor for InflationEngine {
    fn apply_inflation(
        &self,
        header: &LedgerHeader,
        accounts: &dyn AccountStore,
        close_time: u64,
    ) -> Result<LedgerDelta, InflationError> {
        self.run_round(header, accounts, close_time).map(|outcome| outcome.delta)
    }
}
