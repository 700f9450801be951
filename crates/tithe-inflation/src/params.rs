//! Network-agreed inflation parameters.
//!
//! Every node on a network must use identical values; they are selected by
//! [`NetworkType`], not tuned per node.

use serde::{Deserialize, Serialize};
use tithe_core::constants::{
    INFLATION_FREQUENCY_SECS, INFLATION_START_TIME, INFLATION_WIN_MIN_TRILLIONTHS,
    MAX_INFLATION_WINNERS, NetworkType, TRILLION,
};
use tithe_core::error::InflationError;

/// Fields missing from a serialized form take their mainnet values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InflationParams {
    /// Earliest close time of round 0, Unix seconds.
    pub epoch_start: u64,
    /// Seconds between rounds.
    pub epoch_length: u64,
    /// Upper bound on the winner set.
    pub max_winners: usize,
    /// Minimum share of the total vote a destination needs, in trillionths.
    pub min_vote_fraction_trillionths: u64,
    /// Issuance per round, in trillionths of total coins. Zero disables issuance.
    pub rate_trillionths: u64,
}

impl InflationParams {
    pub fn for_network(network: NetworkType) -> Self {
        Self {
            epoch_start: INFLATION_START_TIME,
            epoch_length: INFLATION_FREQUENCY_SECS,
            max_winners: MAX_INFLATION_WINNERS,
            min_vote_fraction_trillionths: INFLATION_WIN_MIN_TRILLIONTHS,
            rate_trillionths: network.inflation_rate_trillionths(),
        }
    }

    /// Reject parameter sets no network could agree on.
    pub fn validate(&self) -> Result<(), InflationError> {
        if self.epoch_length == 0 {
            return Err(InflationError::InvalidParams("epoch_length must be positive".into()));
        }
        if self.max_winners == 0 {
            return Err(InflationError::InvalidParams("max_winners must be positive".into()));
        }
        if self.min_vote_fraction_trillionths > TRILLION {
            return Err(InflationError::InvalidParams(format!(
                "min_vote_fraction_trillionths {} exceeds {TRILLION}",
                self.min_vote_fraction_trillionths
            )));
        }
        if self.rate_trillionths > TRILLION {
            return Err(InflationError::InvalidParams(format!(
                "rate_trillionths {} exceeds {TRILLION}",
                self.rate_trillionths
            )));
        }
        Ok(())
    }
}

impl Default for InflationParams {
    fn default() -> Self {
        Self::for_network(NetworkType::default())
    }
}
