//! # tithe-inflation: Vote-weighted inflation rounds.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! A round runs once per epoch and pays out the fee pool plus new issuance:
//! - **Epoch gate**: a round is due once ledger close time reaches
//!   `epoch_start + inflation_seq * epoch_length`.
//! - **Vote tally**: every account naming an inflation destination adds its
//!   balance to that destination.
//! - **Winner selection**: destinations ranked by weight (ties by lower id),
//!   capped at `max_winners`, filtered by the minimum vote fraction.
//! - **Payout**: `floor(pot * weight / Σ weight)` per winner; the floor
//!   remainder and shares of missing destinations go to the top credited
//!   winner, or stay in the fee pool when nobody can be credited.
//!
//! [`InflationEngine`] ties the steps together behind the
//! [`InflationProcessor`](tithe_core::traits::InflationProcessor) trait.

pub mod engine;
pub mod gate;
pub mod mutator;
pub mod params;
pub mod payout;
pub mod tally;
pub mod winners;

pub use engine::{InflationEngine, InflationOutcome};
pub use gate::{check_due, next_eligible_time};
pub use mutator::{Credit, RoundMutation};
pub use params::InflationParams;
pub use payout::{Payout, PayoutPlan};
pub use tally::VoteTally;
pub use winners::{Winner, select_winners};
