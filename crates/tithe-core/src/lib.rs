//! # tithe-core
//! Foundation types, traits, and the in-memory ledger for the Tithe protocol.

pub mod constants;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod traits;
pub mod types;
