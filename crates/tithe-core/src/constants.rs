//! Protocol constants. All monetary values in stroops (1 TITHE = 10^7 stroops).

use serde::{Deserialize, Serialize};

pub const COIN: u64 = 10_000_000;

/// Total currency created at genesis and held by the root account.
pub const GENESIS_TOTAL_COINS: u64 = 1_000_000_000_000_000_000;

/// Network type: Mainnet, Testnet, or Standalone.
///
/// Controls the network passphrase (and therefore every seed-derived account
/// id) and the per-round issuance rate.
///
/// # Examples
///
/// ```
/// use tithe_core::constants::NetworkType;
/// let net = NetworkType::default();
/// assert_eq!(net, NetworkType::Mainnet);
/// assert_eq!(net.to_string(), "mainnet");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network. No new currency is issued by inflation rounds.
    Testnet,
    /// Local single-node network for development and tests.
    Standalone,
}

impl NetworkType {
    /// Passphrase mixed into every seed-derived key on this network.
    ///
    /// # Examples
    ///
    /// ```
    /// use tithe_core::constants::NetworkType;
    /// assert_ne!(NetworkType::Mainnet.passphrase(), NetworkType::Testnet.passphrase());
    /// ```
    pub fn passphrase(&self) -> &'static str {
        match self {
            Self::Mainnet => "Tithe Public Network ; July 2014",
            Self::Testnet => "Tithe Test Network ; July 2014",
            Self::Standalone => "(V) (;,,;) (V)",
        }
    }

    /// Newly issued currency per inflation round, in trillionths of total coins.
    ///
    /// Mainnet compounds to roughly 1% a year over weekly rounds. Test
    /// networks issue nothing so only collected fees are redistributed.
    pub fn inflation_rate_trillionths(&self) -> u64 {
        match self {
            Self::Mainnet => INFLATION_RATE_TRILLIONTHS,
            Self::Testnet | Self::Standalone => 0,
        }
    }

    /// Lowercase name, matching the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Standalone => "standalone",
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-point denominator for rates and fractions expressed in trillionths.
pub const TRILLION: u64 = 1_000_000_000_000;

/// Earliest close time of inflation round 0: 2014-07-01T00:00:00Z.
pub const INFLATION_START_TIME: u64 = 1_404_172_800;

/// One inflation round per week.
pub const INFLATION_FREQUENCY_SECS: u64 = 7 * 24 * 60 * 60;

pub const INFLATION_RATE_TRILLIONTHS: u64 = 190_721_000;

/// Minimum share of the total vote a destination needs to win: 0.05%.
pub const INFLATION_WIN_MIN_TRILLIONTHS: u64 = 500_000_000;

pub const MAX_INFLATION_WINNERS: usize = 2000;

pub const BASE_FEE: u64 = 100;
pub const BASE_RESERVE: u64 = 100_000_000;
