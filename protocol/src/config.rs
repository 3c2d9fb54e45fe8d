//! # Protocol Configuration & Constants
//!
//! Every magic number the transaction kit depends on lives here. Most of them
//! are consensus values of the target chain, which means they are not ours to
//! tune: change one and the node will politely reject everything we build.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Address parameters for one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Short name used on the command line and in config files.
    pub name: &'static str,
    /// Bech32 human-readable part for witness addresses.
    pub bech32_hrp: &'static str,
}

/// Mainnet. Mistakes here cost real money.
pub const MAINNET: NetworkParams = NetworkParams {
    name: "mainnet",
    bech32_hrp: "bm",
};

/// Public testnet.
pub const TESTNET: NetworkParams = NetworkParams {
    name: "testnet",
    bech32_hrp: "tm",
};

/// Single-node developer network.
pub const SOLONET: NetworkParams = NetworkParams {
    name: "solonet",
    bech32_hrp: "sm",
};

/// All known networks, mainnet first.
pub const NETWORKS: [NetworkParams; 3] = [MAINNET, TESTNET, SOLONET];

/// Which network addresses are encoded for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Solonet,
}

impl Network {
    pub fn params(self) -> &'static NetworkParams {
        match self {
            Network::Mainnet => &NETWORKS[0],
            Network::Testnet => &NETWORKS[1],
            Network::Solonet => &NETWORKS[2],
        }
    }

    pub fn bech32_hrp(self) -> &'static str {
        self.params().bech32_hrp
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.params().name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" | "wisdom" => Ok(Network::Testnet),
            "solonet" | "solo" => Ok(Network::Solonet),
            other => Err(format!(
                "unknown network '{other}' (expected mainnet, testnet or solonet)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction Format
// ---------------------------------------------------------------------------

/// Transaction version emitted by the builder when no base is supplied.
pub const TX_VERSION: u64 = 1;

/// Serialization flags byte. `0x07` = witness, inputs and outputs all
/// present. It is the only flag set we ever write or accept.
pub const SERIALIZATION_FLAGS: u8 = 0x07;

/// Asset version of every input and output commitment.
pub const ASSET_VERSION: u64 = 1;

/// VM version of control programs.
pub const VM_VERSION: u64 = 1;

/// Largest amount a single commitment may carry (2^63 - 1).
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

/// Default transaction time-to-live when the caller passes zero.
pub const DEFAULT_TX_TTL: Duration = Duration::from_secs(5 * 60);

// ---------------------------------------------------------------------------
// Key Derivation
// ---------------------------------------------------------------------------

/// First byte of every account derivation path.
pub const ACCOUNT_KEY_SPACE: u8 = 0x01;

/// Signer type recorded for account-controlled spends.
pub const ACCOUNT_SIGNER_TYPE: &str = "account";

/// Key index of the single signer a raw key represents.
pub const SIGNER_KEY_INDEX: u64 = 1;

/// Control-program index used when deriving the receive address of a key.
pub const ADDRESS_INDEX: u64 = 1;

/// Signatures required on every input we build. Multi-party quorums are
/// not supported.
pub const SIGNING_QUORUM: usize = 1;

// ---------------------------------------------------------------------------
// Runtime Config
// ---------------------------------------------------------------------------

/// Settings a caller can actually change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Network whose address prefix is used.
    pub network: Network,
    /// TTL substituted for a zero TTL in build requests.
    #[serde(with = "humantime_serde_duration")]
    pub default_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            default_ttl: DEFAULT_TX_TTL,
        }
    }
}

impl Config {
    pub fn for_network(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }
}

mod humantime_serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
