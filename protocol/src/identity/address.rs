//! # Witness Addresses
//!
//! Addresses are segwit version-0 bech32 strings wrapping either a 20-byte
//! public-key hash or a 32-byte script hash:
//!
//! ```text
//! derived_pubkey (32 bytes)
//!     -> RIPEMD-160 -> 20 bytes
//!     -> bech32(hrp, v0, hash) -> bm1q...
//! ```
//!
//! The HRP comes from the network (`bm`, `tm`, `sm`). Decoding checks the
//! HRP before anything else so a testnet address can never end up as the
//! destination of a mainnet transaction.

use bech32::{segwit, Fe32, Hrp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::Network;
use crate::crypto::ripemd160;
use crate::transaction::program::{p2wpkh_program, p2wsh_program};

/// Errors that can occur while decoding an address.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("bech32 decode error: {0}")]
    Bech32Decode(String),

    #[error("invalid HRP: expected '{expected}', got '{got}'")]
    InvalidHrp { expected: String, got: String },

    #[error("unsupported witness version {0}")]
    UnsupportedVersion(u8),

    #[error("invalid witness program length {0}")]
    InvalidProgramLength(usize),
}

/// A decoded witness address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
    /// Pay to witness public-key hash.
    PubKeyHash { network: Network, hash: [u8; 20] },
    /// Pay to witness script hash.
    ScriptHash { network: Network, hash: [u8; 32] },
}

impl Address {
    /// Address of a single 32-byte Ed25519 public key.
    pub fn from_public_key(network: Network, public_key: &[u8; 32]) -> Self {
        Address::PubKeyHash {
            network,
            hash: ripemd160(public_key),
        }
    }

    /// Parse `s`, requiring the HRP of `network`.
    pub fn decode(s: &str, network: Network) -> Result<Self, AddressError> {
        let (hrp, version, program) =
            segwit::decode(s).map_err(|e| AddressError::Bech32Decode(e.to_string()))?;

        let expected = network.bech32_hrp();
        if hrp.to_lowercase() != expected {
            return Err(AddressError::InvalidHrp {
                expected: expected.to_string(),
                got: hrp.to_lowercase(),
            });
        }
        if version != Fe32::Q {
            return Err(AddressError::UnsupportedVersion(version.to_u8()));
        }

        match program.len() {
            20 => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&program);
                Ok(Address::PubKeyHash { network, hash })
            }
            32 => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&program);
                Ok(Address::ScriptHash { network, hash })
            }
            n => Err(AddressError::InvalidProgramLength(n)),
        }
    }

    pub fn network(&self) -> Network {
        match self {
            Address::PubKeyHash { network, .. } | Address::ScriptHash { network, .. } => *network,
        }
    }

    /// The witness program bytes carried by the address.
    pub fn program_hash(&self) -> &[u8] {
        match self {
            Address::PubKeyHash { hash, .. } => hash,
            Address::ScriptHash { hash, .. } => hash,
        }
    }

    /// Control program that pays to this address.
    pub fn control_program(&self) -> Vec<u8> {
        match self {
            Address::PubKeyHash { hash, .. } => p2wpkh_program(hash),
            Address::ScriptHash { hash, .. } => p2wsh_program(hash),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hrp = Hrp::parse(self.network().bech32_hrp()).expect("static HRP is valid");
        let encoded = segwit::encode_v0(hrp, self.program_hash())
            .expect("20- and 32-byte v0 programs always encode");
        f.write_str(&encoded)
    }
}

/// Extended public key plus its receive address, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub xpub: crate::crypto::XPub,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pubkey_hash_roundtrip() {
        let addr = Address::PubKeyHash {
            network: Network::Mainnet,
            hash: [0x11; 20],
        };
        let s = addr.to_string();
        assert!(s.starts_with("bm1q"));
        assert_eq!(Address::decode(&s, Network::Mainnet).unwrap(), addr);
    }

    #[test]
    fn script_hash_roundtrip_on_testnet() {
        let addr = Address::ScriptHash {
            network: Network::Testnet,
            hash: [0x22; 32],
        };
        let s = addr.to_string();
        assert!(s.starts_with("tm1q"));
        assert_eq!(Address::decode(&s, Network::Testnet).unwrap(), addr);
    }

    #[test]
    fn decode_known_mainnet_address() {
        let addr = Address::decode("bm1qx7ylnhszg24995d5e0nftu9e87kt9vnxcn633r", Network::Mainnet)
            .unwrap();
        assert_eq!(
            hex::encode(addr.control_program()),
            "00143789f9de0242aa52d1b4cbe695f0b93facb2b266"
        );
    }

    #[test]
    fn rejects_wrong_network() {
        let s = Address::PubKeyHash {
            network: Network::Mainnet,
            hash: [0x33; 20],
        }
        .to_string();
        assert_eq!(
            Address::decode(&s, Network::Solonet).unwrap_err(),
            AddressError::InvalidHrp {
                expected: "sm".into(),
                got: "bm".into()
            }
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Address::decode("not-an-address", Network::Mainnet),
            Err(AddressError::Bech32Decode(_))
        ));
    }
}
