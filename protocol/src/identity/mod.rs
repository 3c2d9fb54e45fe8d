//! # Identity Module
//!
//! Turns a raw extended private key into something you can receive funds
//! at. The stack is layered:
//!
//! 1. **Keys** — [`XPrv`]/[`XPub`] from `crypto::chainkd`. Derive, sign.
//! 2. **Signer** — the single-key, quorum-1 account record a raw key
//!    stands for, and the account derivation paths built from it.
//! 3. **Address** — RIPEMD-160 of a derived public key, bech32-encoded
//!    for the selected network.
//!
//! ## Design Decisions
//!
//! - A raw key is treated as the only key of an account with key index 1.
//!   Every path under it is `[0x01 || key_index]`, `[control_program_index]`,
//!   which is what a full wallet holding the same key would derive too.
//! - Addresses are witness version 0 only. Nothing we build needs anything
//!   newer and the chain doesn't define anything newer.

pub mod address;
pub mod signer;

pub use address::{Address, AddressError, DerivedAddress};
pub use signer::{derivation_path, Signer, SignerError};

use tracing::debug;

use crate::config::{
    Network, ACCOUNT_KEY_SPACE, ACCOUNT_SIGNER_TYPE, ADDRESS_INDEX, SIGNER_KEY_INDEX,
    SIGNING_QUORUM,
};
use crate::crypto::{XPrv, XPub};
use crate::error::Error;

/// The account signer a single extended public key stands for.
pub fn account_signer(xpub: XPub) -> Result<Signer, SignerError> {
    Signer::create(ACCOUNT_SIGNER_TYPE, vec![xpub], SIGNING_QUORUM, SIGNER_KEY_INDEX)
}

/// Derivation path of account control program `index` for a raw key.
pub fn account_path(index: u64) -> Vec<Vec<u8>> {
    derivation_path(ACCOUNT_KEY_SPACE, SIGNER_KEY_INDEX, index)
}

/// Derive the extended public key and receive address of a raw 64-byte
/// extended private key.
///
/// # Errors
///
/// [`Error::InvalidKeyLength`] unless `raw_private_key` is exactly 64 bytes.
///
/// # Example
///
/// ```
/// use bm_txkit::config::Network;
/// use bm_txkit::identity::derive_address;
///
/// let key = hex::decode(
///     "98b94afc04a4dcff39e63bf48d01da8c6057f2564b35def6210add648316584510fd3d91011aeba9d41f1654c0c8232d1f94eb807a89a35e1501c4effb5c4d5a",
/// ).unwrap();
/// let derived = derive_address(&key, Network::Mainnet).unwrap();
/// assert_eq!(derived.address, "bm1qjvj4hy7tkycp99yuv6u9xjl5n0l0n3uwtzesf6");
/// ```
pub fn derive_address(raw_private_key: &[u8], network: Network) -> Result<DerivedAddress, Error> {
    let xprv = XPrv::from_bytes(raw_private_key)?;
    let xpub = xprv.xpub();
    let signer = account_signer(xpub)?;

    let path = signer.path(ACCOUNT_KEY_SPACE, ADDRESS_INDEX);
    let address = Address::from_public_key(network, &xpub.derive(&path).public_key());

    debug!(%network, address = %address, "derived receive address");
    Ok(DerivedAddress {
        xpub,
        address: address.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: &str = "98b94afc04a4dcff39e63bf48d01da8c6057f2564b35def6210add648316584510fd3d91011aeba9d41f1654c0c8232d1f94eb807a89a35e1501c4effb5c4d5a";
    const KEY_B: &str = "50024008ed99dfe4680e695fa0467c2960d1a8efbe206d986ba763611288674b9216b09d23f8c96d7ead0309fd53db524194d0a871a0ff718eac85308ffd7415";

    #[test]
    fn known_address_vectors() {
        let a = derive_address(&hex::decode(KEY_A).unwrap(), Network::Mainnet).unwrap();
        assert_eq!(a.address, "bm1qjvj4hy7tkycp99yuv6u9xjl5n0l0n3uwtzesf6");
        assert_eq!(
            a.xpub.to_string(),
            "f7bf3b320f828566dff61ec222d4cdbcea032892c8c542b3b6a1c3c725ec356210fd3d91011aeba9d41f1654c0c8232d1f94eb807a89a35e1501c4effb5c4d5a"
        );

        let b = derive_address(&hex::decode(KEY_B).unwrap(), Network::Mainnet).unwrap();
        assert_eq!(b.address, "bm1qecew0p8lrftfcc0l8sdppyk07fwk9gpcvnr6e8");
    }

    #[test]
    fn derivation_is_deterministic() {
        let key = hex::decode(KEY_B).unwrap();
        assert_eq!(
            derive_address(&key, Network::Mainnet).unwrap(),
            derive_address(&key, Network::Mainnet).unwrap()
        );
    }

    #[test]
    fn network_changes_only_the_prefix() {
        let key = hex::decode(KEY_A).unwrap();
        let main = derive_address(&key, Network::Mainnet).unwrap();
        let test = derive_address(&key, Network::Testnet).unwrap();
        assert_eq!(main.xpub, test.xpub);
        assert!(test.address.starts_with("tm1q"));

        let decoded_main = Address::decode(&main.address, Network::Mainnet).unwrap();
        let decoded_test = Address::decode(&test.address, Network::Testnet).unwrap();
        assert_eq!(decoded_main.program_hash(), decoded_test.program_hash());
    }

    #[test]
    fn wrong_length_key_is_rejected() {
        let err = derive_address(&[0u8; 32], Network::Mainnet).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidKeyLength {
                expected: 64,
                actual: 32
            }
        ));
    }

    #[test]
    fn account_path_matches_signer_path() {
        let xpub = XPrv::from_seed(b"seed").xpub();
        let signer = account_signer(xpub).unwrap();
        assert_eq!(signer.path(ACCOUNT_KEY_SPACE, 12), account_path(12));
    }
}
