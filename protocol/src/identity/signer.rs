//! # Signers
//!
//! A signer record ties a set of extended public keys to a quorum and a key
//! index. Raw-key wallets only ever create the degenerate single-key,
//! quorum-1 record, but the record itself is general: the key index and the
//! key space are what make derivation paths unique per account.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::XPub;

/// Errors raised when a signer record can't be created.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signer requires at least one xpub")]
    NoXPubs,

    #[error("quorum {quorum} out of range for {keys} key(s)")]
    BadQuorum { quorum: usize, keys: usize },

    #[error("duplicate xpub in signer key set")]
    DuplicateXPub,
}

/// Keys, quorum and key index of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    #[serde(rename = "type")]
    pub signer_type: String,
    pub xpubs: Vec<XPub>,
    pub quorum: usize,
    pub key_index: u64,
}

impl Signer {
    /// Validate and create a signer record. Keys are stored sorted so the
    /// same key set always produces the same record.
    pub fn create(
        signer_type: &str,
        mut xpubs: Vec<XPub>,
        quorum: usize,
        key_index: u64,
    ) -> Result<Self, SignerError> {
        if xpubs.is_empty() {
            return Err(SignerError::NoXPubs);
        }
        if quorum == 0 || quorum > xpubs.len() {
            return Err(SignerError::BadQuorum {
                quorum,
                keys: xpubs.len(),
            });
        }
        xpubs.sort_by_key(|x| x.to_bytes());
        if xpubs.windows(2).any(|w| w[0] == w[1]) {
            return Err(SignerError::DuplicateXPub);
        }
        Ok(Self {
            signer_type: signer_type.to_string(),
            xpubs,
            quorum,
            key_index,
        })
    }

    /// Derivation path of control program `index` in `key_space`.
    pub fn path(&self, key_space: u8, index: u64) -> Vec<Vec<u8>> {
        derivation_path(key_space, self.key_index, index)
    }
}

/// `[key_space || key_index (u64 LE)]`, then `[index (u64 LE)]`.
///
/// ```
/// use bm_txkit::identity::derivation_path;
///
/// let path = derivation_path(0x01, 1, 12);
/// assert_eq!(hex::encode(&path[0]), "010100000000000000");
/// assert_eq!(hex::encode(&path[1]), "0c00000000000000");
/// ```
pub fn derivation_path(key_space: u8, key_index: u64, index: u64) -> Vec<Vec<u8>> {
    let mut account = Vec::with_capacity(9);
    account.push(key_space);
    account.extend_from_slice(&key_index.to_le_bytes());
    vec![account, index.to_le_bytes().to_vec()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::XPrv;
    use rand::rngs::OsRng;

    fn xpub() -> XPub {
        XPrv::generate(&mut OsRng).xpub()
    }

    #[test]
    fn single_key_quorum_one() {
        let key = xpub();
        let signer = Signer::create("account", vec![key], 1, 1).unwrap();
        assert_eq!(signer.xpubs, vec![key]);
        assert_eq!(signer.quorum, 1);
        assert_eq!(signer.signer_type, "account");
    }

    #[test]
    fn rejects_empty_key_set() {
        assert_eq!(
            Signer::create("account", vec![], 1, 1).unwrap_err(),
            SignerError::NoXPubs
        );
    }

    #[test]
    fn rejects_bad_quorum() {
        assert_eq!(
            Signer::create("account", vec![xpub()], 2, 1).unwrap_err(),
            SignerError::BadQuorum { quorum: 2, keys: 1 }
        );
        assert!(Signer::create("account", vec![xpub()], 0, 1).is_err());
    }

    #[test]
    fn rejects_duplicate_keys() {
        let key = xpub();
        assert_eq!(
            Signer::create("account", vec![key, key], 1, 1).unwrap_err(),
            SignerError::DuplicateXPub
        );
    }

    #[test]
    fn key_order_does_not_matter() {
        let (a, b) = (xpub(), xpub());
        let s1 = Signer::create("account", vec![a, b], 1, 1).unwrap();
        let s2 = Signer::create("account", vec![b, a], 1, 1).unwrap();
        assert_eq!(s1, s2);
    }

    #[test]
    fn path_uses_signer_key_index() {
        let signer = Signer::create("account", vec![xpub()], 1, 7).unwrap();
        let path = signer.path(0x01, 2);
        assert_eq!(hex::encode(&path[0]), "010700000000000000");
        assert_eq!(hex::encode(&path[1]), "0200000000000000");
    }
}
