//! # Hashing Utilities
//!
//! The hash functions the chain actually commits to. There are exactly three
//! and we'd like to keep it that way:
//!
//! - **SHA3-256** — entry IDs, transaction IDs and signature hashes. Note:
//!   this is FIPS-202 SHA3, *not* Keccak-256. They differ in padding and the
//!   chain will reject anything hashed with the wrong one.
//! - **RIPEMD-160** — the 20-byte public-key hash inside pay-to-witness
//!   addresses.
//! - **SHA-512** — only ever used through HMAC by the key-derivation code
//!   in [`super::chainkd`].

use ripemd::Ripemd160;
use sha3::{Digest, Sha3_256};

/// Compute the SHA3-256 digest of the input.
///
/// # Example
///
/// ```
/// use bm_txkit::crypto::sha3_256;
///
/// let digest = sha3_256(b"");
/// assert_eq!(
///     hex::encode(digest),
///     "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
/// );
/// ```
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    sha3_256_concat(&[data])
}

/// SHA3-256 over the concatenation of `parts`, without allocating the
/// concatenation. Entry hashing feeds three or four fragments at a time.
pub fn sha3_256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute the RIPEMD-160 digest of the input.
///
/// Used on a derived 32-byte Ed25519 public key to produce the witness
/// program of a pay-to-witness-pubkey-hash address.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha3_256_known_vector() {
        assert_eq!(
            hex::encode(sha3_256(b"abc")),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn sha3_concat_matches_single_buffer() {
        let joined = sha3_256(b"entryid:spend1:");
        let parts = sha3_256_concat(&[b"entryid:", b"spend1", b":"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn ripemd160_known_vector() {
        assert_eq!(
            hex::encode(ripemd160(b"abc")),
            "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"
        );
    }

    #[test]
    fn ripemd160_empty_input() {
        assert_eq!(
            hex::encode(ripemd160(b"")),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
    }
}
