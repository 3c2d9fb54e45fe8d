//! # Chain Key Derivation
//!
//! Extended Ed25519 keys with hierarchical, non-hardened child derivation.
//!
//! An extended key is 64 bytes: a 32-byte secret scalar (or, for the public
//! half, a compressed Edwards point) followed by a 32-byte chain code. The
//! property that makes the whole watch-only wallet story work is that
//! non-hardened derivation commutes with projection:
//!
//! ```text
//! xprv.derive(path).xpub() == xprv.xpub().derive(path)
//! ```
//!
//! so a server holding only an [`XPub`] can compute every address and every
//! per-input public key, while the private half stays wherever the user keeps
//! it and only shows up at signing time.
//!
//! ## Derivation
//!
//! For a selector `sel` the child is computed from
//! `h = HMAC-SHA512(chain_code, "N" || pubkey || sel)`:
//!
//! - the left half is pruned to a small intermediate scalar `f`,
//! - the child scalar is `parent + f` (plain 256-bit little-endian add),
//! - the child point is `parent + f·B`,
//! - the child chain code is the right half.
//!
//! Pruning keeps `f` below 2^230, so repeated additions can never overflow
//! into the top bits that Ed25519 scalar multiplication cares about.
//!
//! ## Signing
//!
//! Signatures are plain Ed25519 over the *expanded* key (scalar plus a
//! nonce prefix derived with `HMAC-SHA512("Expand", xprv)`). Any stock
//! Ed25519 verifier accepts them with the derived public key, which is
//! exactly what [`XPub::verify`] does through `ed25519-dalek`.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha512};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type HmacSha512 = Hmac<Sha512>;

/// Length of an extended key (private or public) in bytes.
pub const EXTENDED_KEY_LENGTH: usize = 64;

/// Errors produced when parsing extended keys.
///
/// Like the rest of the crypto module, these never echo key bytes back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid key encoding: not valid hex")]
    InvalidHex,

    #[error("invalid public key: not a canonical Ed25519 point")]
    InvalidPublicKey,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

fn sha512_wide(parts: &[&[u8]]) -> Zeroizing<Scalar> {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&hasher.finalize());
    let s = Scalar::from_bytes_mod_order_wide(&wide);
    wide.zeroize();
    Zeroizing::new(s)
}

/// Clamp a root scalar: multiple of the cofactor, top bits fixed.
fn prune_root_scalar(s: &mut [u8]) {
    s[0] &= 248;
    s[31] &= 31;
    s[31] |= 64;
}

/// Clamp a derivation offset to 230 bits, multiple of the cofactor.
fn prune_intermediate_scalar(f: &mut [u8]) {
    f[0] &= 248;
    f[29] &= 1;
    f[30] = 0;
    f[31] = 0;
}

/// Secret scalar of a key half. Cleared when dropped.
fn scalar_from(bytes: &[u8]) -> Zeroizing<Scalar> {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&bytes[..32]);
    let s = Scalar::from_bytes_mod_order(buf);
    buf.zeroize();
    Zeroizing::new(s)
}

fn hex_to_extended(s: &str) -> Result<[u8; EXTENDED_KEY_LENGTH], KeyError> {
    let bytes = hex::decode(s).map_err(|_| KeyError::InvalidHex)?;
    if bytes.len() != EXTENDED_KEY_LENGTH {
        return Err(KeyError::InvalidLength {
            expected: EXTENDED_KEY_LENGTH,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; EXTENDED_KEY_LENGTH];
    out.copy_from_slice(&bytes);
    Ok(out)
}

// ---------------------------------------------------------------------------
// XPrv
// ---------------------------------------------------------------------------

/// An extended private key: `scalar || chain_code`.
///
/// Zeroized on drop. Deliberately not `Serialize`; if you need the bytes,
/// ask for them with [`XPrv::as_bytes`] and own the consequences.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct XPrv([u8; EXTENDED_KEY_LENGTH]);

impl XPrv {
    /// Wrap 64 raw bytes. The scalar is used as-is; no clamping is applied,
    /// so keys exported by other chainkd implementations round-trip exactly.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != EXTENDED_KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                expected: EXTENDED_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; EXTENDED_KEY_LENGTH];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Root key from arbitrary seed material: `HMAC-SHA512("Root", seed)`.
    pub fn from_seed(seed: &[u8]) -> Self {
        let mut key = hmac_sha512(b"Root", &[seed]);
        prune_root_scalar(&mut key[..32]);
        Self(key)
    }

    /// Fresh root key from 64 bytes of RNG output.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut seed = [0u8; 64];
        rng.fill_bytes(&mut seed);
        let key = Self::from_seed(&seed);
        seed.zeroize();
        key
    }

    /// Raw key bytes. Handle with the usual care.
    pub fn as_bytes(&self) -> &[u8; EXTENDED_KEY_LENGTH] {
        &self.0
    }

    /// Project to the public half: `scalar·B || chain_code`.
    pub fn xpub(&self) -> XPub {
        let scalar = scalar_from(&self.0[..32]);
        let point = EdwardsPoint::mul_base(&scalar);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&self.0[32..]);
        XPub { point, chain_code }
    }

    /// Derive one child.
    ///
    /// Hardened children (`"H" || scalar || sel`) cannot be reproduced from
    /// the public key and are not used by account paths, but they are part of
    /// the scheme so they're here.
    pub fn child(&self, sel: &[u8], hardened: bool) -> XPrv {
        if hardened {
            let mut res = hmac_sha512(&self.0[32..], &[b"H", &self.0[..32], sel]);
            prune_root_scalar(&mut res[..32]);
            return XPrv(res);
        }

        let xpub = self.xpub();
        let mut res = hmac_sha512(&xpub.chain_code, &[b"N", &xpub.public_key(), sel]);
        prune_intermediate_scalar(&mut res[..32]);

        // res[..32] = parent + f, carry out of the top byte is dropped.
        let mut carry = 0u16;
        for i in 0..32 {
            let sum = self.0[i] as u16 + res[i] as u16 + carry;
            res[i] = sum as u8;
            carry = sum >> 8;
        }
        XPrv(res)
    }

    /// Derive along a path of non-hardened selectors. An empty path yields
    /// a copy of `self`.
    pub fn derive<S: AsRef<[u8]>>(&self, path: &[S]) -> XPrv {
        path.iter()
            .fold(self.clone(), |key, sel| key.child(sel.as_ref(), false))
    }

    /// Ed25519 signature over `msg` using the expanded form of this key.
    pub fn sign(&self, msg: &[u8]) -> Signature {
        let a = scalar_from(&self.0[..32]);
        let expanded = Zeroizing::new(hmac_sha512(b"Expand", &[&self.0]));
        let r = sha512_wide(&[&expanded[32..], msg]);
        let big_r = EdwardsPoint::mul_base(&r).compress();
        let big_a = EdwardsPoint::mul_base(&a).compress();

        let k = sha512_wide(&[big_r.as_bytes(), big_a.as_bytes(), msg]);
        let ka = Zeroizing::new(*k * *a);
        let s = *ka + *r;

        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(big_r.as_bytes());
        sig[32..].copy_from_slice(s.as_bytes());
        Signature::from_bytes(&sig)
    }
}

impl fmt::Debug for XPrv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("XPrv([REDACTED])")
    }
}

impl FromStr for XPrv {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = hex_to_extended(s)?;
        let key = Self(bytes);
        bytes.zeroize();
        Ok(key)
    }
}

// ---------------------------------------------------------------------------
// XPub
// ---------------------------------------------------------------------------

/// An extended public key: `compressed_point || chain_code`.
///
/// The point is decompressed once at construction, so every `XPub` in
/// circulation is known to be on the curve and derivation can't fail.
/// Serialized as 128 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct XPub {
    point: EdwardsPoint,
    chain_code: [u8; 32],
}

impl XPub {
    /// Parse 64 bytes, rejecting anything that isn't a canonical encoding of
    /// a curve point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != EXTENDED_KEY_LENGTH {
            return Err(KeyError::InvalidLength {
                expected: EXTENDED_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        let mut compressed = [0u8; 32];
        compressed.copy_from_slice(&bytes[..32]);
        let point = CompressedEdwardsY(compressed)
            .decompress()
            .ok_or(KeyError::InvalidPublicKey)?;
        if point.compress().to_bytes() != compressed {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&bytes[32..]);
        Ok(Self { point, chain_code })
    }

    pub fn to_bytes(&self) -> [u8; EXTENDED_KEY_LENGTH] {
        let mut out = [0u8; EXTENDED_KEY_LENGTH];
        out[..32].copy_from_slice(&self.public_key());
        out[32..].copy_from_slice(&self.chain_code);
        out
    }

    /// The 32-byte Ed25519 public key (compressed point).
    pub fn public_key(&self) -> [u8; 32] {
        self.point.compress().to_bytes()
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Non-hardened child; mirrors [`XPrv::child`] with `hardened = false`.
    pub fn child(&self, sel: &[u8]) -> XPub {
        let res = {
            let mut h = hmac_sha512(&self.chain_code, &[b"N", &self.public_key(), sel]);
            prune_intermediate_scalar(&mut h[..32]);
            h
        };
        let offset = EdwardsPoint::mul_base(&scalar_from(&res[..32]));
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&res[32..]);
        XPub {
            point: self.point + offset,
            chain_code,
        }
    }

    pub fn derive<S: AsRef<[u8]>>(&self, path: &[S]) -> XPub {
        path.iter().fold(*self, |key, sel| key.child(sel.as_ref()))
    }

    /// Verify an Ed25519 signature against this key's public point.
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> bool {
        match VerifyingKey::from_bytes(&self.public_key()) {
            Ok(vk) => vk.verify(msg, signature).is_ok(),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for XPub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XPub({self})")
    }
}

impl fmt::Display for XPub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for XPub {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&hex_to_extended(s)?)
    }
}

impl Serialize for XPub {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for XPub {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
