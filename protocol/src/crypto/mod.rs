//! # Cryptographic Primitives
//!
//! Everything key- and hash-shaped that the transaction kit needs, and
//! nothing else:
//!
//! - **chainkd** — extended Ed25519 keys, child derivation, signing.
//! - **hash** — SHA3-256 and RIPEMD-160, the two digests the chain commits to.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. The curve arithmetic is `curve25519-dalek`, verification is
//! `ed25519-dalek`, the digests come from RustCrypto. The only thing written
//! here is the derivation glue, and that glue has to match the chain's key
//! scheme bit for bit or every address we produce is unspendable.

pub mod chainkd;
pub mod hash;

pub use chainkd::{KeyError, XPrv, XPub};
pub use hash::{ripemd160, sha3_256, sha3_256_concat};
