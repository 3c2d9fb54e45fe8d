// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # bm-txkit — Core Library
//!
//! Offline transaction tooling for a Bytom-style UTXO chain: turn a raw
//! extended private key into an address, assemble unsigned transactions
//! from a declarative list of actions, and sign them later with the key.
//!
//! Nothing here talks to a node. UTXO records come in as JSON from
//! whatever indexes the chain, and the signed `raw_transaction` goes out
//! to whatever submits it.
//!
//! ## Architecture
//!
//! - **crypto** — Chain key derivation (Ed25519 extended keys) and hashes.
//! - **identity** — Account signers, derivation paths, witness addresses.
//! - **actions** — The action registry: JSON action objects in, buildable
//!   actions out.
//! - **transaction** — Wire codec, entry hashing, templates, the builder
//!   and the signing engine.
//! - **api** — JSON request/response facade over the three operations.
//! - **config** — Protocol constants and network parameters.
//! - **error** — The crate-level error type.
//!
//! ## Design Philosophy
//!
//! 1. Byte-for-byte compatibility with existing wallets. Templates built
//!    here can be signed elsewhere and vice versa.
//! 2. Pure and synchronous. No global state, no I/O.
//! 3. Private key bytes are zeroized when dropped.
//! 4. If it touches money, it has tests. Plural.

pub mod actions;
pub mod api;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod transaction;

pub use error::{Error, Result};
