//! # Transaction Module
//!
//! Construction, hashing, serialization and signing of transactions and the
//! templates that carry them between the builder and the key holder.
//!
//! ## Architecture
//!
//! ```text
//! encoding.rs  — LEB128 varints, varstrs, extensible strings
//! types.rs     — TxData, inputs, outputs, 32-byte IDs, hex byte strings
//! entries.rs   — entry hashing: transaction ID, input IDs, signature hashes
//! program.rs   — control programs and witness scripts
//! template.rs  — Template, SigningInstruction, witness components
//! builder.rs   — TemplateBuilder and action failure aggregation
//! signing.rs   — signing engine, witness materialization, sign progress
//! ```
//!
//! ## Template Lifecycle
//!
//! 1. **Decode** — actions come in as loose JSON (see `crate::actions`).
//! 2. **Build** — [`build`] runs them into a [`Template`] with one signing
//!    instruction per input and no witnesses.
//! 3. **Sign** — [`sign_template`] attaches signatures and writes the
//!    witness arguments into `raw_transaction`.
//! 4. **Submit** — out of scope; the signed `raw_transaction` is ready for
//!    any node's submit endpoint.
//!
//! ## Design Decisions
//!
//! - All amounts are `u64` in the asset's smallest unit and bounded to
//!   2^63 - 1. No floating point anywhere near monetary values.
//! - The transaction ID is the entry hash of the header and ignores
//!   witnesses, so it is fixed at build time and survives signing.

pub mod builder;
pub mod encoding;
pub mod entries;
pub mod program;
pub mod signing;
pub mod template;
pub mod types;

pub use builder::{build, ActionBuildFailure, ActionError, ActionFailure, TemplateBuilder};
pub use encoding::EncodingError;
pub use entries::{tx_hashes, TxHashes};
pub use signing::{
    materialize_witnesses, sign_progress, sign_state, sign_template, SignError, SignState,
};
pub use template::{
    DataWitness, KeyId, RawTxSignature, SigningInstruction, Template, WitnessComponent,
};
pub use types::{AssetId, Hash, HexBytes, TxData, TxInput, TxOutput};
