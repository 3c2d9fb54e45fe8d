//! Entry hashing: transaction IDs, input IDs and signature hashes.
//!
//! The chain doesn't hash the wire bytes. It maps a transaction onto a small
//! graph of typed entries (previous output, spend, mux, results, header)
//! and identifies each entry by
//!
//! ```text
//! SHA3-256("entryid:" || type || ":" || SHA3-256(body))
//! ```
//!
//! The header's ID is the transaction ID. Body encoding: `u64` as 8 bytes
//! little-endian, hashes as 32 raw bytes, byte strings as a uvarint length
//! plus bytes, lists as a uvarint count plus items.
//!
//! Witness arguments never enter any body, which is why attaching
//! signatures leaves the transaction ID untouched.

use super::encoding::write_uvarint;
use super::program::{is_unspendable, OP_1};
use super::types::{AssetId, Hash, TxData};
use crate::config::VM_VERSION;
use crate::crypto::{sha3_256, sha3_256_concat};

/// Transaction ID plus the ID of each input's spend entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHashes {
    pub id: Hash,
    pub input_ids: Vec<Hash>,
}

impl TxHashes {
    /// Hash every signature over input `index` commits to:
    /// `SHA3-256(input_id || tx_id)`. `None` when the index is out of range.
    pub fn sig_hash(&self, index: usize) -> Option<Hash> {
        let input_id = self.input_ids.get(index)?;
        Some(Hash(sha3_256_concat(&[input_id.as_bytes(), self.id.as_bytes()])))
    }
}

// ---------------------------------------------------------------------------
// Entry bodies
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Body(Vec<u8>);

impl Body {
    fn u64(&mut self, n: u64) -> &mut Self {
        self.0.extend_from_slice(&n.to_le_bytes());
        self
    }

    fn hash(&mut self, h: &[u8; 32]) -> &mut Self {
        self.0.extend_from_slice(h);
        self
    }

    fn bytes(&mut self, b: &[u8]) -> &mut Self {
        write_uvarint(&mut self.0, b.len() as u64);
        self.0.extend_from_slice(b);
        self
    }

    fn count(&mut self, n: usize) -> &mut Self {
        write_uvarint(&mut self.0, n as u64);
        self
    }

    fn value_source(&mut self, r: &Hash, asset_id: &AssetId, amount: u64, position: u64) -> &mut Self {
        self.hash(r.as_bytes())
            .hash(asset_id.as_bytes())
            .u64(amount)
            .u64(position)
    }

    fn program(&mut self, vm_version: u64, code: &[u8]) -> &mut Self {
        self.u64(vm_version).bytes(code)
    }

    fn entry_id(&self, entry_type: &str) -> Hash {
        let inner = sha3_256(&self.0);
        Hash(sha3_256_concat(&[b"entryid:", entry_type.as_bytes(), b":", &inner]))
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Compute the transaction ID and every input ID of `tx`.
pub fn tx_hashes(tx: &TxData) -> TxHashes {
    let mut input_ids = Vec::with_capacity(tx.inputs.len());
    let mut mux = Body::default();
    mux.count(tx.inputs.len());

    for input in &tx.inputs {
        let sc = &input.spend;
        let prevout_id = Body::default()
            .value_source(&sc.source_id, &sc.asset_id, sc.amount, sc.source_position)
            .program(sc.vm_version, &sc.control_program)
            .entry_id("output1");
        let spend_id = Body::default().hash(prevout_id.as_bytes()).entry_id("spend1");

        mux.value_source(&spend_id, &sc.asset_id, sc.amount, 0);
        input_ids.push(spend_id);
    }
    let mux_id = mux.program(VM_VERSION, &[OP_1]).entry_id("mux");

    let mut header = Body::default();
    header.u64(tx.version).u64(tx.time_range).count(tx.outputs.len());
    for (i, output) in tx.outputs.iter().enumerate() {
        let oc = &output.commitment;
        let mut body = Body::default();
        body.value_source(&mux_id, &oc.asset_id, oc.amount, i as u64);
        let result_id = if is_unspendable(&oc.control_program) {
            body.entry_id("retirement1")
        } else {
            body.program(oc.vm_version, &oc.control_program)
                .entry_id("output1")
        };
        header.hash(result_id.as_bytes());
    }

    TxHashes {
        id: header.entry_id("txheader"),
        input_ids,
    }
}
