//! Transaction templates: a transaction body plus instructions for
//! completing its witnesses.
//!
//! A template is what travels between the builder and whoever holds the
//! keys. Its JSON shape is fixed by existing wallets:
//!
//! ```json
//! {
//!   "raw_transaction": "0701...",
//!   "signing_instructions": [{
//!     "position": 0,
//!     "witness_components": [
//!       {"type": "raw_tx_signature", "quorum": 1,
//!        "keys": [{"xpub": "...", "derivation_path": ["01...", "0c..."]}],
//!        "signatures": null},
//!       {"type": "data", "value": "..."}
//!     ]
//!   }],
//!   "allow_additional_actions": false
//! }
//! ```
//!
//! `signing_instructions` is always written as a list, even when empty.
//! `signatures` is `null` until a slot has been allocated, after which it
//! holds one hex string per key, `""` marking a slot nobody has filled.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::entries::{tx_hashes, TxHashes};
use super::types::{HexBytes, TxData};
use crate::crypto::XPub;

/// Deserialize a list where `null` and a missing field both mean empty.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_null<S: Serializer>(sigs: &[HexBytes], serializer: S) -> Result<S::Ok, S::Error> {
    if sigs.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.collect_seq(sigs)
    }
}

// ---------------------------------------------------------------------------
// Witness components
// ---------------------------------------------------------------------------

/// One signing key: which root xpub, and the path to the child that signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyId {
    pub xpub: XPub,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub derivation_path: Vec<HexBytes>,
}

impl KeyId {
    pub fn new(xpub: XPub, path: Vec<Vec<u8>>) -> Self {
        Self {
            xpub,
            derivation_path: path.into_iter().map(HexBytes).collect(),
        }
    }
}

/// A quorum of signatures over the input's signature hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTxSignature {
    pub quorum: usize,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keys: Vec<KeyId>,
    #[serde(
        default,
        serialize_with = "empty_as_null",
        deserialize_with = "null_as_empty"
    )]
    pub signatures: Vec<HexBytes>,
}

impl RawTxSignature {
    /// Number of filled signature slots.
    pub fn signature_count(&self) -> usize {
        self.signatures.iter().filter(|s| !s.is_empty()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.signature_count() >= self.quorum
    }
}

/// A fixed value pushed onto the witness after the signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataWitness {
    pub value: HexBytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WitnessComponent {
    RawTxSignature(RawTxSignature),
    Data(DataWitness),
}

impl WitnessComponent {
    pub fn raw_signature(quorum: usize, keys: Vec<KeyId>) -> Self {
        WitnessComponent::RawTxSignature(RawTxSignature {
            quorum,
            keys,
            signatures: Vec::new(),
        })
    }

    pub fn data(value: Vec<u8>) -> Self {
        WitnessComponent::Data(DataWitness {
            value: HexBytes(value),
        })
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// How to complete the witness of the input at `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningInstruction {
    pub position: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub witness_components: Vec<WitnessComponent>,
}

impl SigningInstruction {
    pub fn new(position: u32) -> Self {
        Self {
            position,
            witness_components: Vec::new(),
        }
    }

    /// Raw-signature components, in witness order.
    pub fn raw_signatures(&self) -> impl Iterator<Item = &RawTxSignature> {
        self.witness_components.iter().filter_map(|c| match c {
            WitnessComponent::RawTxSignature(sig) => Some(sig),
            WitnessComponent::Data(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub raw_transaction: TxData,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub signing_instructions: Vec<SigningInstruction>,
    #[serde(default)]
    pub allow_additional_actions: bool,
}

impl Template {
    pub fn new(raw_transaction: TxData, signing_instructions: Vec<SigningInstruction>) -> Self {
        Self {
            raw_transaction,
            signing_instructions,
            allow_additional_actions: false,
        }
    }

    /// Transaction and input IDs of the body.
    pub fn hashes(&self) -> TxHashes {
        tx_hashes(&self.raw_transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XPUB: &str = "f7bf3b320f828566dff61ec222d4cdbcea032892c8c542b3b6a1c3c725ec356210fd3d91011aeba9d41f1654c0c8232d1f94eb807a89a35e1501c4effb5c4d5a";

    fn instruction() -> SigningInstruction {
        let key = KeyId::new(XPUB.parse().unwrap(), vec![vec![1, 1, 0, 0, 0, 0, 0, 0, 0], vec![12, 0, 0, 0, 0, 0, 0, 0]]);
        SigningInstruction {
            position: 0,
            witness_components: vec![
                WitnessComponent::raw_signature(1, vec![key]),
                WitnessComponent::data(vec![0xa4, 0x2b]),
            ],
        }
    }

    #[test]
    fn unsigned_component_serializes_null_signatures() {
        let json = serde_json::to_value(instruction()).unwrap();
        let expected = serde_json::json!({
            "position": 0,
            "witness_components": [
                {
                    "type": "raw_tx_signature",
                    "quorum": 1,
                    "keys": [{
                        "xpub": XPUB,
                        "derivation_path": ["010100000000000000", "0c00000000000000"]
                    }],
                    "signatures": null
                },
                {"type": "data", "value": "a42b"}
            ]
        });
        assert_eq!(json, expected);
    }

    #[test]
    fn empty_slots_serialize_as_empty_strings() {
        let mut inst = instruction();
        if let WitnessComponent::RawTxSignature(sig) = &mut inst.witness_components[0] {
            sig.signatures = vec![HexBytes::default(), HexBytes(vec![0xab])];
        }
        let json = serde_json::to_value(&inst).unwrap();
        assert_eq!(
            json["witness_components"][0]["signatures"],
            serde_json::json!(["", "ab"])
        );
        let back: SigningInstruction = serde_json::from_value(json).unwrap();
        assert_eq!(back, inst);
    }

    #[test]
    fn null_lists_deserialize_as_empty() {
        let tpl: Template = serde_json::from_str(
            r#"{"raw_transaction":"0701000000","signing_instructions":null}"#,
        )
        .unwrap();
        assert!(tpl.signing_instructions.is_empty());
        assert!(!tpl.allow_additional_actions);

        let inst: SigningInstruction =
            serde_json::from_str(r#"{"position":3,"witness_components":null}"#).unwrap();
        assert!(inst.witness_components.is_empty());
    }

    #[test]
    fn empty_template_keeps_instruction_list() {
        let tpl = Template::new(TxData::default(), Vec::new());
        let json = serde_json::to_value(&tpl).unwrap();
        assert_eq!(json["signing_instructions"], serde_json::json!([]));
    }

    #[test]
    fn completion_counts_only_filled_slots() {
        let mut sig = RawTxSignature {
            quorum: 1,
            keys: Vec::new(),
            signatures: vec![HexBytes::default()],
        };
        assert!(!sig.is_complete());
        sig.signatures[0] = HexBytes(vec![1; 64]);
        assert!(sig.is_complete());
    }

    #[test]
    fn unknown_component_type_is_rejected() {
        let res: Result<WitnessComponent, _> =
            serde_json::from_str(r#"{"type":"signature","quorum":1}"#);
        assert!(res.is_err());
    }
}
