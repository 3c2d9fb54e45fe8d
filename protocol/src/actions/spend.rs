//! Spending a known unspent output.
//!
//! The UTXO record comes from whatever indexes the chain for the caller; we
//! take it at face value. The action binds the caller's xpub so the builder
//! can emit a signing instruction that the matching private key will be
//! able to satisfy later.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::BuildAction;
use crate::config::{Network, ACCOUNT_KEY_SPACE};
use crate::crypto::XPub;
use crate::identity::{account_signer, Address};
use crate::transaction::program::multisig_script;
use crate::transaction::{
    ActionError, AssetId, Hash, KeyId, SigningInstruction, TemplateBuilder, TxInput,
    WitnessComponent,
};

/// Control programs arrive base64-encoded (the indexer's byte-array
/// encoding), not hex.
mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        STANDARD.decode(raw.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// An unspent output as reported by the indexer. Missing fields default;
/// unknown fields (aliases and such) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnspentOutput {
    #[serde(rename = "id")]
    pub output_id: Hash,
    pub source_id: Hash,
    pub asset_id: AssetId,
    pub amount: u64,
    pub source_pos: u64,
    #[serde(with = "base64_bytes")]
    pub program: Vec<u8>,
    pub account_id: String,
    pub address: String,
    pub control_program_index: u64,
    pub valid_height: u64,
    pub change: bool,
}

/// Wire shape of the action: `{"type": ..., "utxo": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct SpendPayload {
    pub utxo: UnspentOutput,
}

/// Spend `utxo`, to be signed by the key behind `xpub`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendUtxoAction {
    pub utxo: UnspentOutput,
    pub xpub: XPub,
    pub network: Network,
}

impl BuildAction for SpendUtxoAction {
    fn build(&self, builder: &mut TemplateBuilder) -> Result<(), ActionError> {
        let utxo = &self.utxo;
        let signer = account_signer(self.xpub)?;
        let path = signer.path(ACCOUNT_KEY_SPACE, utxo.control_program_index);

        let input = TxInput::spend(
            utxo.source_id,
            utxo.asset_id,
            utxo.amount,
            utxo.source_pos,
            utxo.program.clone(),
        );

        let keys = signer
            .xpubs
            .iter()
            .map(|xpub| KeyId::new(*xpub, path.clone()))
            .collect();
        let pubkeys: Vec<[u8; 32]> = signer
            .xpubs
            .iter()
            .map(|xpub| xpub.derive(&path).public_key())
            .collect();

        // The address decides the witness shape, so it can't be guessed.
        if utxo.address.is_empty() {
            return Err(ActionError::MissingFields(vec!["address"]));
        }
        let witness_data = match Address::decode(&utxo.address, self.network)? {
            Address::PubKeyHash { .. } => pubkeys[0].to_vec(),
            Address::ScriptHash { .. } => multisig_script(&pubkeys, signer.quorum)?,
        };

        let mut instruction = SigningInstruction::new(0);
        instruction
            .witness_components
            .push(WitnessComponent::raw_signature(signer.quorum, keys));
        instruction
            .witness_components
            .push(WitnessComponent::data(witness_data));

        builder.add_input(input, instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::XPrv;
    use chrono::Utc;

    fn utxo_json() -> serde_json::Value {
        serde_json::json!({
            "account_alias": "default",
            "account_id": "0BKBR2D2G0A02",
            "address": "bm1qx7ylnhszg24995d5e0nftu9e87kt9vnxcn633r",
            "amount": 624000000000u64,
            "asset_alias": "BTM",
            "asset_id": "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
            "change": false,
            "control_program_index": 12,
            "id": "5af9d3c9b69470983377c1fc0c9125c4ac3bfd32c8d505f2a6042aade8503bc9",
            "program": "00143789f9de0242aa52d1b4cbe695f0b93facb2b266",
            "source_id": "233d1dd49e591980f98e11f333c6c28a867e78448e272011f045131df5aa260b",
            "source_pos": 0,
            "valid_height": 12
        })
    }

    #[test]
    fn decodes_indexer_utxo() {
        let utxo: UnspentOutput = serde_json::from_value(utxo_json()).unwrap();
        assert_eq!(utxo.amount, 624_000_000_000);
        assert_eq!(utxo.control_program_index, 12);
        assert_eq!(utxo.account_id, "0BKBR2D2G0A02");
        assert_eq!(
            hex::encode(&utxo.program),
            "d34d78dfbf3d7fd75ed36e3669ae767756f871b7baf797f46fdddf69c6f66f6eba"
        );
    }

    #[test]
    fn missing_fields_default() {
        let utxo: UnspentOutput = serde_json::from_str("{}").unwrap();
        assert_eq!(utxo, UnspentOutput::default());
        let utxo: UnspentOutput = serde_json::from_str(r#"{"program":null}"#).unwrap();
        assert!(utxo.program.is_empty());
    }

    #[test]
    fn builds_input_and_instruction() {
        let xprv = XPrv::from_seed(b"spend tests");
        let action = SpendUtxoAction {
            utxo: serde_json::from_value(utxo_json()).unwrap(),
            xpub: xprv.xpub(),
            network: Network::Mainnet,
        };
        let mut builder = TemplateBuilder::new(None, Utc::now(), 0);
        action.build(&mut builder).unwrap();
        let tpl = builder.build();

        assert_eq!(tpl.raw_transaction.inputs.len(), 1);
        let inst = &tpl.signing_instructions[0];
        assert_eq!(inst.position, 0);

        let raw = inst.raw_signatures().next().unwrap();
        assert_eq!(raw.quorum, 1);
        assert_eq!(raw.keys[0].xpub, xprv.xpub());
        let path: Vec<String> = raw.keys[0].derivation_path.iter().map(hex::encode).collect();
        assert_eq!(path, vec!["010100000000000000", "0c00000000000000"]);

        // The data component is the derived public key.
        match &inst.witness_components[1] {
            WitnessComponent::Data(d) => {
                let derived = xprv.derive(&raw.keys[0].derivation_path).xpub();
                assert_eq!(d.value.0, derived.public_key().to_vec());
            }
            other => panic!("expected data component, got {other:?}"),
        }
    }

    #[test]
    fn script_hash_address_gets_multisig_witness() {
        let xprv = XPrv::from_seed(b"p2wsh");
        let mut utxo: UnspentOutput = serde_json::from_value(utxo_json()).unwrap();
        utxo.address = Address::ScriptHash {
            network: Network::Mainnet,
            hash: [7; 32],
        }
        .to_string();
        let action = SpendUtxoAction {
            utxo,
            xpub: xprv.xpub(),
            network: Network::Mainnet,
        };
        let mut builder = TemplateBuilder::new(None, Utc::now(), 0);
        action.build(&mut builder).unwrap();
        let tpl = builder.build();

        match &tpl.signing_instructions[0].witness_components[1] {
            WitnessComponent::Data(d) => {
                assert_eq!(d.value.len(), 1 + 33 + 3);
                assert_eq!(d.value[0], 0xae);
            }
            other => panic!("expected data component, got {other:?}"),
        }
    }

    #[test]
    fn missing_address_is_reported() {
        let mut utxo: UnspentOutput = serde_json::from_value(utxo_json()).unwrap();
        utxo.address.clear();
        let action = SpendUtxoAction {
            utxo,
            xpub: XPrv::from_seed(b"x").xpub(),
            network: Network::Mainnet,
        };
        let mut builder = TemplateBuilder::new(None, Utc::now(), 0);
        assert_eq!(
            action.build(&mut builder).unwrap_err(),
            ActionError::MissingFields(vec!["address"])
        );
    }

    #[test]
    fn wrong_network_address_fails() {
        let action = SpendUtxoAction {
            utxo: serde_json::from_value(utxo_json()).unwrap(),
            xpub: XPrv::from_seed(b"x").xpub(),
            network: Network::Testnet,
        };
        let mut builder = TemplateBuilder::new(None, Utc::now(), 0);
        assert!(matches!(
            action.build(&mut builder),
            Err(ActionError::Address(_))
        ));
    }

    #[test]
    fn oversized_amount_is_rejected() {
        let mut utxo: UnspentOutput = serde_json::from_value(utxo_json()).unwrap();
        utxo.amount = u64::MAX;
        let action = SpendUtxoAction {
            utxo,
            xpub: XPrv::from_seed(b"x").xpub(),
            network: Network::Mainnet,
        };
        let mut builder = TemplateBuilder::new(None, Utc::now(), 0);
        assert_eq!(
            action.build(&mut builder).unwrap_err(),
            ActionError::BadAmount(u64::MAX)
        );
    }
}
