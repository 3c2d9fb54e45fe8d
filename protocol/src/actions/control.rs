//! Outputs that pay an address or a raw control program.

use serde::{Deserialize, Serialize};

use super::{missing_asset_amount, BuildAction};
use crate::config::Network;
use crate::identity::Address;
use crate::transaction::{ActionError, AssetId, HexBytes, TemplateBuilder, TxOutput};

/// Pay `amount` of `asset_id` to a bech32 witness address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlAddressAction {
    pub address: String,
    pub asset_id: AssetId,
    pub amount: u64,
    /// Network the address must belong to; taken from the decode context.
    #[serde(skip)]
    pub network: Network,
}

impl BuildAction for ControlAddressAction {
    fn build(&self, builder: &mut TemplateBuilder) -> Result<(), ActionError> {
        let mut missing = Vec::new();
        if self.address.is_empty() {
            missing.push("address");
        }
        missing_asset_amount(&mut missing, &self.asset_id, self.amount);
        if !missing.is_empty() {
            return Err(ActionError::MissingFields(missing));
        }

        let address = Address::decode(&self.address, self.network)?;
        builder.add_output(TxOutput::new(
            self.asset_id,
            self.amount,
            address.control_program(),
        ))
    }
}

/// Pay `amount` of `asset_id` to an arbitrary control program, used as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlProgramAction {
    pub control_program: HexBytes,
    pub asset_id: AssetId,
    pub amount: u64,
}

impl BuildAction for ControlProgramAction {
    fn build(&self, builder: &mut TemplateBuilder) -> Result<(), ActionError> {
        let mut missing = Vec::new();
        if self.control_program.is_empty() {
            missing.push("control_program");
        }
        missing_asset_amount(&mut missing, &self.asset_id, self.amount);
        if !missing.is_empty() {
            return Err(ActionError::MissingFields(missing));
        }

        builder.add_output(TxOutput::new(
            self.asset_id,
            self.amount,
            self.control_program.0.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AddressError;
    use crate::transaction::program::p2wsh_program;
    use chrono::Utc;

    const ADDRESS: &str = "bm1qx7ylnhszg24995d5e0nftu9e87kt9vnxcn633r";

    fn builder() -> TemplateBuilder {
        TemplateBuilder::new(None, Utc::now(), 0)
    }

    #[test]
    fn control_address_pays_witness_program() {
        let action = ControlAddressAction {
            address: ADDRESS.into(),
            asset_id: AssetId([0xff; 32]),
            amount: 42,
            network: Network::Mainnet,
        };
        let mut b = builder();
        action.build(&mut b).unwrap();
        let tpl = b.build();

        let out = &tpl.raw_transaction.outputs[0];
        assert_eq!(out.commitment.amount, 42);
        assert_eq!(
            hex::encode(out.control_program()),
            "00143789f9de0242aa52d1b4cbe695f0b93facb2b266"
        );
        assert!(tpl.signing_instructions.is_empty());
    }

    #[test]
    fn control_address_to_script_hash() {
        let hash = [5u8; 32];
        let address = Address::ScriptHash {
            network: Network::Mainnet,
            hash,
        };
        let action = ControlAddressAction {
            address: address.to_string(),
            asset_id: AssetId([1; 32]),
            amount: 1,
            network: Network::Mainnet,
        };
        let mut b = builder();
        action.build(&mut b).unwrap();
        assert_eq!(
            b.build().raw_transaction.outputs[0].control_program(),
            p2wsh_program(&hash).as_slice()
        );
    }

    #[test]
    fn control_address_reports_missing_fields_in_order() {
        let mut b = builder();
        let err = ControlAddressAction::default().build(&mut b).unwrap_err();
        assert_eq!(
            err,
            ActionError::MissingFields(vec!["address", "asset_id", "amount"])
        );
        assert_eq!(err.to_string(), "missing fields: address, asset_id, amount");
    }

    #[test]
    fn control_address_rejects_other_networks() {
        let action = ControlAddressAction {
            address: ADDRESS.into(),
            asset_id: AssetId([1; 32]),
            amount: 1,
            network: Network::Testnet,
        };
        let err = action.build(&mut builder()).unwrap_err();
        assert!(matches!(
            err,
            ActionError::Address(AddressError::InvalidHrp { .. })
        ));
    }

    #[test]
    fn control_program_is_used_verbatim() {
        let action: ControlProgramAction = serde_json::from_value(serde_json::json!({
            "type": "control_program",
            "control_program": "deadbeef",
            "asset_id": hex::encode([3u8; 32]),
            "amount": 9
        }))
        .unwrap();
        let mut b = builder();
        action.build(&mut b).unwrap();
        assert_eq!(
            b.build().raw_transaction.outputs[0].control_program(),
            &[0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn control_program_missing_fields() {
        let action = ControlProgramAction {
            amount: 3,
            ..Default::default()
        };
        assert_eq!(
            action.build(&mut builder()).unwrap_err(),
            ActionError::MissingFields(vec!["control_program", "asset_id"])
        );
    }
}
