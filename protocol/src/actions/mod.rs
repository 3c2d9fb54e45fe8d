//! # Action Registry
//!
//! Build requests describe a transaction as a list of loosely typed JSON
//! actions. This module turns each one into a concrete [`Action`] that
//! knows how to contribute to a [`TemplateBuilder`].
//!
//! ```text
//! spend.rs    — spend_account_unspent_output
//! control.rs  — control_address, control_program
//! retire.rs   — retire
//! ```
//!
//! The set of action types is closed: a tag either parses as an
//! [`ActionType`] or the request is rejected.

pub mod control;
pub mod retire;
pub mod spend;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::Network;
use crate::crypto::XPub;
use crate::transaction::{ActionError, AssetId, TemplateBuilder};

pub use control::{ControlAddressAction, ControlProgramAction};
pub use retire::RetireAction;
pub use spend::{SpendUtxoAction, UnspentOutput};

/// Something that can write inputs and/or outputs into a template under
/// construction.
pub trait BuildAction {
    fn build(&self, builder: &mut TemplateBuilder) -> Result<(), ActionError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no action type provided on action {index}")]
    MissingType { index: usize },

    #[error("unknown action type {action_type} on action {index}")]
    UnknownType { index: usize, action_type: String },

    #[error("{reason} on action {index}")]
    Malformed { index: usize, reason: String },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    SpendUnspentOutput,
    ControlAddress,
    ControlProgram,
    Retire,
}

impl ActionType {
    pub const ALL: [ActionType; 4] = [
        ActionType::SpendUnspentOutput,
        ActionType::ControlAddress,
        ActionType::ControlProgram,
        ActionType::Retire,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::SpendUnspentOutput => "spend_account_unspent_output",
            ActionType::ControlAddress => "control_address",
            ActionType::ControlProgram => "control_program",
            ActionType::Retire => "retire",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown action type {s}"))
    }
}

/// What a decoder may need beyond the action payload itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeContext {
    /// Key that spend actions will be signed with.
    pub xpub: Option<XPub>,
    /// Network addresses are checked against.
    pub network: Network,
}

/// A decoded, buildable action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SpendUtxo(SpendUtxoAction),
    ControlAddress(ControlAddressAction),
    ControlProgram(ControlProgramAction),
    Retire(RetireAction),
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Action::SpendUtxo(_) => ActionType::SpendUnspentOutput,
            Action::ControlAddress(_) => ActionType::ControlAddress,
            Action::ControlProgram(_) => ActionType::ControlProgram,
            Action::Retire(_) => ActionType::Retire,
        }
    }

    /// Decode the action at `index` of a request. `payload` is the whole
    /// action object, `type` field included; fields a decoder doesn't know
    /// are ignored.
    pub fn decode(
        index: usize,
        tag: &str,
        payload: &Value,
        ctx: &DecodeContext,
    ) -> Result<Self, DecodeError> {
        let action_type: ActionType = tag.parse().map_err(|_| DecodeError::UnknownType {
            index,
            action_type: tag.to_string(),
        })?;

        let action = match action_type {
            ActionType::SpendUnspentOutput => {
                let payload: spend::SpendPayload = from_payload(index, payload)?;
                let xpub = ctx.xpub.ok_or_else(|| DecodeError::Malformed {
                    index,
                    reason: "spend action requires an xpub".into(),
                })?;
                Action::SpendUtxo(SpendUtxoAction {
                    utxo: payload.utxo,
                    xpub,
                    network: ctx.network,
                })
            }
            ActionType::ControlAddress => {
                let mut action: ControlAddressAction = from_payload(index, payload)?;
                action.network = ctx.network;
                Action::ControlAddress(action)
            }
            ActionType::ControlProgram => Action::ControlProgram(from_payload(index, payload)?),
            ActionType::Retire => Action::Retire(from_payload(index, payload)?),
        };
        Ok(action)
    }
}

impl BuildAction for Action {
    fn build(&self, builder: &mut TemplateBuilder) -> Result<(), ActionError> {
        match self {
            Action::SpendUtxo(a) => a.build(builder),
            Action::ControlAddress(a) => a.build(builder),
            Action::ControlProgram(a) => a.build(builder),
            Action::Retire(a) => a.build(builder),
        }
    }
}

fn from_payload<T: DeserializeOwned>(index: usize, payload: &Value) -> Result<T, DecodeError> {
    T::deserialize(payload).map_err(|e| DecodeError::Malformed {
        index,
        reason: e.to_string(),
    })
}

/// Decode every action of a build request, in order. Stops at the first
/// action that can't be decoded.
pub fn decode_actions(raw: &[Value], ctx: &DecodeContext) -> Result<Vec<Action>, DecodeError> {
    raw.iter()
        .enumerate()
        .map(|(index, value)| {
            let tag = value
                .get("type")
                .and_then(Value::as_str)
                .ok_or(DecodeError::MissingType { index })?;
            Action::decode(index, tag, value, ctx)
        })
        .collect()
}

/// Check the spend actions of a request before building. Actions pass
/// through untouched and in order.
///
/// Spends of distinct outputs are never combined: each UTXO needs its own
/// input and signing instruction. A second spend of an output is rejected
/// as malformed, naming the action that spent it first.
pub fn merge_spend_actions(actions: Vec<Action>) -> Result<Vec<Action>, DecodeError> {
    let mut seen = HashMap::new();
    for (index, action) in actions.iter().enumerate() {
        if let Action::SpendUtxo(spend) = action {
            let output_id = spend.utxo.output_id;
            if let Some(first) = seen.insert(output_id, index) {
                return Err(DecodeError::Malformed {
                    index,
                    reason: format!("output {output_id} already spent by action {first}"),
                });
            }
        }
    }
    Ok(actions)
}

/// Collect the names of missing asset/amount fields, shared by every
/// output-producing action.
pub(crate) fn missing_asset_amount(missing: &mut Vec<&'static str>, asset_id: &AssetId, amount: u64) {
    if asset_id.is_zero() {
        missing.push("asset_id");
    }
    if amount == 0 {
        missing.push("amount");
    }
}
