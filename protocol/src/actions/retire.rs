//! Destroying value.

use serde::{Deserialize, Serialize};

use super::{missing_asset_amount, BuildAction};
use crate::transaction::program::retirement_program;
use crate::transaction::{ActionError, AssetId, HexBytes, TemplateBuilder, TxOutput};

/// Retire `amount` of `asset_id`. `arbitrary` is an optional comment
/// recorded in the unspendable program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetireAction {
    pub asset_id: AssetId,
    pub amount: u64,
    pub arbitrary: HexBytes,
}

impl BuildAction for RetireAction {
    fn build(&self, builder: &mut TemplateBuilder) -> Result<(), ActionError> {
        let mut missing = Vec::new();
        missing_asset_amount(&mut missing, &self.asset_id, self.amount);
        if !missing.is_empty() {
            return Err(ActionError::MissingFields(missing));
        }

        builder.add_output(TxOutput::new(
            self.asset_id,
            self.amount,
            retirement_program(&self.arbitrary),
        ))
    }
}
