//! Template construction from actions.
//!
//! The [`TemplateBuilder`] is the accumulator actions write into: each
//! action contributes inputs (with a signing instruction apiece) and/or
//! outputs. [`build`] runs every action, collects *all* failures rather than
//! stopping at the first, and only then assembles the template.
//!
//! The builder does not sign. That happens in [`super::signing`], which
//! keeps construction testable without key material.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use super::program::ProgramError;
use super::template::{SigningInstruction, Template};
use super::types::{TxData, TxInput, TxOutput};
use crate::actions::{Action, BuildAction};
use crate::config::MAX_AMOUNT;
use crate::identity::{AddressError, SignerError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a single action could not contribute to the transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("missing fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("bad amount: {0} exceeds maximum value 2^63-1")]
    BadAmount(u64),

    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("signer: {0}")]
    Signer(#[from] SignerError),

    #[error("witness script: {0}")]
    Program(#[from] ProgramError),
}

/// An [`ActionError`] tagged with the index of the action that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub index: usize,
    pub error: ActionError,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action index {}: {}", self.index, self.error)
    }
}

/// Every action failure of one build, in action order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBuildFailure {
    failures: Vec<ActionFailure>,
}

impl ActionBuildFailure {
    /// Root cause of the first failing action.
    pub fn root(&self) -> &ActionError {
        &self.failures[0].error
    }

    pub fn failures(&self) -> &[ActionFailure] {
        &self.failures
    }

    /// Every failure message, joined with `"; "`.
    pub fn detail(&self) -> String {
        self.failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for ActionBuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (root cause: {})", self.detail(), self.root())
    }
}

impl std::error::Error for ActionBuildFailure {}

// ---------------------------------------------------------------------------
// TemplateBuilder
// ---------------------------------------------------------------------------

/// Accumulates the inputs, outputs and signing instructions contributed by
/// actions.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    base: Option<TxData>,
    max_time: DateTime<Utc>,
    time_range: u64,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
    signing_instructions: Vec<SigningInstruction>,
}

impl TemplateBuilder {
    pub fn new(base: Option<TxData>, max_time: DateTime<Utc>, time_range: u64) -> Self {
        Self {
            base,
            max_time,
            time_range,
            inputs: Vec::new(),
            outputs: Vec::new(),
            signing_instructions: Vec::new(),
        }
    }

    /// Deadline after which the template should no longer be signed or
    /// submitted.
    pub fn max_time(&self) -> DateTime<Utc> {
        self.max_time
    }

    /// Add an input and the instruction for completing its witness. The
    /// instruction's position is assigned when the template is assembled.
    pub fn add_input(
        &mut self,
        input: TxInput,
        instruction: SigningInstruction,
    ) -> Result<(), ActionError> {
        if input.amount() > MAX_AMOUNT {
            return Err(ActionError::BadAmount(input.amount()));
        }
        self.inputs.push(input);
        self.signing_instructions.push(instruction);
        Ok(())
    }

    pub fn add_output(&mut self, output: TxOutput) -> Result<(), ActionError> {
        if output.commitment.amount > MAX_AMOUNT {
            return Err(ActionError::BadAmount(output.commitment.amount));
        }
        self.outputs.push(output);
        Ok(())
    }

    /// Assemble the template. New outputs and inputs are appended after
    /// whatever the base transaction already had; a non-zero time range
    /// replaces the base's.
    pub fn build(self) -> Template {
        let mut tx = self.base.unwrap_or_default();
        if self.time_range != 0 {
            tx.time_range = self.time_range;
        }
        tx.outputs.extend(self.outputs);

        let mut instructions = Vec::with_capacity(self.inputs.len());
        for (input, mut instruction) in self.inputs.into_iter().zip(self.signing_instructions) {
            instruction.position = tx.inputs.len() as u32;
            instructions.push(instruction);
            tx.inputs.push(input);
        }

        Template::new(tx, instructions)
    }
}

/// Run every action against a fresh builder and assemble the template.
///
/// # Errors
///
/// If any action fails, the returned [`ActionBuildFailure`] lists every
/// failure in action order; nothing is built.
pub fn build(
    base: Option<TxData>,
    actions: &[Action],
    max_time: DateTime<Utc>,
    time_range: u64,
) -> Result<Template, ActionBuildFailure> {
    let mut builder = TemplateBuilder::new(base, max_time, time_range);

    let mut failures = Vec::new();
    for (index, action) in actions.iter().enumerate() {
        if let Err(error) = action.build(&mut builder) {
            warn!(action_index = index, error = %error, "action failed to build");
            failures.push(ActionFailure { index, error });
        }
    }
    if !failures.is_empty() {
        return Err(ActionBuildFailure { failures });
    }

    let template = builder.build();
    debug!(
        inputs = template.raw_transaction.inputs.len(),
        outputs = template.raw_transaction.outputs.len(),
        max_time = %max_time,
        "built transaction template"
    );
    Ok(template)
}
