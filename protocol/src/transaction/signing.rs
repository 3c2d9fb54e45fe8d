//! Template signing with extended private keys.
//!
//! Signing is a separate step from building because the key is usually not
//! available at construction time: the builder only ever sees an xpub. The
//! signer walks every signing instruction, and for each raw-signature
//! component still below quorum it:
//!
//! 1. allocates one signature slot per key, preserving existing signatures,
//! 2. for each key that belongs to the signing root and has an empty slot,
//!    derives the child along the key's `derivation_path`,
//! 3. signs the input's signature hash `SHA3-256(input_id || tx_id)`.
//!
//! Afterwards the witnesses are *materialized*: quorum signatures followed
//! by the data values become the input's witness arguments in
//! `raw_transaction`. Witness arguments are not part of any entry hash, so
//! the transaction ID never changes.
//!
//! Re-signing is a no-op for components already at quorum.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::template::{SigningInstruction, Template, WitnessComponent};
use super::types::HexBytes;
use crate::crypto::XPrv;

/// Reasons a template can't be signed. Any of these aborts the whole
/// operation before a single signature is attached.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("{instructions} signing instruction(s) for {inputs} input(s)")]
    BadInstructionCount { instructions: usize, inputs: usize },

    #[error("signing instruction {instruction} references missing input {position}")]
    BadInputIndex { instruction: usize, position: u32 },

    #[error(
        "witness component {component} of input {position} has {signatures} signatures for {keys} key(s)"
    )]
    TooManySignatures {
        position: u32,
        component: usize,
        signatures: usize,
        keys: usize,
    },
}

/// Progress of one signing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignState {
    /// No raw-signature component has a signature.
    Unsigned,
    /// Some signatures present, at least one component below quorum.
    PartiallySigned,
    /// Every raw-signature component has reached quorum.
    Signed,
}

/// Where an instruction sits in the `Unsigned → PartiallySigned → Signed`
/// progression.
pub fn sign_state(instruction: &SigningInstruction) -> SignState {
    let mut any_signature = false;
    let mut all_complete = true;
    for sig in instruction.raw_signatures() {
        any_signature |= sig.signature_count() > 0;
        all_complete &= sig.is_complete();
    }
    match (all_complete, any_signature) {
        (true, _) => SignState::Signed,
        (false, false) => SignState::Unsigned,
        (false, true) => SignState::PartiallySigned,
    }
}

/// True iff every raw-signature component of every instruction has reached
/// quorum.
pub fn sign_progress(template: &Template) -> bool {
    template
        .signing_instructions
        .iter()
        .all(|inst| inst.raw_signatures().all(|sig| sig.is_complete()))
}

fn validate(template: &Template) -> Result<(), SignError> {
    let inputs = template.raw_transaction.inputs.len();
    if template.signing_instructions.len() > inputs {
        return Err(SignError::BadInstructionCount {
            instructions: template.signing_instructions.len(),
            inputs,
        });
    }
    for (instruction, inst) in template.signing_instructions.iter().enumerate() {
        if inst.position as usize >= inputs {
            return Err(SignError::BadInputIndex {
                instruction,
                position: inst.position,
            });
        }
        for (component, wc) in inst.witness_components.iter().enumerate() {
            if let WitnessComponent::RawTxSignature(sig) = wc {
                if sig.signatures.len() > sig.keys.len() {
                    return Err(SignError::TooManySignatures {
                        position: inst.position,
                        component,
                        signatures: sig.signatures.len(),
                        keys: sig.keys.len(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Attach every signature `xprv` can contribute, then materialize the
/// witnesses. Returns the overall completion flag.
///
/// Only keys whose root xpub is `xprv`'s own are signed for; slots
/// belonging to other keys are left for their holders.
pub fn sign_template(template: &mut Template, xprv: &XPrv) -> Result<bool, SignError> {
    validate(template)?;

    let root = xprv.xpub();
    let hashes = template.hashes();
    let mut added = 0usize;

    for (instruction, inst) in template.signing_instructions.iter_mut().enumerate() {
        let sighash = hashes
            .sig_hash(inst.position as usize)
            .ok_or(SignError::BadInputIndex {
                instruction,
                position: inst.position,
            })?;

        for wc in &mut inst.witness_components {
            let WitnessComponent::RawTxSignature(sw) = wc else {
                continue;
            };
            let mut filled = sw.signature_count();
            if filled >= sw.quorum {
                continue;
            }
            if sw.signatures.len() < sw.keys.len() {
                sw.signatures.resize(sw.keys.len(), HexBytes::default());
            }

            for (slot, key) in sw.keys.iter().enumerate() {
                if filled >= sw.quorum {
                    break;
                }
                if !sw.signatures[slot].is_empty() || key.xpub != root {
                    continue;
                }
                let child = xprv.derive(&key.derivation_path);
                sw.signatures[slot] = HexBytes(child.sign(sighash.as_bytes()).to_bytes().to_vec());
                filled += 1;
                added += 1;
            }
        }
    }

    materialize_witnesses(template)?;
    let complete = sign_progress(template);
    debug!(
        tx_id = %hashes.id,
        signatures_added = added,
        complete,
        "signed transaction template"
    );
    Ok(complete)
}

/// Write each instruction's witness into its input: up to `quorum`
/// non-empty signatures per raw-signature component, then data values, in
/// component order.
pub fn materialize_witnesses(template: &mut Template) -> Result<(), SignError> {
    validate(template)?;

    for inst in &template.signing_instructions {
        let mut arguments = Vec::new();
        for wc in &inst.witness_components {
            match wc {
                WitnessComponent::RawTxSignature(sig) => arguments.extend(
                    sig.signatures
                        .iter()
                        .filter(|s| !s.is_empty())
                        .take(sig.quorum)
                        .map(|s| s.0.clone()),
                ),
                WitnessComponent::Data(data) => arguments.push(data.value.0.clone()),
            }
        }
        template.raw_transaction.inputs[inst.position as usize].arguments = arguments;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::template::{KeyId, RawTxSignature};
    use crate::transaction::types::{AssetId, Hash, TxData, TxInput};

    fn key() -> XPrv {
        XPrv::from_seed(b"signing tests")
    }

    fn template_for(xprv: &XPrv, paths: &[Vec<Vec<u8>>]) -> Template {
        let mut tx = TxData::default();
        let mut instructions = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            tx.inputs.push(TxInput::spend(
                Hash([i as u8; 32]),
                AssetId([0xff; 32]),
                1_000,
                0,
                vec![0x00, 0x14],
            ));
            let pk = xprv.derive(path).xpub().public_key();
            instructions.push(SigningInstruction {
                position: i as u32,
                witness_components: vec![
                    WitnessComponent::raw_signature(1, vec![KeyId::new(xprv.xpub(), path.clone())]),
                    WitnessComponent::data(pk.to_vec()),
                ],
            });
        }
        Template::new(tx, instructions)
    }

    fn raw(inst: &SigningInstruction) -> &RawTxSignature {
        inst.raw_signatures().next().unwrap()
    }

    #[test]
    fn signs_every_instruction_and_verifies() {
        let xprv = key();
        let paths = vec![vec![vec![1u8], vec![2u8]], vec![vec![3u8]]];
        let mut tpl = template_for(&xprv, &paths);
        let id_before = tpl.hashes().id;

        assert!(sign_template(&mut tpl, &xprv).unwrap());

        let hashes = tpl.hashes();
        assert_eq!(hashes.id, id_before, "signing must not change the transaction ID");
        for (i, inst) in tpl.signing_instructions.iter().enumerate() {
            assert_eq!(sign_state(inst), SignState::Signed);
            let sig_bytes: [u8; 64] = raw(inst).signatures[0].0.as_slice().try_into().unwrap();
            let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
            let child = xprv.xpub().derive(&paths[i]);
            assert!(child.verify(hashes.sig_hash(i).unwrap().as_bytes(), &sig));
        }
    }

    #[test]
    fn witness_arguments_are_materialized() {
        let xprv = key();
        let mut tpl = template_for(&xprv, &[vec![vec![7u8]]]);
        sign_template(&mut tpl, &xprv).unwrap();

        let args = &tpl.raw_transaction.inputs[0].arguments;
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].len(), 64);
        assert_eq!(args[1], xprv.derive(&[vec![7u8]]).xpub().public_key().to_vec());
    }

    #[test]
    fn signing_twice_is_idempotent() {
        let xprv = key();
        let mut tpl = template_for(&xprv, &[vec![vec![1u8]]]);
        sign_template(&mut tpl, &xprv).unwrap();
        let once = tpl.clone();
        assert!(sign_template(&mut tpl, &xprv).unwrap());
        assert_eq!(tpl, once);
        assert_eq!(raw(&tpl.signing_instructions[0]).signatures.len(), 1);
    }

    #[test]
    fn foreign_key_leaves_template_unsigned() {
        let owner = key();
        let stranger = XPrv::from_seed(b"someone else");
        let mut tpl = template_for(&owner, &[vec![vec![1u8]]]);

        assert!(!sign_template(&mut tpl, &stranger).unwrap());
        assert_eq!(sign_state(&tpl.signing_instructions[0]), SignState::Unsigned);
        // The slot was allocated but left empty.
        assert_eq!(raw(&tpl.signing_instructions[0]).signatures, vec![HexBytes::default()]);
    }

    #[test]
    fn partially_signed_instruction() {
        let a = key();
        let b = XPrv::from_seed(b"second signer");
        let mut tpl = template_for(&a, &[vec![vec![1u8]]]);
        // A second component that only `b` can satisfy.
        tpl.signing_instructions[0]
            .witness_components
            .push(WitnessComponent::raw_signature(1, vec![KeyId::new(b.xpub(), vec![])]));

        assert!(!sign_template(&mut tpl, &a).unwrap());
        assert_eq!(sign_state(&tpl.signing_instructions[0]), SignState::PartiallySigned);

        assert!(sign_template(&mut tpl, &b).unwrap());
        assert_eq!(sign_state(&tpl.signing_instructions[0]), SignState::Signed);
    }

    #[test]
    fn empty_template_is_complete() {
        let mut tpl = Template::new(TxData::default(), Vec::new());
        assert!(sign_template(&mut tpl, &key()).unwrap());
    }

    #[test]
    fn rejects_position_out_of_range() {
        let xprv = key();
        let mut tpl = template_for(&xprv, &[vec![vec![1u8]]]);
        tpl.signing_instructions[0].position = 5;
        assert_eq!(
            sign_template(&mut tpl, &xprv).unwrap_err(),
            SignError::BadInputIndex {
                instruction: 0,
                position: 5
            }
        );
    }

    #[test]
    fn rejects_more_instructions_than_inputs() {
        let xprv = key();
        let mut tpl = template_for(&xprv, &[vec![vec![1u8]]]);
        tpl.signing_instructions.push(SigningInstruction::new(0));
        assert!(matches!(
            sign_template(&mut tpl, &xprv),
            Err(SignError::BadInstructionCount { instructions: 2, inputs: 1 })
        ));
    }

    #[test]
    fn rejects_more_signatures_than_keys_without_mutating() {
        let xprv = key();
        let mut tpl = template_for(&xprv, &[vec![vec![1u8]]]);
        if let WitnessComponent::RawTxSignature(sig) =
            &mut tpl.signing_instructions[0].witness_components[0]
        {
            sig.signatures = vec![HexBytes::default(), HexBytes::default()];
        }
        let before = tpl.clone();
        assert!(matches!(
            sign_template(&mut tpl, &xprv),
            Err(SignError::TooManySignatures { keys: 1, signatures: 2, .. })
        ));
        assert_eq!(tpl, before);
    }
}
