//! Control programs and witness scripts.
//!
//! Only the handful of program shapes the builder emits are covered here:
//! the two version-0 witness programs, retirement, and the 1-of-N
//! multisig witness script that sits behind a pay-to-witness-script-hash
//! address.

use thiserror::Error;

use crate::crypto::sha3_256;

pub const OP_0: u8 = 0x00;
pub const OP_1: u8 = 0x51;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_FAIL: u8 = 0x6a;
pub const OP_CHECKMULTISIG: u8 = 0xad;
pub const OP_TXSIGHASH: u8 = 0xae;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("bad multisig parameters: {required} of {keys}")]
    BadMultisigParams { required: usize, keys: usize },
}

/// Append a minimal push of `data`.
pub fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    match len {
        0 => out.push(OP_0),
        1..=75 => out.push(len as u8),
        76..=0xff => {
            out.push(OP_PUSHDATA1);
            out.push(len as u8);
        }
        0x100..=0xffff => {
            out.push(OP_PUSHDATA2);
            out.extend_from_slice(&(len as u16).to_le_bytes());
        }
        _ => {
            out.push(OP_PUSHDATA4);
            out.extend_from_slice(&(len as u32).to_le_bytes());
        }
    }
    out.extend_from_slice(data);
}

/// Append a push of a non-negative integer: `OP_0`..`OP_16` for small
/// values, otherwise the little-endian bytes with trailing zeros trimmed.
pub fn push_int(out: &mut Vec<u8>, n: u64) {
    match n {
        0 => out.push(OP_0),
        1..=16 => out.push(OP_1 + (n as u8) - 1),
        _ => {
            let bytes = n.to_le_bytes();
            let used = 8 - (n.leading_zeros() as usize / 8);
            push_data(out, &bytes[..used]);
        }
    }
}

/// `OP_0 <20-byte pubkey hash>`
pub fn p2wpkh_program(hash: &[u8; 20]) -> Vec<u8> {
    let mut prog = Vec::with_capacity(22);
    prog.push(OP_0);
    push_data(&mut prog, hash);
    prog
}

/// `OP_0 <32-byte script hash>`
pub fn p2wsh_program(hash: &[u8; 32]) -> Vec<u8> {
    let mut prog = Vec::with_capacity(34);
    prog.push(OP_0);
    push_data(&mut prog, hash);
    prog
}

/// A program nobody can satisfy: outputs carrying it destroy their value.
/// A non-empty `comment` is pushed after `OP_FAIL`.
pub fn retirement_program(comment: &[u8]) -> Vec<u8> {
    let mut prog = vec![OP_FAIL];
    if !comment.is_empty() {
        push_data(&mut prog, comment);
    }
    prog
}

/// True for programs that begin with `OP_FAIL`.
pub fn is_unspendable(program: &[u8]) -> bool {
    program.first() == Some(&OP_FAIL)
}

/// `TXSIGHASH <pk>... <required> <n> CHECKMULTISIG`
pub fn multisig_script(pubkeys: &[[u8; 32]], required: usize) -> Result<Vec<u8>, ProgramError> {
    if pubkeys.is_empty() || required == 0 || required > pubkeys.len() {
        return Err(ProgramError::BadMultisigParams {
            required,
            keys: pubkeys.len(),
        });
    }
    let mut script = vec![OP_TXSIGHASH];
    for pk in pubkeys {
        push_data(&mut script, pk);
    }
    push_int(&mut script, required as u64);
    push_int(&mut script, pubkeys.len() as u64);
    script.push(OP_CHECKMULTISIG);
    Ok(script)
}

/// Hash committed to by a pay-to-witness-script-hash program.
pub fn script_hash(script: &[u8]) -> [u8; 32] {
    sha3_256(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_data_boundaries() {
        let mut out = Vec::new();
        push_data(&mut out, &[]);
        assert_eq!(out, vec![OP_0]);

        let mut out = Vec::new();
        push_data(&mut out, &[7u8; 75]);
        assert_eq!(out[0], 75);
        assert_eq!(out.len(), 76);

        let mut out = Vec::new();
        push_data(&mut out, &[7u8; 76]);
        assert_eq!(&out[..2], &[OP_PUSHDATA1, 76]);

        let mut out = Vec::new();
        push_data(&mut out, &[7u8; 256]);
        assert_eq!(&out[..3], &[OP_PUSHDATA2, 0x00, 0x01]);
    }

    #[test]
    fn push_int_small_and_large() {
        let mut out = Vec::new();
        push_int(&mut out, 0);
        push_int(&mut out, 1);
        push_int(&mut out, 16);
        assert_eq!(out, vec![0x00, 0x51, 0x60]);

        let mut out = Vec::new();
        push_int(&mut out, 300);
        assert_eq!(out, vec![0x02, 0x2c, 0x01]);
    }

    #[test]
    fn witness_programs() {
        let p = p2wpkh_program(&[0xab; 20]);
        assert_eq!(&p[..2], &[0x00, 0x14]);
        assert_eq!(p.len(), 22);

        let p = p2wsh_program(&[0xcd; 32]);
        assert_eq!(&p[..2], &[0x00, 0x20]);
        assert_eq!(p.len(), 34);
    }

    #[test]
    fn retirement_is_unspendable() {
        assert_eq!(retirement_program(&[]), vec![OP_FAIL]);
        assert_eq!(retirement_program(b"bye"), vec![OP_FAIL, 3, b'b', b'y', b'e']);
        assert!(is_unspendable(&retirement_program(b"bye")));
        assert!(!is_unspendable(&p2wpkh_program(&[0; 20])));
        assert!(!is_unspendable(&[]));
    }

    #[test]
    fn one_of_one_multisig_layout() {
        let pk = [9u8; 32];
        let script = multisig_script(&[pk], 1).unwrap();
        assert_eq!(script[0], OP_TXSIGHASH);
        assert_eq!(script[1], 0x20);
        assert_eq!(&script[2..34], &pk);
        assert_eq!(&script[34..], &[0x51, 0x51, OP_CHECKMULTISIG]);
    }

    #[test]
    fn multisig_rejects_bad_quorum() {
        assert!(multisig_script(&[], 1).is_err());
        assert!(multisig_script(&[[1; 32]], 0).is_err());
        assert!(multisig_script(&[[1; 32]], 2).is_err());
    }
}
