//! Core type definitions for transactions.
//!
//! These types form the vocabulary of every transaction we build: 32-byte
//! identifiers, hex byte strings, input/output commitments and the
//! transaction body itself ([`TxData`]), which owns its own canonical
//! serialization.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use super::encoding::{
    write_extstr, write_uvarint, write_varstr, write_varstr_list, EncodingError, Reader,
};
use crate::config::{ASSET_VERSION, SERIALIZATION_FLAGS, TX_VERSION, VM_VERSION};

const SPEND_INPUT_TYPE: u8 = 0x01;

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

fn decode_hex(s: &str) -> Result<Vec<u8>, EncodingError> {
    hex::decode(s).map_err(|e| EncodingError::InvalidHex(e.to_string()))
}

// ---------------------------------------------------------------------------
// 32-byte identifiers
// ---------------------------------------------------------------------------

macro_rules! hex32 {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = EncodingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = decode_hex(s)?;
                let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    EncodingError::InvalidHex(format!("expected 32 bytes, got {}", bytes.len()))
                })?;
                Ok(Self(arr))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serialize_hex(&self.0, serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex32! {
    /// A 32-byte entry hash: output IDs, source IDs, transaction IDs.
    Hash
}

hex32! {
    /// A 32-byte asset identifier. All zeros means "not set".
    AssetId
}

// ---------------------------------------------------------------------------
// HexBytes
// ---------------------------------------------------------------------------

/// A byte string that travels as lowercase hex in JSON.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct HexBytes(pub Vec<u8>);

impl Deref for HexBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for HexBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Debug for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexBytes({})", hex::encode(&self.0))
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hex(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_hex(&s).map(HexBytes).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// What a spend input commits to: the previous output it consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendCommitment {
    pub source_id: Hash,
    pub asset_id: AssetId,
    pub amount: u64,
    pub source_position: u64,
    pub vm_version: u64,
    pub control_program: Vec<u8>,
    /// Unknown trailing commitment fields, preserved verbatim.
    pub suffix: Vec<u8>,
}

/// A spend input with its witness arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub spend: SpendCommitment,
    pub commitment_suffix: Vec<u8>,
    /// Witness arguments: signatures followed by data pushes.
    pub arguments: Vec<Vec<u8>>,
    pub witness_suffix: Vec<u8>,
}

impl TxInput {
    /// A spend of output `source_position` of `source_id`, no arguments yet.
    pub fn spend(
        source_id: Hash,
        asset_id: AssetId,
        amount: u64,
        source_position: u64,
        control_program: Vec<u8>,
    ) -> Self {
        Self {
            spend: SpendCommitment {
                source_id,
                asset_id,
                amount,
                source_position,
                vm_version: VM_VERSION,
                control_program,
                suffix: Vec::new(),
            },
            commitment_suffix: Vec::new(),
            arguments: Vec::new(),
            witness_suffix: Vec::new(),
        }
    }

    pub fn asset_id(&self) -> AssetId {
        self.spend.asset_id
    }

    pub fn amount(&self) -> u64 {
        self.spend.amount
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        write_uvarint(out, ASSET_VERSION);
        write_extstr(out, |c| {
            c.push(SPEND_INPUT_TYPE);
            write_extstr(c, |s| {
                let sc = &self.spend;
                s.extend_from_slice(sc.source_id.as_bytes());
                s.extend_from_slice(sc.asset_id.as_bytes());
                write_uvarint(s, sc.amount);
                write_uvarint(s, sc.source_position);
                write_uvarint(s, sc.vm_version);
                write_varstr(s, &sc.control_program);
                s.extend_from_slice(&sc.suffix);
            });
            c.extend_from_slice(&self.commitment_suffix);
        });
        write_extstr(out, |w| {
            write_varstr_list(w, &self.arguments);
            w.extend_from_slice(&self.witness_suffix);
        });
    }

    fn read_from(r: &mut Reader<'_>) -> Result<Self, EncodingError> {
        let asset_version = r.read_varint63()?;
        if asset_version != ASSET_VERSION {
            return Err(EncodingError::UnsupportedAssetVersion(asset_version));
        }

        let (spend, commitment_suffix) = r.read_extstr(|c| {
            let input_type = c.read_byte()?;
            if input_type != SPEND_INPUT_TYPE {
                return Err(EncodingError::UnsupportedInputType(input_type));
            }
            let (mut spend, suffix) = c.read_extstr(|s| {
                Ok(SpendCommitment {
                    source_id: Hash(s.read_hash()?),
                    asset_id: AssetId(s.read_hash()?),
                    amount: s.read_varint63()?,
                    source_position: s.read_varint63()?,
                    vm_version: s.read_varint63()?,
                    control_program: s.read_varstr()?.to_vec(),
                    suffix: Vec::new(),
                })
            })?;
            spend.suffix = suffix;
            Ok(spend)
        })?;

        let (arguments, witness_suffix) = r.read_extstr(|w| w.read_varstr_list())?;

        Ok(Self {
            spend,
            commitment_suffix,
            arguments,
            witness_suffix,
        })
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Asset, amount and the program that controls them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCommitment {
    pub asset_id: AssetId,
    pub amount: u64,
    pub vm_version: u64,
    pub control_program: Vec<u8>,
    pub suffix: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub commitment: OutputCommitment,
    pub witness_suffix: Vec<u8>,
}

impl TxOutput {
    pub fn new(asset_id: AssetId, amount: u64, control_program: Vec<u8>) -> Self {
        Self {
            commitment: OutputCommitment {
                asset_id,
                amount,
                vm_version: VM_VERSION,
                control_program,
                suffix: Vec::new(),
            },
            witness_suffix: Vec::new(),
        }
    }

    pub fn control_program(&self) -> &[u8] {
        &self.commitment.control_program
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        write_uvarint(out, ASSET_VERSION);
        write_extstr(out, |c| {
            let oc = &self.commitment;
            c.extend_from_slice(oc.asset_id.as_bytes());
            write_uvarint(c, oc.amount);
            write_uvarint(c, oc.vm_version);
            write_varstr(c, &oc.control_program);
            c.extend_from_slice(&oc.suffix);
        });
        write_varstr(out, &self.witness_suffix);
    }

    fn read_from(r: &mut Reader<'_>) -> Result<Self, EncodingError> {
        let asset_version = r.read_varint63()?;
        if asset_version != ASSET_VERSION {
            return Err(EncodingError::UnsupportedAssetVersion(asset_version));
        }
        let (mut commitment, suffix) = r.read_extstr(|c| {
            Ok(OutputCommitment {
                asset_id: AssetId(c.read_hash()?),
                amount: c.read_varint63()?,
                vm_version: c.read_varint63()?,
                control_program: c.read_varstr()?.to_vec(),
                suffix: Vec::new(),
            })
        })?;
        commitment.suffix = suffix;
        let witness_suffix = r.read_varstr()?.to_vec();
        Ok(Self {
            commitment,
            witness_suffix,
        })
    }
}

// ---------------------------------------------------------------------------
// TxData
// ---------------------------------------------------------------------------

/// The transaction body: everything that gets serialized into
/// `raw_transaction`.
///
/// In JSON a `TxData` is the hex of its canonical serialization, so a
/// template can be passed around as plain text and re-parsed losslessly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxData {
    pub version: u64,
    pub time_range: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl Default for TxData {
    fn default() -> Self {
        Self {
            version: TX_VERSION,
            time_range: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl TxData {
    /// Canonical serialization with all sections present.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![SERIALIZATION_FLAGS];
        write_uvarint(&mut out, self.version);
        write_uvarint(&mut out, self.time_range);
        write_uvarint(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            input.write_to(&mut out);
        }
        write_uvarint(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            output.write_to(&mut out);
        }
        out
    }

    /// Parse a full transaction. Trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        let mut r = Reader::new(bytes);
        let flags = r.read_byte()?;
        if flags != SERIALIZATION_FLAGS {
            return Err(EncodingError::UnsupportedSerFlags(flags));
        }
        let version = r.read_varint63()?;
        let time_range = r.read_varint63()?;

        let n_inputs = r.read_varint31()? as usize;
        let mut inputs = Vec::with_capacity(n_inputs.min(r.remaining()));
        for _ in 0..n_inputs {
            inputs.push(TxInput::read_from(&mut r)?);
        }

        let n_outputs = r.read_varint31()? as usize;
        let mut outputs = Vec::with_capacity(n_outputs.min(r.remaining()));
        for _ in 0..n_outputs {
            outputs.push(TxOutput::read_from(&mut r)?);
        }

        if !r.is_empty() {
            return Err(EncodingError::TrailingBytes(r.remaining()));
        }
        Ok(Self {
            version,
            time_range,
            inputs,
            outputs,
        })
    }
}

impl fmt::Display for TxData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for TxData {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&decode_hex(s)?)
    }
}

impl Serialize for TxData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSIGNED_VECTOR: &str = "07010001016c016a233d1dd49e591980f98e11f333c6c28a867e78448e272011f045131df5aa260bffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff80c0b1ca9412000121d34d78dfbf3d7fd75ed36e3669ae767756f871b7baf797f46fdddf69c6f66f6eba010000";

    fn vector_input() -> TxInput {
        TxInput::spend(
            "233d1dd49e591980f98e11f333c6c28a867e78448e272011f045131df5aa260b"
                .parse()
                .unwrap(),
            AssetId([0xff; 32]),
            624_000_000_000,
            0,
            hex::decode("d34d78dfbf3d7fd75ed36e3669ae767756f871b7baf797f46fdddf69c6f66f6eba")
                .unwrap(),
        )
    }

    #[test]
    fn serializes_known_vector() {
        let tx = TxData {
            inputs: vec![vector_input()],
            ..TxData::default()
        };
        assert_eq!(tx.to_string(), UNSIGNED_VECTOR);
    }

    #[test]
    fn parses_known_vector() {
        let tx: TxData = UNSIGNED_VECTOR.parse().unwrap();
        assert_eq!(tx.version, 1);
        assert_eq!(tx.time_range, 0);
        assert_eq!(tx.inputs, vec![vector_input()]);
        assert!(tx.outputs.is_empty());
    }

    #[test]
    fn witness_arguments_and_outputs_survive_reparse() {
        let mut input = vector_input();
        input.arguments = vec![vec![0xaa; 64], vec![0xbb; 32]];
        let tx = TxData {
            version: 1,
            time_range: 1_700_000,
            inputs: vec![input],
            outputs: vec![TxOutput::new(AssetId([1; 32]), 5, vec![0x6a])],
        };
        let bytes = tx.to_bytes();
        assert_eq!(TxData::from_bytes(&bytes).unwrap(), tx);
    }

    #[test]
    fn unknown_suffixes_are_preserved() {
        let mut input = vector_input();
        input.spend.suffix = vec![0x01, 0x02];
        input.witness_suffix = vec![0x03];
        let mut output = TxOutput::new(AssetId([2; 32]), 9, vec![0x51]);
        output.commitment.suffix = vec![0x04];
        let tx = TxData {
            inputs: vec![input],
            outputs: vec![output],
            ..TxData::default()
        };
        assert_eq!(TxData::from_bytes(&tx.to_bytes()).unwrap(), tx);
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = hex::decode(UNSIGNED_VECTOR).unwrap();
        bytes.push(0x00);
        assert_eq!(
            TxData::from_bytes(&bytes).unwrap_err(),
            EncodingError::TrailingBytes(1)
        );
    }

    #[test]
    fn rejects_other_serialization_flags() {
        let mut bytes = hex::decode(UNSIGNED_VECTOR).unwrap();
        bytes[0] = 0x03;
        assert_eq!(
            TxData::from_bytes(&bytes).unwrap_err(),
            EncodingError::UnsupportedSerFlags(0x03)
        );
    }

    #[test]
    fn rejects_non_spend_inputs() {
        let mut bytes = hex::decode(UNSIGNED_VECTOR).unwrap();
        // flags, version, time_range, n_inputs, asset_version, extstr len, type
        bytes[6] = 0x00;
        assert_eq!(
            TxData::from_bytes(&bytes).unwrap_err(),
            EncodingError::UnsupportedInputType(0x00)
        );
    }

    #[test]
    fn hex_ids_serde() {
        let id: Hash = serde_json::from_str(
            "\"5af9d3c9b69470983377c1fc0c9125c4ac3bfd32c8d505f2a6042aade8503bc9\"",
        )
        .unwrap();
        assert_eq!(id.0[0], 0x5a);
        assert!(serde_json::from_str::<AssetId>("\"abcd\"").is_err());
        assert!(AssetId::default().is_zero());
    }

    #[test]
    fn tx_data_json_is_hex() {
        let tx = TxData::default();
        assert_eq!(serde_json::to_string(&tx).unwrap(), "\"0701000000\"");
    }
}
