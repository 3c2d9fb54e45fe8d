//! Wire primitives for the canonical transaction format.
//!
//! Integers are unsigned LEB128. Two bounded flavours exist on the wire:
//! `varint63` (at most 2^63 - 1) for amounts and counters and `varint31`
//! (at most 2^31 - 1) for lengths. A `varstr` is a varint31 length followed by
//! that many bytes; an *extensible string* is a varstr whose tail, after the
//! known fields, is kept verbatim as a suffix so future fields survive a
//! parse/serialize cycle.

use thiserror::Error;

const MAX_VARINT63: u64 = i64::MAX as u64;
const MAX_VARINT31: u64 = i32::MAX as u64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("varint overflows 64 bits")]
    VarintOverflow,

    #[error("{what} value {value} out of range")]
    OutOfRange { what: &'static str, value: u64 },

    #[error("{0} trailing byte(s) after transaction")]
    TrailingBytes(usize),

    #[error("unsupported serialization flags {0:#04x}")]
    UnsupportedSerFlags(u8),

    #[error("unsupported input type {0:#04x}")]
    UnsupportedInputType(u8),

    #[error("unsupported asset version {0}")]
    UnsupportedAssetVersion(u64),

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

pub fn write_uvarint(out: &mut Vec<u8>, mut n: u64) {
    while n >= 0x80 {
        out.push((n as u8) | 0x80);
        n >>= 7;
    }
    out.push(n as u8);
}

pub fn write_varstr(out: &mut Vec<u8>, data: &[u8]) {
    write_uvarint(out, data.len() as u64);
    out.extend_from_slice(data);
}

pub fn write_varstr_list(out: &mut Vec<u8>, items: &[Vec<u8>]) {
    write_uvarint(out, items.len() as u64);
    for item in items {
        write_varstr(out, item);
    }
}

/// Write an extensible string whose body is produced by `f`.
pub fn write_extstr<F: FnOnce(&mut Vec<u8>)>(out: &mut Vec<u8>, f: F) {
    let mut body = Vec::new();
    f(&mut body);
    write_varstr(out, &body);
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Everything not yet consumed.
    pub fn rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos..];
        self.pos = self.buf.len();
        rest
    }

    pub fn read_byte(&mut self) -> Result<u8, EncodingError> {
        let b = *self.buf.get(self.pos).ok_or(EncodingError::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], EncodingError> {
        if self.remaining() < n {
            return Err(EncodingError::UnexpectedEof);
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_hash(&mut self) -> Result<[u8; 32], EncodingError> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.read_bytes(32)?);
        Ok(out)
    }

    pub fn read_uvarint(&mut self) -> Result<u64, EncodingError> {
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let b = self.read_byte()?;
            if shift == 63 && b > 1 {
                return Err(EncodingError::VarintOverflow);
            }
            value |= u64::from(b & 0x7f) << shift;
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(EncodingError::VarintOverflow)
    }

    pub fn read_varint63(&mut self) -> Result<u64, EncodingError> {
        let value = self.read_uvarint()?;
        if value > MAX_VARINT63 {
            return Err(EncodingError::OutOfRange {
                what: "varint63",
                value,
            });
        }
        Ok(value)
    }

    pub fn read_varint31(&mut self) -> Result<u64, EncodingError> {
        let value = self.read_uvarint()?;
        if value > MAX_VARINT31 {
            return Err(EncodingError::OutOfRange {
                what: "varint31",
                value,
            });
        }
        Ok(value)
    }

    pub fn read_varstr(&mut self) -> Result<&'a [u8], EncodingError> {
        let len = self.read_varint31()? as usize;
        self.read_bytes(len)
    }

    pub fn read_varstr_list(&mut self) -> Result<Vec<Vec<u8>>, EncodingError> {
        let count = self.read_varint31()? as usize;
        // Each item needs at least one length byte; caps the allocation.
        if count > self.remaining() {
            return Err(EncodingError::UnexpectedEof);
        }
        (0..count)
            .map(|_| self.read_varstr().map(<[u8]>::to_vec))
            .collect()
    }

    /// Read an extensible string, run `f` on its body and return what `f`
    /// produced together with the unread suffix.
    pub fn read_extstr<T, F>(&mut self, f: F) -> Result<(T, Vec<u8>), EncodingError>
    where
        F: FnOnce(&mut Reader<'a>) -> Result<T, EncodingError>,
    {
        let body = self.read_varstr()?;
        let mut sub = Reader::new(body);
        let value = f(&mut sub)?;
        Ok((value, sub.rest().to_vec()))
    }
}
