//! Low-level decoding primitives for the Square binary formats.
//!
//! This module provides:
//! - `ByteCursor`: a forward-only cursor over an in-memory byte buffer
//! - Scalar codecs for the fixed-width and length-prefixed field types
//! - `decode_group`: the schema engine that evaluates an ordered field
//!   specification against a buffer
//!
//! All multi-byte values are little-endian. The formats interleave
//! variable-length strings with fixed-width scalars, so records cannot be
//! unpacked in one block; each field is decoded in declaration order and the
//! cursor advances by exactly the bytes that field consumed.

use byteorder::{ByteOrder, LittleEndian};
use std::collections::HashMap;

use crate::error::{Result, SquareFormatError};

/// A read-only view over a byte buffer plus a monotonically increasing
/// offset. Reads never advance past the end of the buffer; a read that
/// requires unavailable bytes fails with `Truncated` and consumes nothing.
///
/// The cursor is `Copy`, which lets callers probe a decode and commit the
/// position only on success.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The unread tail of the buffer. Does not advance the cursor.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Consumes exactly `n` bytes and returns them as a slice.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(SquareFormatError::Truncated {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Consumes and discards exactly `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads one byte as a boolean (any nonzero value is true).
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// Reads `count` little-endian doubles in one bounds-checked pass.
    pub fn read_f64_array(&mut self, count: usize) -> Result<Vec<f64>> {
        let raw = self.take(checked_array_size(count, 8)?)?;
        Ok(raw.chunks_exact(8).map(LittleEndian::read_f64).collect())
    }

    /// Reads `count` little-endian i32 values in one bounds-checked pass.
    pub fn read_i32_array(&mut self, count: usize) -> Result<Vec<i32>> {
        let raw = self.take(checked_array_size(count, 4)?)?;
        Ok(raw.chunks_exact(4).map(LittleEndian::read_i32).collect())
    }

    /// Reads `count` signed bytes in one bounds-checked pass.
    pub fn read_i8_array(&mut self, count: usize) -> Result<Vec<i8>> {
        let raw = self.take(count)?;
        Ok(raw.iter().map(|&b| b as i8).collect())
    }
}

fn checked_array_size(count: usize, width: usize) -> Result<usize> {
    count.checked_mul(width).ok_or_else(|| {
        SquareFormatError::Parse(format!(
            "array size overflow: {} elements of {} bytes",
            count, width
        ))
    })
}

/// An ordered field specification: `(wire name, codec)` pairs whose order is
/// the on-wire layout.
pub type FieldSpec = [(&'static str, Codec)];

/// The scalar codec set. Each codec consumes a known (or self-describing)
/// number of bytes and is side-effect-free: decoding the same buffer and
/// offset twice yields identical results.
#[derive(Debug, Clone, Copy)]
pub enum Codec {
    /// 8-byte little-endian float.
    Double,
    /// 4-byte unsigned integer.
    Uint32,
    /// 4-byte signed integer.
    Int32,
    /// 8-byte signed integer.
    Int64,
    /// 1 byte, nonzero is true.
    Boolean,
    /// One unsigned length byte followed by that many raw bytes.
    PString,
    /// Fixed-size block captured as raw bytes.
    Opaque(usize),
    /// Fixed-size block consumed and discarded; yields no value.
    Reserved(usize),
    /// A nested group decoded in place.
    Group(&'static FieldSpec),
}

impl Codec {
    /// Decodes one value, advancing `cur` only on success. `Reserved` blocks
    /// consume their bytes but yield `None`.
    pub fn decode(&self, cur: &mut ByteCursor<'_>) -> Result<Option<Value>> {
        let mut probe = *cur;
        let value = self.decode_inner(&mut probe)?;
        *cur = probe;
        Ok(value)
    }

    fn decode_inner(&self, cur: &mut ByteCursor<'_>) -> Result<Option<Value>> {
        match self {
            Codec::Double => Ok(Some(Value::Double(cur.read_f64()?))),
            Codec::Uint32 => Ok(Some(Value::Uint32(cur.read_u32()?))),
            Codec::Int32 => Ok(Some(Value::Int32(cur.read_i32()?))),
            Codec::Int64 => Ok(Some(Value::Int64(cur.read_i64()?))),
            Codec::Boolean => Ok(Some(Value::Boolean(cur.read_bool()?))),
            Codec::PString => {
                let len = cur.read_u8()? as usize;
                let raw = cur.take(len)?;
                // Lossy fallback: these fields carry operator-entered text and
                // the instrument does not guarantee an encoding.
                Ok(Some(Value::Str(String::from_utf8_lossy(raw).into_owned())))
            }
            Codec::Opaque(n) => Ok(Some(Value::Bytes(cur.take(*n)?.to_vec()))),
            Codec::Reserved(n) => {
                cur.skip(*n)?;
                Ok(None)
            }
            Codec::Group(spec) => Ok(Some(Value::Group(decode_group(spec, cur)?))),
        }
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Uint32(u32),
    Int32(i32),
    Int64(i64),
    Boolean(bool),
    Str(String),
    Bytes(Vec<u8>),
    Group(GroupValue),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::Uint32(_) => "uint32",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Boolean(_) => "boolean",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Group(_) => "group",
        }
    }
}

/// A decoded record: field name → value, plus the total bytes the record
/// consumed. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupValue {
    fields: HashMap<&'static str, Value>,
    length: usize,
}

impl GroupValue {
    /// Total bytes this group consumed, reserved blocks included.
    pub fn byte_len(&self) -> usize {
        self.length
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.fields
            .get(name)
            .ok_or_else(|| SquareFormatError::Schema(format!("missing field '{}'", name)))
    }

    fn mismatch(name: &str, expected: &str, found: &Value) -> SquareFormatError {
        SquareFormatError::Schema(format!(
            "field '{}' is {}, expected {}",
            name,
            found.kind(),
            expected
        ))
    }

    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            Value::Double(v) => Ok(*v),
            other => Err(Self::mismatch(name, "double", other)),
        }
    }

    pub fn get_u32(&self, name: &str) -> Result<u32> {
        match self.require(name)? {
            Value::Uint32(v) => Ok(*v),
            other => Err(Self::mismatch(name, "uint32", other)),
        }
    }

    pub fn get_i32(&self, name: &str) -> Result<i32> {
        match self.require(name)? {
            Value::Int32(v) => Ok(*v),
            other => Err(Self::mismatch(name, "int32", other)),
        }
    }

    pub fn get_i64(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            Value::Int64(v) => Ok(*v),
            other => Err(Self::mismatch(name, "int64", other)),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.require(name)? {
            Value::Boolean(v) => Ok(*v),
            other => Err(Self::mismatch(name, "boolean", other)),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            Value::Str(v) => Ok(v.as_str()),
            other => Err(Self::mismatch(name, "string", other)),
        }
    }

    pub fn get_bytes(&self, name: &str) -> Result<&[u8]> {
        match self.require(name)? {
            Value::Bytes(v) => Ok(v.as_slice()),
            other => Err(Self::mismatch(name, "bytes", other)),
        }
    }

    /// Reads an integer field as an element count. Negative counts are
    /// malformed data, not a schema problem.
    pub fn get_count(&self, name: &str) -> Result<usize> {
        match self.require(name)? {
            Value::Uint32(v) => Ok(*v as usize),
            Value::Int32(v) if *v >= 0 => Ok(*v as usize),
            Value::Int32(v) => Err(SquareFormatError::Parse(format!(
                "field '{}' holds negative count {}",
                name, v
            ))),
            other => Err(Self::mismatch(name, "integer count", other)),
        }
    }
}

/// Evaluates an ordered field specification against the buffer, starting at
/// the cursor position. Fields are decoded strictly in declaration order;
/// failure of any field aborts the decode and leaves the cursor unmoved.
pub fn decode_group(spec: &'static FieldSpec, cur: &mut ByteCursor<'_>) -> Result<GroupValue> {
    let mut probe = *cur;
    let start = probe.position();
    let mut fields = HashMap::with_capacity(spec.len());

    for (name, codec) in spec {
        if let Some(value) = codec.decode_inner(&mut probe)? {
            fields.insert(*name, value);
        }
    }

    let length = probe.position() - start;
    *cur = probe;
    Ok(GroupValue { fields, length })
}
