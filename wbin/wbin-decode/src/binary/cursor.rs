//! Byte cursor with absolute offset tracking and bounds-checked primitives.

use super::leb128::{self, Leb128Error};
use crate::error::{DecodeError, Result};

/// Cursor over a byte slice.
///
/// A cursor carved out of a larger one with [`Cursor::sub_cursor`] keeps reporting offsets
/// relative to the original buffer, so errors always point at the real input position.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Absolute byte offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Remaining unread length.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// True if at end of input.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Next byte without advancing; `None` at end of input.
    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let b = self.peek_u8().ok_or(DecodeError::UnexpectedEof {
            offset: self.offset(),
            needed: 1,
        })?;
        self.advance(1)?;
        Ok(b)
    }

    /// Read exactly n bytes and return a slice view into the underlying data.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.offset(),
                needed: n - self.remaining(),
            });
        }
        let slice = self.rest()?.get(..n).ok_or(DecodeError::Internal {
            offset: self.offset(),
            msg: "slice shorter than remaining length",
        })?;
        self.advance(n)?;
        Ok(slice)
    }

    /// Consume the next `n` bytes as an independent cursor that keeps absolute offsets.
    pub fn sub_cursor(&mut self, n: usize) -> Result<Cursor<'a>> {
        let base = self.offset();
        let data = self.read_bytes(n)?;
        Ok(Cursor { data, pos: 0, base })
    }

    /// Consume `expected.len()` bytes that must equal `expected` (magic and version fields).
    /// Nothing is consumed on mismatch.
    pub fn expect_const(&mut self, expected: &[u8]) -> Result<()> {
        let rest = self.rest()?;
        let found = &rest[..expected.len().min(rest.len())];
        if found != expected {
            return Err(DecodeError::MalformedHeader {
                offset: self.offset(),
                expected: expected.to_vec(),
                found: found.to_vec(),
            });
        }
        self.advance(expected.len())
    }

    /// Unsigned LEB128 bounded to 32 bits.
    pub fn read_u32(&mut self) -> Result<u32> {
        let offset = self.offset();
        let v = self.read_unsigned(32)?;
        u32::try_from(v).map_err(|_| DecodeError::IntegerOverflow { offset, bits: 32 })
    }

    /// Signed LEB128 bounded to 32 bits.
    pub fn read_i32(&mut self) -> Result<i32> {
        let offset = self.offset();
        let v = self.read_signed(32)?;
        i32::try_from(v).map_err(|_| DecodeError::IntegerOverflow { offset, bits: 32 })
    }

    /// Signed LEB128 bounded to 64 bits.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_signed(64)
    }

    /// Signed LEB128 bounded to 33 bits (block type indices).
    pub fn read_s33(&mut self) -> Result<i64> {
        const MIN: i64 = -(1 << 32);
        const MAX: i64 = (1 << 32) - 1;
        let offset = self.offset();
        let v = self.read_signed(33)?;
        if !(MIN..=MAX).contains(&v) {
            return Err(DecodeError::IntegerOverflow { offset, bits: 33 });
        }
        Ok(v)
    }

    /// Little-endian IEEE-754 single, returned as raw bits.
    pub fn read_f32_bits(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Little-endian IEEE-754 double, returned as raw bits.
    pub fn read_f64_bits(&mut self) -> Result<u64> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a u32 count, then call `elem` exactly that many times.
    pub fn read_vec<T, F>(&mut self, mut elem: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Cursor<'a>) -> Result<T>,
    {
        let len = self.read_u32()? as usize;
        // a hostile count must not turn into a huge allocation before the data runs out
        let mut out = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            out.push(elem(self)?);
        }
        Ok(out)
    }

    fn read_unsigned(&mut self, bits: u32) -> Result<u64> {
        let offset = self.offset();
        let (value, len) =
            leb128::decode_unsigned(self.rest()?).map_err(|e| self.leb_error(e, offset, bits))?;
        self.advance(len)?;
        Ok(value)
    }

    fn read_signed(&mut self, bits: u32) -> Result<i64> {
        let offset = self.offset();
        let (value, len) =
            leb128::decode_signed(self.rest()?).map_err(|e| self.leb_error(e, offset, bits))?;
        self.advance(len)?;
        Ok(value)
    }

    fn leb_error(&self, e: Leb128Error, offset: usize, bits: u32) -> DecodeError {
        match e {
            Leb128Error::Unterminated { read } => DecodeError::UnexpectedEof {
                offset: offset + read,
                needed: 1,
            },
            Leb128Error::Overflow => DecodeError::IntegerOverflow { offset, bits },
            Leb128Error::NegativeInput(_) => DecodeError::Internal {
                offset,
                msg: "encoder error while decoding",
            },
        }
    }

    fn rest(&self) -> Result<&'a [u8]> {
        self.data.get(self.pos..).ok_or(DecodeError::Internal {
            offset: self.offset(),
            msg: "cursor positioned past end of buffer",
        })
    }

    /// Move forward by `n`; every primitive funnels through here so the overrun check
    /// runs after each read.
    fn advance(&mut self, n: usize) -> Result<()> {
        self.pos = self.pos.checked_add(n).ok_or(DecodeError::Internal {
            offset: self.offset(),
            msg: "cursor position overflow",
        })?;
        if self.pos > self.data.len() {
            return Err(DecodeError::Internal {
                offset: self.offset(),
                msg: "cursor advanced past end of buffer",
            });
        }
        Ok(())
    }
}
