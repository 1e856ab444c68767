//! LEB128 codec over raw byte slices.
//!
//! These functions only know about 64-bit containers. Narrower widths (u32, s33, i32) and
//! absolute offsets are layered on by the cursor.

use thiserror::Error;

/// Longest encoding of a 64-bit value.
pub const MAX_LEN_64: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Leb128Error {
    #[error("LEB128 value not terminated after {read} byte(s)")]
    Unterminated { read: usize },

    #[error("LEB128 value does not fit in 64 bits")]
    Overflow,

    #[error("cannot encode negative number {0} as unsigned LEB128")]
    NegativeInput(i64),
}

/// Decode an unsigned LEB128 value from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed. Bytes after the terminating byte
/// (the first one with the high bit clear) are never looked at.
pub fn decode_unsigned(bytes: &[u8]) -> Result<(u64, usize), Leb128Error> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (index, &byte) in bytes.iter().enumerate() {
        let low = u64::from(byte & 0x7F);
        // the tenth byte only has room for bit 63
        if shift == 63 && (low > 1 || byte & 0x80 != 0) {
            return Err(Leb128Error::Overflow);
        }
        result |= low << shift;
        if byte & 0x80 == 0 {
            return Ok((result, index + 1));
        }
        shift += 7;
    }

    Err(Leb128Error::Unterminated { read: bytes.len() })
}

/// Decode a signed LEB128 value from the front of `bytes`.
///
/// Sign extension happens from bit `7 * consumed - 1`, i.e. bit 6 of the final byte.
pub fn decode_signed(bytes: &[u8]) -> Result<(i64, usize), Leb128Error> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    for (index, &byte) in bytes.iter().enumerate() {
        let low = i64::from(byte & 0x7F);
        // tenth byte: only the sign bit is left, so the payload must be all zeros or all ones
        if shift == 63 && (byte & 0x80 != 0 || (low != 0 && low != 0x7F)) {
            return Err(Leb128Error::Overflow);
        }
        result |= low << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                result |= -1i64 << shift;
            }
            return Ok((result, index + 1));
        }
    }

    Err(Leb128Error::Unterminated { read: bytes.len() })
}

/// Encode `value` as unsigned LEB128, low groups first.
pub fn encode_unsigned(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_LEN_64);
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if value == 0 {
            return out;
        }
    }
}

/// Like [`encode_unsigned`] but for a signed input, rejecting negative numbers.
pub fn try_encode_unsigned(value: i64) -> Result<Vec<u8>, Leb128Error> {
    u64::try_from(value)
        .map(encode_unsigned)
        .map_err(|_| Leb128Error::NegativeInput(value))
}

/// Encode `value` as signed LEB128 using the shortest form.
pub fn encode_signed(mut value: i64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_LEN_64);
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}
