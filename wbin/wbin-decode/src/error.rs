//! Crate-level error type for wbin-decode.

use thiserror::Error;

/// Result alias used throughout the decoder.
pub type Result<T> = core::result::Result<T, DecodeError>;

/// Everything that can stop a decode. All offsets are absolute positions in the input buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed header at offset {offset}: expected {expected:02x?}, found {found:02x?}")]
    MalformedHeader {
        offset: usize,
        expected: Vec<u8>,
        found: Vec<u8>,
    },

    #[error("unexpected end of input at offset {offset} (needed {needed} more byte(s))")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("integer at offset {offset} does not fit in {bits} bits")]
    IntegerOverflow { offset: usize, bits: u32 },

    #[error("unknown opcode {} at offset {offset}", render_opcode(.opcode, .sub_opcode))]
    UnknownOpcode {
        offset: usize,
        opcode: u8,
        sub_opcode: Option<u32>,
    },

    #[error("not yet supported at offset {offset}: {what}")]
    Unsupported { offset: usize, what: String },

    #[error("section {id} at offset {offset} is out of order (previous section was {previous})")]
    SectionOrderViolation { offset: usize, id: u8, previous: u8 },

    #[error("malformed binary at offset {offset}: {msg}")]
    Malformed { offset: usize, msg: String },

    #[error("control nesting at offset {offset} exceeds the limit of {limit}")]
    NestingTooDeep { offset: usize, limit: u32 },

    #[error("function body at offset {offset} declares more than {limit} locals")]
    TooManyLocals { offset: usize, limit: u32 },

    /// The decoder's own bookkeeping is wrong; this is a bug, never the input's fault.
    #[error("internal decoder error at offset {offset}: {msg}")]
    Internal { offset: usize, msg: &'static str },
}

fn render_opcode(opcode: &u8, sub_opcode: &Option<u32>) -> String {
    match sub_opcode {
        Some(sub) => format!("0x{opcode:02X} {sub}"),
        None => format!("0x{opcode:02X}"),
    }
}

/// Fieldless classification of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedHeader,
    UnexpectedEof,
    IntegerOverflow,
    UnknownOpcode,
    Unsupported,
    SectionOrderViolation,
    Malformed,
    NestingTooDeep,
    TooManyLocals,
    Internal,
}

impl ErrorKind {
    /// True when the failure points at a decoder bug rather than at bad input.
    pub fn is_defect(self) -> bool {
        matches!(self, ErrorKind::Internal)
    }
}

impl DecodeError {
    pub(crate) fn malformed(offset: usize, msg: impl Into<String>) -> Self {
        DecodeError::Malformed {
            offset,
            msg: msg.into(),
        }
    }

    pub(crate) fn unsupported(offset: usize, what: impl Into<String>) -> Self {
        DecodeError::Unsupported {
            offset,
            what: what.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            DecodeError::UnexpectedEof { .. } => ErrorKind::UnexpectedEof,
            DecodeError::IntegerOverflow { .. } => ErrorKind::IntegerOverflow,
            DecodeError::UnknownOpcode { .. } => ErrorKind::UnknownOpcode,
            DecodeError::Unsupported { .. } => ErrorKind::Unsupported,
            DecodeError::SectionOrderViolation { .. } => ErrorKind::SectionOrderViolation,
            DecodeError::Malformed { .. } => ErrorKind::Malformed,
            DecodeError::NestingTooDeep { .. } => ErrorKind::NestingTooDeep,
            DecodeError::TooManyLocals { .. } => ErrorKind::TooManyLocals,
            DecodeError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Byte offset the failure was detected at.
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::MalformedHeader { offset, .. }
            | DecodeError::UnexpectedEof { offset, .. }
            | DecodeError::IntegerOverflow { offset, .. }
            | DecodeError::UnknownOpcode { offset, .. }
            | DecodeError::Unsupported { offset, .. }
            | DecodeError::SectionOrderViolation { offset, .. }
            | DecodeError::Malformed { offset, .. }
            | DecodeError::NestingTooDeep { offset, .. }
            | DecodeError::TooManyLocals { offset, .. }
            | DecodeError::Internal { offset, .. } => *offset,
        }
    }
}
