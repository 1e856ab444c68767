//! Binary format decoding: LEB128, the byte cursor, shared type readers, instructions and
//! the section framework.

pub mod cursor;
pub mod instructions;
pub mod leb128;
pub mod reader;
pub mod sections;
