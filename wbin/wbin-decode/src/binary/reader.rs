//! Higher-level binary helpers: names, byte vectors, and the small type grammars shared by
//! the section and instruction decoders.

use super::cursor::Cursor;
use crate::error::{DecodeError, Result};
use crate::model::{
    BlockType, FuncType, GlobalType, Limits, MemArg, MemoryType, Mutability, Name, RefType,
    TableType, ValType,
};

/// Marker byte in front of every function type.
pub const FUNC_TYPE_FORM: u8 = 0x60;
/// Block type byte for "no params, no results".
pub const EMPTY_BLOCK_TYPE: u8 = 0x40;

/// Read a length-prefixed vector of raw bytes.
pub fn read_byte_vec(cur: &mut Cursor) -> Result<Vec<u8>> {
    let len = cur.read_u32()? as usize;
    Ok(cur.read_bytes(len)?.to_vec())
}

/// Read a name. The bytes are not checked for UTF-8.
pub fn read_name(cur: &mut Cursor) -> Result<Name> {
    read_byte_vec(cur).map(Name)
}

pub fn read_val_type(cur: &mut Cursor) -> Result<ValType> {
    let offset = cur.offset();
    let b = cur.read_u8()?;
    ValType::from_byte(b)
        .ok_or_else(|| DecodeError::malformed(offset, format!("invalid value type 0x{b:02X}")))
}

pub fn read_ref_type(cur: &mut Cursor) -> Result<RefType> {
    let offset = cur.offset();
    let b = cur.read_u8()?;
    RefType::from_byte(b)
        .ok_or_else(|| DecodeError::malformed(offset, format!("invalid reference type 0x{b:02X}")))
}

pub fn read_limits(cur: &mut Cursor) -> Result<Limits> {
    let offset = cur.offset();
    match cur.read_u8()? {
        0x00 => Ok(Limits::new(cur.read_u32()?, None)),
        0x01 => {
            let min = cur.read_u32()?;
            let max = cur.read_u32()?;
            Ok(Limits::new(min, Some(max)))
        }
        tag => Err(DecodeError::malformed(
            offset,
            format!("invalid limits flag 0x{tag:02X}"),
        )),
    }
}

pub fn read_func_type(cur: &mut Cursor) -> Result<FuncType> {
    let offset = cur.offset();
    let form = cur.read_u8()?;
    if form != FUNC_TYPE_FORM {
        return Err(DecodeError::malformed(
            offset,
            format!("expected functype header 0x60, got 0x{form:02X}"),
        ));
    }
    let params = cur.read_vec(read_val_type)?;
    let results = cur.read_vec(read_val_type)?;
    Ok(FuncType { params, results })
}

pub fn read_table_type(cur: &mut Cursor) -> Result<TableType> {
    let elem = read_ref_type(cur)?;
    let limits = read_limits(cur)?;
    Ok(TableType { elem, limits })
}

pub fn read_memory_type(cur: &mut Cursor) -> Result<MemoryType> {
    let limits = read_limits(cur)?;
    Ok(MemoryType { limits })
}

pub fn read_global_type(cur: &mut Cursor) -> Result<GlobalType> {
    let val_type = read_val_type(cur)?;
    let offset = cur.offset();
    let mutability = match cur.read_u8()? {
        0x00 => Mutability::Const,
        0x01 => Mutability::Var,
        b => {
            return Err(DecodeError::malformed(
                offset,
                format!("invalid global mutability 0x{b:02X}"),
            ))
        }
    };
    Ok(GlobalType::new(val_type, mutability))
}

/// Block type: `0x40`, a value type byte, or a non-negative s33 type index.
pub fn read_block_type(cur: &mut Cursor) -> Result<BlockType> {
    let offset = cur.offset();
    let b = cur.peek_u8().ok_or(DecodeError::UnexpectedEof { offset, needed: 1 })?;
    if b == EMPTY_BLOCK_TYPE {
        cur.read_u8()?;
        return Ok(BlockType::Empty);
    }
    if let Some(ty) = ValType::from_byte(b) {
        cur.read_u8()?;
        return Ok(BlockType::Value(ty));
    }
    let index = cur.read_s33()?;
    u32::try_from(index)
        .map(BlockType::TypeIndex)
        .map_err(|_| DecodeError::malformed(offset, format!("invalid block type {index}")))
}

pub fn read_memarg(cur: &mut Cursor) -> Result<MemArg> {
    let align = cur.read_u32()?;
    let offset = cur.read_u32()?;
    Ok(MemArg { align, offset })
}
