//! Instruction decoding: one flat dispatch over the opcode byte, a nested dispatch for the
//! `0xFC` family, and recursion for `block`/`loop`/`if` bodies.

use super::cursor::Cursor;
use super::reader::{read_block_type, read_memarg, read_ref_type, read_val_type};
use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::model::{Expr, Instruction};

pub mod op {
    pub const UNREACHABLE: u8 = 0x00;
    pub const NOP: u8 = 0x01;
    pub const BLOCK: u8 = 0x02;
    pub const LOOP: u8 = 0x03;
    pub const IF: u8 = 0x04;
    pub const ELSE: u8 = 0x05;
    pub const END: u8 = 0x0B;

    pub const MEMORY_SIZE: u8 = 0x3F;
    pub const MEMORY_GROW: u8 = 0x40;

    /// Saturating truncation, bulk memory and table instructions.
    pub const PREFIX_FC: u8 = 0xFC;
    /// Vector instructions.
    pub const PREFIX_FD: u8 = 0xFD;

    /// Highest sub-opcode defined under the vector prefix.
    pub const MAX_VECTOR_SUB_OPCODE: u32 = 0x113;
}

/// How an instruction sequence ended.
enum Terminator {
    End,
    Else { offset: usize },
}

/// Read an expression up to and including its `end`.
pub fn read_expr(cur: &mut Cursor, config: &DecoderConfig) -> Result<Expr> {
    read_nested(cur, config, 0)
}

/// Body of `block` or `loop`, or a whole expression at depth 0.
fn read_nested(cur: &mut Cursor, config: &DecoderConfig, depth: u32) -> Result<Expr> {
    match read_sequence(cur, config, depth)? {
        (instrs, Terminator::End) => Ok(Expr(instrs)),
        (_, Terminator::Else { offset }) => {
            Err(DecodeError::malformed(offset, "`else` outside of `if`"))
        }
    }
}

fn read_sequence(
    cur: &mut Cursor,
    config: &DecoderConfig,
    depth: u32,
) -> Result<(Vec<Instruction>, Terminator)> {
    let mut instrs = Vec::new();
    loop {
        let offset = cur.offset();
        match cur.peek_u8() {
            None => return Err(DecodeError::UnexpectedEof { offset, needed: 1 }),
            Some(op::END) => {
                cur.read_u8()?;
                return Ok((instrs, Terminator::End));
            }
            Some(op::ELSE) => {
                cur.read_u8()?;
                return Ok((instrs, Terminator::Else { offset }));
            }
            Some(_) => instrs.push(read_instr(cur, config, depth)?),
        }
    }
}

fn enter(config: &DecoderConfig, depth: u32, offset: usize) -> Result<u32> {
    let next = depth + 1;
    if next > config.max_nesting_depth {
        return Err(DecodeError::NestingTooDeep {
            offset,
            limit: config.max_nesting_depth,
        });
    }
    Ok(next)
}

fn read_if(cur: &mut Cursor, config: &DecoderConfig, depth: u32) -> Result<Instruction> {
    let ty = read_block_type(cur)?;
    let (then_instrs, term) = read_sequence(cur, config, depth)?;
    let else_body = match term {
        Terminator::End => Expr::default(),
        Terminator::Else { .. } => match read_sequence(cur, config, depth)? {
            (instrs, Terminator::End) => Expr(instrs),
            (_, Terminator::Else { offset }) => {
                return Err(DecodeError::malformed(offset, "second `else` in `if`"))
            }
        },
    };
    Ok(Instruction::If {
        ty,
        then_body: Expr(then_instrs),
        else_body,
    })
}

/// The byte that selects memory 0 in `memory.*` instructions.
fn read_memory_zero(cur: &mut Cursor) -> Result<()> {
    let offset = cur.offset();
    match cur.read_u8()? {
        0x00 => Ok(()),
        b => Err(DecodeError::unsupported(
            offset,
            format!("memory index {b} (multi-memory)"),
        )),
    }
}

/// Decode one instruction. `depth` is the nesting level the instruction sits at.
///
/// Only the structured opcodes recurse, so they are the only arms kept in this frame.
pub fn read_instr(cur: &mut Cursor, config: &DecoderConfig, depth: u32) -> Result<Instruction> {
    let offset = cur.offset();
    let opcode = cur.read_u8()?;
    match opcode {
        op::BLOCK => {
            let inner = enter(config, depth, offset)?;
            let ty = read_block_type(cur)?;
            Ok(Instruction::Block {
                ty,
                body: read_nested(cur, config, inner)?,
            })
        }
        op::LOOP => {
            let inner = enter(config, depth, offset)?;
            let ty = read_block_type(cur)?;
            Ok(Instruction::Loop {
                ty,
                body: read_nested(cur, config, inner)?,
            })
        }
        op::IF => {
            let inner = enter(config, depth, offset)?;
            read_if(cur, config, inner)
        }
        _ => read_plain_instr(cur, opcode, offset),
    }
}

/// Every opcode without a nested body. Kept out of line so the large dispatch does not
/// inflate each level of block recursion.
#[inline(never)]
fn read_plain_instr(cur: &mut Cursor, opcode: u8, offset: usize) -> Result<Instruction> {
    use Instruction::*;

    Ok(match opcode {
        // control
        op::UNREACHABLE => Unreachable,
        op::NOP => Nop,
        0x0C => Br(cur.read_u32()?),
        0x0D => BrIf(cur.read_u32()?),
        0x0E => {
            let labels = cur.read_vec(|c| c.read_u32())?;
            let default = cur.read_u32()?;
            BrTable { labels, default }
        }
        0x0F => Return,
        0x10 => Call(cur.read_u32()?),
        0x11 => {
            // binary order: type index first, then table index
            let type_idx = cur.read_u32()?;
            let table_idx = cur.read_u32()?;
            CallIndirect {
                type_idx,
                table_idx,
            }
        }

        // reference
        0xD0 => RefNull(read_ref_type(cur)?),
        0xD1 => RefIsNull,
        0xD2 => RefFunc(cur.read_u32()?),

        // parametric
        0x1A => Drop,
        0x1B => Select,
        0x1C => SelectTyped(cur.read_vec(read_val_type)?),

        // variable
        0x20 => LocalGet(cur.read_u32()?),
        0x21 => LocalSet(cur.read_u32()?),
        0x22 => LocalTee(cur.read_u32()?),
        0x23 => GlobalGet(cur.read_u32()?),
        0x24 => GlobalSet(cur.read_u32()?),

        // table
        0x25 => TableGet(cur.read_u32()?),
        0x26 => TableSet(cur.read_u32()?),

        // memory
        0x28 => I32Load(read_memarg(cur)?),
        0x29 => I64Load(read_memarg(cur)?),
        0x2A => F32Load(read_memarg(cur)?),
        0x2B => F64Load(read_memarg(cur)?),
        0x2C => I32Load8S(read_memarg(cur)?),
        0x2D => I32Load8U(read_memarg(cur)?),
        0x2E => I32Load16S(read_memarg(cur)?),
        0x2F => I32Load16U(read_memarg(cur)?),
        0x30 => I64Load8S(read_memarg(cur)?),
        0x31 => I64Load8U(read_memarg(cur)?),
        0x32 => I64Load16S(read_memarg(cur)?),
        0x33 => I64Load16U(read_memarg(cur)?),
        0x34 => I64Load32S(read_memarg(cur)?),
        0x35 => I64Load32U(read_memarg(cur)?),
        0x36 => I32Store(read_memarg(cur)?),
        0x37 => I64Store(read_memarg(cur)?),
        0x38 => F32Store(read_memarg(cur)?),
        0x39 => F64Store(read_memarg(cur)?),
        0x3A => I32Store8(read_memarg(cur)?),
        0x3B => I32Store16(read_memarg(cur)?),
        0x3C => I64Store8(read_memarg(cur)?),
        0x3D => I64Store16(read_memarg(cur)?),
        0x3E => I64Store32(read_memarg(cur)?),
        op::MEMORY_SIZE => {
            read_memory_zero(cur)?;
            MemorySize
        }
        op::MEMORY_GROW => {
            read_memory_zero(cur)?;
            MemoryGrow
        }

        // numeric
        0x41 => I32Const(cur.read_i32()?),
        0x42 => I64Const(cur.read_i64()?),
        0x43 => F32Const(cur.read_f32_bits()?),
        0x44 => F64Const(cur.read_f64_bits()?),

        0x45 => I32Eqz,
        0x46 => I32Eq,
        0x47 => I32Ne,
        0x48 => I32LtS,
        0x49 => I32LtU,
        0x4A => I32GtS,
        0x4B => I32GtU,
        0x4C => I32LeS,
        0x4D => I32LeU,
        0x4E => I32GeS,
        0x4F => I32GeU,

        0x50 => I64Eqz,
        0x51 => I64Eq,
        0x52 => I64Ne,
        0x53 => I64LtS,
        0x54 => I64LtU,
        0x55 => I64GtS,
        0x56 => I64GtU,
        0x57 => I64LeS,
        0x58 => I64LeU,
        0x59 => I64GeS,
        0x5A => I64GeU,

        0x5B => F32Eq,
        0x5C => F32Ne,
        0x5D => F32Lt,
        0x5E => F32Gt,
        0x5F => F32Le,
        0x60 => F32Ge,

        0x61 => F64Eq,
        0x62 => F64Ne,
        0x63 => F64Lt,
        0x64 => F64Gt,
        0x65 => F64Le,
        0x66 => F64Ge,

        0x67 => I32Clz,
        0x68 => I32Ctz,
        0x69 => I32Popcnt,
        0x6A => I32Add,
        0x6B => I32Sub,
        0x6C => I32Mul,
        0x6D => I32DivS,
        0x6E => I32DivU,
        0x6F => I32RemS,
        0x70 => I32RemU,
        0x71 => I32And,
        0x72 => I32Or,
        0x73 => I32Xor,
        0x74 => I32Shl,
        0x75 => I32ShrS,
        0x76 => I32ShrU,
        0x77 => I32Rotl,
        0x78 => I32Rotr,

        0x79 => I64Clz,
        0x7A => I64Ctz,
        0x7B => I64Popcnt,
        0x7C => I64Add,
        0x7D => I64Sub,
        0x7E => I64Mul,
        0x7F => I64DivS,
        0x80 => I64DivU,
        0x81 => I64RemS,
        0x82 => I64RemU,
        0x83 => I64And,
        0x84 => I64Or,
        0x85 => I64Xor,
        0x86 => I64Shl,
        0x87 => I64ShrS,
        0x88 => I64ShrU,
        0x89 => I64Rotl,
        0x8A => I64Rotr,

        0x8B => F32Abs,
        0x8C => F32Neg,
        0x8D => F32Ceil,
        0x8E => F32Floor,
        0x8F => F32Trunc,
        0x90 => F32Nearest,
        0x91 => F32Sqrt,
        0x92 => F32Add,
        0x93 => F32Sub,
        0x94 => F32Mul,
        0x95 => F32Div,
        0x96 => F32Min,
        0x97 => F32Max,
        0x98 => F32Copysign,

        0x99 => F64Abs,
        0x9A => F64Neg,
        0x9B => F64Ceil,
        0x9C => F64Floor,
        0x9D => F64Trunc,
        0x9E => F64Nearest,
        0x9F => F64Sqrt,
        0xA0 => F64Add,
        0xA1 => F64Sub,
        0xA2 => F64Mul,
        0xA3 => F64Div,
        0xA4 => F64Min,
        0xA5 => F64Max,
        0xA6 => F64Copysign,

        0xA7 => I32WrapI64,
        0xA8 => I32TruncF32S,
        0xA9 => I32TruncF32U,
        0xAA => I32TruncF64S,
        0xAB => I32TruncF64U,
        0xAC => I64ExtendI32S,
        0xAD => I64ExtendI32U,
        0xAE => I64TruncF32S,
        0xAF => I64TruncF32U,
        0xB0 => I64TruncF64S,
        0xB1 => I64TruncF64U,
        0xB2 => F32ConvertI32S,
        0xB3 => F32ConvertI32U,
        0xB4 => F32ConvertI64S,
        0xB5 => F32ConvertI64U,
        0xB6 => F32DemoteF64,
        0xB7 => F64ConvertI32S,
        0xB8 => F64ConvertI32U,
        0xB9 => F64ConvertI64S,
        0xBA => F64ConvertI64U,
        0xBB => F64PromoteF32,
        0xBC => I32ReinterpretF32,
        0xBD => I64ReinterpretF64,
        0xBE => F32ReinterpretI32,
        0xBF => F64ReinterpretI64,

        0xC0 => I32Extend8S,
        0xC1 => I32Extend16S,
        0xC2 => I64Extend8S,
        0xC3 => I64Extend16S,
        0xC4 => I64Extend32S,

        op::PREFIX_FC => read_fc_instr(cur, offset)?,
        op::PREFIX_FD => {
            let sub = cur.read_u32()?;
            if sub > op::MAX_VECTOR_SUB_OPCODE {
                return Err(DecodeError::UnknownOpcode {
                    offset,
                    opcode,
                    sub_opcode: Some(sub),
                });
            }
            return Err(DecodeError::unsupported(
                offset,
                format!("vector instruction 0xFD {sub}"),
            ));
        }

        _ => {
            return Err(DecodeError::UnknownOpcode {
                offset,
                opcode,
                sub_opcode: None,
            })
        }
    })
}

fn read_fc_instr(cur: &mut Cursor, offset: usize) -> Result<Instruction> {
    use Instruction::*;

    let sub = cur.read_u32()?;
    Ok(match sub {
        0 => I32TruncSatF32S,
        1 => I32TruncSatF32U,
        2 => I32TruncSatF64S,
        3 => I32TruncSatF64U,
        4 => I64TruncSatF32S,
        5 => I64TruncSatF32U,
        6 => I64TruncSatF64S,
        7 => I64TruncSatF64U,
        8 => {
            let data = cur.read_u32()?;
            read_memory_zero(cur)?;
            MemoryInit(data)
        }
        9 => DataDrop(cur.read_u32()?),
        10 => {
            read_memory_zero(cur)?;
            read_memory_zero(cur)?;
            MemoryCopy
        }
        11 => {
            read_memory_zero(cur)?;
            MemoryFill
        }
        12 => {
            let elem = cur.read_u32()?;
            let table = cur.read_u32()?;
            TableInit { elem, table }
        }
        13 => ElemDrop(cur.read_u32()?),
        14 => {
            let dst = cur.read_u32()?;
            let src = cur.read_u32()?;
            TableCopy { dst, src }
        }
        15 => TableGrow(cur.read_u32()?),
        16 => TableSize(cur.read_u32()?),
        17 => TableFill(cur.read_u32()?),
        _ => {
            return Err(DecodeError::UnknownOpcode {
                offset,
                opcode: op::PREFIX_FC,
                sub_opcode: Some(sub),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{BlockType, MemArg, RefType, ValType};

    fn decode(bytes: &[u8]) -> Result<Expr> {
        decode_with(bytes, &DecoderConfig::default())
    }

    fn decode_with(bytes: &[u8], config: &DecoderConfig) -> Result<Expr> {
        let mut c = Cursor::new(bytes);
        let expr = read_expr(&mut c, config)?;
        assert!(c.is_eof(), "trailing bytes after expression");
        Ok(expr)
    }

    #[test]
    fn empty_expr() {
        assert_eq!(decode(&[0x0B]).unwrap(), Expr::default());
    }

    #[test]
    fn nested_block_excludes_terminators() {
        // block (result i32) i32.const 1 end end
        let expr = decode(&[0x02, 0x7F, 0x41, 0x01, 0x0B, 0x0B]).unwrap();
        assert_eq!(
            expr.0,
            vec![Instruction::Block {
                ty: BlockType::Value(ValType::I32),
                body: Expr(vec![Instruction::I32Const(1)]),
            }]
        );
    }

    #[test]
    fn loop_with_branch() {
        let expr = decode(&[0x03, 0x40, 0x0C, 0x00, 0x0B, 0x0B]).unwrap();
        assert_eq!(
            expr.0,
            vec![Instruction::Loop {
                ty: BlockType::Empty,
                body: Expr(vec![Instruction::Br(0)]),
            }]
        );
    }

    #[test]
    fn if_with_else() {
        // local.get 0 if (result i32) i32.const 1 else i32.const 2 end end
        let expr = decode(&[
            0x20, 0x00, 0x04, 0x7F, 0x41, 0x01, 0x05, 0x41, 0x02, 0x0B, 0x0B,
        ])
        .unwrap();
        assert_eq!(
            expr.0,
            vec![
                Instruction::LocalGet(0),
                Instruction::If {
                    ty: BlockType::Value(ValType::I32),
                    then_body: Expr(vec![Instruction::I32Const(1)]),
                    else_body: Expr(vec![Instruction::I32Const(2)]),
                },
            ]
        );
    }

    #[test]
    fn if_without_else_has_empty_else_body() {
        let expr = decode(&[0x04, 0x40, 0x01, 0x0B, 0x0B]).unwrap();
        assert_eq!(
            expr.0,
            vec![Instruction::If {
                ty: BlockType::Empty,
                then_body: Expr(vec![Instruction::Nop]),
                else_body: Expr::default(),
            }]
        );
    }

    #[test]
    fn nested_if_inside_else() {
        // if else if else end end end
        let expr = decode(&[0x04, 0x40, 0x05, 0x04, 0x40, 0x05, 0x0B, 0x0B, 0x0B]).unwrap();
        let inner = Instruction::If {
            ty: BlockType::Empty,
            then_body: Expr::default(),
            else_body: Expr::default(),
        };
        assert_eq!(
            expr.0,
            vec![Instruction::If {
                ty: BlockType::Empty,
                then_body: Expr::default(),
                else_body: Expr(vec![inner]),
            }]
        );
    }

    #[test]
    fn stray_else_is_malformed() {
        assert_eq!(
            decode(&[0x01, 0x05, 0x0B]).unwrap_err(),
            DecodeError::Malformed {
                offset: 1,
                msg: "`else` outside of `if`".into()
            }
        );
        assert_eq!(
            decode(&[0x04, 0x40, 0x05, 0x05, 0x0B, 0x0B]).unwrap_err().kind(),
            ErrorKind::Malformed
        );
    }

    #[test]
    fn block_type_index() {
        let expr = decode(&[0x02, 0x03, 0x0B, 0x0B]).unwrap();
        assert_eq!(
            expr.0,
            vec![Instruction::Block {
                ty: BlockType::TypeIndex(3),
                body: Expr::default(),
            }]
        );
    }

    #[test]
    fn br_table_and_call_indirect() {
        let expr = decode(&[0x0E, 0x02, 0x00, 0x01, 0x02, 0x11, 0x07, 0x00, 0x0B]).unwrap();
        assert_eq!(
            expr.0,
            vec![
                Instruction::BrTable {
                    labels: vec![0, 1],
                    default: 2,
                },
                Instruction::CallIndirect {
                    type_idx: 7,
                    table_idx: 0,
                },
            ]
        );
    }

    #[test]
    fn constants() {
        let mut bytes = vec![0x41, 0x7F, 0x42, 0x80, 0x01, 0x43];
        bytes.extend_from_slice(&1.5f32.to_bits().to_le_bytes());
        bytes.push(0x44);
        bytes.extend_from_slice(&(-2.25f64).to_bits().to_le_bytes());
        bytes.push(0x0B);
        let expr = decode(&bytes).unwrap();
        assert_eq!(
            expr.0,
            vec![
                Instruction::I32Const(-1),
                Instruction::I64Const(128),
                Instruction::F32Const(1.5f32.to_bits()),
                Instruction::F64Const((-2.25f64).to_bits()),
            ]
        );
    }

    #[test]
    fn i32_const_out_of_range() {
        // 2^31 as signed LEB128
        let err = decode(&[0x41, 0x80, 0x80, 0x80, 0x80, 0x08, 0x0B]).unwrap_err();
        assert_eq!(err, DecodeError::IntegerOverflow { offset: 1, bits: 32 });
    }

    #[test]
    fn memory_instructions() {
        let expr = decode(&[
            0x28, 0x02, 0x08, // i32.load align=2 offset=8
            0x3E, 0x03, 0x00, // i64.store32
            0x3F, 0x00, // memory.size
            0x40, 0x00, // memory.grow
            0x0B,
        ])
        .unwrap();
        assert_eq!(
            expr.0,
            vec![
                Instruction::I32Load(MemArg {
                    align: 2,
                    offset: 8
                }),
                Instruction::I64Store32(MemArg {
                    align: 3,
                    offset: 0
                }),
                Instruction::MemorySize,
                Instruction::MemoryGrow,
            ]
        );
    }

    #[test]
    fn memory_size_other_memory_is_unsupported() {
        assert_eq!(
            decode(&[0x3F, 0x01, 0x0B]).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
    }

    #[test]
    fn prefixed_fc_family() {
        let expr = decode(&[
            0xFC, 0x00, // i32.trunc_sat_f32_s
            0xFC, 0x07, // i64.trunc_sat_f64_u
            0xFC, 0x08, 0x03, 0x00, // memory.init 3
            0xFC, 0x09, 0x03, // data.drop 3
            0xFC, 0x0A, 0x00, 0x00, // memory.copy
            0xFC, 0x0B, 0x00, // memory.fill
            0xFC, 0x0C, 0x01, 0x00, // table.init elem 1 table 0
            0xFC, 0x0D, 0x01, // elem.drop 1
            0xFC, 0x0E, 0x00, 0x01, // table.copy 0 <- 1
            0xFC, 0x0F, 0x00, // table.grow
            0xFC, 0x10, 0x00, // table.size
            0xFC, 0x11, 0x00, // table.fill
            0x0B,
        ])
        .unwrap();
        assert_eq!(
            expr.0,
            vec![
                Instruction::I32TruncSatF32S,
                Instruction::I64TruncSatF64U,
                Instruction::MemoryInit(3),
                Instruction::DataDrop(3),
                Instruction::MemoryCopy,
                Instruction::MemoryFill,
                Instruction::TableInit { elem: 1, table: 0 },
                Instruction::ElemDrop(1),
                Instruction::TableCopy { dst: 0, src: 1 },
                Instruction::TableGrow(0),
                Instruction::TableSize(0),
                Instruction::TableFill(0),
            ]
        );
    }

    #[test]
    fn unknown_fc_sub_opcode() {
        assert_eq!(
            decode(&[0x01, 0xFC, 0x12, 0x0B]).unwrap_err(),
            DecodeError::UnknownOpcode {
                offset: 1,
                opcode: 0xFC,
                sub_opcode: Some(18),
            }
        );
    }

    #[test]
    fn vector_prefix() {
        assert_eq!(
            decode(&[0xFD, 0x0C, 0x0B]).unwrap_err().kind(),
            ErrorKind::Unsupported
        );
        // 0x200 is past every defined vector opcode
        assert_eq!(
            decode(&[0xFD, 0x80, 0x04, 0x0B]).unwrap_err(),
            DecodeError::UnknownOpcode {
                offset: 0,
                opcode: 0xFD,
                sub_opcode: Some(0x200),
            }
        );
    }

    #[test]
    fn unknown_opcode_reports_offset() {
        assert_eq!(
            decode(&[0x01, 0x01, 0xFF, 0x0B]).unwrap_err(),
            DecodeError::UnknownOpcode {
                offset: 2,
                opcode: 0xFF,
                sub_opcode: None,
            }
        );
    }

    #[test]
    fn reference_and_parametric() {
        let expr = decode(&[
            0xD0, 0x70, 0xD1, 0xD2, 0x04, 0x1A, 0x1B, 0x1C, 0x01, 0x7E, 0x0B,
        ])
        .unwrap();
        assert_eq!(
            expr.0,
            vec![
                Instruction::RefNull(RefType::FuncRef),
                Instruction::RefIsNull,
                Instruction::RefFunc(4),
                Instruction::Drop,
                Instruction::Select,
                Instruction::SelectTyped(vec![ValType::I64]),
            ]
        );
    }

    #[test]
    fn missing_end_is_eof() {
        assert_eq!(
            decode(&[0x02, 0x40, 0x01]).unwrap_err(),
            DecodeError::UnexpectedEof {
                offset: 3,
                needed: 1
            }
        );
    }

    #[test]
    fn nesting_limit() {
        let config = DecoderConfig::default().with_max_nesting_depth(2);
        let two = [0x02, 0x40, 0x02, 0x40, 0x0B, 0x0B, 0x0B];
        assert!(decode_with(&two, &config).is_ok());

        let three = [0x02, 0x40, 0x02, 0x40, 0x04, 0x40, 0x0B, 0x0B, 0x0B, 0x0B];
        assert_eq!(
            decode_with(&three, &config).unwrap_err(),
            DecodeError::NestingTooDeep {
                offset: 4,
                limit: 2
            }
        );
    }

    fn nested_blocks(depth: usize) -> Vec<u8> {
        let mut bytes = [0x02, 0x40].repeat(depth);
        bytes.extend(std::iter::repeat(0x0B).take(depth + 1));
        bytes
    }

    #[test]
    fn default_limit_is_reachable_without_exhausting_the_stack() {
        let depth = crate::config::DEFAULT_MAX_NESTING_DEPTH as usize;
        let expr = decode(&nested_blocks(depth)).unwrap();
        assert_eq!(expr.deep_len(), depth);

        let err = decode(&nested_blocks(depth + 1)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::NestingTooDeep {
                offset: 2 * depth,
                limit: crate::config::DEFAULT_MAX_NESTING_DEPTH
            }
        );
    }
}
