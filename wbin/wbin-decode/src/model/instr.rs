//! Decoded instructions. Structured control instructions own their nested bodies, so an
//! [`Expr`] is a tree rather than a flat tape.

use std::ops::Deref;

use super::types::{
    DataIdx, ElemIdx, FuncIdx, GlobalIdx, LabelIdx, LocalIdx, RefType, TableIdx, TypeIdx, ValType,
};

/// Signature attached to `block`, `loop` and `if`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Empty,
    Value(ValType),
    /// Index into the type section, decoded from a non-negative s33.
    TypeIndex(TypeIdx),
}

/// Immediate of every load and store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemArg {
    pub align: u32,
    pub offset: u32,
}

/// Instruction sequence whose closing `end` has been consumed and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expr(pub Vec<Instruction>);

impl Expr {
    pub fn instructions(&self) -> &[Instruction] {
        &self.0
    }

    /// Instruction count including everything nested inside blocks.
    pub fn deep_len(&self) -> usize {
        self.0
            .iter()
            .map(|i| {
                1 + match i {
                    Instruction::Block { body, .. } | Instruction::Loop { body, .. } => {
                        body.deep_len()
                    }
                    Instruction::If {
                        then_body,
                        else_body,
                        ..
                    } => then_body.deep_len() + else_body.deep_len(),
                    _ => 0,
                }
            })
            .sum()
    }
}

impl Deref for Expr {
    type Target = [Instruction];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    // control
    Unreachable,
    Nop,
    Block {
        ty: BlockType,
        body: Expr,
    },
    Loop {
        ty: BlockType,
        body: Expr,
    },
    If {
        ty: BlockType,
        then_body: Expr,
        else_body: Expr,
    },
    Br(LabelIdx),
    BrIf(LabelIdx),
    BrTable {
        labels: Vec<LabelIdx>,
        default: LabelIdx,
    },
    Return,
    Call(FuncIdx),
    CallIndirect {
        type_idx: TypeIdx,
        table_idx: TableIdx,
    },

    // reference
    RefNull(RefType),
    RefIsNull,
    RefFunc(FuncIdx),

    // parametric
    Drop,
    Select,
    SelectTyped(Vec<ValType>),

    // variable
    LocalGet(LocalIdx),
    LocalSet(LocalIdx),
    LocalTee(LocalIdx),
    GlobalGet(GlobalIdx),
    GlobalSet(GlobalIdx),

    // table
    TableGet(TableIdx),
    TableSet(TableIdx),
    TableInit {
        elem: ElemIdx,
        table: TableIdx,
    },
    ElemDrop(ElemIdx),
    TableCopy {
        dst: TableIdx,
        src: TableIdx,
    },
    TableGrow(TableIdx),
    TableSize(TableIdx),
    TableFill(TableIdx),

    // memory
    I32Load(MemArg),
    I64Load(MemArg),
    F32Load(MemArg),
    F64Load(MemArg),
    I32Load8S(MemArg),
    I32Load8U(MemArg),
    I32Load16S(MemArg),
    I32Load16U(MemArg),
    I64Load8S(MemArg),
    I64Load8U(MemArg),
    I64Load16S(MemArg),
    I64Load16U(MemArg),
    I64Load32S(MemArg),
    I64Load32U(MemArg),
    I32Store(MemArg),
    I64Store(MemArg),
    F32Store(MemArg),
    F64Store(MemArg),
    I32Store8(MemArg),
    I32Store16(MemArg),
    I64Store8(MemArg),
    I64Store16(MemArg),
    I64Store32(MemArg),
    MemorySize,
    MemoryGrow,
    MemoryInit(DataIdx),
    DataDrop(DataIdx),
    MemoryCopy,
    MemoryFill,

    // numeric constants; floats keep their raw IEEE-754 bits
    I32Const(i32),
    I64Const(i64),
    F32Const(u32),
    F64Const(u64),

    // i32 comparison
    I32Eqz,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32GtS,
    I32GtU,
    I32LeS,
    I32LeU,
    I32GeS,
    I32GeU,

    // i64 comparison
    I64Eqz,
    I64Eq,
    I64Ne,
    I64LtS,
    I64LtU,
    I64GtS,
    I64GtU,
    I64LeS,
    I64LeU,
    I64GeS,
    I64GeU,

    // f32 comparison
    F32Eq,
    F32Ne,
    F32Lt,
    F32Gt,
    F32Le,
    F32Ge,

    // f64 comparison
    F64Eq,
    F64Ne,
    F64Lt,
    F64Gt,
    F64Le,
    F64Ge,

    // i32 arithmetic
    I32Clz,
    I32Ctz,
    I32Popcnt,
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32DivU,
    I32RemS,
    I32RemU,
    I32And,
    I32Or,
    I32Xor,
    I32Shl,
    I32ShrS,
    I32ShrU,
    I32Rotl,
    I32Rotr,

    // i64 arithmetic
    I64Clz,
    I64Ctz,
    I64Popcnt,
    I64Add,
    I64Sub,
    I64Mul,
    I64DivS,
    I64DivU,
    I64RemS,
    I64RemU,
    I64And,
    I64Or,
    I64Xor,
    I64Shl,
    I64ShrS,
    I64ShrU,
    I64Rotl,
    I64Rotr,

    // f32 arithmetic
    F32Abs,
    F32Neg,
    F32Ceil,
    F32Floor,
    F32Trunc,
    F32Nearest,
    F32Sqrt,
    F32Add,
    F32Sub,
    F32Mul,
    F32Div,
    F32Min,
    F32Max,
    F32Copysign,

    // f64 arithmetic
    F64Abs,
    F64Neg,
    F64Ceil,
    F64Floor,
    F64Trunc,
    F64Nearest,
    F64Sqrt,
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,
    F64Min,
    F64Max,
    F64Copysign,

    // conversions
    I32WrapI64,
    I32TruncF32S,
    I32TruncF32U,
    I32TruncF64S,
    I32TruncF64U,
    I64ExtendI32S,
    I64ExtendI32U,
    I64TruncF32S,
    I64TruncF32U,
    I64TruncF64S,
    I64TruncF64U,
    F32ConvertI32S,
    F32ConvertI32U,
    F32ConvertI64S,
    F32ConvertI64U,
    F32DemoteF64,
    F64ConvertI32S,
    F64ConvertI32U,
    F64ConvertI64S,
    F64ConvertI64U,
    F64PromoteF32,
    I32ReinterpretF32,
    I64ReinterpretF64,
    F32ReinterpretI32,
    F64ReinterpretI64,

    // sign extension
    I32Extend8S,
    I32Extend16S,
    I64Extend8S,
    I64Extend16S,
    I64Extend32S,

    // saturating truncation
    I32TruncSatF32S,
    I32TruncSatF32U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF32S,
    I64TruncSatF32U,
    I64TruncSatF64S,
    I64TruncSatF64U,
}

impl Instruction {
    /// True for `block`, `loop` and `if`.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Instruction::Block { .. } | Instruction::Loop { .. } | Instruction::If { .. }
        )
    }
}
