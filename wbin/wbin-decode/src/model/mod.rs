//! Public model/IR surface.

pub mod instr;
pub mod module;
pub mod types;

pub use instr::{BlockType, Expr, Instruction, MemArg};
pub use module::{
    Code, CustomSection, DataSegment, ElementSegment, Global, Module, SectionId, SegmentMode,
};
pub use types::{
    DataIdx, ElemIdx, Export, ExportDesc, FuncIdx, FuncType, GlobalIdx, GlobalType, Import,
    ImportDesc, LabelIdx, Limits, LocalIdx, MemIdx, MemoryType, Mutability, Name, RefType,
    TableIdx, TableType, TypeIdx, ValType,
};
