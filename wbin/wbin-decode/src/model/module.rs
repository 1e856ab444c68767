//! Module-level IR: the decoded module, its segments, function bodies and custom sections.

use std::fmt;

use super::instr::Expr;
use super::types::{
    Export, FuncIdx, FuncType, GlobalType, Import, ImportDesc, MemIdx, MemoryType, RefType,
    TableIdx, TableType, TypeIdx, ValType,
};
use crate::binary::leb128;

/// Section identifiers in the binary format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SectionId {
    Custom = 0,
    Type = 1,
    Import = 2,
    Function = 3,
    Table = 4,
    Memory = 5,
    Global = 6,
    Export = 7,
    Start = 8,
    Element = 9,
    Code = 10,
    Data = 11,
    DataCount = 12,
}

impl SectionId {
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0 => SectionId::Custom,
            1 => SectionId::Type,
            2 => SectionId::Import,
            3 => SectionId::Function,
            4 => SectionId::Table,
            5 => SectionId::Memory,
            6 => SectionId::Global,
            7 => SectionId::Export,
            8 => SectionId::Start,
            9 => SectionId::Element,
            10 => SectionId::Code,
            11 => SectionId::Data,
            12 => SectionId::DataCount,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Custom => "custom",
            SectionId::Type => "type",
            SectionId::Import => "import",
            SectionId::Function => "function",
            SectionId::Table => "table",
            SectionId::Memory => "memory",
            SectionId::Global => "global",
            SectionId::Export => "export",
            SectionId::Start => "start",
            SectionId::Element => "element",
            SectionId::Code => "code",
            SectionId::Data => "data",
            SectionId::DataCount => "data_count",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque custom section. The payload is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSection {
    /// Last numbered section decoded before this one; `None` if it precedes all of them.
    pub after: Option<SectionId>,
    /// Absolute offset of the payload.
    pub offset: usize,
    pub payload: Vec<u8>,
}

impl CustomSection {
    /// The conventional name prefix of the payload, when it is a well-formed UTF-8 name.
    pub fn name(&self) -> Option<&str> {
        let (len, used) = leb128::decode_unsigned(&self.payload).ok()?;
        let len = usize::try_from(len).ok()?;
        let bytes = self.payload.get(used..used.checked_add(len)?)?;
        std::str::from_utf8(bytes).ok()
    }
}

/// Global with type and initializer expression.
///
/// The initializer is decoded like any other expression; whether it is constant is for a
/// validator to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub ty: GlobalType,
    pub init: Expr,
}

/// How a segment is applied. Passive and declarative segments are rejected while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentMode {
    #[default]
    Active,
}

/// Element segment: each init entry is an expression, normally a lone `ref.func`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSegment {
    pub elem_type: RefType,
    pub init: Vec<Expr>,
    pub mode: SegmentMode,
    pub table: TableIdx,
    pub offset: Expr,
}

/// Data segment: raw bytes copied into memory at the offset expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    pub init: Vec<u8>,
    pub mode: SegmentMode,
    pub memory: MemIdx,
    pub offset: Expr,
}

/// Code entry for a defined function: one local slot per entry, then the body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Code {
    pub locals: Vec<ValType>,
    pub body: Expr,
}

/// The decoded module (pre-validation, pre-instantiation).
///
/// `funcs[i]` and `codes[i]` describe the same defined function. Imported functions come
/// first in the function index space and have no code entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub custom_sections: Vec<CustomSection>,
    pub types: Vec<FuncType>,
    pub imports: Vec<Import>,
    /// Type indices for each defined (non-imported) function, in module order.
    pub funcs: Vec<TypeIdx>,
    pub tables: Vec<TableType>,
    pub memories: Vec<MemoryType>,
    pub globals: Vec<Global>,
    pub exports: Vec<Export>,
    pub elements: Vec<ElementSegment>,
    pub codes: Vec<Code>,
    pub datas: Vec<DataSegment>,
}

impl Module {
    /// Number of imported functions, which occupy the front of the function index space.
    pub fn imported_func_count(&self) -> usize {
        self.imports
            .iter()
            .filter(|i| matches!(i.desc, ImportDesc::Func(_)))
            .count()
    }

    /// Total functions including imports.
    pub fn func_count(&self) -> usize {
        self.imported_func_count() + self.funcs.len()
    }

    /// Resolve a function index (imports first, then defined functions) to its type.
    pub fn func_type(&self, idx: FuncIdx) -> Option<&FuncType> {
        let type_idx = self
            .imports
            .iter()
            .filter_map(|i| match i.desc {
                ImportDesc::Func(t) => Some(t),
                _ => None,
            })
            .chain(self.funcs.iter().copied())
            .nth(idx as usize)?;
        self.types.get(type_idx as usize)
    }

    /// Look up an export by name.
    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }

    /// True when no section contributed anything.
    pub fn is_empty(&self) -> bool {
        *self == Module::default()
    }
}
