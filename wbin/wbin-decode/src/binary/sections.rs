//! Sections: the module header, the section sequence with interleaved custom sections, and
//! the payload grammar of each numbered section.

use tracing::{debug, trace};

use super::cursor::Cursor;
use super::instructions::read_expr;
use super::reader::{
    read_byte_vec, read_func_type, read_global_type, read_memory_type, read_name, read_table_type,
    read_val_type,
};
use crate::config::DecoderConfig;
use crate::error::{DecodeError, Result};
use crate::model::{
    Code, CustomSection, DataSegment, ElementSegment, Export, ExportDesc, Expr, FuncType, Global,
    Import, ImportDesc, Instruction, MemoryType, Module, RefType, SectionId, SegmentMode,
    TableType, TypeIdx,
};

/// `\0asm`
pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];
/// Binary format version 1.
pub const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Header describing a section's id, payload length, and the payload start offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    pub id: SectionId,
    pub payload_len: u32,
    pub payload_offset: usize,
}

/// Read a section header: id byte + payload length.
pub fn read_section_header(cur: &mut Cursor) -> Result<SectionHeader> {
    let offset = cur.offset();
    let id_byte = cur.read_u8()?;
    let id = SectionId::from_byte(id_byte).ok_or_else(|| {
        DecodeError::malformed(offset, format!("unknown section id {id_byte}"))
    })?;
    let payload_len = cur.read_u32()?;
    Ok(SectionHeader {
        id,
        payload_len,
        payload_offset: cur.offset(),
    })
}

/* ---------- Section readers ---------- */

fn read_type_section(cur: &mut Cursor) -> Result<Vec<FuncType>> {
    cur.read_vec(read_func_type)
}

fn read_import(cur: &mut Cursor) -> Result<Import> {
    let module = read_name(cur)?;
    let name = read_name(cur)?;
    let offset = cur.offset();
    let desc = match cur.read_u8()? {
        0x00 => ImportDesc::Func(cur.read_u32()?),
        0x01 => ImportDesc::Table(read_table_type(cur)?),
        0x02 => ImportDesc::Memory(read_memory_type(cur)?),
        0x03 => ImportDesc::Global(read_global_type(cur)?),
        tag => {
            return Err(DecodeError::unsupported(
                offset,
                format!("import descriptor kind 0x{tag:02X}"),
            ))
        }
    };
    Ok(Import { module, name, desc })
}

fn read_import_section(cur: &mut Cursor) -> Result<Vec<Import>> {
    cur.read_vec(read_import)
}

fn read_function_section(cur: &mut Cursor) -> Result<Vec<TypeIdx>> {
    cur.read_vec(|c| c.read_u32())
}

fn read_table_section(cur: &mut Cursor) -> Result<Vec<TableType>> {
    cur.read_vec(read_table_type)
}

fn read_memory_section(cur: &mut Cursor) -> Result<Vec<MemoryType>> {
    cur.read_vec(read_memory_type)
}

fn read_global_section(cur: &mut Cursor, config: &DecoderConfig) -> Result<Vec<Global>> {
    cur.read_vec(|c| {
        let ty = read_global_type(c)?;
        let init = read_expr(c, config)?;
        Ok(Global { ty, init })
    })
}

fn read_export(cur: &mut Cursor) -> Result<Export> {
    let name = read_name(cur)?;
    let offset = cur.offset();
    let desc = match cur.read_u8()? {
        0x00 => ExportDesc::Func(cur.read_u32()?),
        0x01 => ExportDesc::Table(cur.read_u32()?),
        0x02 => ExportDesc::Memory(cur.read_u32()?),
        0x03 => ExportDesc::Global(cur.read_u32()?),
        tag => {
            return Err(DecodeError::unsupported(
                offset,
                format!("export descriptor kind 0x{tag:02X}"),
            ))
        }
    };
    Ok(Export { name, desc })
}

fn read_export_section(cur: &mut Cursor) -> Result<Vec<Export>> {
    cur.read_vec(read_export)
}

fn read_element(cur: &mut Cursor, config: &DecoderConfig) -> Result<ElementSegment> {
    let offset = cur.offset();
    let kind = match cur.read_u32()? {
        0 => {
            let offset_expr = read_expr(cur, config)?;
            let init = cur.read_vec(|c| Ok(Expr(vec![Instruction::RefFunc(c.read_u32()?)])))?;
            return Ok(ElementSegment {
                elem_type: RefType::FuncRef,
                init,
                mode: SegmentMode::Active,
                table: 0,
                offset: offset_expr,
            });
        }
        1 => "passive element segment",
        2 => "active element segment with explicit table",
        3 => "declarative element segment",
        4 => "active element segment with init expressions",
        5 => "passive element segment with init expressions",
        6 => "active element segment with explicit table and init expressions",
        7 => "declarative element segment with init expressions",
        tag => {
            return Err(DecodeError::unsupported(
                offset,
                format!("element segment kind {tag}"),
            ))
        }
    };
    Err(DecodeError::unsupported(offset, kind))
}

fn read_element_section(cur: &mut Cursor, config: &DecoderConfig) -> Result<Vec<ElementSegment>> {
    cur.read_vec(|c| read_element(c, config))
}

fn read_code(cur: &mut Cursor, config: &DecoderConfig) -> Result<Code> {
    // entry size is informational; the body is delimited by its own `end`
    let _size = cur.read_u32()?;
    let offset = cur.offset();
    let groups = cur.read_vec(|c| {
        let count = c.read_u32()?;
        let ty = read_val_type(c)?;
        Ok((count, ty))
    })?;
    let total: u64 = groups.iter().map(|(count, _)| u64::from(*count)).sum();
    if total > u64::from(config.max_locals) {
        return Err(DecodeError::TooManyLocals {
            offset,
            limit: config.max_locals,
        });
    }
    let locals = groups
        .into_iter()
        .flat_map(|(count, ty)| std::iter::repeat(ty).take(count as usize))
        .collect();
    let body = read_expr(cur, config)?;
    Ok(Code { locals, body })
}

fn read_code_section(cur: &mut Cursor, config: &DecoderConfig) -> Result<Vec<Code>> {
    cur.read_vec(|c| read_code(c, config))
}

fn read_data(cur: &mut Cursor, config: &DecoderConfig) -> Result<DataSegment> {
    let offset = cur.offset();
    match cur.read_u32()? {
        0 => {
            let offset_expr = read_expr(cur, config)?;
            let init = read_byte_vec(cur)?;
            Ok(DataSegment {
                init,
                mode: SegmentMode::Active,
                memory: 0,
                offset: offset_expr,
            })
        }
        1 => Err(DecodeError::unsupported(offset, "passive data segment")),
        2 => Err(DecodeError::unsupported(
            offset,
            "active data segment with explicit memory",
        )),
        tag => Err(DecodeError::unsupported(
            offset,
            format!("data segment kind {tag}"),
        )),
    }
}

fn read_data_section(cur: &mut Cursor, config: &DecoderConfig) -> Result<Vec<DataSegment>> {
    cur.read_vec(|c| read_data(c, config))
}

/* ---------- Top-level module parser ---------- */

fn ensure_fully_consumed(cur: &Cursor, id: SectionId) -> Result<()> {
    if !cur.is_eof() {
        return Err(DecodeError::malformed(
            cur.offset(),
            format!(
                "section size mismatch: {} unread byte(s) at end of {id} section",
                cur.remaining()
            ),
        ));
    }
    Ok(())
}

/// Decode a complete module.
///
/// After the header, sections must appear in strictly ascending id order with custom
/// sections allowed anywhere in between. A section with a declared size of zero is skipped
/// without decoding or recording anything.
pub fn read_module(cur: &mut Cursor, config: &DecoderConfig) -> Result<Module> {
    cur.expect_const(&MAGIC)?;
    cur.expect_const(&VERSION)?;

    let mut module = Module::default();
    let mut last: Option<SectionId> = None;

    while !cur.is_eof() {
        let section_offset = cur.offset();
        let header = read_section_header(cur)?;

        if header.id != SectionId::Custom {
            if let Some(previous) = last {
                if header.id <= previous {
                    return Err(DecodeError::SectionOrderViolation {
                        offset: section_offset,
                        id: header.id as u8,
                        previous: previous as u8,
                    });
                }
            }
            last = Some(header.id);
        }

        if header.payload_len == 0 {
            trace!(section = %header.id, offset = section_offset, "skipping empty section");
            continue;
        }

        let mut payload = cur.sub_cursor(header.payload_len as usize)?;
        debug!(
            section = %header.id,
            size = header.payload_len,
            offset = header.payload_offset,
            "decoding section"
        );

        let items = match header.id {
            SectionId::Custom => {
                let bytes = payload.read_bytes(payload.remaining())?;
                let section = CustomSection {
                    after: last,
                    offset: header.payload_offset,
                    payload: bytes.to_vec(),
                };
                trace!(name = section.name().unwrap_or("<unnamed>"), "custom section");
                if config.keep_custom_sections {
                    module.custom_sections.push(section);
                }
                1
            }
            SectionId::Type => {
                module.types = read_type_section(&mut payload)?;
                module.types.len()
            }
            SectionId::Import => {
                module.imports = read_import_section(&mut payload)?;
                module.imports.len()
            }
            SectionId::Function => {
                module.funcs = read_function_section(&mut payload)?;
                module.funcs.len()
            }
            SectionId::Table => {
                module.tables = read_table_section(&mut payload)?;
                module.tables.len()
            }
            SectionId::Memory => {
                module.memories = read_memory_section(&mut payload)?;
                module.memories.len()
            }
            SectionId::Global => {
                module.globals = read_global_section(&mut payload, config)?;
                module.globals.len()
            }
            SectionId::Export => {
                module.exports = read_export_section(&mut payload)?;
                module.exports.len()
            }
            SectionId::Start => {
                return Err(DecodeError::unsupported(section_offset, "start section"));
            }
            SectionId::Element => {
                module.elements = read_element_section(&mut payload, config)?;
                module.elements.len()
            }
            SectionId::Code => {
                module.codes = read_code_section(&mut payload, config)?;
                module.codes.len()
            }
            SectionId::Data => {
                module.datas = read_data_section(&mut payload, config)?;
                module.datas.len()
            }
            SectionId::DataCount => {
                return Err(DecodeError::unsupported(section_offset, "data count section"));
            }
        };

        ensure_fully_consumed(&payload, header.id)?;
        debug!(section = %header.id, items, "decoded section");
    }

    debug!(
        types = module.types.len(),
        imports = module.imports.len(),
        funcs = module.funcs.len(),
        exports = module.exports.len(),
        codes = module.codes.len(),
        custom = module.custom_sections.len(),
        "module decoded"
    );
    Ok(module)
}
