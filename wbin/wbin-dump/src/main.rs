//! wbin-dump: print the decoded structure of a WebAssembly binary.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wbin_decode::model::{ExportDesc, ImportDesc};
use wbin_decode::{BlockType, DecoderConfig, Expr, Instruction, Module};

#[derive(Parser, Debug)]
#[command(name = "wbin-dump")]
#[command(about = "Decode a .wasm file and print its structure")]
#[command(version)]
struct Cli {
    /// Input .wasm file
    file: PathBuf,

    /// Print the type section
    #[arg(long)]
    types: bool,

    /// Print imports
    #[arg(long)]
    imports: bool,

    /// Print exports
    #[arg(long)]
    exports: bool,

    /// Print every function body as an indented instruction tree
    #[arg(long)]
    code: bool,

    /// Maximum block nesting accepted by the decoder
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Do not keep custom sections
    #[arg(long)]
    no_custom: bool,

    /// Debug-level decoder logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn decoder_config(&self) -> DecoderConfig {
        let mut config = DecoderConfig::new().with_custom_sections(!self.no_custom);
        if let Some(depth) = self.max_depth {
            config = config.with_max_nesting_depth(depth);
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let bytes = std::fs::read(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    info!(path = %cli.file.display(), size = bytes.len(), "decoding");

    let config = cli.decoder_config();
    debug!(?config, "decoder config");
    let module = wbin_decode::decode_with_config(&bytes, &config)
        .with_context(|| format!("failed to decode {}", cli.file.display()))?;

    print!("{}", render(&module, &cli)?);
    Ok(())
}

fn render(m: &Module, cli: &Cli) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_module(&mut out, m, cli)?;
    Ok(out)
}

/// `func N: (params) -> (results)` for a defined function at index `idx` of the function
/// index space.
fn func_header(m: &Module, idx: usize) -> String {
    let ty = u32::try_from(idx).ok().and_then(|i| m.func_type(i));
    match ty {
        Some(ty) => format!("func {idx}: {ty}"),
        None => format!("func {idx}: <bad type index>"),
    }
}

fn write_module(out: &mut String, m: &Module, cli: &Cli) -> std::fmt::Result {
    writeln!(out, "types:     {}", m.types.len())?;
    writeln!(out, "imports:   {}", m.imports.len())?;
    writeln!(out, "functions: {} ({} imported)", m.func_count(), m.imported_func_count())?;
    writeln!(out, "tables:    {}", m.tables.len())?;
    writeln!(out, "memories:  {}", m.memories.len())?;
    writeln!(out, "globals:   {}", m.globals.len())?;
    writeln!(out, "exports:   {}", m.exports.len())?;
    writeln!(out, "elements:  {}", m.elements.len())?;
    writeln!(out, "data:      {}", m.datas.len())?;
    for cs in &m.custom_sections {
        let after = cs.after.map_or_else(|| "start".to_string(), |id| id.to_string());
        writeln!(
            out,
            "custom:    {} ({} bytes, after {after})",
            cs.name().unwrap_or("<unnamed>"),
            cs.payload.len()
        )?;
    }

    if cli.types {
        writeln!(out, "\n[types]")?;
        for (i, ty) in m.types.iter().enumerate() {
            writeln!(out, "  {i}: {ty}")?;
        }
    }

    if cli.imports {
        writeln!(out, "\n[imports]")?;
        for imp in &m.imports {
            let desc = match &imp.desc {
                ImportDesc::Func(t) => format!("func type {t}"),
                ImportDesc::Table(t) => format!("table {} {}", t.elem, t.limits),
                ImportDesc::Memory(mem) => format!("memory {}", mem.limits),
                ImportDesc::Global(g) => format!("global {:?} {}", g.mutability, g.val_type),
            };
            writeln!(out, "  {}.{}: {desc}", imp.module, imp.name)?;
        }
    }

    if cli.exports {
        writeln!(out, "\n[exports]")?;
        for exp in &m.exports {
            let desc = match exp.desc {
                ExportDesc::Func(i) => format!("func {i}"),
                ExportDesc::Table(i) => format!("table {i}"),
                ExportDesc::Memory(i) => format!("memory {i}"),
                ExportDesc::Global(i) => format!("global {i}"),
            };
            writeln!(out, "  {}: {desc}", exp.name)?;
        }
    }

    if cli.code {
        writeln!(out, "\n[code]")?;
        let imported = m.imported_func_count();
        for (i, code) in m.codes.iter().enumerate() {
            writeln!(out, "  {}", func_header(m, imported + i))?;
            if !code.locals.is_empty() {
                let locals: Vec<String> = code.locals.iter().map(|l| l.to_string()).collect();
                writeln!(out, "    locals: {}", locals.join(", "))?;
            }
            write_expr(out, &code.body, 2)?;
        }
    }
    Ok(())
}

fn write_expr(out: &mut String, expr: &Expr, indent: usize) -> std::fmt::Result {
    for instr in expr.iter() {
        let pad = "  ".repeat(indent);
        match instr {
            Instruction::Block { ty, body } => {
                writeln!(out, "{pad}block{}", block_suffix(ty))?;
                write_expr(out, body, indent + 1)?;
                writeln!(out, "{pad}end")?;
            }
            Instruction::Loop { ty, body } => {
                writeln!(out, "{pad}loop{}", block_suffix(ty))?;
                write_expr(out, body, indent + 1)?;
                writeln!(out, "{pad}end")?;
            }
            Instruction::If {
                ty,
                then_body,
                else_body,
            } => {
                writeln!(out, "{pad}if{}", block_suffix(ty))?;
                write_expr(out, then_body, indent + 1)?;
                if !else_body.is_empty() {
                    writeln!(out, "{pad}else")?;
                    write_expr(out, else_body, indent + 1)?;
                }
                writeln!(out, "{pad}end")?;
            }
            other => writeln!(out, "{pad}{other:?}")?,
        }
    }
    Ok(())
}

fn block_suffix(ty: &BlockType) -> String {
    match ty {
        BlockType::Empty => String::new(),
        BlockType::Value(v) => format!(" (result {v})"),
        BlockType::TypeIndex(i) => format!(" (type {i})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("wbin-dump").chain(args.iter().copied()))
    }

    #[test]
    fn flags_map_to_config() {
        let c = cli(&["x.wasm", "--max-depth", "16", "--no-custom"]);
        let config = c.decoder_config();
        assert_eq!(config.max_nesting_depth, 16);
        assert!(!config.keep_custom_sections);

        let config = cli(&["x.wasm"]).decoder_config();
        assert_eq!(config, DecoderConfig::default());
    }

    #[test]
    fn code_listing_is_indented_by_nesting() {
        let bytes = wat::parse_str(
            r#"(module
                (func (export "f") (param i32) (result i32)
                    local.get 0
                    if (result i32)
                        block
                            nop
                        end
                        i32.const 1
                    else
                        i32.const 2
                    end))"#,
        )
        .unwrap();
        let module = wbin_decode::decode(&bytes).unwrap();
        let text = render(&module, &cli(&["f.wasm", "--code", "--exports"])).unwrap();

        assert!(text.contains("functions: 1 (0 imported)"));
        assert!(text.contains("  f: func 0"));
        assert!(text.contains("  func 0: (i32) -> (i32)"));
        assert!(text.contains("    LocalGet(0)\n    if (result i32)\n      block\n        Nop\n      end\n"));
        assert!(text.contains("    else\n      I32Const(2)\n    end\n"));
    }

    #[test]
    fn func_header_handles_indices_outside_the_module() {
        let bytes = wat::parse_str(
            r#"(module
                (import "env" "g" (func (param i64)))
                (func (result f32) f32.const 0))"#,
        )
        .unwrap();
        let module = wbin_decode::decode(&bytes).unwrap();
        assert_eq!(func_header(&module, 0), "func 0: (i64) -> ()");
        assert_eq!(func_header(&module, 1), "func 1: () -> (f32)");
        assert_eq!(func_header(&module, 2), "func 2: <bad type index>");
        assert_eq!(
            func_header(&module, usize::MAX),
            format!("func {}: <bad type index>", usize::MAX)
        );
    }
}
