//! wbin-decode: decoder for the WebAssembly binary format.
//!
//! Turns the bytes of a `.wasm` file into a [`Module`]: function types, imports, exports,
//! tables, memories, globals, element and data segments, and each function body as a tree of
//! [`Instruction`]s. The decoder checks structure only. Type checking and execution are left
//! to later stages.
//!
//! ```
//! let bytes = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];
//! let module = wbin_decode::decode(&bytes).unwrap();
//! assert!(module.is_empty());
//! ```

pub mod binary;
pub mod config;
pub mod error;
pub mod model;

pub use binary::leb128::Leb128Error;
pub use config::DecoderConfig;
pub use error::{DecodeError, ErrorKind, Result};
pub use model::{BlockType, Expr, FuncType, Instruction, Module, Name, SectionId, ValType};

use binary::cursor::Cursor;

/// Decode a module with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<Module> {
    Decoder::new(bytes).decode()
}

/// Decode a module with explicit limits.
pub fn decode_with_config(bytes: &[u8], config: &DecoderConfig) -> Result<Module> {
    Decoder::new(bytes).with_config(config.clone()).decode()
}

/// One-shot decoder over a borrowed input buffer.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    config: DecoderConfig,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            config: DecoderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Run the decode. The decoder is consumed; decode the same bytes again with a new one.
    pub fn decode(self) -> Result<Module> {
        let mut cur = Cursor::new(self.bytes);
        binary::sections::read_module(&mut cur, &self.config)
    }
}
