//! Decoder configuration.

/// Default bound on `block`/`loop`/`if` nesting.
///
/// Decoding recurses once per level, so this must stay low enough for an unoptimized build
/// on a 2 MiB thread stack.
pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 128;

/// Default bound on the flattened local count of one function body.
pub const DEFAULT_MAX_LOCALS: u32 = 50_000;

/// Limits and switches applied while decoding a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum nesting depth for structured control instructions
    pub max_nesting_depth: u32,
    /// Maximum number of locals a single function may declare
    pub max_locals: u32,
    /// Whether custom sections are recorded in the decoded module
    pub keep_custom_sections: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            max_locals: DEFAULT_MAX_LOCALS,
            keep_custom_sections: true,
        }
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_nesting_depth(mut self, depth: u32) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_max_locals(mut self, locals: u32) -> Self {
        self.max_locals = locals;
        self
    }

    pub fn with_custom_sections(mut self, keep: bool) -> Self {
        self.keep_custom_sections = keep;
        self
    }
}
