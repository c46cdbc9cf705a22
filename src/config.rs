//! Compiler configuration.
//!
//! Knobs the CLI layer sets up front and threads into the driver; the four
//! core stages (lexer, parser, symbol builder, emitter) never read this
//! type themselves, keeping configuration a driver-level concern.
//!
//! # Example
//!
//! ```rust,ignore
//! use nasmpy::CompilerConfig;
//!
//! let config = CompilerConfig::new()
//!     .with_output_path("out.asm")
//!     .with_emit_on_error(true);
//!
//! nasmpy::compile_file(source_path, &config)?;
//! ```

use std::path::PathBuf;

/// How loud the tracing subscriber should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    #[default]
    Warn,
    Debug,
}

/// Configuration for one compilation run.
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    /// Overrides the default `<input>.asm` output path.
    pub output_path: Option<PathBuf>,

    /// When true, the driver still writes the emitted assembly even if
    /// diagnostics were recorded, instead of the default policy of
    /// skipping the write and exiting 1. Useful when debugging the
    /// emitter itself.
    pub emit_on_error: bool,

    pub verbosity: Verbosity,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_emit_on_error(mut self, emit_on_error: bool) -> Self {
        self.emit_on_error = emit_on_error;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_output_override() {
        let config = CompilerConfig::new();
        assert!(config.output_path.is_none());
        assert!(!config.emit_on_error);
        assert_eq!(config.verbosity, Verbosity::Warn);
    }

    #[test]
    fn builder_sets_every_field() {
        let config = CompilerConfig::new()
            .with_output_path("out.asm")
            .with_emit_on_error(true)
            .with_verbosity(Verbosity::Debug);

        assert_eq!(config.output_path, Some(PathBuf::from("out.asm")));
        assert!(config.emit_on_error);
        assert_eq!(config.verbosity, Verbosity::Debug);
    }
}
