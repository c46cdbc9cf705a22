//! Ties the four core stages together and handles the driver-level policy
//! of what to do with diagnostics and where to write the assembly.
//!
//! This is the only module that touches the filesystem; [`compile_source`]
//! takes and returns plain strings so it can be exercised without files at
//! all, and [`compile_file`] is a thin wrapper around it for the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::CodeEmitter;
use crate::config::CompilerConfig;
use crate::error::{Diagnostic, ErrorSink};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::symbols::SymbolBuilder;

/// Errors at the driver boundary: filesystem and invocation problems, as
/// distinct from the `Diagnostic`s the compilation stages themselves raise.
#[derive(Debug)]
pub enum DriverError {
    Io(std::io::Error),
    Usage(String),
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::Io(e) => write!(f, "{e}"),
            DriverError::Usage(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        DriverError::Io(e)
    }
}

/// The result of running the pipeline over one source string: the emitted
/// assembly (always produced, even when diagnostics were raised) and every
/// diagnostic the four stages recorded along the way.
pub struct CompileOutcome {
    pub assembly: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutcome {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Runs the full `Lexer -> Parser -> SymbolBuilder -> CodeEmitter` pipeline
/// over `source`, collecting diagnostics from every stage into one sink.
///
/// Always returns assembly text: the emitter is built to keep generating
/// code around malformed input rather than abort, so whether that text gets
/// written anywhere is a decision left to the caller (see
/// [`CompilerConfig::keep_going`]).
pub fn compile_source(source: &str) -> CompileOutcome {
    let span = tracing::debug_span!("compile");
    let _enter = span.enter();

    let mut errors = ErrorSink::new();
    let tokens = Lexer::new(source, &mut errors).tokenize();
    let (ast, program) = Parser::new(tokens, &mut errors).parse();
    let mut scopes = SymbolBuilder::new(&ast, &mut errors).build(program);
    let assembly = match CodeEmitter::new(&ast, &mut scopes, &mut errors).emit(program) {
        Ok(text) => text,
        Err(e) => {
            errors.push_semantics(0, e.to_string(), "");
            String::new()
        }
    };

    tracing::debug!(diagnostic_count = errors.len(), "compilation finished");
    CompileOutcome {
        assembly,
        diagnostics: errors.drain_for_display().into_iter().cloned().collect(),
    }
}

/// Reads `input`, compiles it, and writes the resulting assembly to the
/// configured (or default `<input>.asm`) output path unless diagnostics
/// were raised and the config doesn't ask to keep going anyway.
///
/// Returns the outcome either way; callers decide what exit code and
/// messages to surface.
pub fn compile_file(input: &Path, config: &CompilerConfig) -> Result<CompileOutcome, DriverError> {
    let source = fs::read_to_string(input)?;
    let outcome = compile_source(&source);

    if !outcome.has_errors() || config.emit_on_error {
        let output_path = resolve_output_path(input, config);
        fs::write(&output_path, &outcome.assembly)?;
    }

    Ok(outcome)
}

fn resolve_output_path(input: &Path, config: &CompilerConfig) -> PathBuf {
    match &config.output_path {
        Some(p) => p.clone(),
        None => input.with_extension("asm"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn well_formed_source_compiles_with_no_diagnostics() {
        let outcome = compile_source("print(1 + 2)\n");
        assert!(!outcome.has_errors());
        assert!(outcome.assembly.contains("_start:"));
    }

    #[test]
    fn malformed_source_still_returns_assembly_text() {
        let outcome = compile_source("x = \n");
        assert!(outcome.has_errors());
    }

    #[test]
    fn compile_file_writes_default_asm_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("prog.py");
        let mut f = fs::File::create(&input).expect("create input");
        writeln!(f, "print(1)").expect("write input");

        let config = CompilerConfig::new();
        let outcome = compile_file(&input, &config).expect("compile succeeds");
        assert!(!outcome.has_errors());

        let expected_output = input.with_extension("asm");
        assert!(expected_output.exists());
    }

    #[test]
    fn compile_file_honors_output_path_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("prog.py");
        fs::write(&input, "print(1)\n").expect("write input");
        let custom_output = dir.path().join("custom.s");

        let config = CompilerConfig::new().with_output_path(custom_output.clone());
        compile_file(&input, &config).expect("compile succeeds");

        assert!(custom_output.exists());
    }

    #[test]
    fn compile_file_skips_write_on_error_by_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("bad.py");
        fs::write(&input, "x = \n").expect("write input");

        let config = CompilerConfig::new();
        let outcome = compile_file(&input, &config).expect("driver does not error on diagnostics");
        assert!(outcome.has_errors());
        assert!(!input.with_extension("asm").exists());
    }

    #[test]
    fn compile_file_keep_going_writes_despite_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("bad.py");
        fs::write(&input, "x = \n").expect("write input");

        let config = CompilerConfig::new().with_emit_on_error(true);
        let outcome = compile_file(&input, &config).expect("driver does not error on diagnostics");
        assert!(outcome.has_errors());
        assert!(input.with_extension("asm").exists());
    }
}
