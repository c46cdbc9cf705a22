//! A compiler for a small Python-like language, targeting x86-64 NASM
//! assembly against the Linux syscall ABI directly (no libc).
//!
//! The pipeline is four stages feeding a shared diagnostic sink:
//!
//! ```text
//! source text -> Lexer -> Parser -> SymbolBuilder -> CodeEmitter -> NASM text
//! ```
//!
//! None of the four core stages read any configuration; [`CompilerConfig`]
//! and [`driver::compile_source`] exist purely for the CLI binary.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod token;

pub use config::CompilerConfig;
pub use driver::{compile_file, compile_source, CompileOutcome, DriverError};
pub use error::{Category, Diagnostic, ErrorSink};
