//! x86-64 NASM Code Generation
//!
//! Emits a single NASM text file targeting the Linux syscall ABI directly
//! (`write`/`exit`, no libc). Code generation is split into focused
//! submodules the same way the generator walks the AST: declarations,
//! statements, control flow, and expressions each get their own file.
//!
//! # Module Structure
//!
//! - `state.rs`: label counters and name mangling (`CodeEmitter` itself
//!   lives here too, below).
//! - `error.rs`: `InternalError`, the emitter's only error type.
//! - `program.rs`: prologue data/bss, `_start`, and final assembly.
//! - `statements.rs`: `Affect`/`Print`/`Return`/function prologue-epilogue.
//! - `control_flow.rs`: `If`/`For`.
//! - `expressions.rs`: everything that leaves a value in `rax`.
//! - `runtime.rs`: the fixed runtime support routines.
//!
//! # Calling convention
//!
//! Arguments are pushed right-to-left on the stack; a callee reads its
//! `i`-th parameter at `[rbp + 16 + 8*i]`. Return value comes back in `rax`.
//! A callee must preserve `rbx, r12–r15`; a caller realigns `rsp` to 16
//! bytes before `call` and restores it afterward (see `expressions.rs`'s
//! `emit_user_call`).
//!
//! # Type tracking
//!
//! Unlike the symbol builder's monotonic static pass (`auto` only ever
//! upgrades to a concrete type), the emitter tracks types dynamically:
//! assigning a new value to an existing variable overwrites its recorded
//! type outright (`ScopeTree::set_type`), mirroring the source's
//! `updateSymbolType`.

mod control_flow;
mod error;
mod expressions;
mod program;
mod runtime;
mod state;
mod statements;

use std::collections::HashSet;

pub use error::InternalError;
use state::LabelCounters;

use crate::ast::{Ast, NodeId};
use crate::error::ErrorSink;
use crate::symbols::{ScopeId, ScopeTree};

/// Owns every mutable piece of state the NASM emitter needs: the three text
/// buffers it writes into, the set of globals already declared, label
/// counters, and which scope/function is currently being emitted. A single
/// instance is created per compilation; no state survives across runs.
pub struct CodeEmitter<'a> {
    ast: &'a Ast,
    scopes: &'a mut ScopeTree,
    errors: &'a mut ErrorSink,
    data: String,
    text: String,
    functions: String,
    declared_vars: HashSet<String>,
    labels: LabelCounters,
    current_function: Option<String>,
    current_scope: ScopeId,
}

impl<'a> CodeEmitter<'a> {
    pub fn new(ast: &'a Ast, scopes: &'a mut ScopeTree, errors: &'a mut ErrorSink) -> Self {
        let current_scope = scopes.global();
        let mut emitter = CodeEmitter {
            ast,
            scopes,
            errors,
            data: String::new(),
            text: String::new(),
            functions: String::new(),
            declared_vars: HashSet::new(),
            labels: LabelCounters::default(),
            current_function: None,
            current_scope,
        };
        emitter.emit_prologue_data();
        emitter
    }

    /// Emits the whole program and returns the finished NASM text.
    pub fn emit(mut self, program: NodeId) -> Result<String, InternalError> {
        self.emit_program(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::symbols::SymbolBuilder;

    fn emit_src(src: &str) -> (String, ErrorSink) {
        let mut errors = ErrorSink::new();
        let tokens = Lexer::new(src, &mut errors).tokenize();
        let (ast, program) = Parser::new(tokens, &mut errors).parse();
        let mut scopes = SymbolBuilder::new(&ast, &mut errors).build(program);
        let asm = CodeEmitter::new(&ast, &mut scopes, &mut errors)
            .emit(program)
            .expect("well-formed program should emit");
        (asm, errors)
    }

    #[test]
    fn emits_start_label_and_exit_syscall() {
        let (asm, errors) = emit_src("print(1 + 2)\n");
        assert!(!errors.has_errors());
        assert!(asm.contains("_start:"));
        assert!(asm.contains("mov rax, 60"));
    }

    #[test]
    fn integer_addition_emits_add_instruction() {
        let (asm, _) = emit_src("print(1 + 2)\n");
        assert!(asm.contains("add rax, rsi") || asm.contains("add rax,"));
    }

    #[test]
    fn global_assignment_declares_data_cell_once() {
        let (asm, _) = emit_src("x = 1\nx = 2\nprint(x)\n");
        let occurrences = asm.matches("x: dq 0").count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn function_definition_emits_named_label_and_return_target() {
        let (asm, errors) = emit_src("def f(n):\n    return n\nprint(f(5))\n");
        assert!(!errors.has_errors());
        assert!(asm.contains("f:"));
        assert!(asm.contains(".return_f:"));
    }

    #[test]
    fn for_loop_emits_paired_loop_labels() {
        let (asm, errors) = emit_src("for i in range(3):\n    print(i)\n");
        assert!(!errors.has_errors());
        assert!(asm.contains(".loop_start_0:"));
        assert!(asm.contains(".loop_end_0:"));
    }

    #[test]
    fn if_else_emits_paired_branch_labels() {
        let (asm, errors) = emit_src("if 1 == 1:\n    print(1)\nelse:\n    print(2)\n");
        assert!(!errors.has_errors());
        assert!(asm.contains(".else_0:"));
        assert!(asm.contains(".endif_0:"));
    }

    #[test]
    fn string_concatenation_emits_str_concat_call() {
        let (asm, errors) = emit_src("x = \"a\"\ny = \"b\"\nprint(x + y)\n");
        assert!(!errors.has_errors());
        assert!(asm.contains("call str_concat"));
    }

    #[test]
    fn list_literal_allocates_size_word_and_elements() {
        let (asm, errors) = emit_src("l = [1, 2, 3]\nprint(l)\n");
        assert!(!errors.has_errors());
        assert!(asm.contains("mov qword [r12], 3"));
    }

    #[test]
    fn division_by_integer_checks_zero_divisor() {
        let (asm, _) = emit_src("x = 4 // 2\nprint(x)\n");
        assert!(asm.contains(".division_by_zero_error"));
    }

    #[test]
    fn len_of_list_reads_size_word() {
        let (asm, errors) = emit_src("print(len([1, 2, 3]))\n");
        assert!(!errors.has_errors());
        assert!(asm.contains("mov rax, qword [rax]"));
    }

    #[test]
    fn calling_undefined_function_is_semantics_error_at_emission() {
        let mut errors = ErrorSink::new();
        let tokens = Lexer::new("print(g(1))\n", &mut errors).tokenize();
        let (ast, program) = Parser::new(tokens, &mut errors).parse();
        let mut scopes = SymbolBuilder::new(&ast, &mut errors).build(program);
        // the undefined-call diagnostic is already raised during symbol
        // validation; emission must not also panic on the malformed call.
        let result = CodeEmitter::new(&ast, &mut scopes, &mut errors).emit(program);
        assert!(result.is_ok());
        assert!(errors.has_errors());
    }
}
