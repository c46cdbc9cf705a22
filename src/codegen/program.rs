//! Program-level code generation.
//!
//! Entry points for emitting a whole NASM program: the fixed data/bss
//! prologue, the `_start` trailer, and the final assembly of every buffer
//! into one output string.

use std::fmt::Write as _;

use super::{CodeEmitter, InternalError};
use crate::ast::NodeId;
use crate::symbols::{ScopeId, Symbol};

impl<'a> CodeEmitter<'a> {
    /// Runs the whole pipeline: prologue, every function definition, the
    /// `_start` body, and the runtime routines, returning the finished
    /// NASM text.
    pub fn emit_program(&mut self, program: NodeId) -> Result<String, InternalError> {
        let span = tracing::debug_span!("emit");
        let _enter = span.enter();

        let children = self.ast.children(program);
        let definitions = children[0];
        let instructions = children[1];

        for def in self.ast.children(definitions).to_vec() {
            self.emit_function(def)?;
        }

        let global = self.scopes.global();
        self.current_scope = global;
        self.current_function = None;
        writeln!(self.text, "_start:")?;
        for stmt in self.ast.children(instructions).to_vec() {
            self.emit_stmt(stmt)?;
        }
        writeln!(self.text, "    mov rax, 60")?;
        writeln!(self.text, "    xor rdi, rdi")?;
        writeln!(self.text, "    syscall")?;

        self.emit_shared_error_handlers();
        for routine in super::runtime::all_routines() {
            self.functions.push_str(routine);
        }

        tracing::debug!(
            functions = self.ast.children(definitions).len(),
            "code emission complete"
        );
        Ok(self.assemble())
    }

    /// Emits the fixed buffers every program needs regardless of its
    /// content: concatenation/list arenas, punctuation literals used by
    /// `print`, and the two runtime error messages.
    pub(super) fn emit_prologue_data(&mut self) {
        let d = &mut self.data;
        writeln!(d, "concat_buffer: times 2048 db 0").ok();
        writeln!(d, "concat_offset: dq 0").ok();
        writeln!(d, "list_buffer: times 8192 dq 0").ok();
        writeln!(d, "list_offset: dq 0").ok();
        writeln!(d, "newline: db 10").ok();
        writeln!(d, "space: db ' '").ok();
        writeln!(d, "minus_sign: db '-'").ok();
        writeln!(d, "open_bracket: db '['").ok();
        writeln!(d, "close_bracket: db ']'").ok();
        writeln!(d, "comma_space: db ', '").ok();
        writeln!(d, "div_zero_msg: db \"Error: division by zero\", 10").ok();
        writeln!(d, "div_zero_msg_len: equ $ - div_zero_msg").ok();
        writeln!(d, "index_error_msg: db \"Error: list index out of bounds\", 10").ok();
        writeln!(d, "index_error_msg_len: equ $ - index_error_msg").ok();
    }

    /// Shared exit targets every function body can jump to: division/modulo
    /// by zero and out-of-bounds list index.
    pub(super) fn emit_shared_error_handlers(&mut self) {
        let f = &mut self.functions;
        writeln!(f, ".division_by_zero_error:").ok();
        writeln!(f, "    mov rax, 1").ok();
        writeln!(f, "    mov rdi, 1").ok();
        writeln!(f, "    mov rsi, div_zero_msg").ok();
        writeln!(f, "    mov rdx, div_zero_msg_len").ok();
        writeln!(f, "    syscall").ok();
        writeln!(f, "    mov rax, 60").ok();
        writeln!(f, "    mov rdi, 1").ok();
        writeln!(f, "    syscall").ok();
        writeln!(f, ".index_error:").ok();
        writeln!(f, "    mov rax, 1").ok();
        writeln!(f, "    mov rdi, 1").ok();
        writeln!(f, "    mov rsi, index_error_msg").ok();
        writeln!(f, "    mov rdx, index_error_msg_len").ok();
        writeln!(f, "    syscall").ok();
        writeln!(f, "    mov rax, 60").ok();
        writeln!(f, "    mov rdi, 1").ok();
        writeln!(f, "    syscall").ok();
    }

    /// Registers a global variable's `dq 0` storage the first time its name
    /// is seen, mirroring the source's "declare on first assignment" rule.
    pub(super) fn declare_if_new(&mut self, name: &str) {
        if self.declared_vars.insert(name.to_string()) {
            writeln!(self.data, "{name}: dq 0").ok();
        }
    }

    /// Resolves a name to its storage operand in the current scope: a named
    /// global cell for top-level variables, or an `rbp`-relative slot for
    /// function locals and parameters. Falls back to a global cell for a
    /// name the symbol builder never registered, which should not happen
    /// for any program that reached emission without diagnostics.
    pub(super) fn operand(&self, name: &str) -> String {
        match self.scopes.lookup(self.current_scope, name) {
            Some(Symbol::Variable { is_global: false, offset, .. }) => {
                if *offset >= 0 {
                    format!("[rbp+{offset}]")
                } else {
                    format!("[rbp-{}]", -offset)
                }
            }
            _ => format!("[{name}]"),
        }
    }

    pub(super) fn scope_for_function(&self, name: &str) -> Option<ScopeId> {
        self.scopes
            .find_child_named(self.scopes.global(), &format!("function {name}"))
    }

    fn assemble(&self) -> String {
        let mut out = String::new();
        writeln!(out, "global _start").ok();
        writeln!(out, "section .data").ok();
        out.push_str(&self.data);
        writeln!(out, "section .bss").ok();
        writeln!(out, "buffer: resb 32").ok();
        writeln!(out, "section .text").ok();
        out.push_str(&self.text);
        out.push_str(&self.functions);
        out
    }
}
