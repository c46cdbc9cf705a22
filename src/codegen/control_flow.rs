//! Control flow code generation: `if`/`else` and `for ... in range(...)`.

use std::fmt::Write as _;

use super::{CodeEmitter, InternalError};
use crate::ast::{NodeId, NodeKind};

impl<'a> CodeEmitter<'a> {
    /// `.else_<id>` / `.endif_<id>` labels; condition value is left in `rax`
    /// by the recursive expression evaluation, compared against zero.
    pub(super) fn emit_if(&mut self, node: NodeId) -> Result<(), InternalError> {
        let children = self.ast.children(node).to_vec();
        if children.len() < 2 {
            return Err(InternalError::Logic("If node missing condition or body".into()));
        }
        let id = self.labels.next_if();
        self.emit_expr(children[0])?;
        writeln!(self.text, "    cmp rax, 0")?;
        if children.len() == 3 {
            writeln!(self.text, "    je .else_{id}")?;
            self.emit_block(children[1])?;
            writeln!(self.text, "    jmp .endif_{id}")?;
            writeln!(self.text, ".else_{id}:")?;
            self.emit_block(children[2])?;
        } else {
            writeln!(self.text, "    je .endif_{id}")?;
            self.emit_block(children[1])?;
        }
        writeln!(self.text, ".endif_{id}:")?;
        Ok(())
    }

    /// Only `for x in range(n)` is supported; any other arity to `range` (or
    /// any other iterable expression) is a Semantics error raised here,
    /// mirroring the original, which performs this check during code
    /// generation rather than symbol building.
    pub(super) fn emit_for(&mut self, node: NodeId) -> Result<(), InternalError> {
        let children = self.ast.children(node).to_vec();
        if children.len() != 3 {
            return Err(InternalError::Logic("For node must have 3 children".into()));
        }
        let (ident, iterable, body) = (children[0], children[1], children[2]);
        let loop_var = self.ast.get(ident).value.clone();
        let operand = self.operand(&loop_var);
        if self.current_scope == self.scopes.global() {
            self.declare_if_new(&loop_var);
        }

        let bound = self.range_argument(iterable)?;

        let id = self.labels.next_loop();
        writeln!(self.text, "    mov qword {operand}, 0")?;
        self.emit_expr(bound)?;
        writeln!(self.text, "    push rax")?;
        writeln!(self.text, ".loop_start_{id}:")?;
        writeln!(self.text, "    mov rax, qword {operand}")?;
        writeln!(self.text, "    cmp rax, qword [rsp]")?;
        writeln!(self.text, "    jge .loop_end_{id}")?;
        self.emit_block(body)?;
        writeln!(self.text, "    inc qword {operand}")?;
        writeln!(self.text, "    jmp .loop_start_{id}")?;
        writeln!(self.text, ".loop_end_{id}:")?;
        writeln!(self.text, "    add rsp, 8")?;
        Ok(())
    }

    /// Validates `iterable` is `range(n)` with exactly one argument and
    /// returns the node for `n`.
    fn range_argument(&mut self, iterable: NodeId) -> Result<NodeId, InternalError> {
        let n = self.ast.get(iterable);
        if n.kind != NodeKind::FunctionCall {
            self.errors
                .push_semantics(n.line, "Only range(...) is supported as a for-loop iterable.", "");
            return Ok(iterable);
        }
        let children = self.ast.children(iterable);
        let callee = self.ast.get(children[0]).value.clone();
        let args = self.ast.children(children[1]).to_vec();
        if callee != "range" {
            self.errors
                .push_semantics(n.line, "Only range(...) is supported as a for-loop iterable.", "");
            return Ok(args.first().copied().unwrap_or(children[1]));
        }
        if args.len() != 1 {
            self.errors
                .push_semantics(n.line, "Expected one parameter for range", "");
        }
        Ok(args.first().copied().unwrap_or_else(|| children[1]))
    }

    fn emit_block(&mut self, body: NodeId) -> Result<(), InternalError> {
        for stmt in self.ast.children(body).to_vec() {
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }
}
