//! Statement-level code generation: assignment, `print`, `return`, and
//! function prologue/epilogue.

use std::fmt::Write as _;

use super::state::mangle_name;
use super::{CodeEmitter, InternalError};
use crate::ast::{NodeId, NodeKind};
use crate::symbols::{Symbol, STRING};

impl<'a> CodeEmitter<'a> {
    pub(super) fn emit_stmt(&mut self, node: NodeId) -> Result<(), InternalError> {
        match self.ast.get(node).kind {
            NodeKind::Affect => self.emit_affect(node),
            NodeKind::Print => self.emit_print(node),
            NodeKind::If => self.emit_if(node),
            NodeKind::For => self.emit_for(node),
            NodeKind::Return => self.emit_return(node),
            _ => {
                self.emit_expr(node)?;
                Ok(())
            }
        }
    }

    /// Prologue, parameter copy-in is unnecessary (parameters already live
    /// at their `[rbp+16+8*i]` slots by the calling convention), body, and
    /// the named `.return_<name>` epilogue.
    pub(super) fn emit_function(&mut self, def: NodeId) -> Result<(), InternalError> {
        let node = self.ast.get(def);
        let name = node.value.clone();
        let children = self.ast.children(def).to_vec();
        if children.len() != 2 {
            return Err(InternalError::Logic("FunctionDefinition must have 2 children".into()));
        }
        let body = children[1];

        let func_scope = self
            .scope_for_function(&name)
            .ok_or_else(|| InternalError::Logic(format!("no scope registered for function {name}")))?;
        let frame_size = match self.scopes.lookup(self.scopes.global(), &name) {
            Some(Symbol::Function { frame_size, .. }) => *frame_size,
            _ => return Err(InternalError::Logic(format!("function {name} missing symbol"))),
        };

        self.current_scope = func_scope;
        self.current_function = Some(name.clone());
        let label = mangle_name(&name);

        writeln!(self.text, "{label}:")?;
        writeln!(self.text, "    push rbp")?;
        writeln!(self.text, "    mov rbp, rsp")?;
        if frame_size > 0 {
            writeln!(self.text, "    sub rsp, {frame_size}")?;
        }
        writeln!(self.text, "    push rbx")?;
        writeln!(self.text, "    push r12")?;
        writeln!(self.text, "    push r13")?;
        writeln!(self.text, "    push r14")?;
        writeln!(self.text, "    push r15")?;

        for stmt in self.ast.children(body).to_vec() {
            self.emit_stmt(stmt)?;
        }

        writeln!(self.text, ".return_{label}:")?;
        writeln!(self.text, "    pop r15")?;
        writeln!(self.text, "    pop r14")?;
        writeln!(self.text, "    pop r13")?;
        writeln!(self.text, "    pop r12")?;
        writeln!(self.text, "    pop rbx")?;
        writeln!(self.text, "    mov rsp, rbp")?;
        writeln!(self.text, "    pop rbp")?;
        writeln!(self.text, "    ret")?;

        self.current_scope = self.scopes.global();
        self.current_function = None;
        Ok(())
    }

    /// `ListCall` targets bounds-check the index at runtime before storing;
    /// plain identifiers register their global cell on first sight and have
    /// their tracked type updated to whatever the RHS evaluates to.
    fn emit_affect(&mut self, node: NodeId) -> Result<(), InternalError> {
        let children = self.ast.children(node).to_vec();
        if children.len() != 2 {
            return Err(InternalError::Logic("Affect node must have 2 children".into()));
        }
        let (target, rhs) = (children[0], children[1]);

        if self.ast.get(target).kind == NodeKind::ListCall {
            return self.emit_list_assign(target, rhs);
        }

        let name = self.ast.get(target).value.clone();
        let is_global = self.current_scope == self.scopes.global();
        if is_global {
            self.declare_if_new(&name);
        }
        let operand = self.operand(&name);

        let ty = self.emit_expr(rhs)?;
        writeln!(self.text, "    mov qword {operand}, rax")?;

        if is_global {
            self.scopes.upgrade_type(self.current_scope, &name, &ty);
        } else {
            self.scopes.set_type(self.current_scope, &name, &ty);
        }
        Ok(())
    }

    fn emit_list_assign(&mut self, list_call: NodeId, rhs: NodeId) -> Result<(), InternalError> {
        let children = self.ast.children(list_call).to_vec();
        if children.len() != 2 {
            return Err(InternalError::Logic("ListCall node must have 2 children".into()));
        }
        let (base_ident, index_expr) = (children[0], children[1]);
        let id = self.labels.next_if();

        self.emit_expr(base_ident)?;
        writeln!(self.text, "    push rax")?;
        self.emit_expr(index_expr)?;
        writeln!(self.text, "    pop rbx")?;
        writeln!(self.text, "    cmp rax, 0")?;
        writeln!(self.text, "    jl .index_error")?;
        writeln!(self.text, "    cmp rax, qword [rbx]")?;
        writeln!(self.text, "    jge .index_error_{id}")?;
        writeln!(self.text, "    lea rcx, [rbx + 8 + rax*8]")?;
        writeln!(self.text, "    push rcx")?;
        self.emit_expr(rhs)?;
        writeln!(self.text, "    pop rcx")?;
        writeln!(self.text, "    mov qword [rcx], rax")?;
        writeln!(self.text, "    jmp .end_list_assign_{id}")?;
        writeln!(self.text, ".index_error_{id}:")?;
        writeln!(self.text, "    jmp .index_error")?;
        writeln!(self.text, ".end_list_assign_{id}:")?;
        Ok(())
    }

    /// `List` arguments are spread as comma-separated items; every other
    /// expression is a single argument. A single space separates arguments
    /// and one trailing newline closes the call.
    fn emit_print(&mut self, node: NodeId) -> Result<(), InternalError> {
        let children = self.ast.children(node).to_vec();
        if children.is_empty() {
            return Err(InternalError::Logic("Print node must have one child".into()));
        }
        let args_node = children[0];
        let args = if self.ast.get(args_node).kind == NodeKind::List {
            self.ast.children(args_node).to_vec()
        } else {
            vec![args_node]
        };

        for (i, arg) in args.iter().enumerate() {
            let ty = self.emit_expr(*arg)?;
            if ty == STRING {
                writeln!(self.text, "    call print_string")?;
            } else {
                writeln!(self.text, "    call print_not_string")?;
            }
            if i + 1 < args.len() {
                writeln!(self.text, "    mov rax, 1")?;
                writeln!(self.text, "    mov rdi, 1")?;
                writeln!(self.text, "    mov rsi, space")?;
                writeln!(self.text, "    mov rdx, 1")?;
                writeln!(self.text, "    syscall")?;
            }
        }
        writeln!(self.text, "    mov rax, 1")?;
        writeln!(self.text, "    mov rdi, 1")?;
        writeln!(self.text, "    mov rsi, newline")?;
        writeln!(self.text, "    mov rdx, 1")?;
        writeln!(self.text, "    syscall")?;
        Ok(())
    }

    fn emit_return(&mut self, node: NodeId) -> Result<(), InternalError> {
        let func = self
            .current_function
            .clone()
            .ok_or_else(|| InternalError::Logic("return statement outside a function reached emission".into()))?;
        let children = self.ast.children(node).to_vec();
        if let Some(expr) = children.first() {
            self.emit_expr(*expr)?;
        } else {
            writeln!(self.text, "    xor rax, rax")?;
        }
        writeln!(self.text, "    jmp .return_{}", mangle_name(&func))?;
        Ok(())
    }
}
