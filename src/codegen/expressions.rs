//! Expression code generation.
//!
//! Every method here leaves its result in `rax` and returns the static type
//! tag it resolved (one of [`INTEGER`], [`STRING`], [`LIST`], [`BOOLEAN`], or
//! [`AUTO`] when nothing narrower is known), mirroring the source's
//! `getIdentifierType`/`isStringVariable` family of helpers without the
//! repeated scope-chain walks: the type comes back from the single
//! evaluation pass instead of a second lookup.

use std::fmt::Write as _;

use super::state::mangle_name;
use super::{CodeEmitter, InternalError};
use crate::ast::{NodeId, NodeKind};
use crate::symbols::{Symbol, AUTO, BOOLEAN, INTEGER, LIST, STRING};

impl<'a> CodeEmitter<'a> {
    pub(super) fn emit_expr(&mut self, node: NodeId) -> Result<String, InternalError> {
        let n = self.ast.get(node);
        match n.kind {
            NodeKind::Integer => {
                let value = &n.value;
                writeln!(self.text, "    mov rax, {value}")?;
                Ok(INTEGER.to_string())
            }
            NodeKind::StringLit => self.emit_string_literal(node),
            NodeKind::True => {
                writeln!(self.text, "    mov rax, 1")?;
                Ok(BOOLEAN.to_string())
            }
            NodeKind::False => {
                writeln!(self.text, "    mov rax, 0")?;
                Ok(BOOLEAN.to_string())
            }
            NodeKind::NoneLit => {
                writeln!(self.text, "    xor rax, rax")?;
                Ok(AUTO.to_string())
            }
            NodeKind::Identifier => self.emit_identifier(node),
            NodeKind::UnaryOp => self.emit_unary_minus(node),
            NodeKind::Not => self.emit_not(node),
            NodeKind::And => self.emit_bool_op(node, "and"),
            NodeKind::Or => self.emit_bool_op(node, "or"),
            NodeKind::Compare => self.emit_compare(node),
            NodeKind::ArithOp if n.value == "+" => self.emit_plus(node),
            NodeKind::ArithOp => self.emit_integer_binop(node, &n.value),
            NodeKind::TermOp => self.emit_integer_binop(node, &n.value),
            NodeKind::List => self.emit_list_literal(node),
            NodeKind::ListCall => self.emit_list_index(node),
            NodeKind::FunctionCall => self.emit_function_call(node),
            _ => Err(InternalError::Logic(format!(
                "node kind {:?} cannot be evaluated as an expression",
                n.kind
            ))),
        }
    }

    fn emit_string_literal(&mut self, node: NodeId) -> Result<String, InternalError> {
        let n = self.ast.get(node);
        let id = self.labels.next_string();
        writeln!(self.data, "str_{id}: db {}, 0", escape_nasm_string(&n.value))?;
        writeln!(self.text, "    mov rax, str_{id}")?;
        Ok(STRING.to_string())
    }

    fn emit_identifier(&mut self, node: NodeId) -> Result<String, InternalError> {
        let name = self.ast.get(node).value.clone();
        let operand = self.operand(&name);
        writeln!(self.text, "    mov rax, qword {operand}")?;
        Ok(self.scopes.type_of(self.current_scope, &name))
    }

    fn emit_unary_minus(&mut self, node: NodeId) -> Result<String, InternalError> {
        let inner = self.ast.children(node)[0];
        let ty = self.emit_expr(inner)?;
        if ty != INTEGER && ty != AUTO {
            self.errors.push_semantics(
                self.ast.get(node).line,
                "Unary minus requires an Integer operand, found ",
                ty,
            );
        }
        writeln!(self.text, "    neg rax")?;
        Ok(INTEGER.to_string())
    }

    fn emit_not(&mut self, node: NodeId) -> Result<String, InternalError> {
        let inner = self.ast.children(node)[0];
        self.emit_expr(inner)?;
        writeln!(self.text, "    xor rax, 1")?;
        Ok(BOOLEAN.to_string())
    }

    fn emit_bool_op(&mut self, node: NodeId, op: &str) -> Result<String, InternalError> {
        let children = self.ast.children(node).to_vec();
        self.emit_expr(children[0])?;
        writeln!(self.text, "    push rax")?;
        self.emit_expr(children[1])?;
        writeln!(self.text, "    pop rbx")?;
        match op {
            "and" => writeln!(self.text, "    and rax, rbx")?,
            _ => writeln!(self.text, "    or rax, rbx")?,
        }
        Ok(BOOLEAN.to_string())
    }

    fn emit_compare(&mut self, node: NodeId) -> Result<String, InternalError> {
        let children = self.ast.children(node).to_vec();
        let op = self.ast.get(node).value.clone();
        self.emit_expr(children[0])?;
        writeln!(self.text, "    push rax")?;
        self.emit_expr(children[1])?;
        writeln!(self.text, "    pop rbx")?;
        writeln!(self.text, "    cmp rbx, rax")?;
        let set = match op.as_str() {
            "==" => "sete",
            "!=" => "setne",
            "<" => "setl",
            ">" => "setg",
            "<=" => "setle",
            ">=" => "setge",
            _ => return Err(InternalError::Logic(format!("unknown comparison operator {op}"))),
        };
        writeln!(self.text, "    {set} al")?;
        writeln!(self.text, "    movzx rax, al")?;
        Ok(BOOLEAN.to_string())
    }

    /// `+` dispatches at runtime when either operand's static type is still
    /// unresolved: string concatenation and list concatenation are both
    /// discriminated by checking whether the left operand's address falls
    /// inside `concat_buffer`/`list_buffer`, matching the design note that
    /// keeps the address-range probe rather than introducing tagged values.
    fn emit_plus(&mut self, node: NodeId) -> Result<String, InternalError> {
        let children = self.ast.children(node).to_vec();
        let left_ty = self.emit_expr(children[0])?;
        writeln!(self.text, "    push rax")?;
        let right_ty = self.emit_expr(children[1])?;
        writeln!(self.text, "    mov rsi, rax")?;
        writeln!(self.text, "    pop rdi")?;

        match (left_ty.as_str(), right_ty.as_str()) {
            (STRING, STRING) => {
                writeln!(self.text, "    call str_concat")?;
                Ok(STRING.to_string())
            }
            (LIST, LIST) => {
                writeln!(self.text, "    call list_concat")?;
                Ok(LIST.to_string())
            }
            (INTEGER, INTEGER) => {
                writeln!(self.text, "    mov rax, rdi")?;
                writeln!(self.text, "    add rax, rsi")?;
                Ok(INTEGER.to_string())
            }
            (a, b) if a != AUTO && b != AUTO && a != b => {
                self.errors.push_semantics(
                    self.ast.get(node).line,
                    format!("Operand type mismatch in '+': {a} and {b}"),
                    "",
                );
                writeln!(self.text, "    mov rax, rdi")?;
                writeln!(self.text, "    add rax, rsi")?;
                Ok(AUTO.to_string())
            }
            _ => {
                // One or both operands only known at runtime: fall back to the
                // source's address-range probe against the two arena buffers.
                writeln!(self.text, "    cmp rdi, concat_buffer")?;
                writeln!(self.text, "    jl .plus_try_list_{node_id}", node_id = node.0)?;
                writeln!(self.text, "    cmp rdi, concat_buffer + 2048")?;
                writeln!(self.text, "    jge .plus_try_list_{node_id}", node_id = node.0)?;
                writeln!(self.text, "    call str_concat")?;
                writeln!(self.text, "    jmp .plus_done_{node_id}", node_id = node.0)?;
                writeln!(self.text, ".plus_try_list_{node_id}:", node_id = node.0)?;
                writeln!(self.text, "    cmp rdi, list_buffer")?;
                writeln!(self.text, "    jl .plus_integer_{node_id}", node_id = node.0)?;
                writeln!(self.text, "    cmp rdi, list_buffer + 65536")?;
                writeln!(self.text, "    jge .plus_integer_{node_id}", node_id = node.0)?;
                writeln!(self.text, "    call list_concat")?;
                writeln!(self.text, "    jmp .plus_done_{node_id}", node_id = node.0)?;
                writeln!(self.text, ".plus_integer_{node_id}:", node_id = node.0)?;
                writeln!(self.text, "    mov rax, rdi")?;
                writeln!(self.text, "    add rax, rsi")?;
                writeln!(self.text, ".plus_done_{node_id}:", node_id = node.0)?;
                Ok(AUTO.to_string())
            }
        }
    }

    /// `-`, `*`, `//`, `%`: both operands must be Integer. `//` and `%`
    /// guard against a zero divisor with a shared jump to
    /// `.division_by_zero_error`.
    fn emit_integer_binop(&mut self, node: NodeId, op: &str) -> Result<String, InternalError> {
        let children = self.ast.children(node).to_vec();
        let left_ty = self.emit_expr(children[0])?;
        writeln!(self.text, "    push rax")?;
        let right_ty = self.emit_expr(children[1])?;
        writeln!(self.text, "    mov rbx, rax")?;
        writeln!(self.text, "    pop rax")?;

        for (side, ty) in [("left", &left_ty), ("right", &right_ty)] {
            if ty != INTEGER && ty != AUTO {
                self.errors.push_semantics(
                    self.ast.get(node).line,
                    format!("Operand type mismatch in '{op}': {side} operand is {ty}, expected Integer"),
                    "",
                );
            }
        }

        match op {
            "-" => {
                writeln!(self.text, "    sub rax, rbx")?;
            }
            "*" => {
                writeln!(self.text, "    imul rax, rbx")?;
            }
            "//" => {
                writeln!(self.text, "    cmp rbx, 0")?;
                writeln!(self.text, "    je .division_by_zero_error")?;
                writeln!(self.text, "    cqo")?;
                writeln!(self.text, "    idiv rbx")?;
            }
            "%" => {
                writeln!(self.text, "    cmp rbx, 0")?;
                writeln!(self.text, "    je .division_by_zero_error")?;
                writeln!(self.text, "    cqo")?;
                writeln!(self.text, "    idiv rbx")?;
                writeln!(self.text, "    mov rax, rdx")?;
            }
            _ => return Err(InternalError::Logic(format!("unknown arithmetic operator {op}"))),
        }
        Ok(INTEGER.to_string())
    }

    /// Bump-allocates the next slot in `list_buffer`: a size word followed by
    /// each element's value. An empty literal stores a single zero word.
    fn emit_list_literal(&mut self, node: NodeId) -> Result<String, InternalError> {
        let items = self.ast.children(node).to_vec();
        writeln!(self.text, "    mov rax, qword [list_offset]")?;
        writeln!(self.text, "    lea r12, [list_buffer + rax]")?;

        if items.is_empty() {
            writeln!(self.text, "    mov qword [r12], 0")?;
            writeln!(self.text, "    add qword [list_offset], 8")?;
            writeln!(self.text, "    mov rax, r12")?;
            return Ok(LIST.to_string());
        }

        writeln!(self.text, "    mov qword [r12], {}", items.len())?;
        let bytes = (items.len() as i64 + 1) * 8;
        writeln!(self.text, "    add qword [list_offset], {bytes}")?;

        for (i, item) in items.iter().enumerate() {
            let n = self.ast.get(*item);
            if matches!(n.kind, NodeKind::Identifier) && self.scopes.type_of(self.current_scope, &n.value) == AUTO {
                self.errors.push_semantics(n.line, "Undefined Variable", n.value.clone());
            }
            writeln!(self.text, "    push r12")?;
            self.emit_expr(*item)?;
            writeln!(self.text, "    pop r12")?;
            writeln!(self.text, "    mov qword [r12 + {}], rax", 8 + 8 * i)?;
        }
        writeln!(self.text, "    mov rax, r12")?;
        Ok(LIST.to_string())
    }

    /// Reading `a[i]` (as opposed to assigning to it): bounds-check then load.
    fn emit_list_index(&mut self, node: NodeId) -> Result<String, InternalError> {
        let children = self.ast.children(node).to_vec();
        self.emit_expr(children[0])?;
        writeln!(self.text, "    push rax")?;
        self.emit_expr(children[1])?;
        writeln!(self.text, "    pop rbx")?;
        writeln!(self.text, "    cmp rax, 0")?;
        writeln!(self.text, "    jl .index_error")?;
        writeln!(self.text, "    cmp rax, qword [rbx]")?;
        writeln!(self.text, "    jge .index_error")?;
        writeln!(self.text, "    mov rax, qword [rbx + 8 + rax*8]")?;
        Ok(AUTO.to_string())
    }

    fn emit_function_call(&mut self, node: NodeId) -> Result<String, InternalError> {
        let children = self.ast.children(node).to_vec();
        if children.len() != 2 {
            return Err(InternalError::Logic("FunctionCall must have 2 children".into()));
        }
        let callee = self.ast.get(children[0]).value.clone();
        let args = self.ast.children(children[1]).to_vec();

        match callee.as_str() {
            "list" => self.emit_list_of_range(node, &args),
            "len" => self.emit_len(node, &args),
            _ => self.emit_user_call(node, &callee, &args),
        }
    }

    /// Inlines `list(range(n))` directly into `list_range`, bypassing the
    /// call convention entirely, matching the source's special-case.
    fn emit_list_of_range(&mut self, node: NodeId, args: &[NodeId]) -> Result<String, InternalError> {
        let line = self.ast.get(node).line;
        let Some(range_call) = args.first().copied() else {
            self.errors.push_semantics(line, "list(...) expects a single range(...) argument", "");
            writeln!(self.text, "    xor rax, rax")?;
            return Ok(LIST.to_string());
        };
        let rn = self.ast.get(range_call);
        if rn.kind != NodeKind::FunctionCall || self.ast.get(self.ast.children(range_call)[0]).value != "range" {
            self.errors.push_semantics(line, "list(...) only supports list(range(n))", "");
            writeln!(self.text, "    xor rax, rax")?;
            return Ok(LIST.to_string());
        }
        let range_args = self.ast.children(self.ast.children(range_call)[1]).to_vec();
        if let Some(n_expr) = range_args.first() {
            self.emit_expr(*n_expr)?;
        } else {
            writeln!(self.text, "    xor rax, rax")?;
        }
        writeln!(self.text, "    call list_range")?;
        Ok(LIST.to_string())
    }

    /// `len` on a `String` counts bytes up to the terminating NUL inline; on
    /// a `List` it reads the size word. Anything else is a Semantics error.
    fn emit_len(&mut self, node: NodeId, args: &[NodeId]) -> Result<String, InternalError> {
        let line = self.ast.get(node).line;
        let Some(arg) = args.first().copied() else {
            self.errors.push_semantics(line, "len(...) expects exactly one argument", "");
            writeln!(self.text, "    xor rax, rax")?;
            return Ok(INTEGER.to_string());
        };
        let ty = self.emit_expr(arg)?;
        match ty.as_str() {
            STRING => {
                let id = self.labels.next_if();
                writeln!(self.text, "    mov rbx, rax")?;
                writeln!(self.text, "    xor rcx, rcx")?;
                writeln!(self.text, ".len_loop_{id}:")?;
                writeln!(self.text, "    cmp byte [rbx + rcx], 0")?;
                writeln!(self.text, "    je .len_done_{id}")?;
                writeln!(self.text, "    inc rcx")?;
                writeln!(self.text, "    jmp .len_loop_{id}")?;
                writeln!(self.text, ".len_done_{id}:")?;
                writeln!(self.text, "    mov rax, rcx")?;
            }
            LIST => {
                writeln!(self.text, "    mov rax, qword [rax]")?;
            }
            _ => {
                self.errors.push_semantics(line, "len(...) requires a String or List argument, found ", ty);
                writeln!(self.text, "    xor rax, rax")?;
            }
        }
        Ok(INTEGER.to_string())
    }

    /// Full System V calling convention: save callee-saved registers,
    /// 16-byte-align `rsp`, push arguments right-to-left, `call`, then
    /// unwind in reverse.
    fn emit_user_call(&mut self, node: NodeId, callee: &str, args: &[NodeId]) -> Result<String, InternalError> {
        let line = self.ast.get(node).line;
        match self.scopes.lookup(self.scopes.global(), callee) {
            Some(Symbol::Function { .. }) => {}
            _ => {
                self.errors
                    .push_semantics(line, "Function Call Error: ", format!("{callee} is not defined."));
                writeln!(self.text, "    xor rax, rax")?;
                return Ok(AUTO.to_string());
            }
        }

        writeln!(self.text, "    push rbx")?;
        writeln!(self.text, "    push r12")?;
        writeln!(self.text, "    push r13")?;
        writeln!(self.text, "    push r14")?;
        writeln!(self.text, "    push r15")?;
        writeln!(self.text, "    mov rbx, rsp")?;
        writeln!(self.text, "    and rsp, -16")?;
        writeln!(self.text, "    push rbx")?;

        for arg in args.iter().rev() {
            self.emit_expr(*arg)?;
            writeln!(self.text, "    push rax")?;
        }
        writeln!(self.text, "    call {}", mangle_name(callee))?;
        if !args.is_empty() {
            writeln!(self.text, "    add rsp, {}", args.len() * 8)?;
        }
        writeln!(self.text, "    pop rsp")?;
        writeln!(self.text, "    pop r15")?;
        writeln!(self.text, "    pop r14")?;
        writeln!(self.text, "    pop r13")?;
        writeln!(self.text, "    pop r12")?;
        writeln!(self.text, "    pop rbx")?;

        Ok(self.scopes.function_return_type(self.scopes.global(), callee))
    }
}

/// Renders a source string literal's text as a NASM `db` byte list,
/// escaping embedded quotes the lexer already unescaped back out.
fn escape_nasm_string(text: &str) -> String {
    if text.is_empty() {
        return "0".to_string();
    }
    let mut parts = Vec::new();
    let mut current = String::new();
    for b in text.bytes() {
        if (0x20..0x7f).contains(&b) && b != b'"' {
            current.push(b as char);
        } else {
            if !current.is_empty() {
                parts.push(format!("\"{current}\""));
                current.clear();
            }
            parts.push(b.to_string());
        }
    }
    if !current.is_empty() {
        parts.push(format!("\"{current}\""));
    }
    parts.join(", ")
}
