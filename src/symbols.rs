//! Scope tree, symbol table, stack-frame layout, and the lightweight type
//! inference shared by symbol building and code emission.
//!
//! The source program's scope tree is built from reference-counted nodes
//! with a raw parent pointer; here a [`ScopeTree`] owns every [`Scope`] in a
//! flat `Vec` and scopes reference each other by [`ScopeId`], so parent
//! links are plain indices rather than weak pointers.

use std::collections::HashSet;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::ErrorSink;

pub const AUTO: &str = "auto";
pub const AUTO_FN: &str = "autoFun";
pub const VOID: &str = "void";
pub const INTEGER: &str = "Integer";
pub const STRING: &str = "String";
pub const LIST: &str = "List";
pub const BOOLEAN: &str = "Boolean";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarCategory {
    Variable,
    Parameter,
}

/// A tagged variant over the three kinds of names a scope can bind.
#[derive(Debug, Clone)]
pub enum Symbol {
    Variable {
        name: String,
        ty: String,
        category: VarCategory,
        is_global: bool,
        offset: i64,
    },
    Function {
        name: String,
        return_type: String,
        num_params: usize,
        table_id: usize,
        frame_size: i64,
    },
    Array {
        name: String,
        element_type: String,
        size: usize,
        is_global: bool,
        offset: i64,
    },
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable { name, .. } => name,
            Symbol::Function { name, .. } => name,
            Symbol::Array { name, .. } => name,
        }
    }

    pub fn type_tag(&self) -> &str {
        match self {
            Symbol::Variable { ty, .. } => ty,
            Symbol::Function { return_type, .. } => return_type,
            Symbol::Array { .. } => "array",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

#[derive(Debug)]
pub struct Scope {
    pub name: String,
    pub parent: Option<ScopeId>,
    pub id: usize,
    pub symbols: Vec<Symbol>,
    pub children: Vec<ScopeId>,
    pub next_data_offset: i64,
}

impl Scope {
    fn find_immediate(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name() == name)
    }

    fn find_immediate_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.iter_mut().find(|s| s.name() == name)
    }
}

/// Owns every [`Scope`] created while building the symbol table for one
/// program. The root scope (index 0) is always named `global`.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> (Self, ScopeId) {
        let global = Scope {
            name: "global".to_string(),
            parent: None,
            id: 0,
            symbols: Vec::new(),
            children: Vec::new(),
            next_data_offset: -8,
        };
        let tree = ScopeTree {
            scopes: vec![global],
        };
        (tree, ScopeId(0))
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn new_child(&mut self, parent: ScopeId, name: impl Into<String>, id: usize) -> ScopeId {
        let child_id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.into(),
            parent: Some(parent),
            id,
            symbols: Vec::new(),
            children: Vec::new(),
            next_data_offset: -8,
        });
        self.scopes[parent.0].children.push(child_id);
        child_id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    /// Finds a child scope of `parent` by its exact name (e.g. `"function f"`).
    pub fn find_child_named(&self, parent: ScopeId, name: &str) -> Option<ScopeId> {
        self.scopes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.scopes[c.0].name == name)
    }

    /// Adds a symbol to `scope` if no symbol of the same name already lives
    /// there. Returns `false` on a silent duplicate, matching the source
    /// table's "first registration wins" behavior for locals.
    pub fn add_symbol(&mut self, scope: ScopeId, symbol: Symbol) -> bool {
        if self.scopes[scope.0].find_immediate(symbol.name()).is_some() {
            return false;
        }
        self.scopes[scope.0].symbols.push(symbol);
        true
    }

    /// Walks from `scope` up through parents looking for `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(sym) = self.scopes[id.0].find_immediate(name) {
                return Some(sym);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    pub fn lookup_immediate(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[scope.0].find_immediate(name)
    }

    /// Returns the type tag a name currently resolves to, walking the scope
    /// chain from `scope`, or `auto` if the name is unbound.
    pub fn type_of(&self, scope: ScopeId, name: &str) -> String {
        self.lookup(scope, name)
            .map(|s| s.type_tag().to_string())
            .unwrap_or_else(|| AUTO.to_string())
    }

    /// Monotonic update used by `SymbolBuilder`'s inference pass: a concrete
    /// type only ever replaces `auto`, never the reverse.
    pub fn upgrade_type(&mut self, scope: ScopeId, name: &str, new_ty: &str) {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(Symbol::Variable { ty, .. }) = self.scopes[id.0].find_immediate_mut(name) {
                if ty == AUTO && new_ty != AUTO {
                    *ty = new_ty.to_string();
                }
                return;
            }
            current = self.scopes[id.0].parent;
        }
    }

    /// Direct update used by the emitter's dynamic type tracking: sets the
    /// type outright, matching the source's `updateSymbolType`.
    pub fn set_type(&mut self, scope: ScopeId, name: &str, new_ty: &str) {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(Symbol::Variable { ty, .. }) = self.scopes[id.0].find_immediate_mut(name) {
                *ty = new_ty.to_string();
                return;
            }
            current = self.scopes[id.0].parent;
        }
    }

    /// Resets every local/parameter variable in the named function scope
    /// back to `auto`, matching the source's `resetFunctionVarTypes` (called
    /// after a call returns, so the next call starts from fresh inference).
    pub fn reset_function_var_types(&mut self, global: ScopeId, func_name: &str) {
        if let Some(func_scope) = self.find_child_named(global, &format!("function {func_name}")) {
            for sym in &mut self.scopes[func_scope.0].symbols {
                if let Symbol::Variable { ty, .. } = sym {
                    *ty = AUTO.to_string();
                }
            }
        }
    }

    pub fn set_function_return_type(&mut self, global: ScopeId, func_name: &str, return_type: &str) {
        for sym in &mut self.scopes[global.0].symbols {
            if let Symbol::Function { name, return_type: rt, .. } = sym {
                if name == func_name {
                    *rt = return_type.to_string();
                    return;
                }
            }
        }
    }

    pub fn function_return_type(&self, global: ScopeId, func_name: &str) -> String {
        self.scopes[global.0]
            .symbols
            .iter()
            .find_map(|s| match s {
                Symbol::Function { name, return_type, .. } if name == func_name => {
                    Some(return_type.clone())
                }
                _ => None,
            })
            .unwrap_or_else(|| AUTO.to_string())
    }
}

/// Rounds `locals_bytes` up so that `locals_bytes + 40` is a multiple of 16,
/// per §3's frame-size invariant (40 bytes = five callee-saved registers).
fn compute_frame_size(final_local_offset: i64) -> i64 {
    let locals_bytes = if final_local_offset == -8 {
        0
    } else {
        -(final_local_offset + 8)
    };
    let total = locals_bytes + 40;
    let padding = (16 - (total % 16)) % 16;
    locals_bytes + padding
}

/// Walks a `Program` node and builds the scope tree: function scopes with
/// parameter/local offsets, global variables, and inferred types.
pub struct SymbolBuilder<'a> {
    ast: &'a Ast,
    errors: &'a mut ErrorSink,
    next_table_id: usize,
    defined_function_names: HashSet<String>,
    loop_stack: Vec<String>,
}

impl<'a> SymbolBuilder<'a> {
    pub fn new(ast: &'a Ast, errors: &'a mut ErrorSink) -> Self {
        SymbolBuilder {
            ast,
            errors,
            next_table_id: 1,
            defined_function_names: HashSet::new(),
            loop_stack: Vec::new(),
        }
    }

    pub fn build(mut self, program: NodeId) -> ScopeTree {
        let span = tracing::debug_span!("symbol_build");
        let _enter = span.enter();
        let (mut scopes, global) = ScopeTree::new();
        let children = self.ast.children(program);
        let definitions = children[0];
        let instructions = children[1];

        for def in self.ast.children(definitions).to_vec() {
            self.register_function(&mut scopes, global, def);
        }
        for stmt in self.ast.children(instructions).to_vec() {
            self.register_top_level(&mut scopes, global, stmt);
        }

        self.validate(&scopes, global, program);
        tracing::debug!(
            function_count = self.defined_function_names.len(),
            "symbol build complete"
        );
        scopes
    }

    fn register_function(&mut self, scopes: &mut ScopeTree, global: ScopeId, def: NodeId) {
        let node = self.ast.get(def);
        let name = node.value.clone();

        if self.defined_function_names.contains(&name) {
            self.errors.push_semantic(
                node.line,
                "Function already defined: ",
                format!("A function already exists with the name {name}."),
            );
            return;
        }
        self.defined_function_names.insert(name.clone());

        let table_id = self.next_table_id;
        self.next_table_id += 1;
        let func_scope = scopes.new_child(global, format!("function {name}"), table_id);

        let param_list = self.ast.children(def)[0];
        let mut seen_params: HashSet<String> = HashSet::new();
        let mut offset = 16i64;
        for param in self.ast.children(param_list).to_vec() {
            let param_name = self.ast.get(param).value.clone();
            if !seen_params.insert(param_name.clone()) {
                self.errors.push_semantic(
                    node.line,
                    "Params Error: ",
                    format!("Duplicate parameter {param_name}. Expected distinct parameters name."),
                );
                continue;
            }
            scopes.add_symbol(
                func_scope,
                Symbol::Variable {
                    name: param_name,
                    ty: AUTO.to_string(),
                    category: VarCategory::Parameter,
                    is_global: false,
                    offset,
                },
            );
            offset += 8;
        }

        let body = self.ast.children(def)[1];
        self.local_discovery(scopes, func_scope, body);

        let return_type = self.infer_return_type(scopes, func_scope, &name, body);
        let frame_size = compute_frame_size(scopes.get(func_scope).next_data_offset);
        let num_params = self
            .ast
            .children(param_list)
            .iter()
            .map(|p| self.ast.get(*p).value.clone())
            .collect::<HashSet<_>>()
            .len();

        scopes.add_symbol(
            global,
            Symbol::Function {
                name,
                return_type,
                num_params,
                table_id,
                frame_size,
            },
        );
    }

    fn local_discovery(&mut self, scopes: &mut ScopeTree, func_scope: ScopeId, node: NodeId) {
        let n = self.ast.get(node);
        match n.kind {
            NodeKind::Affect => {
                let target = self.ast.children(node)[0];
                if self.ast.get(target).kind == NodeKind::Identifier {
                    let name = self.ast.get(target).value.clone();
                    if scopes.lookup_immediate(func_scope, &name).is_none() {
                        let rhs = self.ast.children(node)[1];
                        let ty = self.infer_expr_type(scopes, func_scope, rhs);
                        let offset = scopes.get(func_scope).next_data_offset;
                        scopes.add_symbol(
                            func_scope,
                            Symbol::Variable {
                                name,
                                ty,
                                category: VarCategory::Variable,
                                is_global: false,
                                offset,
                            },
                        );
                        scopes.get_mut(func_scope).next_data_offset -= 8;
                    }
                }
            }
            NodeKind::For => {
                let ident = self.ast.children(node)[0];
                let name = self.ast.get(ident).value.clone();
                if scopes.lookup_immediate(func_scope, &name).is_none() {
                    let offset = scopes.get(func_scope).next_data_offset;
                    scopes.add_symbol(
                        func_scope,
                        Symbol::Variable {
                            name,
                            ty: INTEGER.to_string(),
                            category: VarCategory::Variable,
                            is_global: false,
                            offset,
                        },
                    );
                    scopes.get_mut(func_scope).next_data_offset -= 8;
                }
            }
            _ => {}
        }
        for child in self.ast.children(node).to_vec() {
            self.local_discovery(scopes, func_scope, child);
        }
    }

    fn register_top_level(&mut self, scopes: &mut ScopeTree, global: ScopeId, node: NodeId) {
        let n = self.ast.get(node);
        match n.kind {
            NodeKind::Affect => {
                let target = self.ast.children(node)[0];
                if self.ast.get(target).kind == NodeKind::Identifier {
                    let name = self.ast.get(target).value.clone();
                    let rhs = self.ast.children(node)[1];
                    let inferred = self.infer_expr_type(scopes, global, rhs);
                    match scopes.lookup_immediate(global, &name) {
                        None => {
                            let ty = if inferred == AUTO {
                                INTEGER.to_string()
                            } else {
                                inferred
                            };
                            scopes.add_symbol(
                                global,
                                Symbol::Variable {
                                    name,
                                    ty,
                                    category: VarCategory::Variable,
                                    is_global: true,
                                    offset: 0,
                                },
                            );
                        }
                        Some(_) => scopes.upgrade_type(global, &name, &inferred),
                    }
                }
            }
            NodeKind::For => {
                let ident = self.ast.children(node)[0];
                let name = self.ast.get(ident).value.clone();
                if scopes.lookup_immediate(global, &name).is_none() {
                    scopes.add_symbol(
                        global,
                        Symbol::Variable {
                            name,
                            ty: INTEGER.to_string(),
                            category: VarCategory::Variable,
                            is_global: true,
                            offset: 0,
                        },
                    );
                }
            }
            _ => {}
        }
        // Top-level control flow (If/For bodies) can itself introduce more
        // top-level-visible globals (the source language has no block
        // scoping below function level), so recurse into children too.
        for child in self.ast.children(node).to_vec() {
            if matches!(n.kind, NodeKind::If | NodeKind::For) {
                self.register_top_level(scopes, global, child);
            }
        }
    }

    /// §4.4 lightweight type inference for a single RHS expression node.
    fn infer_expr_type(&self, scopes: &ScopeTree, scope: ScopeId, node: NodeId) -> String {
        let n = self.ast.get(node);
        match n.kind {
            NodeKind::Integer => INTEGER.to_string(),
            NodeKind::StringLit => STRING.to_string(),
            NodeKind::List => LIST.to_string(),
            NodeKind::True | NodeKind::False => BOOLEAN.to_string(),
            NodeKind::Identifier => scopes.type_of(scope, &n.value),
            NodeKind::FunctionCall => {
                let callee = self.ast.get(self.ast.children(node)[0]).value.clone();
                match callee.as_str() {
                    "list" => LIST.to_string(),
                    "len" => INTEGER.to_string(),
                    _ => scopes.function_return_type(scopes.global(), &callee),
                }
            }
            NodeKind::Compare | NodeKind::And | NodeKind::Or | NodeKind::Not => BOOLEAN.to_string(),
            NodeKind::ArithOp if n.value == "+" => {
                let children = self.ast.children(node);
                let is_string_operand = |id: NodeId| -> bool {
                    let c = self.ast.get(id);
                    c.kind == NodeKind::StringLit
                        || (c.kind == NodeKind::Identifier && scopes.type_of(scope, &c.value) == STRING)
                };
                if is_string_operand(children[0]) || is_string_operand(children[1]) {
                    STRING.to_string()
                } else {
                    INTEGER.to_string()
                }
            }
            NodeKind::ArithOp | NodeKind::TermOp | NodeKind::UnaryOp => INTEGER.to_string(),
            _ => AUTO.to_string(),
        }
    }

    /// Walks only the function body, returning the first concrete type seen
    /// on a `return` expression; `void` if returns never carry a value;
    /// `autoFun` if the function never returns at all.
    fn infer_return_type(&self, scopes: &ScopeTree, func_scope: ScopeId, func_name: &str, body: NodeId) -> String {
        let mut saw_return = false;
        let mut result = None;
        self.find_returns(scopes, func_scope, func_name, body, &mut saw_return, &mut result);
        if let Some(ty) = result {
            return ty;
        }
        if saw_return {
            VOID.to_string()
        } else {
            AUTO_FN.to_string()
        }
    }

    fn find_returns(
        &self,
        scopes: &ScopeTree,
        func_scope: ScopeId,
        func_name: &str,
        node: NodeId,
        saw_return: &mut bool,
        result: &mut Option<String>,
    ) {
        let n = self.ast.get(node);
        if n.kind == NodeKind::Return {
            *saw_return = true;
            if let Some(expr) = self.ast.children(node).first().copied() {
                let expr_node = self.ast.get(expr);
                let ty = match expr_node.kind {
                    NodeKind::StringLit => Some(STRING.to_string()),
                    NodeKind::List => Some(LIST.to_string()),
                    NodeKind::FunctionCall => {
                        let callee = self.ast.get(self.ast.children(expr)[0]).value.clone();
                        if callee == func_name {
                            None // recursive call: keep whatever has been inferred so far
                        } else {
                            Some(scopes.function_return_type(scopes.global(), &callee))
                        }
                    }
                    NodeKind::Identifier => Some(scopes.type_of(func_scope, &expr_node.value)),
                    _ => Some(INTEGER.to_string()),
                };
                if result.is_none() {
                    *result = ty;
                }
            }
        }
        for child in self.ast.children(node).to_vec() {
            self.find_returns(scopes, func_scope, func_name, child, saw_return, result);
        }
    }

    // ---- semantic validation pass ----

    fn validate(&mut self, scopes: &ScopeTree, global: ScopeId, program: NodeId) {
        self.loop_stack.clear();
        self.visit_validate(scopes, global, global, program, false);
    }

    fn visit_validate(
        &mut self,
        scopes: &ScopeTree,
        global: ScopeId,
        scope: ScopeId,
        node: NodeId,
        inside_function: bool,
    ) {
        let n = self.ast.get(node);
        match n.kind {
            NodeKind::FunctionDefinition => {
                if let Some(func_scope) =
                    scopes.find_child_named(global, &format!("function {}", n.value))
                {
                    let body = self.ast.children(node)[1];
                    self.visit_validate(scopes, global, func_scope, body, true);
                }
                return;
            }
            NodeKind::FunctionCall => {
                self.check_function_call(scopes, global, scope, node);
            }
            NodeKind::Print => {
                let children = self.ast.children(node);
                let args_ok = children
                    .first()
                    .map(|list| {
                        self.ast.get(*list).kind == NodeKind::List
                            && !self.ast.children(*list).is_empty()
                    })
                    .unwrap_or(false);
                if !args_ok {
                    self.errors.push_semantic(
                        n.line,
                        "Print function should be called with at least one parameter.",
                        "",
                    );
                }
            }
            NodeKind::Return => {
                if !inside_function {
                    self.errors
                        .push_semantic(n.line, "Return statement outside of a function.", "");
                }
            }
            NodeKind::For => {
                let loop_var = self.ast.get(self.ast.children(node)[0]).value.clone();
                if self.loop_stack.contains(&loop_var) {
                    self.errors.push_semantic(
                        n.line,
                        "Variable shadowing is not allowed: ",
                        loop_var.clone(),
                    );
                }
                self.loop_stack.push(loop_var);
            }
            NodeKind::Affect => {
                let target = self.ast.children(node)[0];
                if self.ast.get(target).kind == NodeKind::Identifier {
                    let affect_ident = self.ast.get(target).value.clone();
                    if self.loop_stack.contains(&affect_ident) {
                        self.errors.push_semantic(
                            n.line,
                            "Shadowing a loop variable is forbidden: ",
                            affect_ident,
                        );
                    }
                }
            }
            _ => {}
        }

        for child in self.ast.children(node).to_vec() {
            self.visit_validate(scopes, global, scope, child, inside_function);
        }

        if n.kind == NodeKind::For {
            self.loop_stack.pop();
        }
    }

    fn check_function_call(&mut self, scopes: &ScopeTree, global: ScopeId, scope: ScopeId, node: NodeId) {
        let children = self.ast.children(node);
        let callee_node = self.ast.get(children[0]);
        let callee = callee_node.value.clone();
        let param_list = children.get(1).copied();
        let actual = param_list.map(|p| self.ast.children(p).len()).unwrap_or(0);

        if matches!(callee.as_str(), "list" | "len" | "range") {
            if actual != 1 {
                self.errors.push_semantic(
                    callee_node.line,
                    format!("Function {callee} expects exactly one parameter."),
                    "",
                );
            }
            return;
        }

        match scopes.lookup(scope, &callee) {
            Some(Symbol::Function { num_params, .. }) => {
                if *num_params != actual {
                    self.errors.push_semantic(
                        callee_node.line,
                        "Function Call Error: ",
                        format!(
                            "Function {callee} expects {num_params} arguments, but {actual} were provided."
                        ),
                    );
                }
            }
            _ => {
                let _ = global;
                self.errors.push_semantic(
                    callee_node.line,
                    "Function Call Error: ",
                    format!("Function {callee} is not defined."),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorSink;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn build(src: &str) -> (ScopeTree, ScopeId, ErrorSink) {
        let mut errors = ErrorSink::new();
        let tokens = Lexer::new(src, &mut errors).tokenize();
        let (ast, program) = Parser::new(tokens, &mut errors).parse();
        let scopes = SymbolBuilder::new(&ast, &mut errors).build(program);
        let global = scopes.global();
        (scopes, global, errors)
    }

    #[test]
    fn function_params_get_sequential_offsets() {
        let (scopes, global, errors) = build("def f(a, b, c):\n    return a\n");
        assert!(!errors.has_errors());
        let func = scopes.find_child_named(global, "function f").unwrap();
        let offsets: Vec<i64> = scopes
            .get(func)
            .symbols
            .iter()
            .filter_map(|s| match s {
                Symbol::Variable { offset, category: VarCategory::Parameter, .. } => Some(*offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![16, 24, 32]);
    }

    #[test]
    fn locals_get_decreasing_offsets_from_minus_eight() {
        let (scopes, global, errors) = build("def f():\n    x = 1\n    y = 2\n    return x\n");
        assert!(!errors.has_errors());
        let func = scopes.find_child_named(global, "function f").unwrap();
        let offsets: Vec<i64> = scopes
            .get(func)
            .symbols
            .iter()
            .filter_map(|s| match s {
                Symbol::Variable { offset, category: VarCategory::Variable, .. } => Some(*offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![-8, -16]);
    }

    #[test]
    fn frame_size_is_multiple_of_sixteen_minus_forty() {
        let (scopes, global, errors) = build("def f():\n    x = 1\n    return x\n");
        assert!(!errors.has_errors());
        let func = match scopes.lookup(global, "f") {
            Some(Symbol::Function { frame_size, .. }) => *frame_size,
            _ => panic!("expected function symbol"),
        };
        assert_eq!((func + 40) % 16, 0);
        assert!(func >= 8);
    }

    #[test]
    fn duplicate_function_definition_is_semantic_error() {
        let (_, _, errors) =
            build("def f():\n    return 1\ndef f():\n    return 2\n");
        assert!(errors
            .all()
            .iter()
            .any(|d| d.message.contains("already defined")));
    }

    #[test]
    fn call_with_wrong_arity_is_semantic_error() {
        let (_, _, errors) = build("def f(a):\n    return a\nprint(f(1, 2))\n");
        assert!(errors.all().iter().any(|d| d.message.contains("expects 1")));
    }

    #[test]
    fn call_to_undefined_function_is_semantic_error() {
        let (_, _, errors) = build("print(g(1))\n");
        assert!(errors.all().iter().any(|d| d.message.contains("not defined")));
    }

    #[test]
    fn return_outside_function_is_reported() {
        let (_, _, errors) = build("return 1\n");
        assert!(errors
            .all()
            .iter()
            .any(|d| d.message.contains("outside of a function")));
    }

    #[test]
    fn global_assignment_defaults_unresolved_type_to_integer() {
        let (scopes, global, errors) = build("def f():\n    return 1\nx = f() + f()\n");
        assert!(!errors.has_errors());
        // f() + f() infers Integer via ArithOp default, not auto.
        assert_eq!(scopes.type_of(global, "x"), INTEGER);
    }

    #[test]
    fn return_type_is_first_concrete_type_seen() {
        let (scopes, global, errors) = build("def f():\n    return 1\n    return \"x\"\n");
        assert!(!errors.has_errors());
        assert_eq!(scopes.function_return_type(global, "f"), INTEGER);
    }

    #[test]
    fn loop_variable_shadowing_in_nested_for_is_semantic_error() {
        let (_, _, errors) =
            build("for i in range(3):\n    for i in range(2):\n        print(i)\n");
        assert!(errors.all().iter().any(|d| d.message.contains("shadowing")));
    }
}
