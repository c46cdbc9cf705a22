//! Recursive-descent parser with error recovery.
//!
//! The grammar is expressed as one function per production, exactly as
//! `expr`/`term`/`factor` read in a textbook precedence-climbing parser.
//! Parsing never stops at the first error: `expect` resynchronizes to the
//! next `NEWLINE`/`EOF` so sibling statements still get a chance to parse,
//! maximizing the diagnostics a single run produces.

use crate::ast::{Ast, NodeId, NodeKind};
use crate::error::ErrorSink;
use crate::token::{Token, TokenKind};

const FORBIDDEN_FUNCTION_NAMES: [&str; 3] = ["list", "len", "range"];

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    ast: Ast,
    errors: &'a mut ErrorSink,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, errors: &'a mut ErrorSink) -> Self {
        Parser {
            tokens,
            pos: 0,
            ast: Ast::new(),
            errors,
        }
    }

    /// Parses the whole token stream and returns the arena together with the
    /// root `Program` node. Always returns a `Program` node, even when
    /// diagnostics were recorded along the way.
    pub fn parse(mut self) -> (Ast, NodeId) {
        let span = tracing::debug_span!("parse");
        let _enter = span.enter();
        let line = self.line();

        while self.at(TokenKind::Newline) {
            self.bump();
        }

        let mut defs = Vec::new();
        while self.at(TokenKind::Def) {
            defs.push(self.parse_function_def());
            while self.at(TokenKind::Newline) {
                self.bump();
            }
        }

        let mut stmts = Vec::new();
        while !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Newline) {
                self.bump();
                continue;
            }
            stmts.push(self.parse_stmt());
        }

        self.check_trailing_newline();

        let definitions = self.ast.alloc(NodeKind::Definitions, "", line, defs);
        let instructions = self.ast.alloc(NodeKind::Instructions, "", line, stmts);
        let program = self
            .ast
            .alloc(NodeKind::Program, "", line, vec![definitions, instructions]);
        tracing::debug!(node_count = self.ast.len(), "parsing complete");
        (self.ast, program)
    }

    // ---- token stream helpers ----

    fn cur(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn peek_kind(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn line(&self) -> usize {
        self.cur().line
    }

    fn bump(&mut self) -> Token {
        let tok = self.cur().clone();
        if !self.at(TokenKind::Eof) {
            self.pos += 1;
        }
        tok
    }

    /// Consumes `kind` if present; otherwise records a Syntax diagnostic and
    /// resynchronizes to the next `NEWLINE`/`EOF`.
    fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.errors
                .push_syntax(self.line(), format!("Expected {what}"));
            self.recover_to_newline();
            false
        }
    }

    fn recover_to_newline(&mut self) {
        while !self.at(TokenKind::Newline) && !self.at(TokenKind::Eof) {
            self.bump();
        }
    }

    fn skip_to_closing(&mut self, closer: TokenKind) {
        while !self.at(closer) && !self.at(TokenKind::Eof) {
            self.bump();
        }
        if self.at(closer) {
            self.bump();
        }
    }

    fn check_trailing_newline(&mut self) {
        if self.tokens.len() < 2 {
            return;
        }
        let prev = self.tokens[self.tokens.len() - 2].kind;
        if !matches!(prev, TokenKind::Newline | TokenKind::End | TokenKind::Begin) {
            self.errors.push_syntax(
                self.tokens.last().expect("EOF always present").line,
                "Missing trailing newline at end of file",
            );
        }
    }

    // ---- declarations ----

    fn parse_function_def(&mut self) -> NodeId {
        let line = self.line();
        self.bump(); // 'def'
        let name = if self.at(TokenKind::Ident) {
            self.bump().lexeme
        } else {
            self.errors.push_syntax(self.line(), "Expected function name");
            self.recover_to_newline();
            String::new()
        };
        if FORBIDDEN_FUNCTION_NAMES.contains(&name.as_str()) {
            self.errors.push_semantic(
                line,
                "Forbidden function name: ",
                format!("'{name}' is a built-in and cannot be redefined."),
            );
        }
        self.expect(TokenKind::LParen, "'('");
        let params = self.parse_formal_param_list();
        self.expect(TokenKind::RParen, "')'");
        self.expect(TokenKind::Colon, "':'");
        let body = self.parse_suite();
        self.ast
            .alloc(NodeKind::FunctionDefinition, name, line, vec![params, body])
    }

    fn parse_formal_param_list(&mut self) -> NodeId {
        let line = self.line();
        let mut children = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                if self.at(TokenKind::Newline) {
                    self.errors.push_syntax(
                        self.line(),
                        "Newlines are not allowed inside lists or parameter definitions.",
                    );
                    self.skip_to_closing(TokenKind::RParen);
                    break;
                }
                if self.at(TokenKind::Ident) {
                    let t = self.bump();
                    children.push(
                        self.ast
                            .alloc(NodeKind::Identifier, t.lexeme, t.line, vec![]),
                    );
                } else {
                    self.errors
                        .push_syntax(self.line(), "Expected parameter name");
                    break;
                }
                if self.at(TokenKind::Comma) {
                    self.bump();
                    if self.at(TokenKind::RParen) {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
        self.ast.alloc(NodeKind::FormalParameterList, "", line, children)
    }

    /// `suite := NEWLINE BEGIN stmt+ END | simple_stmt NEWLINE`
    fn parse_suite(&mut self) -> NodeId {
        let line = self.line();
        if self.at(TokenKind::Newline) {
            self.bump();
            if !self.expect(TokenKind::Begin, "indented block") {
                return self.ast.alloc(NodeKind::FunctionBody, "", line, vec![]);
            }
            let mut stmts = Vec::new();
            while !self.at(TokenKind::End) && !self.at(TokenKind::Eof) {
                stmts.push(self.parse_stmt());
            }
            self.expect(TokenKind::End, "end of indented block");
            self.ast.alloc(NodeKind::FunctionBody, "", line, stmts)
        } else {
            let stmt = self.parse_simple_stmt();
            self.expect(TokenKind::Newline, "newline");
            self.ast.alloc(NodeKind::FunctionBody, "", line, vec![stmt])
        }
    }

    // ---- statements ----

    fn parse_stmt(&mut self) -> NodeId {
        match self.cur().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            _ => {
                let stmt = self.parse_simple_stmt();
                self.expect(TokenKind::Newline, "newline");
                stmt
            }
        }
    }

    fn parse_if(&mut self) -> NodeId {
        let line = self.line();
        self.bump(); // 'if'
        let cond = self.parse_expr();
        self.expect(TokenKind::Colon, "':'");
        let if_body = self.parse_suite();
        let mut children = vec![cond, if_body];
        if self.at(TokenKind::Else) {
            self.bump();
            self.expect(TokenKind::Colon, "':'");
            children.push(self.parse_suite());
        }
        self.ast.alloc(NodeKind::If, "", line, children)
    }

    fn parse_for(&mut self) -> NodeId {
        let line = self.line();
        self.bump(); // 'for'
        let ident = if self.at(TokenKind::Ident) {
            let t = self.bump();
            self.ast.alloc(NodeKind::Identifier, t.lexeme, t.line, vec![])
        } else {
            self.errors.push_syntax(self.line(), "Expected loop variable");
            self.ast.alloc(NodeKind::Identifier, "", line, vec![])
        };
        self.expect(TokenKind::In, "'in'");
        let iterable = self.parse_expr();
        self.expect(TokenKind::Colon, "':'");
        let body = self.parse_suite();
        self.ast.alloc(NodeKind::For, "", line, vec![ident, iterable, body])
    }

    /// `simple_stmt := IDENT '=' expr | 'return' expr | 'print' '(' expr_list ')' | expr`
    ///
    /// Every other alternative in the grammar sketch (indexing, calls, a
    /// leading unary minus, bare operator continuations) is already covered
    /// by `parse_expr`'s own precedence chain, so this only special-cases
    /// plain-identifier assignment and the two keyword-led statements.
    fn parse_simple_stmt(&mut self) -> NodeId {
        let line = self.line();
        if self.at(TokenKind::Ident) && self.peek_kind(1) == TokenKind::Assign {
            let t = self.bump();
            let ident = self.ast.alloc(NodeKind::Identifier, t.lexeme, line, vec![]);
            self.bump(); // '='
            let rhs = self.parse_expr();
            return self.ast.alloc(NodeKind::Affect, "", line, vec![ident, rhs]);
        }
        match self.cur().kind {
            TokenKind::Return => {
                self.bump();
                if self.at(TokenKind::Newline) || self.at(TokenKind::Eof) {
                    self.ast.alloc(NodeKind::Return, "", line, vec![])
                } else {
                    let expr = self.parse_expr();
                    self.ast.alloc(NodeKind::Return, "", line, vec![expr])
                }
            }
            TokenKind::Print => {
                self.bump();
                self.expect(TokenKind::LParen, "'('");
                let items = self.parse_comma_list_until(TokenKind::RParen);
                self.expect(TokenKind::RParen, "')'");
                let args = self.ast.alloc(NodeKind::List, "", line, items);
                self.ast.alloc(NodeKind::Print, "", line, vec![args])
            }
            _ => self.parse_expr(),
        }
    }

    // ---- expressions, lowest to highest precedence ----

    fn parse_expr(&mut self) -> NodeId {
        self.parse_or()
    }

    fn parse_or(&mut self) -> NodeId {
        let mut left = self.parse_and();
        while self.at(TokenKind::Or) {
            let t = self.bump();
            let right = self.parse_and();
            left = self.ast.alloc(NodeKind::Or, "", t.line, vec![left, right]);
        }
        left
    }

    fn parse_and(&mut self) -> NodeId {
        let mut left = self.parse_comp();
        while self.at(TokenKind::And) {
            let t = self.bump();
            let right = self.parse_comp();
            left = self.ast.alloc(NodeKind::And, "", t.line, vec![left, right]);
        }
        left
    }

    /// Non-associative: at most one comparison operator per level. A
    /// comparison-position `=` is tolerated and promoted to `==`.
    fn parse_comp(&mut self) -> NodeId {
        let left = self.parse_arith();
        if matches!(
            self.cur().kind,
            TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::Assign
        ) {
            let t = self.bump();
            let op = if t.kind == TokenKind::Assign {
                "==".to_string()
            } else {
                t.lexeme.clone()
            };
            let right = self.parse_arith();
            self.ast.alloc(NodeKind::Compare, op, t.line, vec![left, right])
        } else {
            left
        }
    }

    fn parse_arith(&mut self) -> NodeId {
        let mut left = self.parse_term();
        while matches!(self.cur().kind, TokenKind::Plus | TokenKind::Minus) {
            let t = self.bump();
            let right = self.parse_term();
            left = self.ast.alloc(NodeKind::ArithOp, t.lexeme, t.line, vec![left, right]);
        }
        left
    }

    fn parse_term(&mut self) -> NodeId {
        let mut left = self.parse_factor();
        while matches!(
            self.cur().kind,
            TokenKind::Star | TokenKind::SlashSlash | TokenKind::Percent
        ) {
            let t = self.bump();
            let right = self.parse_factor();
            left = self.ast.alloc(NodeKind::TermOp, t.lexeme, t.line, vec![left, right]);
        }
        left
    }

    /// `factor := '-' primary | primary`
    fn parse_factor(&mut self) -> NodeId {
        if self.at(TokenKind::Minus) {
            let t = self.bump();
            let inner = self.parse_primary();
            self.ast.alloc(NodeKind::UnaryOp, "-", t.line, vec![inner])
        } else {
            self.parse_primary()
        }
    }

    /// `primary := INTEGER | STRING | True | False | None
    ///           | IDENT ('(' arg_list ')' | '[' expr ']' ('=' expr)? | ε)
    ///           | '(' expr ')' | '[' expr_list ']' | 'not' primary`
    fn parse_primary(&mut self) -> NodeId {
        let line = self.line();
        match self.cur().kind {
            TokenKind::Integer => {
                let t = self.bump();
                self.ast.alloc(NodeKind::Integer, t.lexeme, line, vec![])
            }
            TokenKind::StringLit => {
                let t = self.bump();
                self.ast.alloc(NodeKind::StringLit, t.lexeme, line, vec![])
            }
            TokenKind::True => {
                self.bump();
                self.ast.alloc(NodeKind::True, "", line, vec![])
            }
            TokenKind::False => {
                self.bump();
                self.ast.alloc(NodeKind::False, "", line, vec![])
            }
            TokenKind::None => {
                self.bump();
                self.ast.alloc(NodeKind::NoneLit, "", line, vec![])
            }
            TokenKind::Not => {
                self.bump();
                let inner = self.parse_primary();
                self.ast.alloc(NodeKind::Not, "", line, vec![inner])
            }
            TokenKind::Ident => self.parse_identifier_primary(),
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr();
                self.expect(TokenKind::RParen, "')'");
                inner
            }
            TokenKind::LBracket => {
                self.bump();
                let items = self.parse_comma_list_until(TokenKind::RBracket);
                self.expect(TokenKind::RBracket, "']'");
                self.ast.alloc(NodeKind::List, "", line, items)
            }
            _ => {
                self.errors
                    .push_syntax(self.line(), "Unexpected token in expression");
                self.recover_to_newline();
                self.ast.alloc(NodeKind::Integer, "0", line, vec![])
            }
        }
    }

    fn parse_identifier_primary(&mut self) -> NodeId {
        let line = self.line();
        let t = self.bump();
        let ident = self.ast.alloc(NodeKind::Identifier, t.lexeme.clone(), line, vec![]);
        if self.at(TokenKind::LParen) {
            self.bump();
            let items = self.parse_comma_list_until(TokenKind::RParen);
            self.expect(TokenKind::RParen, "')'");
            let args = self.ast.alloc(NodeKind::ParameterList, "", line, items);
            self.ast.alloc(NodeKind::FunctionCall, "", line, vec![ident, args])
        } else if self.at(TokenKind::LBracket) {
            self.bump();
            if self.at(TokenKind::Newline) {
                self.errors.push_syntax(
                    self.line(),
                    "Newlines are not allowed inside lists or parameter definitions.",
                );
                self.skip_to_closing(TokenKind::RBracket);
                return ident;
            }
            let index = self.parse_expr();
            self.expect(TokenKind::RBracket, "']'");
            let list_call = self
                .ast
                .alloc(NodeKind::ListCall, t.lexeme, line, vec![ident, index]);
            if self.at(TokenKind::Assign) {
                self.bump();
                let rhs = self.parse_expr();
                self.ast.alloc(NodeKind::Affect, "", line, vec![list_call, rhs])
            } else {
                list_call
            }
        } else {
            ident
        }
    }

    /// Parses a comma-separated expression list up to (not including) `closer`.
    /// A newline encountered before `closer` is a Syntax error; parsing
    /// resynchronizes by skipping to the matching closer.
    fn parse_comma_list_until(&mut self, closer: TokenKind) -> Vec<NodeId> {
        let mut items = Vec::new();
        if self.at(closer) {
            return items;
        }
        loop {
            if self.at(TokenKind::Newline) {
                self.errors.push_syntax(
                    self.line(),
                    "Newlines are not allowed inside lists or parameter definitions.",
                );
                self.skip_to_closing(closer);
                return items;
            }
            if self.at(TokenKind::Eof) {
                self.errors.push_syntax(self.line(), "Unexpected end of file");
                return items;
            }
            items.push(self.parse_expr());
            if self.at(TokenKind::Comma) {
                self.bump();
                if self.at(closer) {
                    break;
                }
            } else {
                break;
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::error::{Category, ErrorSink};
    use crate::lexer::Lexer;

    fn parse_src(src: &str) -> (Ast, NodeId, ErrorSink) {
        let mut errors = ErrorSink::new();
        let tokens = Lexer::new(src, &mut errors).tokenize();
        let (ast, program) = Parser::new(tokens, &mut errors).parse();
        (ast, program, errors)
    }

    fn defs_and_instrs(ast: &Ast, program: NodeId) -> (NodeId, NodeId) {
        let children = ast.children(program);
        (children[0], children[1])
    }

    #[test]
    fn program_always_has_two_children() {
        let (ast, program, errors) = parse_src("print(1)\n");
        assert!(!errors.has_errors());
        assert_eq!(ast.children(program).len(), 2);
    }

    #[test]
    fn simple_assignment_parses_as_affect() {
        let (ast, program, errors) = parse_src("x = 1\n");
        assert!(!errors.has_errors());
        let (_, instrs) = defs_and_instrs(&ast, program);
        let stmt = ast.children(instrs)[0];
        assert_eq!(ast.get(stmt).kind, NodeKind::Affect);
        let children = ast.children(stmt);
        assert_eq!(ast.get(children[0]).kind, NodeKind::Identifier);
        assert_eq!(ast.get(children[1]).kind, NodeKind::Integer);
    }

    #[test]
    fn list_index_assignment_produces_affect_over_listcall() {
        let (ast, program, errors) = parse_src("l[1] = 20\n");
        assert!(!errors.has_errors());
        let (_, instrs) = defs_and_instrs(&ast, program);
        let stmt = ast.children(instrs)[0];
        assert_eq!(ast.get(stmt).kind, NodeKind::Affect);
        let first_child = ast.children(stmt)[0];
        assert_eq!(ast.get(first_child).kind, NodeKind::ListCall);
    }

    #[test]
    fn function_def_with_forbidden_name_is_semantic_error() {
        let (_, _, errors) = parse_src("def list():\n    return 1\n");
        assert!(errors
            .all()
            .iter()
            .any(|d| d.category == Category::Semantic));
    }

    #[test]
    fn precedence_matches_spec_ordering() {
        // `1 + 2 * 3` should parse as `1 + (2 * 3)`.
        let (ast, program, errors) = parse_src("print(1 + 2 * 3)\n");
        assert!(!errors.has_errors());
        let (_, instrs) = defs_and_instrs(&ast, program);
        let print_stmt = ast.children(instrs)[0];
        let list = ast.children(print_stmt)[0];
        let top = ast.children(list)[0];
        assert_eq!(ast.get(top).kind, NodeKind::ArithOp);
        let rhs = ast.children(top)[1];
        assert_eq!(ast.get(rhs).kind, NodeKind::TermOp);
    }

    #[test]
    fn comparison_single_equals_is_tolerated_as_equality() {
        let (ast, program, errors) = parse_src("if x = 1:\n    return 1\n");
        assert!(!errors.has_errors());
        let (_, instrs) = defs_and_instrs(&ast, program);
        let if_node = ast.children(instrs)[0];
        let cond = ast.children(if_node)[0];
        assert_eq!(ast.get(cond).kind, NodeKind::Compare);
        assert_eq!(ast.get(cond).value, "==");
    }

    #[test]
    fn missing_trailing_newline_is_one_syntax_diagnostic() {
        let (_, _, errors) = parse_src("print(1)");
        let syntax_errors: Vec<_> = errors
            .all()
            .iter()
            .filter(|d| d.category == Category::Syntax)
            .collect();
        assert_eq!(syntax_errors.len(), 1);
    }

    #[test]
    fn empty_source_has_no_diagnostics() {
        let (ast, program, errors) = parse_src("");
        assert!(!errors.has_errors());
        let (defs, instrs) = defs_and_instrs(&ast, program);
        assert!(ast.children(defs).is_empty());
        assert!(ast.children(instrs).is_empty());
    }

    #[test]
    fn newline_inside_list_literal_is_syntax_error() {
        let (_, _, errors) = parse_src("x = [1,\n2]\n");
        assert!(errors.all().iter().any(|d| d.message.contains("Newlines")));
    }

    #[test]
    fn function_call_with_args_parses_parameter_list() {
        let (ast, program, errors) = parse_src("def f(n):\n    return n\nprint(f(5))\n");
        assert!(!errors.has_errors());
        let (_, instrs) = defs_and_instrs(&ast, program);
        let print_stmt = ast.children(instrs)[0];
        let list = ast.children(print_stmt)[0];
        let call = ast.children(list)[0];
        assert_eq!(ast.get(call).kind, NodeKind::FunctionCall);
        let params = ast.children(call)[1];
        assert_eq!(ast.get(params).kind, NodeKind::ParameterList);
        assert_eq!(ast.children(params).len(), 1);
    }

    #[test]
    fn for_loop_parses_identifier_iterable_and_body() {
        let (ast, program, errors) = parse_src("for i in range(3):\n    print(i)\n");
        assert!(!errors.has_errors());
        let (_, instrs) = defs_and_instrs(&ast, program);
        let for_node = ast.children(instrs)[0];
        assert_eq!(ast.get(for_node).kind, NodeKind::For);
        assert_eq!(ast.children(for_node).len(), 3);
    }

    #[test]
    fn unary_minus_on_call_result_wraps_in_unary_op() {
        let (ast, program, errors) = parse_src("def f():\n    return 1\nx = -f()\n");
        assert!(!errors.has_errors());
        let (_, instrs) = defs_and_instrs(&ast, program);
        let affect = ast.children(instrs)[0];
        let rhs = ast.children(affect)[1];
        assert_eq!(ast.get(rhs).kind, NodeKind::UnaryOp);
    }
}
