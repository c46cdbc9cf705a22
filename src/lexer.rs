//! Indentation-aware lexer.
//!
//! Turns raw source bytes into a flat token stream, synthesizing `BEGIN`/`END`
//! tokens at indentation changes the way a Python-like grammar needs them.
//! The lexer never stops on an error: it records a diagnostic in the shared
//! [`ErrorSink`] and keeps scanning from the next plausible position.

use crate::error::ErrorSink;
use crate::token::{keyword, Token, TokenKind};

/// Scans a whole source string into tokens, reporting lexical errors into
/// `errors` as it goes.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    indent_stack: Vec<usize>,
    errors: &'a mut ErrorSink,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str, errors: &'a mut ErrorSink) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            indent_stack: vec![0],
            errors,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let span = tracing::debug_span!("lex");
        let _enter = span.enter();
        let mut tokens = Vec::new();
        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphabetic() || c == b'_' {
                self.lex_identifier_or_keyword(&mut tokens);
            } else if c.is_ascii_digit() {
                self.lex_integer(&mut tokens);
            } else if c == b'=' || c == b'<' || c == b'>' {
                self.lex_double_operator(&mut tokens, c);
            } else if c == b'+' || c == b'*' || c == b'%' || c == b'-' {
                self.lex_simple_operator(&mut tokens, c);
            } else if c == b'!' {
                self.lex_not_equal(&mut tokens);
            } else if c == b'/' {
                self.lex_division(&mut tokens);
            } else if matches!(c, b'(' | b')' | b'[' | b']' | b',' | b':') {
                self.lex_bracket(&mut tokens, c);
            } else if c == b'\n' {
                self.lex_newline(&mut tokens);
            } else if c == b' ' || c == b'\t' || c == b'\r' {
                self.advance();
            } else if c == b'"' {
                self.lex_string(&mut tokens);
            } else if c == b'#' {
                self.skip_comment();
            } else {
                self.errors.push_lexical(
                    self.line,
                    format!("Unexpected character: {}", c as char),
                );
                self.advance();
            }
        }
        self.end_of_file(&mut tokens);
        tracing::debug!(token_count = tokens.len(), "lexing complete");
        tokens
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek(0);
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn lex_identifier_or_keyword(&mut self, tokens: &mut Vec<Token>) {
        let start = self.pos;
        self.advance();
        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .expect("source validated as UTF-8 by caller")
            .to_string();
        let kind = keyword(&text).unwrap_or(TokenKind::Ident);
        tokens.push(Token::new(kind, text, self.line));
    }

    fn lex_integer(&mut self, tokens: &mut Vec<Token>) {
        let start = self.pos;
        if self.peek(0) == Some(b'0') {
            self.advance();
            if self.peek(0).is_some_and(|c| c.is_ascii_alphanumeric()) {
                self.errors
                    .push_lexical(self.line, "Integers cannot start with zeros");
                while self.peek(0).is_some_and(|c| c.is_ascii_alphanumeric()) {
                    self.advance();
                }
                return;
            }
        } else {
            while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            if self.peek(0).is_some_and(|c| c.is_ascii_alphabetic()) {
                self.errors
                    .push_lexical(self.line, "Identifier cannot start with a digit");
            } else if self.pos - start > 79 {
                self.errors.push_lexical(self.line, "Identifier name too long");
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos])
            .expect("digits are ASCII")
            .to_string();
        tokens.push(Token::new(TokenKind::Integer, text, self.line));
    }

    fn lex_double_operator(&mut self, tokens: &mut Vec<Token>, c: u8) {
        self.advance();
        if self.peek(0) == Some(b'=') {
            self.advance();
            let (kind, lexeme) = match c {
                b'=' => (TokenKind::Eq, "=="),
                b'<' => (TokenKind::LtEq, "<="),
                b'>' => (TokenKind::GtEq, ">="),
                _ => unreachable!(),
            };
            tokens.push(Token::new(kind, lexeme, self.line));
        } else {
            let (kind, lexeme) = match c {
                b'=' => (TokenKind::Assign, "="),
                b'<' => (TokenKind::Lt, "<"),
                b'>' => (TokenKind::Gt, ">"),
                _ => unreachable!(),
            };
            tokens.push(Token::new(kind, lexeme, self.line));
        }
    }

    fn lex_simple_operator(&mut self, tokens: &mut Vec<Token>, c: u8) {
        self.advance();
        let (kind, lexeme) = match c {
            b'+' => (TokenKind::Plus, "+"),
            b'-' => (TokenKind::Minus, "-"),
            b'*' => (TokenKind::Star, "*"),
            b'%' => (TokenKind::Percent, "%"),
            _ => unreachable!(),
        };
        tokens.push(Token::new(kind, lexeme, self.line));
    }

    fn lex_not_equal(&mut self, tokens: &mut Vec<Token>) {
        self.advance();
        if self.peek(0) == Some(b'=') {
            self.advance();
            tokens.push(Token::new(TokenKind::NotEq, "!=", self.line));
        } else {
            self.errors.push_lexical(self.line, "Expected '=' after '!'");
        }
    }

    fn lex_division(&mut self, tokens: &mut Vec<Token>) {
        self.advance();
        if self.peek(0) == Some(b'/') {
            self.advance();
            tokens.push(Token::new(TokenKind::SlashSlash, "//", self.line));
        } else {
            self.errors.push_lexical(self.line, "Expected '/' after '/'");
        }
    }

    fn lex_bracket(&mut self, tokens: &mut Vec<Token>, c: u8) {
        self.advance();
        let (kind, lexeme) = match c {
            b'(' => (TokenKind::LParen, "("),
            b')' => (TokenKind::RParen, ")"),
            b'[' => (TokenKind::LBracket, "["),
            b']' => (TokenKind::RBracket, "]"),
            b',' => (TokenKind::Comma, ","),
            b':' => (TokenKind::Colon, ":"),
            _ => unreachable!(),
        };
        tokens.push(Token::new(kind, lexeme, self.line));
    }

    fn lex_newline(&mut self, tokens: &mut Vec<Token>) {
        tokens.push(Token::new(TokenKind::Newline, "", self.line));
        self.line += 1;
        self.advance();

        let mut indentation = 0usize;
        while matches!(self.peek(0), Some(b' ') | Some(b'\t')) {
            self.advance();
            indentation += 1;
        }
        self.manage_indentation(tokens, indentation);
    }

    fn manage_indentation(&mut self, tokens: &mut Vec<Token>, n: usize) {
        let top = *self.indent_stack.last().expect("indent stack never empty");
        if n > top {
            self.indent_stack.push(n);
            tokens.push(Token::new(TokenKind::Begin, "", self.line));
        } else if n < top {
            while n < *self.indent_stack.last().expect("indent stack never empty") {
                self.indent_stack.pop();
                tokens.push(Token::new(TokenKind::End, "", self.line));
            }
            if n != *self.indent_stack.last().expect("indent stack never empty") {
                self.errors.push_lexical(self.line, "Indentation error");
            }
        }
    }

    fn lex_string(&mut self, tokens: &mut Vec<Token>) {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek(0) {
                None => {
                    self.errors
                        .push_lexical(self.line, "Reached end of file without closing string");
                    break;
                }
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    self.lex_escape_character(&mut value);
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.advance();
                    value.push('\n');
                }
                Some(_) => {
                    let start = self.pos;
                    self.advance();
                    value.push_str(std::str::from_utf8(&self.src[start..self.pos]).unwrap_or(""));
                }
            }
        }
        tokens.push(Token::new(TokenKind::StringLit, value, self.line));
    }

    fn lex_escape_character(&mut self, value: &mut String) {
        match self.peek(0) {
            Some(b'"') => {
                self.advance();
                value.push('"');
            }
            Some(b'\\') => {
                self.advance();
                value.push('\\');
            }
            Some(b'n') => {
                self.advance();
                value.push('\n');
            }
            _ => value.push('\\'),
        }
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == b'\n' {
                break;
            }
            self.advance();
        }
    }

    fn end_of_file(&mut self, tokens: &mut Vec<Token>) {
        while *self.indent_stack.last().expect("indent stack never empty") != 0 {
            self.indent_stack.pop();
            tokens.push(Token::new(TokenKind::End, "", self.line));
        }
        tokens.push(Token::new(TokenKind::Eof, "", self.line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> (Vec<Token>, ErrorSink) {
        let mut errors = ErrorSink::new();
        let tokens = {
            let lexer = Lexer::new(src, &mut errors);
            lexer.tokenize()
        };
        (tokens, errors)
    }

    #[test]
    fn empty_source_lexes_to_eof_only() {
        let (tokens, errors) = lex("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert!(!errors.has_errors());
    }

    #[test]
    fn leading_zero_on_multi_digit_is_lexical_error() {
        let (_, errors) = lex("01\n");
        assert!(errors.has_errors());
        assert_eq!(errors.all()[0].category, crate::error::Category::Lexical);
    }

    #[test]
    fn single_zero_is_fine() {
        let (tokens, errors) = lex("0\n");
        assert!(!errors.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[0].lexeme, "0");
    }

    #[test]
    fn digit_then_letter_is_lexical_error_but_still_emits_two_tokens() {
        let (tokens, errors) = lex("1a\n");
        assert!(errors.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn indentation_begin_and_end_are_balanced() {
        let src = "if True:\n    print(1)\nprint(2)\n";
        let (tokens, errors) = lex(src);
        assert!(!errors.has_errors());
        let begins = tokens.iter().filter(|t| t.kind == TokenKind::Begin).count();
        let ends = tokens.iter().filter(|t| t.kind == TokenKind::End).count();
        assert_eq!(begins, ends);
        assert_eq!(begins, 1);
    }

    #[test]
    fn unmatched_dedent_is_indentation_error() {
        let src = "if True:\n    print(1)\n  print(2)\n";
        let (_, errors) = lex(src);
        assert!(errors
            .all()
            .iter()
            .any(|d| d.message == "Indentation error"));
    }

    #[test]
    fn lone_slash_is_lexical_error() {
        let (_, errors) = lex("x = 1 / 0\n");
        assert!(errors
            .all()
            .iter()
            .any(|d| d.message == "Expected '/' after '/'"));
    }

    #[test]
    fn double_slash_is_integer_division() {
        let (tokens, errors) = lex("1 // 2\n");
        assert!(!errors.has_errors());
        assert!(tokens.iter().any(|t| t.kind == TokenKind::SlashSlash));
    }

    #[test]
    fn bang_without_equals_is_lexical_error() {
        let (_, errors) = lex("!x\n");
        assert!(errors
            .all()
            .iter()
            .any(|d| d.message == "Expected '=' after '!'"));
    }

    #[test]
    fn unterminated_string_is_lexical_error() {
        let (_, errors) = lex("x = \"abc\n");
        assert!(errors
            .all()
            .iter()
            .any(|d| d.message == "Reached end of file without closing string"));
    }

    #[test]
    fn string_escapes_decode_correctly() {
        let (tokens, errors) = lex("\"a\\nb\\\"c\\\\d\\q\"\n");
        assert!(!errors.has_errors());
        assert_eq!(tokens[0].lexeme, "a\nb\"c\\d\\q");
    }

    #[test]
    fn while_lexes_as_keyword() {
        let (tokens, _) = lex("while\n");
        assert_eq!(tokens[0].kind, TokenKind::While);
    }

    #[test]
    fn comparison_equals_tolerates_single_equals() {
        // the parser (not the lexer) is responsible for treating `=` as `==`
        // in comparison position; the lexer just emits Assign here.
        let (tokens, _) = lex("x = y\n");
        assert_eq!(tokens[1].kind, TokenKind::Assign);
    }
}
