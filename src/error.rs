//! Diagnostic collection shared by every compilation stage.
//!
//! `ErrorSink` is a first-in-first-out buffer of diagnostics. Every stage of
//! the pipeline (lexer, parser, symbol builder, code emitter) pushes into the
//! same sink and keeps going whenever a plausible synchronization point
//! exists, so a single run surfaces as many diagnostics as possible rather
//! than bailing out on the first one.

use std::collections::HashSet;
use std::fmt;

/// The stage (and, loosely, the severity) a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Unexpected byte, malformed integer, unterminated string, indentation error.
    Lexical,
    /// Token expectation failures, missing trailing newline, newlines inside brackets.
    Syntax,
    /// Duplicate definitions, forbidden names, arity mismatches, scoping errors.
    Semantic,
    /// Emitter-time type mismatches and operand-type violations.
    Semantics,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Lexical => "Lexical",
            Category::Syntax => "Syntax",
            Category::Semantic => "Semantic",
            Category::Semantics => "Semantics",
        };
        write!(f, "{s}")
    }
}

/// A single diagnostic produced by a compilation stage.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub value: String,
    pub category: Category,
    pub line: usize,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            write!(f, "[{}] line {}: {}", self.category, self.line, self.message)
        } else {
            write!(
                f,
                "[{}] line {}: {}{}",
                self.category, self.line, self.message, self.value
            )
        }
    }
}

/// FIFO diagnostic buffer shared across the whole pipeline.
#[derive(Debug, Default)]
pub struct ErrorSink {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorSink {
    pub fn new() -> Self {
        ErrorSink {
            diagnostics: Vec::new(),
        }
    }

    /// Record a diagnostic. Never aborts the run; it is each stage's job to
    /// decide whether to keep going after reporting.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(
            category = %diagnostic.category,
            line = diagnostic.line,
            message = %diagnostic.message,
            "diagnostic recorded"
        );
        self.diagnostics.push(diagnostic);
    }

    pub fn push_lexical(&mut self, line: usize, message: impl Into<String>) {
        self.push(Diagnostic {
            message: message.into(),
            value: String::new(),
            category: Category::Lexical,
            line,
        });
    }

    pub fn push_syntax(&mut self, line: usize, message: impl Into<String>) {
        self.push(Diagnostic {
            message: message.into(),
            value: String::new(),
            category: Category::Syntax,
            line,
        });
    }

    pub fn push_semantic(&mut self, line: usize, message: impl Into<String>, value: impl Into<String>) {
        self.push(Diagnostic {
            message: message.into(),
            value: value.into(),
            category: Category::Semantic,
            line,
        });
    }

    pub fn push_semantics(&mut self, line: usize, message: impl Into<String>, value: impl Into<String>) {
        self.push(Diagnostic {
            message: message.into(),
            value: value.into(),
            category: Category::Semantics,
            line,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// All diagnostics in insertion order, unfiltered. Used by tests that
    /// want to inspect every recorded diagnostic rather than the deduplicated
    /// display list.
    pub fn all(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics to show a user: `Syntax` diagnostics are deduplicated so
    /// at most one is shown per source line; every other category is shown
    /// in full, in insertion order.
    pub fn drain_for_display(&self) -> Vec<&Diagnostic> {
        let mut seen_syntax_lines: HashSet<usize> = HashSet::new();
        let mut out = Vec::with_capacity(self.diagnostics.len());
        for diagnostic in &self.diagnostics {
            if diagnostic.category == Category::Syntax {
                if seen_syntax_lines.contains(&diagnostic.line) {
                    continue;
                }
                seen_syntax_lines.insert(diagnostic.line);
            }
            out.push(diagnostic);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sink_has_no_errors() {
        let sink = ErrorSink::new();
        assert!(!sink.has_errors());
        assert!(sink.drain_for_display().is_empty());
    }

    #[test]
    fn syntax_errors_dedup_per_line_but_other_categories_do_not() {
        let mut sink = ErrorSink::new();
        sink.push_syntax(3, "expected ':'");
        sink.push_syntax(3, "expected ':' again");
        sink.push_semantic(3, "duplicate function", "f");
        sink.push_semantic(3, "duplicate function", "f");

        assert_eq!(sink.len(), 4);
        let displayed = sink.drain_for_display();
        // one Syntax kept for line 3, both Semantic kept
        assert_eq!(displayed.len(), 3);
        assert_eq!(displayed[0].message, "expected ':'");
    }

    #[test]
    fn insertion_order_is_preserved_across_categories() {
        let mut sink = ErrorSink::new();
        sink.push_lexical(1, "bad byte");
        sink.push_syntax(2, "expected NEWLINE");
        sink.push_semantic(3, "forbidden name", "list");
        let displayed = sink.drain_for_display();
        assert_eq!(displayed[0].category, Category::Lexical);
        assert_eq!(displayed[1].category, Category::Syntax);
        assert_eq!(displayed[2].category, Category::Semantic);
    }

    #[test]
    fn syntax_dedup_is_per_line_not_global() {
        let mut sink = ErrorSink::new();
        sink.push_syntax(1, "a");
        sink.push_syntax(2, "b");
        let displayed = sink.drain_for_display();
        assert_eq!(displayed.len(), 2);
    }
}
