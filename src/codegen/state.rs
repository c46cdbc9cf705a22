//! Emitter-wide counters and small naming helpers.
//!
//! The source generator keeps its label counters as function-local
//! `static` integers, so label uniqueness survives only within one process
//! invocation rather than per-compilation. Here every counter lives on
//! [`super::CodeEmitter`] itself, so two compilations in the same process
//! (as happen back-to-back in the test suite) never share label state.

/// Bump-allocated counters for the handful of label families the emitter
/// produces: `if`/`for` pairs and string literals each get their own
/// monotonic id so nested constructs never collide.
#[derive(Debug, Default)]
pub struct LabelCounters {
    pub if_counter: usize,
    pub loop_counter: usize,
    pub string_counter: usize,
}

impl LabelCounters {
    pub fn next_if(&mut self) -> usize {
        let id = self.if_counter;
        self.if_counter += 1;
        id
    }

    pub fn next_loop(&mut self) -> usize {
        let id = self.loop_counter;
        self.loop_counter += 1;
        id
    }

    pub fn next_string(&mut self) -> usize {
        let id = self.string_counter;
        self.string_counter += 1;
        id
    }
}

/// Escapes a source-level identifier for use as a NASM label/symbol name.
/// Source identifiers are already restricted to `[A-Za-z_][A-Za-z0-9_]*` by
/// the lexer, so this is the identity function today; it exists as the
/// single seam every label/call site routes through instead of inlining
/// name formatting ad hoc.
pub fn mangle_name(name: &str) -> String {
    name.to_string()
}
