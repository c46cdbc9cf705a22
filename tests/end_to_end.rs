//! Integration tests exercising the full pipeline through the public API.
//!
//! The assembler/linker toolchain is out of scope, so "output" here means
//! the emitted NASM text reaches the right shape, not that a built binary
//! prints the right thing.

use nasmpy::compile_source;

#[test]
fn empty_source_compiles_with_no_errors() {
    let outcome = compile_source("");
    assert!(!outcome.has_errors());
    assert!(outcome.assembly.contains("mov rax, 60"));
}

#[test]
fn integer_addition_reaches_print() {
    let outcome = compile_source("print(1 + 2)\n");
    assert!(!outcome.has_errors());
    assert!(outcome.assembly.contains("call print_number") || outcome.assembly.contains("print_not_string"));
    assert!(outcome.assembly.contains("add rax, rsi") || outcome.assembly.contains("add rax,"));
}

#[test]
fn string_concatenation_compiles() {
    let src = "x = \"hello\"\ny = \" world\"\nprint(x + y)\n";
    let outcome = compile_source(src);
    assert!(!outcome.has_errors());
    assert!(outcome.assembly.contains("call str_concat"));
}

#[test]
fn recursive_function_emits_recursive_call() {
    let src = "def f(n):\n    if n == 0:\n        return 1\n    return n * f(n - 1)\nprint(f(5))\n";
    let outcome = compile_source(src);
    assert!(!outcome.has_errors());
    assert!(outcome.assembly.contains("f:"));
    assert!(outcome.assembly.contains("call f"));
}

#[test]
fn list_index_assignment_compiles() {
    let src = "l = [1, 2, 3]\nl[1] = 20\nprint(l)\n";
    let outcome = compile_source(src);
    assert!(!outcome.has_errors());
    assert!(outcome.assembly.contains("mov qword [r12], 3"));
}

#[test]
fn for_range_loop_emits_paired_labels() {
    let src = "for i in range(3):\n    print(i)\n";
    let outcome = compile_source(src);
    assert!(!outcome.has_errors());
    assert!(outcome.assembly.contains(".loop_start_0:"));
    assert!(outcome.assembly.contains(".loop_end_0:"));
}

#[test]
fn len_of_list_literal_compiles() {
    let outcome = compile_source("print(len([10, 20, 30, 40]))\n");
    assert!(!outcome.has_errors());
    assert!(outcome.assembly.contains("mov rax, qword [rax]"));
}

#[test]
fn forbidden_function_name_is_semantic_error() {
    let outcome = compile_source("def list():\n    return 1\n");
    assert!(outcome.has_errors());
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.category == nasmpy::Category::Semantic));
}

#[test]
fn return_outside_function_is_semantic_error() {
    let outcome = compile_source("return 1\n");
    assert!(outcome.has_errors());
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.category == nasmpy::Category::Semantic));
}

#[test]
fn lone_slash_is_lexical_error() {
    let outcome = compile_source("x = 1 / 0\n");
    assert!(outcome.has_errors());
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.category == nasmpy::Category::Lexical));
}

#[test]
fn function_returning_two_types_infers_first_concrete_type() {
    let src = "def f():\n    return 1\n    return \"x\"\nprint(f())\n";
    let outcome = compile_source(src);
    // emission must succeed even though the second return disagrees in type;
    // the symbol builder's monotonic inference keeps the first concrete type.
    assert!(outcome.assembly.contains("f:"));
}

#[test]
fn source_without_trailing_newline_raises_exactly_one_syntax_diagnostic() {
    let outcome = compile_source("print(1)");
    let syntax_count = outcome
        .diagnostics
        .iter()
        .filter(|d| d.category == nasmpy::Category::Syntax)
        .count();
    assert_eq!(syntax_count, 1);
}

#[test]
fn leading_zero_integer_is_lexical_error() {
    let outcome = compile_source("x = 01\n");
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.category == nasmpy::Category::Lexical));
}

#[test]
fn single_zero_integer_is_valid() {
    let outcome = compile_source("x = 0\nprint(x)\n");
    assert!(!outcome.has_errors());
}

#[test]
fn division_by_integer_literal_emits_zero_check() {
    let outcome = compile_source("x = 4 // 2\nprint(x)\n");
    assert!(outcome.assembly.contains(".division_by_zero_error"));
}
