//! Runtime support routines appended verbatim to every emitted program.
//!
//! Each routine is a fixed block of NASM text; none of them depend on
//! anything the emitter computed at compile time, so they are written out
//! once as a table rather than generated field-by-field.

/// Converts `rax` (signed) to decimal and writes it to stdout.
const PRINT_NUMBER: &str = r#"
print_number:
    push rbx
    push rbp
    mov rbp, rsp
    mov rbx, rax
    mov rdi, 0
    cmp rbx, 0
    jge .pn_convert
    mov rdi, 1
    neg rbx
.pn_convert:
    mov rax, rbx
    lea rsi, [buffer + 31]
    mov byte [rsi], 0
    mov rcx, 10
.pn_loop:
    xor rdx, rdx
    div rcx
    add rdx, '0'
    dec rsi
    mov [rsi], dl
    test rax, rax
    jnz .pn_loop
    cmp rdi, 1
    jne .pn_write
    dec rsi
    mov byte [rsi], '-'
.pn_write:
    lea rdx, [buffer + 31]
    sub rdx, rsi
    mov rax, 1
    mov rdi, 1
    syscall
    mov rsp, rbp
    pop rbp
    pop rbx
    ret
"#;

/// Writes the NUL-terminated C string at `rax` to stdout.
const PRINT_STRING: &str = r#"
print_string:
    push rbx
    mov rbx, rax
    xor rdx, rdx
.ps_len:
    cmp byte [rbx + rdx], 0
    je .ps_write
    inc rdx
    jmp .ps_len
.ps_write:
    mov rsi, rbx
    mov rax, 1
    mov rdi, 1
    syscall
    pop rbx
    ret
"#;

/// Prints `rax` as a list when its address falls inside `list_buffer`
/// (honoring each element's runtime type the same way), otherwise falls
/// back to `print_number`. This is the simplified discrimination recorded
/// in the design notes: no magic-number heuristic, only the address-range
/// check.
const PRINT_NOT_STRING: &str = r#"
print_not_string:
    mov rbx, list_buffer
    mov rcx, list_buffer + 65536
    cmp rax, rbx
    jl .pns_number
    cmp rax, rcx
    jge .pns_number
    push r12
    push r13
    mov r12, rax
    mov r13, qword [r12]
    mov rax, 1
    mov rdi, 1
    mov rsi, open_bracket
    mov rdx, 1
    syscall
    lea r12, [r12 + 8]
    xor rcx, rcx
.pns_elem:
    cmp rcx, r13
    jge .pns_close
    push rcx
    mov rax, qword [r12 + rcx*8]
    call print_not_string
    pop rcx
    inc rcx
    cmp rcx, r13
    jge .pns_close
    push rcx
    mov rax, 1
    mov rdi, 1
    mov rsi, comma_space
    mov rdx, 2
    syscall
    pop rcx
    jmp .pns_elem
.pns_close:
    mov rax, 1
    mov rdi, 1
    mov rsi, close_bracket
    mov rdx, 1
    syscall
    pop r13
    pop r12
    ret
.pns_number:
    call print_number
    ret
"#;

/// Appends both NUL-terminated strings at `rdi`/`rsi` into `concat_buffer`
/// starting at `concat_offset`; returns the new string's address in `rax`
/// and advances `concat_offset` past it (including the terminating NUL).
const STR_CONCAT: &str = r#"
str_concat:
    push rbx
    push r12
    push r13
    mov rbx, rdi
    mov r12, rsi
    mov r13, concat_offset
    mov rax, qword [r13]
    lea rcx, [concat_buffer + rax]
    mov rax, rcx
.sc_copy_first:
    cmp byte [rbx], 0
    je .sc_copy_second
    mov dl, byte [rbx]
    mov byte [rcx], dl
    inc rbx
    inc rcx
    jmp .sc_copy_first
.sc_copy_second:
    cmp byte [r12], 0
    je .sc_done
    mov dl, byte [r12]
    mov byte [rcx], dl
    inc r12
    inc rcx
    jmp .sc_copy_second
.sc_done:
    mov byte [rcx], 0
    inc rcx
    mov rdx, concat_buffer
    sub rcx, rdx
    mov [r13], rcx
    pop r13
    pop r12
    pop rbx
    ret
"#;

/// Copies two size-prefixed lists at `rdi`/`rsi` into a fresh region of
/// `list_buffer`; returns the new base address in `rax`.
const LIST_CONCAT: &str = r#"
list_concat:
    push rbx
    push r12
    push r13
    push r14
    push r15
    mov rbx, rdi
    mov r12, rsi
    mov r13, qword [rbx]
    mov r14, qword [r12]
    mov r15, list_offset
    mov rax, qword [r15]
    lea r15, [list_buffer + rax]
    push r15
    mov rax, r13
    add rax, r14
    mov qword [r15], rax
    lea r15, [r15 + 8]
    xor rcx, rcx
.lc_copy_first:
    cmp rcx, r13
    jge .lc_copy_second
    mov rdx, qword [rbx + 8 + rcx*8]
    mov qword [r15 + rcx*8], rdx
    inc rcx
    jmp .lc_copy_first
.lc_copy_second:
    xor rdx, rdx
.lc_copy_second_loop:
    cmp rdx, r14
    jge .lc_done
    mov rax, qword [r12 + 8 + rdx*8]
    mov qword [r15 + r13*8 + rdx*8], rax
    inc rdx
    jmp .lc_copy_second_loop
.lc_done:
    mov rax, r13
    add rax, r14
    inc rax
    imul rax, rax, 8
    mov rcx, list_offset
    add qword [rcx], rax
    pop rax
    pop r15
    pop r14
    pop r13
    pop r12
    pop rbx
    ret
"#;

/// Materializes `list(range(n))`: writes `n` followed by `0..n-1` into
/// `list_buffer` starting at the current `list_offset`; returns the new
/// list's base address in `rax`.
const LIST_RANGE: &str = r#"
list_range:
    push rbx
    push r12
    mov rbx, rax
    mov r12, list_offset
    mov rax, qword [r12]
    lea rax, [list_buffer + rax]
    push rax
    mov qword [rax], rbx
    lea rax, [rax + 8]
    xor rcx, rcx
.lr_fill:
    cmp rcx, rbx
    jge .lr_done
    mov qword [rax + rcx*8], rcx
    inc rcx
    jmp .lr_fill
.lr_done:
    lea rcx, [rbx*8 + 8]
    add qword [r12], rcx
    pop rax
    pop r12
    pop rbx
    ret
"#;

/// Every runtime routine, in emission order. `_start`'s epilogue appends
/// these once, after the user program's own code.
pub fn all_routines() -> [&'static str; 6] {
    [
        PRINT_NUMBER,
        STR_CONCAT,
        LIST_CONCAT,
        PRINT_STRING,
        PRINT_NOT_STRING,
        LIST_RANGE,
    ]
}
