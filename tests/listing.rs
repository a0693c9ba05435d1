//
// This file is part of the x86dis disassembler.
//
// Copyright 2025 the x86dis authors
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation
// files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy,
// modify, merge, publish, distribute, sublicense, and/or sell copies
// of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

//! End-to-end scenarios: canonical byte sequences through the builder
//! API, both passes, and each dialect's renderer.

use x86dis::{
    Dialect, Disassembler, RELOC_DIRECT, RELOC_SELFREL, SCOPE_PUBLIC, SECTION_CODE, SECTION_CONST,
};

fn disassemble(dialect: Dialect, code: &[u8]) -> String {
    let mut d = Disassembler::new(dialect);
    d.init(0, 0);
    d.add_section(
        code,
        code.len() as u32,
        code.len() as u32,
        0x1000,
        SECTION_CODE,
        4,
        64,
        "text",
    );
    d.go().unwrap();
    d.output().to_owned()
}

fn line_with<'s>(out: &'s str, needle: &str) -> &'s str {
    out.lines()
        .find(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("no line containing {:?} in:\n{}", needle, out))
}

#[test]
fn scenario_nop() {
    for dialect in [Dialect::Masm, Dialect::Nasm, Dialect::Gas].iter() {
        let out = disassemble(*dialect, &[0x90]);
        let line = line_with(&out, "nop");
        // No warnings anywhere in the listing.
        assert!(!out.contains("Note:"), "{}", out);
        assert!(!out.contains("Error:"), "{}", out);
        // The hex comment shows the single byte.
        assert!(line.contains("90"), "{}", line);
    }
}

#[test]
fn scenario_mov_rbx_rax() {
    let out = disassemble(Dialect::Masm, &[0x48, 0x89, 0xC3]);
    assert!(line_with(&out, "mov").contains("rbx, rax"), "{}", out);

    let out = disassemble(Dialect::Nasm, &[0x48, 0x89, 0xC3]);
    assert!(line_with(&out, "mov").contains("rbx, rax"), "{}", out);

    let out = disassemble(Dialect::Gas, &[0x48, 0x89, 0xC3]);
    assert!(line_with(&out, "movq").contains("%rax, %rbx"), "{}", out);
}

#[test]
fn scenario_call_with_relocation() {
    // call foo, where foo lives at offset 0x20 of the same section.
    let mut code = vec![0xE8, 0x00, 0x00, 0x00, 0x00, 0xC3];
    code.resize(0x20, 0x90);
    code.push(0xC3); // foo: ret

    let mut d = Disassembler::new(Dialect::Nasm);
    d.init(0, 0);
    d.add_section(
        &code,
        code.len() as u32,
        code.len() as u32,
        0,
        SECTION_CODE,
        4,
        64,
        "text",
    );
    d.add_symbol(1, 0x20, 0, 0, SCOPE_PUBLIC, 11, Some("foo"), None);
    d.add_relocation(1, 1, -4, RELOC_SELFREL, 4, 11, 0);
    d.go().unwrap();

    let out = d.output();
    assert!(line_with(out, "call").contains("call"), "{}", out);
    assert!(line_with(out, "call").contains("foo"), "{}", out);
    // Pass 1 opened a function at foo: the label is emitted.
    assert!(out.contains("foo:"), "{}", out);
}

#[test]
fn scenario_jump_table() {
    // jmp [jt + rax*4] followed by two label-and-return blocks, with a
    // relocated jump table in a read-only data section.
    let code = [
        0xFF, 0x24, 0x85, 0x00, 0x00, 0x00, 0x00, // jmp [jt+rax*4]
        0x90, 0xC3, // L1
        0x90, 0xC3, // L2
    ];
    let table = [0u8; 8];

    let mut d = Disassembler::new(Dialect::Nasm);
    d.init(0, 0);
    d.add_section(&code, 11, 11, 0, SECTION_CODE, 4, 32, "text");
    d.add_section(&table, 8, 8, 0x100, SECTION_CONST, 2, 32, "rodata");
    d.add_symbol(2, 0, 0, 0, SCOPE_PUBLIC, 3, Some("jt"), None);
    d.add_symbol(1, 7, 0, 0, 0, 4, Some("L1"), None);
    d.add_symbol(1, 9, 0, 0, 0, 5, Some("L2"), None);
    d.add_relocation(1, 3, 0, RELOC_DIRECT, 4, 3, 0);
    d.add_relocation(2, 0, 0, RELOC_DIRECT, 4, 4, 0);
    d.add_relocation(2, 4, 0, RELOC_DIRECT, 4, 5, 0);
    d.go().unwrap();

    let out = d.output();
    let jmp = line_with(out, "jmp");
    assert!(jmp.contains("jt"), "{}", out);
    assert!(jmp.contains("jump table"), "{}", out);
    assert!(jmp.contains("L1"), "{}", out);
    assert!(jmp.contains("L2"), "{}", out);
    // The discovered labels are written in the code section.
    assert!(out.contains("L1:"), "{}", out);
    assert!(out.contains("L2:"), "{}", out);
    // The table itself renders as pointer directives, not raw bytes.
    assert!(line_with(out, "dd").contains("L1"), "{}", out);
}

#[test]
fn scenario_evex_vmovups() {
    let code = [
        0x62, 0xF1, 0x7C, 0x48, 0x10, 0x04, 0x25, 0x40, 0x00, 0x00, 0x00,
    ];
    let out = disassemble(Dialect::Nasm, &code);
    let line = line_with(&out, "vmovups");
    assert!(line.contains("zmm0"), "{}", line);
    assert!(line.contains("0x40"), "{}", line);
    // No mask, no broadcast decorations.
    assert!(!line.contains("{k"), "{}", line);
    assert!(!line.contains("{1to"), "{}", line);
}

#[test]
fn scenario_ud2_then_data() {
    // ud2 followed by bytes with no inbound label: the tail is data.
    let code = [0x0F, 0x0B, 0x48, 0x89];
    let out = disassemble(Dialect::Nasm, &code);
    assert!(out.contains("ud2"), "{}", out);
    // The trailing truncated instruction is emitted as data bytes.
    assert!(out.contains("db"), "{}", out);
}

#[test]
fn section_address_appears_in_comments() {
    let out = disassemble(Dialect::Nasm, &[0x90]);
    assert!(out.contains("1000 _ 90"), "{}", out);
}

#[test]
fn output_is_deterministic() {
    let code = [0xE8, 0x02, 0x00, 0x00, 0x00, 0x90, 0xC3, 0xC3];
    let a = disassemble(Dialect::Nasm, &code);
    let b = disassemble(Dialect::Nasm, &code);
    assert_eq!(a, b);
}

#[test]
fn gas_uses_att_everywhere() {
    let code = [0x55, 0x48, 0x89, 0xE5, 0x5D, 0xC3];
    let out = disassemble(Dialect::Gas, &code);
    assert!(out.contains("pushq"), "{}", out);
    assert!(line_with(&out, "movq").contains("%rsp, %rbp"), "{}", out);
    assert!(out.contains("popq"), "{}", out);
    // GAS comments use the hash separator.
    assert!(out.contains("# "), "{}", out);
    assert!(!out.lines().any(|l| l.trim_start().starts_with(';')), "{}", out);
}

#[test]
fn bss_tail_renders_per_dialect() {
    let data = [0u8; 0];
    for (dialect, needle) in [
        (Dialect::Masm, "dup (?)"),
        (Dialect::Nasm, "resb"),
        (Dialect::Gas, ".zero"),
    ]
    .iter()
    {
        let mut d = Disassembler::new(*dialect);
        d.init(0, 0);
        d.add_section(&data, 0, 0x40, 0, x86dis::SECTION_BSS, 4, 32, "bss");
        d.go().unwrap();
        assert!(d.output().contains(needle), "{:?}:\n{}", dialect, d.output());
    }
}
