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

//! The dialect formatter: everything that turns decoded instructions,
//! labels and data runs into MASM, NASM or GAS text. One dialect is
//! selected per run; the renderers share the instruction/operand
//! contract and differ only where the assemblers do.

use crate::decoder::{
    MFlags, OP_DIRECT_MEM, OP_IMM, OP_IMM2, OP_IMM_REG, OP_PLACE, OP_REG, OP_RM, OP_SHORT_REG,
    OP_VVVV, P_REX, P_SEG, P_TYPE, RX_B, RX_REX, RX_VEX2, RX_VEX3, RX_XOP,
};
use crate::disasm::{Disassembler, TYPE_DATA};
use crate::errors::{ERROR_TEXTS, WARNING_TEXTS};
use crate::opcodes::{self, REG16, REG32, REG64, REG8, REG8X, REG_SEG};
use crate::sections::{RELOC_GOT_SELFREL, RELOC_PLT_SELFREL, RELOC_SELFREL, SEG_FLAT};
use crate::symbols::SCOPE_WRITTEN;

// Output columns, as character positions on the line.
const ASM_TAB1: usize = 8; // mnemonic
const ASM_TAB2: usize = 16; // first operand
const ASM_TAB3: usize = 56; // comment

/// Target assembler syntax family.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dialect {
    Masm,
    Nasm,
    Gas,
}

impl Dialect {
    /// Index used by the opcode tables' dialect link.
    pub fn index(self) -> u16 {
        match self {
            Dialect::Masm => 0,
            Dialect::Nasm => 1,
            Dialect::Gas => 2,
        }
    }

    pub fn comment_sep(self) -> &'static str {
        match self {
            Dialect::Gas => "#",
            _ => ";",
        }
    }

    /// Token for the current output position.
    pub fn here(self) -> &'static str {
        match self {
            Dialect::Gas => ".",
            _ => "$",
        }
    }

    fn data_directive(self, size: u32) -> &'static str {
        match self {
            Dialect::Gas => match size {
                1 => ".byte",
                2 => ".word",
                4 => ".long",
                _ => ".quad",
            },
            _ => match size {
                1 => "db",
                2 => "dw",
                4 => "dd",
                _ => "dq",
            },
        }
    }

    fn is_att(self) -> bool {
        self == Dialect::Gas
    }
}

fn pad_to(line: &mut String, column: usize) {
    while line.len() < column {
        line.push(' ');
    }
    if !line.is_empty() && !line.ends_with(' ') {
        line.push(' ');
    }
}

impl<'a> Disassembler<'a> {
    fn put(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }

    fn dialect_hex(&self, value: i64) -> String {
        if (0..10).contains(&value) {
            return format!("{}", value);
        }
        let negative = value < 0;
        let abs = value.unsigned_abs();
        let body = match self.dialect {
            Dialect::Masm => {
                let h = format!("{:X}h", abs);
                if h.starts_with(|c: char| c.is_ascii_alphabetic()) {
                    format!("0{}", h)
                } else {
                    h
                }
            }
            _ => format!("0x{:x}", abs),
        };
        if negative {
            format!("-{}", body)
        } else {
            body
        }
    }

    // --- file and segment frames ------------------------------------------

    pub(crate) fn write_file_begin(&mut self) {
        let sep = self.dialect.comment_sep();
        self.put(&format!(
            "{} Disassembly of {} section(s), {} syntax",
            sep,
            self.sections.len() - 1,
            match self.dialect {
                Dialect::Masm => "MASM",
                Dialect::Nasm => "NASM",
                Dialect::Gas => "GAS",
            }
        ));
        self.put(&format!(
            "{} Instruction set: {}",
            sep,
            opcodes::instruction_set_name(self.instruction_set_max)
        ));
        if self.count_errors > 0 {
            self.put(&format!("{} {} decode error(s)", sep, self.count_errors));
        }
        if self.exe_type == 2 && self.image_base != 0 {
            self.put(&format!("{} Image base: {:X}", sep, self.image_base));
        }
        self.put("");

        if self.dialect == Dialect::Masm && self.word_size_of_file() == 32 {
            self.put(".686");
            self.put(".xmm");
            self.put(".model flat");
            self.put("");
        }

        // Public and external declarations.
        let mut publics = Vec::new();
        let mut externals = Vec::new();
        for (_, sym) in self.symbols.iter() {
            if !sym.has_name() {
                continue;
            }
            if sym.is_public() {
                publics.push(sym.name.clone());
            } else if sym.is_external() {
                externals.push(sym.name.clone());
            }
        }
        for name in publics {
            let line = match self.dialect {
                Dialect::Masm => format!("public {}", name),
                Dialect::Nasm => format!("global {}", name),
                Dialect::Gas => format!(".globl {}", name),
            };
            self.put(&line);
        }
        for name in externals {
            let line = match self.dialect {
                Dialect::Masm => format!("extrn {}:near", name),
                Dialect::Nasm => format!("extern {}", name),
                Dialect::Gas => format!(".extern {}", name),
            };
            self.put(&line);
        }
        self.put("");
    }

    fn word_size_of_file(&self) -> u32 {
        self.sections
            .iter()
            .skip(1)
            .map(|s| s.word_size)
            .max()
            .unwrap_or(32)
    }

    pub(crate) fn write_file_end(&mut self) {
        if self.dialect == Dialect::Masm {
            self.put("");
            self.put("end");
        }
    }

    pub(crate) fn write_segment_begin(&mut self) {
        let sec = &self.sections[self.section];
        let name = sec.name.clone();
        let align_log2 = sec.align.min(12);
        let align = 1u32 << align_log2;
        let is_code = sec.is_code();
        let class = if is_code {
            "CODE"
        } else if sec.is_const() {
            "CONST"
        } else if sec.init_size == 0 && sec.total_size > 0 {
            "BSS"
        } else {
            "DATA"
        };
        self.put("");
        match self.dialect {
            Dialect::Masm => {
                self.put(&format!("{} SEGMENT ALIGN({}) '{}'", name, align, class));
                if is_code {
                    self.assumes[1] = self.section as i32; // cs
                    let ds = if self.assumes[3] == SEG_FLAT {
                        "FLAT"
                    } else {
                        "NOTHING"
                    };
                    self.put(&format!("        ASSUME  cs:{}, ds:{}", name, ds));
                }
            }
            Dialect::Nasm => {
                if class == "BSS" {
                    self.put(&format!("SECTION {} align={} nobits", name, align));
                } else {
                    self.put(&format!("SECTION {} align={}", name, align));
                }
            }
            Dialect::Gas => {
                self.put(&format!(".section {}", name));
                self.put(&format!(".p2align {}", align_log2));
            }
        }
    }

    pub(crate) fn write_segment_end(&mut self) {
        if self.dialect == Dialect::Masm {
            let name = self.sections[self.section].name.clone();
            self.put(&format!("{} ENDS", name));
        }
        self.put("");
    }

    // --- labels and functions ---------------------------------------------

    /// Returns whether any label was written at this address.
    pub(crate) fn write_labels_here(&mut self) -> bool {
        let sec = self.section as i32;
        let at = self.ibegin;
        let (first, last, _) = self.symbols.find_by_address(sec, at);
        if first == 0 {
            return false;
        }
        let function_entry = self.functions[1..]
            .iter()
            .any(|f| f.section == sec && f.start == at);
        for i in first..=last {
            let name = self.symbols.name(i).to_owned();
            self.symbols.get_mut(i).scope |= SCOPE_WRITTEN;
            if function_entry && self.dialect == Dialect::Masm {
                self.put("");
                self.put(&format!("{} PROC", name));
            } else {
                if function_entry {
                    self.put("");
                }
                self.put(&format!("{}:", name));
            }
        }
        true
    }

    pub(crate) fn write_function_end_marker(&mut self) {
        if self.dialect != Dialect::Masm || self.ifunction == 0 {
            return;
        }
        let f = &self.functions[self.ifunction];
        if f.end_unknown() || self.iend != f.end {
            return;
        }
        let old = f.old_symbol_index;
        if let Some(symi) = self.symbols.old_to_new(old) {
            let name = self.symbols.name(symi).to_owned();
            self.put(&format!("{} ENDP", name));
        }
    }

    pub(crate) fn write_errors_and_warnings(&mut self) {
        let sep = self.dialect.comment_sep();
        let errors = self.s.errors;
        let warnings = self.s.warnings;
        for &(flag, text) in ERROR_TEXTS {
            if errors.contains(flag) {
                self.put(&format!("{} {}", sep, text));
            }
        }
        for &(flag, text) in WARNING_TEXTS {
            if warnings.contains(flag) {
                self.put(&format!("{} {}", sep, text));
            }
        }
    }

    // --- instructions -----------------------------------------------------

    pub(crate) fn write_instruction(&mut self) {
        let mut line = String::new();
        pad_to(&mut line, ASM_TAB1);
        line.push_str(&self.opcode_name());

        let mut rendered = Vec::new();
        let ops = self.s.operands;
        for (i, &op) in ops.iter().enumerate() {
            if op == 0 {
                continue;
            }
            if let Some(text) = self.format_operand(op, i) {
                rendered.push(text);
            }
        }
        if self.dialect.is_att() {
            rendered.reverse();
        }
        if !rendered.is_empty() {
            pad_to(&mut line, ASM_TAB2);
            line.push_str(&rendered.join(", "));
        }

        // Address and raw bytes in the comment column.
        pad_to(&mut line, ASM_TAB3);
        let sec = &self.sections[self.section];
        let hex: Vec<String> = sec.bytes
            [self.s.start as usize..(self.s.end as usize).min(sec.bytes.len())]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        line.push_str(&format!(
            "{} {:04X} _ {}",
            self.dialect.comment_sep(),
            sec.address + self.s.start,
            hex.join(" ")
        ));

        if let Some(comment) = self.jump_table_comment() {
            line.push_str(&comment);
        }

        self.put(&line);
    }

    /// Mnemonic with its v prefix, condition code and size suffixes.
    fn opcode_name(&mut self) -> String {
        let e = self.s.entry;
        let mut name = String::new();
        if e.options & 2 != 0 && self.s.has_vex() {
            name.push('v');
        }
        name.push_str(e.name);
        if e.options & 0x2000 != 0 {
            name.push_str(opcodes::cc_name(self.s.opcode_byte & 0x0F));
        }
        if e.options & 1 != 0 {
            let allowed = e.prefixes;
            if allowed & 0xE00 == 0xE00 {
                name.push_str(match self.s.prefixes[P_TYPE] {
                    0x66 => "pd",
                    0xF2 => "sd",
                    0xF3 => "ss",
                    _ => "ps",
                });
            } else if allowed & 0x200 != 0 && allowed & 0xC00 == 0 {
                name.push_str(if self.s.prefixes[P_TYPE] == 0x66 {
                    "pd"
                } else {
                    "ps"
                });
            } else if allowed & 0x3000 == 0x3000 {
                name.push_str(if self.s.vex_w() { "q" } else { "d" });
            }
        }
        if e.options & 0x1000 != 0 && self.s.has_evex() {
            name.push_str(if self.s.vex_w() { "64" } else { "32" });
        }
        if self.dialect.is_att() {
            if let Some(suffix) = self.att_suffix() {
                name.push(suffix);
            }
        }
        name
    }

    /// AT&T appends the operand size to mnemonics with sized integer
    /// operands.
    fn att_suffix(&self) -> Option<char> {
        let e = self.s.entry;
        let mut sizes = Vec::new();
        for &t in [e.dest, e.src1].iter() {
            if t != 0 && opcodes::is_gp(t) && (t & 0xFF) < 0x10 {
                sizes.push(self.gp_bits(t));
            }
        }
        // Widening moves and friends carry two sizes; leave those alone.
        if sizes.len() == 2 && sizes[0] != sizes[1] {
            return None;
        }
        match sizes.first() {
            Some(8) => Some('b'),
            Some(16) => Some('w'),
            Some(32) => Some('l'),
            Some(64) => Some('q'),
            _ => None,
        }
    }

    /// Integer operand size in bits, honoring the 64-bit default for
    /// push/pop and near-pointer operands.
    fn gp_bits(&self, t: u32) -> u32 {
        let bits = opcodes::int_bits(t, self.s.operand_size);
        if matches!(t & 0xFF, 0x0A | 0x0B | 0x0C)
            && self.s.word_size == 64
            && self.s.prefixes[crate::decoder::P_OSIZE] == 0
        {
            64
        } else {
            bits
        }
    }

    fn reg_prefix(&self) -> &'static str {
        if self.dialect.is_att() {
            "%"
        } else {
            ""
        }
    }

    fn gp_name(&self, n: u8, bits: u32) -> String {
        let n = n as usize & 15;
        let rexish = self.s.prefixes[P_REX] & (RX_REX | RX_VEX2 | RX_VEX3 | RX_XOP) != 0;
        let name = match bits {
            8 => {
                if rexish {
                    REG8X[n]
                } else {
                    REG8[n & 7]
                }
            }
            16 => REG16[n],
            64 => REG64[n],
            _ => REG32[n],
        };
        format!("{}{}", self.reg_prefix(), name)
    }

    fn vector_name(&self, n: u8, bytes: u32) -> String {
        let family = match bytes {
            8 => "mm",
            32 => "ymm",
            64 => "zmm",
            _ => "xmm",
        };
        format!("{}{}{}", self.reg_prefix(), family, n)
    }

    fn register_name(&self, n: u8, t: u32) -> String {
        let kind = t & 0xFF;
        if opcodes::is_vector(t) {
            let bytes = opcodes::vector_bytes(
                t,
                self.s.prefixes[P_TYPE] == 0x66,
                self.s.has_vex(),
                self.s.ll(),
            );
            let bytes = if bytes == 0 || opcodes::is_scalar_float(t, self.s.prefixes[P_TYPE]) {
                16
            } else {
                bytes
            };
            return self.vector_name(n, bytes);
        }
        match kind {
            0x40..=0x45 => {
                if self.dialect.is_att() {
                    format!("%st({})", n)
                } else {
                    format!("st({})", n)
                }
            }
            0x91 => format!("{}{}", self.reg_prefix(), REG_SEG[n as usize & 7]),
            0x92 => format!("{}cr{}", self.reg_prefix(), n),
            0x93 => format!("{}dr{}", self.reg_prefix(), n),
            0x95 => format!("{}k{}", self.reg_prefix(), n),
            0x98 => format!("{}bnd{}", self.reg_prefix(), n & 3),
            _ => self.gp_name(n, self.gp_bits(t)),
        }
    }

    /// Size keyword used in memory overrides.
    fn size_keyword(&self, bytes: u32) -> &'static str {
        match (self.dialect, bytes) {
            (_, 1) => "byte",
            (_, 2) => "word",
            (_, 4) => "dword",
            (_, 6) => "fword",
            (_, 8) => "qword",
            (_, 10) => "tbyte",
            (Dialect::Nasm, 16) => "oword",
            (_, 16) => "xmmword",
            (Dialect::Nasm, 32) => "yword",
            (_, 32) => "ymmword",
            (Dialect::Nasm, 64) => "zword",
            (_, 64) => "zmmword",
            _ => "",
        }
    }

    fn memory_bytes(&self, t: u32) -> u32 {
        let kind = t & 0xFF;
        if opcodes::is_scalar_float(t, self.s.prefixes[P_TYPE]) {
            return opcodes::element_bytes(t, self.s.prefixes[P_TYPE], self.s.vex_w());
        }
        if opcodes::is_vector(t) {
            return opcodes::vector_bytes(
                t,
                self.s.prefixes[P_TYPE] == 0x66,
                self.s.has_vex(),
                self.s.ll(),
            );
        }
        match kind {
            0x43 => 4,
            0x44 => 8,
            0x45 | 5 => 10,
            7 => 6,
            0x0D => {
                if self.s.operand_size == 16 {
                    4
                } else {
                    6
                }
            }
            6 | 0x40 => 0,
            _ => self.gp_bits(t) / 8,
        }
    }

    fn segment_override(&self) -> Option<&'static str> {
        match self.s.prefixes[P_SEG] {
            0x26 => Some("es"),
            0x2E => Some("cs"),
            0x36 => Some("ss"),
            0x3E => Some("ds"),
            0x64 => Some("fs"),
            0x65 => Some("gs"),
            _ => None,
        }
    }

    fn format_operand(&mut self, op: u32, slot: usize) -> Option<String> {
        let text = match op & OP_PLACE {
            OP_SHORT_REG => {
                let b = if self.s.prefixes[P_REX] & RX_B != 0 { 8 } else { 0 };
                self.register_name((self.s.opcode_byte & 7) | b, op)
            }
            OP_REG => self.register_name(self.s.reg_bits, op),
            OP_VVVV => self.register_name(self.s.vreg, op),
            OP_IMM_REG => {
                let bytes = self.sections[self.section].bytes;
                let imm = self.s.immediate(bytes) as u8;
                self.register_name(imm >> 4, op)
            }
            OP_RM => {
                if self.s.has_memory() {
                    self.memory_operand(op)
                } else {
                    let mut r = self.register_name(self.s.rm_bits, op);
                    if self.dialect.is_att() && matches!(op & 0xFF, 0x0B | 0x0C) {
                        r.insert(0, '*');
                    }
                    r
                }
            }
            OP_DIRECT_MEM => self.direct_memory_operand(op),
            _ => {
                if op & (OP_IMM | OP_IMM2) != 0 {
                    self.immediate_operand(op)?
                } else {
                    self.fixed_operand(op)?
                }
            }
        };
        let text = if slot == 0 { self.decorate_dest(text) } else { text };
        Some(text)
    }

    /// EVEX mask and zeroing decorations on the destination.
    fn decorate_dest(&self, mut text: String) -> String {
        if self.s.has_evex() && !self.dialect.is_att() {
            if self.s.kreg != 0 {
                text.push_str(&format!("{{k{}}}", self.s.kreg));
                if self.s.esss & 8 != 0 {
                    text.push_str("{z}");
                }
            }
        }
        text
    }

    /// Hard-coded operands: al, ax, cl, dx, st(0), 1, string memory.
    fn fixed_operand(&self, op: u32) -> Option<String> {
        let p = self.reg_prefix();
        Some(match op & 0xFF {
            0xa1 => format!("{}al", p),
            0xa2 => format!("{}ax", p),
            0xa3 => format!("{}eax", p),
            0xa4 => format!("{}rax", p),
            0xa8 => {
                if self.s.operand_size == 16 {
                    format!("{}ax", p)
                } else {
                    format!("{}eax", p)
                }
            }
            0xa9 => match self.s.operand_size {
                16 => format!("{}ax", p),
                64 => format!("{}rax", p),
                _ => format!("{}eax", p),
            },
            0xae => format!("{}xmm0", p),
            0xaf => {
                if self.dialect.is_att() {
                    format!("{}st", p)
                } else {
                    "st".to_owned()
                }
            }
            0xb1 => "1".to_owned(),
            0xb2 => format!("{}dx", p),
            0xb3 => format!("{}cl", p),
            _ => return None,
        })
    }

    fn immediate_operand(&mut self, op: u32) -> Option<String> {
        let bytes = self.sections[self.section].bytes;
        let kind = op & 0xFF;

        // Far direct pointer: segment in the trailing word.
        if matches!(kind, 0x84 | 0x85) {
            let off = self.s.immediate(bytes);
            let seg = self.s.immediate2(bytes) & 0xFFFF;
            return Some(format!(
                "{}:{}",
                self.dialect_hex(seg),
                self.dialect_hex(off)
            ));
        }

        if opcodes::is_jump_target(op) {
            return Some(self.jump_target_operand());
        }

        if self.s.immediate_relocation != 0 {
            let (name, extra) = self.relocation_target(self.s.immediate_relocation, true);
            let mut t = match self.dialect {
                Dialect::Masm => format!("offset {}", name),
                Dialect::Nasm => name,
                Dialect::Gas => format!("${}", name),
            };
            if extra != 0 {
                t.push_str(&format!("+{}", self.dialect_hex(extra)));
            }
            return Some(t);
        }

        let (value, field_size) = if op & OP_IMM2 != 0 {
            (self.s.immediate2(bytes), 2)
        } else {
            (
                self.s.immediate(bytes),
                self.s.immediate_field_size.min(8),
            )
        };
        // Only the signed constant kinds keep their sign; unsigned and
        // hexadecimal kinds are masked to the field width.
        let signed = matches!(kind, 0x21..=0x29);
        let text = if signed {
            format!("{}", value)
        } else {
            let masked = if field_size >= 8 {
                value as u64 as i64
            } else {
                value & ((1i64 << (field_size * 8)) - 1)
            };
            self.dialect_hex(masked)
        };
        Some(if self.dialect.is_att() {
            format!("${}", text)
        } else {
            text
        })
    }

    /// Near jump and call targets: the symbol at end-plus-displacement,
    /// or the relocation target, or a bare address.
    fn jump_target_operand(&mut self) -> String {
        let bytes = self.sections[self.section].bytes;
        if self.s.immediate_relocation != 0 {
            let (name, extra) = self.relocation_target(self.s.immediate_relocation, true);
            let mut t = name;
            if extra != 0 {
                t.push_str(&format!("+{}", self.dialect_hex(extra)));
            }
            return t;
        }
        let target = self.s.end as i64 + self.s.immediate(bytes);
        if target >= 0 {
            let (symi, _, _) = self
                .symbols
                .find_by_address(self.section as i32, target as u32);
            if symi != 0 {
                return self.symbols.name(symi).to_owned();
            }
        }
        let addr = self.sections[self.section].address as i64 + target;
        self.dialect_hex(addr)
    }

    /// Resolve a relocation to (symbol name, leftover addend).
    fn relocation_target(&mut self, r: usize, is_immediate: bool) -> (String, i64) {
        let reloc = self.relocations.list[r].clone();
        let symi = match self.symbols.old_to_new(reloc.target_old_index) {
            Some(i) => i,
            None => return ("?missing".to_owned(), 0),
        };
        let name = self.symbols.name(symi).to_owned();
        let bytes = self.sections[self.section].bytes;
        let raw = if is_immediate {
            self.s.immediate(bytes)
        } else {
            self.s.displacement(bytes)
        };
        let field = if is_immediate {
            self.s.immediate_field
        } else {
            self.s.address_field
        };
        let extra = if reloc.rtype & (RELOC_SELFREL | RELOC_GOT_SELFREL | RELOC_PLT_SELFREL) != 0 {
            raw - reloc.addend as i64 - (self.s.end as i64 - field as i64)
        } else {
            raw - reloc.addend as i64
        };
        (name, extra)
    }

    fn direct_memory_operand(&mut self, op: u32) -> String {
        let bytes = self.sections[self.section].bytes;
        let inner = if self.s.address_relocation != 0 {
            let (name, extra) = self.relocation_target(self.s.address_relocation, false);
            if extra != 0 {
                format!("{}+{}", name, self.dialect_hex(extra))
            } else {
                name
            }
        } else {
            self.dialect_hex(self.s.displacement(bytes))
        };
        let seg = self.segment_override();
        if self.dialect.is_att() {
            match seg {
                Some(s) => format!("%{}:{}", s, inner),
                None => inner,
            }
        } else {
            let size = self.memory_bytes(op);
            let mut t = self.size_override(size);
            if let Some(s) = seg {
                t.push_str(s);
                t.push(':');
            }
            t.push('[');
            t.push_str(&inner);
            t.push(']');
            t
        }
    }

    fn size_override(&self, bytes: u32) -> String {
        if self.s.entry.options & 0x800 != 0 || bytes == 0 {
            return String::new();
        }
        let word = self.size_keyword(bytes);
        if word.is_empty() {
            return String::new();
        }
        match self.dialect {
            Dialect::Masm => format!("{} ptr ", word),
            Dialect::Nasm => format!("{} ", word),
            Dialect::Gas => String::new(),
        }
    }

    fn memory_operand(&mut self, op: u32) -> String {
        let bytes = self.sections[self.section].bytes;
        let mut disp_text = String::new();
        let mut disp_val: i64 = 0;
        let mut have_symbol = false;

        if self.s.address_relocation != 0 {
            let (name, extra) = self.relocation_target(self.s.address_relocation, false);
            disp_text = name;
            disp_val = extra;
            have_symbol = true;
        } else if self.s.address_field_size > 0 {
            let mut v = self.s.displacement(bytes);
            if self.s.address_field_size == 1 && self.s.offset_multiplier > 1 {
                // EVEX compressed displacement.
                v *= self.s.offset_multiplier as i64;
            }
            disp_val = v;
        }

        let base = self.s.base_reg.checked_sub(1);
        let index = self.s.index_reg.checked_sub(1);
        let abits = self.s.address_size;
        let rip = self.s.mflags.contains(MFlags::RIP_RELATIVE);
        let seg = self.segment_override();

        if self.dialect.is_att() {
            let mut t = String::new();
            if let Some(s) = seg {
                t.push_str(&format!("%{}:", s));
            }
            if have_symbol {
                t.push_str(&disp_text);
                if disp_val != 0 {
                    t.push_str(&format!("+{}", self.dialect_hex(disp_val)));
                }
            } else if disp_val != 0 || (base.is_none() && index.is_none() && !rip) {
                t.push_str(&self.dialect_hex(disp_val));
            }
            if rip {
                t.push_str("(%rip)");
            } else if base.is_some() || index.is_some() {
                t.push('(');
                if let Some(b) = base {
                    t.push_str(&self.gp_name(b, abits));
                }
                if let Some(i) = index {
                    t.push(',');
                    t.push_str(&self.gp_name(i, abits));
                    t.push_str(&format!(",{}", 1u32 << self.s.scale));
                }
                t.push(')');
            }
            if matches!(op & 0xFF, 0x0B | 0x0C | 0x0D) {
                t.insert(0, '*');
            }
            return t;
        }

        let mut parts: Vec<String> = Vec::new();
        if rip {
            if self.dialect == Dialect::Nasm {
                parts.push(format!(
                    "rel {}",
                    if have_symbol {
                        disp_text.clone()
                    } else {
                        self.dialect_hex(disp_val)
                    }
                ));
                if have_symbol && disp_val != 0 {
                    parts.push(self.dialect_hex(disp_val));
                }
            } else {
                if have_symbol {
                    parts.push(disp_text.clone());
                    if disp_val != 0 {
                        parts.push(self.dialect_hex(disp_val));
                    }
                } else {
                    parts.push(self.dialect_hex(disp_val));
                }
                parts.push("rip".to_owned());
            }
        } else {
            if let Some(b) = base {
                parts.push(self.gp_name(b, abits));
            }
            if let Some(i) = index {
                let scale = 1u32 << self.s.scale;
                if scale > 1 {
                    parts.push(format!("{}*{}", self.gp_name(i, abits), scale));
                } else {
                    parts.push(self.gp_name(i, abits));
                }
            }
            if have_symbol {
                parts.push(disp_text.clone());
                if disp_val != 0 {
                    parts.push(self.dialect_hex(disp_val));
                }
            } else if disp_val != 0 || parts.is_empty() {
                parts.push(self.dialect_hex(disp_val));
            }
        }

        let size = self.memory_bytes(op);
        let mut t = self.size_override(size);
        if let Some(s) = seg {
            t.push_str(s);
            t.push(':');
        }
        t.push('[');
        t.push_str(&parts.join("+"));
        t.push(']');
        if self.s.has_evex() && self.s.esss & 1 != 0 {
            // Broadcast memory operand.
            let elem = self.s.offset_multiplier.max(1);
            let full = opcodes::vector_bytes(op, true, true, self.s.ll()).max(elem);
            t.push_str(&format!("{{1to{}}}", full / elem));
        }
        t
    }

    /// For an indirect jump through a recognized table, list the targets
    /// discovered in pass 1.
    fn jump_table_comment(&mut self) -> Option<String> {
        let mut table_op = false;
        for &op in self.s.operands.iter() {
            if matches!(op & 0xFF, 0x0B | 0x0C) {
                table_op = true;
            }
        }
        if !table_op || self.s.address_relocation == 0 {
            return None;
        }
        let reloc = self.relocations.list[self.s.address_relocation].clone();
        let symi = self.symbols.old_to_new(reloc.target_old_index)?;
        let (tsec, toff, size) = {
            let sym = self.symbols.get(symi);
            if sym.stype & TYPE_DATA == 0 || sym.size == 0 {
                return None;
            }
            (sym.section, sym.offset, sym.size)
        };
        let entry_size = if self.sections[tsec as usize].word_size == 64 {
            8
        } else {
            4
        };
        let mut names = Vec::new();
        let mut at = toff;
        while at < toff + size && names.len() < 8 {
            let r = self.relocations.find_at(tsec, at);
            if r == 0 {
                break;
            }
            let old = self.relocations.list[r].target_old_index;
            if let Some(ti) = self.symbols.old_to_new(old) {
                names.push(self.symbols.name(ti).to_owned());
            }
            at += entry_size;
        }
        if names.is_empty() {
            None
        } else {
            Some(format!(" (jump table: {})", names.join(", ")))
        }
    }

    // --- data -------------------------------------------------------------

    /// Write the bytes of [lo, hi) as data directives. Pointer-sized
    /// relocated items become symbol references; plain bytes are batched.
    pub(crate) fn write_data_run(&mut self, lo: u32, hi: u32) {
        let sec = self.section as i32;
        let mut at = lo;
        while at < hi {
            let r = self.relocations.find_at(sec, at);
            if r != 0 {
                let reloc = self.relocations.list[r].clone();
                let size = reloc.size.max(1).min(8);
                let name = match self.symbols.old_to_new(reloc.target_old_index) {
                    Some(symi) => self.symbols.name(symi).to_owned(),
                    None => "?missing".to_owned(),
                };
                let directive = self.dialect.data_directive(size);
                let mut line = String::new();
                pad_to(&mut line, ASM_TAB1);
                line.push_str(directive);
                pad_to(&mut line, ASM_TAB2);
                line.push_str(&name);
                if reloc.addend != 0 {
                    line.push_str(&format!("+{}", self.dialect_hex(reloc.addend as i64)));
                }
                self.put(&line);
                at += size;
                continue;
            }

            // Plain bytes up to the next relocation, 16 per line.
            let stop = {
                let next = self.relocations.find_in_range(sec, at, hi);
                if next != 0 {
                    self.relocations.list[next].offset.max(at + 1)
                } else {
                    hi
                }
            };
            let stop = stop.min(at + 16);
            let bytes = self.sections[self.section].bytes;
            let items: Vec<String> = bytes[at as usize..stop as usize]
                .iter()
                .map(|b| self.dialect_hex(*b as i64))
                .collect();
            let mut line = String::new();
            pad_to(&mut line, ASM_TAB1);
            line.push_str(self.dialect.data_directive(1));
            pad_to(&mut line, ASM_TAB2);
            line.push_str(&items.join(", "));
            self.put(&line);
            at = stop;
        }
    }

    /// Uninitialized tail of a section.
    pub(crate) fn write_uninit_run(&mut self, count: u32) {
        let mut line = String::new();
        pad_to(&mut line, ASM_TAB1);
        match self.dialect {
            Dialect::Masm => {
                line.push_str("db");
                pad_to(&mut line, ASM_TAB2);
                line.push_str(&format!("{} dup (?)", count));
            }
            Dialect::Nasm => {
                line.push_str("resb");
                pad_to(&mut line, ASM_TAB2);
                line.push_str(&format!("{}", count));
            }
            Dialect::Gas => {
                line.push_str(&format!(".zero {}", count));
            }
        }
        self.put(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::SECTION_CODE;

    fn listing(dialect: Dialect, bytes: &[u8]) -> String {
        let mut d = Disassembler::new(dialect);
        d.init(0, 0);
        d.add_section(
            bytes,
            bytes.len() as u32,
            bytes.len() as u32,
            0,
            SECTION_CODE,
            4,
            64,
            "text",
        );
        d.go().unwrap();
        d.output().to_owned()
    }

    fn instruction_line(out: &str, needle: &str) -> String {
        out.lines()
            .find(|l| l.contains(needle))
            .unwrap_or_else(|| panic!("no line with {:?} in:\n{}", needle, out))
            .to_owned()
    }

    #[test]
    fn nop_in_all_dialects() {
        for d in [Dialect::Masm, Dialect::Nasm, Dialect::Gas].iter() {
            let out = listing(*d, &[0x90, 0xC3]);
            instruction_line(&out, "nop");
        }
    }

    #[test]
    fn mov_rbx_rax_intel_and_att() {
        let out = listing(Dialect::Nasm, &[0x48, 0x89, 0xC3, 0xC3]);
        let line = instruction_line(&out, "mov");
        assert!(line.contains("rbx, rax"), "line: {}", line);

        let out = listing(Dialect::Gas, &[0x48, 0x89, 0xC3, 0xC3]);
        let line = instruction_line(&out, "movq");
        assert!(line.contains("%rax, %rbx"), "line: {}", line);
    }

    #[test]
    fn memory_operand_with_size_override() {
        // mov dword [rax], 1
        let bytes = [0xC7, 0x00, 0x01, 0x00, 0x00, 0x00, 0xC3];
        let out = listing(Dialect::Nasm, &bytes);
        let line = instruction_line(&out, "mov");
        assert!(line.contains("dword [rax]"), "line: {}", line);

        let out = listing(Dialect::Masm, &bytes);
        let line = instruction_line(&out, "mov");
        assert!(line.contains("dword ptr [rax]"), "line: {}", line);
    }

    #[test]
    fn sib_with_scale() {
        // mov eax, [rbx+rcx*4]
        let bytes = [0x8B, 0x04, 0x8B, 0xC3];
        let out = listing(Dialect::Nasm, &bytes);
        let line = instruction_line(&out, "mov");
        assert!(line.contains("[rbx+rcx*4]"), "line: {}", line);

        let out = listing(Dialect::Gas, &bytes);
        let line = instruction_line(&out, "mov");
        assert!(line.contains("(%rbx,%rcx,4)"), "line: {}", line);
    }

    #[test]
    fn rip_relative_rendering() {
        // lea rax, [rip+0x10]
        let bytes = [0x48, 0x8D, 0x05, 0x10, 0x00, 0x00, 0x00, 0xC3];
        let out = listing(Dialect::Nasm, &bytes);
        let line = instruction_line(&out, "lea");
        assert!(line.contains("[rel 0x10]"), "line: {}", line);

        let out = listing(Dialect::Gas, &bytes);
        let line = instruction_line(&out, "lea");
        assert!(line.contains("0x10(%rip)"), "line: {}", line);
    }

    #[test]
    fn hex_styles_differ() {
        // mov eax, 0xABCD1234: hex constants stay unsigned in both styles.
        let bytes = [0xB8, 0x34, 0x12, 0xCD, 0xAB, 0xC3];
        let out = listing(Dialect::Nasm, &bytes);
        let line = instruction_line(&out, "mov");
        assert!(line.contains("0xabcd1234"), "line: {}", line);

        let out = listing(Dialect::Masm, &bytes);
        let line = instruction_line(&out, "mov");
        assert!(line.contains("0ABCD1234h"), "line: {}", line);
    }

    #[test]
    fn data_directives_per_dialect() {
        let data = [1u8, 2, 3, 4];
        for (dialect, directive) in [
            (Dialect::Masm, "db"),
            (Dialect::Nasm, "db"),
            (Dialect::Gas, ".byte"),
        ]
        .iter()
        {
            let mut d = Disassembler::new(*dialect);
            d.init(0, 0);
            d.add_section(
                &data,
                4,
                8,
                0,
                crate::sections::SECTION_DATA,
                2,
                32,
                "data",
            );
            d.go().unwrap();
            let out = d.output();
            assert!(out.contains(directive), "{:?} output:\n{}", dialect, out);
            // Uninitialized tail.
            let uninit = match dialect {
                Dialect::Masm => "dup (?)",
                Dialect::Nasm => "resb",
                Dialect::Gas => ".zero",
            };
            assert!(out.contains(uninit), "{:?} output:\n{}", dialect, out);
        }
    }

    #[test]
    fn public_markers_per_dialect() {
        let bytes = [0xC3];
        for (dialect, marker) in [
            (Dialect::Masm, "public entry"),
            (Dialect::Nasm, "global entry"),
            (Dialect::Gas, ".globl entry"),
        ]
        .iter()
        {
            let mut d = Disassembler::new(*dialect);
            d.init(0, 0);
            d.add_section(&bytes, 1, 1, 0, SECTION_CODE, 0, 64, "text");
            d.add_symbol(1, 0, 0, 0, crate::symbols::SCOPE_PUBLIC, 1, Some("entry"), None);
            d.go().unwrap();
            assert!(d.output().contains(marker), "{:?}:\n{}", dialect, d.output());
        }
    }

    #[test]
    fn masm_gets_proc_and_assume() {
        let bytes = [0xC3];
        let mut d = Disassembler::new(Dialect::Masm);
        d.init(0, 0);
        d.add_section(&bytes, 1, 1, 0, SECTION_CODE, 0, 64, "_text");
        d.add_symbol(1, 0, 0, 0, crate::symbols::SCOPE_PUBLIC, 1, Some("entry"), None);
        d.go().unwrap();
        let out = d.output();
        assert!(out.contains("entry PROC"), "{}", out);
        assert!(out.contains("entry ENDP"), "{}", out);
        assert!(out.contains("ASSUME"), "{}", out);
        assert!(out.contains("_text SEGMENT"), "{}", out);
        assert!(out.contains("_text ENDS"), "{}", out);
    }

    #[test]
    fn comment_column_carries_hex_bytes() {
        let out = listing(Dialect::Nasm, &[0x90, 0xC3]);
        let line = instruction_line(&out, "nop");
        assert!(line.contains("; 0000 _ 90"), "line: {}", line);
    }
}
