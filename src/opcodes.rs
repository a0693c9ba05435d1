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

//! The opcode table library.
//!
//! The x86 instruction space is described as a forest of static tables.
//! Each table entry is either terminal (its `link` is `NONE`) or a link
//! that tells the decoder how to pick an index into another table: by the
//! next code byte, by a mod/reg/rm field, by operand size, by prefix
//! class, by VEX bits and so on. Tables refer to each other by index into
//! the `TABLES` registry, never by pointer, so the whole forest is plain
//! position-independent data.
//!
//! Field encodings (kept numeric so the tables stay narrow):
//!
//! `iset` — instruction set and mode restrictions:
//!   0..8 = 8086..Pentium II generations, 0x11..0x16 = SSE..SSE4.2,
//!   0x17 = AES, 0x19 = AVX, 0x1A = FMA3, 0x1C = AVX2, 0x1D = BMI and
//!   friends, 0x20 = AVX-512, 0x100 = 8087, 0x800 = privileged (OR),
//!   0x1001 = AMD 3DNow, 0x1005 = AMD XOP,
//!   0x4000 = 64-bit mode only (OR), 0x8000 = not in 64-bit mode (OR).
//!
//! `prefixes` — which prefixes are meaningful for the opcode:
//!   1 = address size allowed without mod/reg/rm, 2 = stack operation,
//!   4 = segment prefix allowed without mod/reg/rm, 8 = branch hint/BND,
//!   0x10 = LOCK, 0x20 = REP, 0x40 = REPE/REPNE, 0x80 = jump where 66
//!   truncates EIP, 0x100 = 66 selects integer operand size, 0x200 = 66
//!   repurposed (packed/pd selection), 0x400 = F3 repurposed (ss),
//!   0x800 = F2 repurposed (sd), 0x1000 = REX.W selects operand size,
//!   0x2000 = REX.W allowed but unneeded, 0x3000 = W selects d/q vector
//!   element, 0x8000 = one of 66/F2/F3 required, 0x10000 = VEX or XOP
//!   allowed, 0x20000 = VEX/EVEX/XOP required, 0x40000 = VEX.L allowed,
//!   0x80000 = VEX.vvvv allowed, 0x100000 = VEX.L required,
//!   0x400000 = MVEX allowed, 0x800000 = EVEX allowed.
//!
//! `format` — instruction shape, low 5 bits:
//!   0 = illegal, 1 = implicit operands, 2 = no operands, 3 = register
//!   in opcode bits 0-2, 4 = VEX without mod/reg/rm, 0x10 = mod/reg/rm
//!   with no explicit operand, 0x11 = one r/m operand, 0x12 = reg dest
//!   and r/m source, 0x13 = r/m dest and reg source, 0x18 = VEX NDD,
//!   0x19 = VEX NDS, 0x1A/0x1B = swapped VEX forms, 0x1C/0x1D = four
//!   operands with register in immediate bits 4-7, 0x1E = VSIB.
//!   OR'ed immediate field bits: 0x20 = two bytes, 0x40 = one byte,
//!   0x60 = 2+1 bytes, 0x80 = 16/32-bit by operand size, 0x100 =
//!   16/32/64-bit by operand size, 0x200 = far direct pointer, 0x400 =
//!   direct memory (moffs), 0x800 = far indirect memory.
//!   0x2000 = reserved entry, 0x4000 = undocumented, 0x8000 = prefix
//!   byte, 0x8001 = segment prefix byte.
//!
//! Operand type descriptors (`dest`, `src1`..`src3`), low byte:
//!   1..4 = 8/16/32/64-bit integer, 6 = integer memory of other size,
//!   7 = 48-bit memory, 8 = 16/32-bit by 66, 9 = 16/32/64 by 66/REX.W,
//!   0x0A = 16/32/64 with 64 default in long mode, 0x0B/0x0C = near
//!   indirect jump/call pointer, 0x0D = far indirect pointer,
//!   0x11..0x13/0x18/0x19 = unsigned constants, 0x21..0x29 = signed
//!   constants, 0x31..0x39 = hexadecimal constants (width as above),
//!   0x40/0x43/0x44/0x45 = x87 float, 0x4A/0x4B/0x4C = half/single/
//!   double float, 0x4F = float form selected by 66/F2/F3, 0x50/0x51 =
//!   full vector aligned/unaligned, 0x81..0x85 = jump/call targets,
//!   0x91..0x98 = segment/control/debug/test/mask/bound registers,
//!   0xa1..0xc2 = hard-coded registers and memory operands.
//!   OR'ed size selector: 0x100 = MMX..ZMM by 66 and VEX.L/EVEX.LL,
//!   0x200 = XMM..ZMM by VEX.L/EVEX.LL, 0x300 = MMX, 0x400 = XMM,
//!   0x500 = YMM, 0x600 = ZMM, 0xF00 = half of the selected vector.
//!   OR'ed placement: 0x1000 = register only, 0x2000 = memory only.
//!
//! The decoder adds runtime placement flags above bit 16 (see
//! `decoder.rs`): where the register number comes from and which
//! immediate field part an operand uses.
//!
//! `options`: 1 = append operand-size suffix, 2 = prepend "v" when VEX
//! encoded, 4 = does not change its destination, 8 = clobbers other
//! registers, 0x10 = unconditional control transfer, 0x40 = usable as
//! NOP or filler, 0x80 = a shorter encoding exists, 0x100 = memory
//! operand must be aligned, 0x400 = name differs in 64-bit mode,
//! 0x800 = never write a size specifier, 0x1000 = append "32"/"64" by
//! EVEX.W, 0x2000 = append the condition code held in the low four bits
//! of the opcode byte.
//!
//! `evex`: low nibble = meaning of L'L/b (0 = plain length, 1 =
//! broadcast allowed, 2 = SAE allowed, 6 = rounding and SAE allowed,
//! 8 = scalar); bits 4-7 = mask use (0x10 = masking, 0x20 = masking and
//! zeroing, 0x50 = mask required, 0x80 = mask written); bits 12-15 =
//! offset multiplier rule (0 = memory operand size, 1 = element size).

/// How a non-terminal entry indexes the table it links to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkKind {
    None,
    /// Next code byte (256 entries).
    NextByte,
    /// reg field of mod/reg/rm (8).
    Reg,
    /// mod < 3 vs mod == 3 (2).
    Mod,
    /// mod < 3 / mod == 3, then reg (16).
    ModReg,
    /// rm field of mod/reg/rm (8).
    Rm,
    /// Immediate byte after all operands (256).
    TrailingImm,
    /// CPU mode 16/32/64 (3).
    Mode,
    /// Resolved operand size 16/32/64 (3).
    OperandSize,
    /// None / 66 / F2 / F3 (4).
    PrefixClass,
    /// Resolved address size 16/32/64 (3).
    AddressSize,
    /// No VEX / VEX.L=0 / VEX.L=1 / EVEX.LL=2 / EVEX.LL=3 (5).
    VexL,
    /// VEX.W or REX.W (2).
    VexW,
    /// Vector length by L bits alone (4).
    VectorSize,
    /// None / VEX / EVEX / MVEX (4).
    VexKind,
    /// MVEX.E bit (2).
    MvexE,
    /// Assembly dialect (3).
    Dialect,
    /// First code byte after the prefixes (256).
    ByteAfterPrefixes,
}

/// Link to another table in the `TABLES` registry.
#[derive(Clone, Copy, Debug)]
pub struct Lnk {
    pub kind: LinkKind,
    pub table: u16,
}

pub const NONE: Lnk = Lnk {
    kind: LinkKind::None,
    table: 0,
};

/// One opcode table entry.
#[derive(Clone, Copy, Debug)]
pub struct Op {
    pub name: &'static str,
    pub iset: u32,
    pub prefixes: u32,
    pub format: u16,
    pub dest: u32,
    pub src1: u32,
    pub src2: u32,
    pub src3: u32,
    pub evex: u16,
    pub link: Lnk,
    pub options: u16,
}

impl Op {
    pub fn is_link(&self) -> bool {
        self.link.kind != LinkKind::None
    }

    /// Terminal entry with no name decodes as an illegal opcode.
    pub fn is_illegal(&self) -> bool {
        !self.is_link() && (self.name.is_empty() || self.format & 0x1F == 0 && self.format & 0x8000 == 0)
    }

    pub fn is_prefix(&self) -> bool {
        self.format & 0x8000 != 0
    }

    pub fn has_modrm(&self) -> bool {
        self.format & 0x10 != 0 && self.format & 0x8000 == 0
    }

    pub fn shape(&self) -> u16 {
        self.format & 0x1F
    }

    pub fn imm_code(&self) -> u16 {
        self.format & 0xFE0
    }
}

/// Entry used for every undefined slot.
pub const ILL: Op = Op {
    name: "",
    iset: 0,
    prefixes: 0,
    format: 0,
    dest: 0,
    src1: 0,
    src2: 0,
    src3: 0,
    evex: 0,
    link: NONE,
    options: 0,
};

const fn pick(ops: &[u32], i: usize) -> u32 {
    if i < ops.len() {
        ops[i]
    } else {
        0
    }
}

// Terminal entry. Operand list and the optional `; options ; evex` tail
// may be omitted.
macro_rules! op {
    (@ $n:expr, $i:expr, $p:expr, $f:expr, [$($o:expr),*], $opt:expr, $evex:expr) => {{
        const OPS: &[u32] = &[$($o),*];
        Op {
            name: $n,
            iset: $i,
            prefixes: $p,
            format: $f,
            dest: pick(OPS, 0),
            src1: pick(OPS, 1),
            src2: pick(OPS, 2),
            src3: pick(OPS, 3),
            evex: $evex,
            link: NONE,
            options: $opt,
        }
    }};
    ($n:expr, $i:expr, $p:expr, $f:expr $(, $o:expr)*) => {
        op!(@ $n, $i, $p, $f, [$($o),*], 0, 0)
    };
    ($n:expr, $i:expr, $p:expr, $f:expr $(, $o:expr)* ; $opt:expr) => {
        op!(@ $n, $i, $p, $f, [$($o),*], $opt, 0)
    };
    ($n:expr, $i:expr, $p:expr, $f:expr $(, $o:expr)* ; $opt:expr ; $evex:expr) => {
        op!(@ $n, $i, $p, $f, [$($o),*], $opt, $evex)
    };
}

// Link entry. The optional format is needed when the link is resolved
// from a field that lies beyond the operands (TrailingImm).
macro_rules! lnk {
    ($k:ident, $t:expr) => {
        lnk!($k, $t, 0)
    };
    ($k:ident, $t:expr, $f:expr) => {
        Op {
            name: "",
            iset: 0,
            prefixes: 0,
            format: $f,
            dest: 0,
            src1: 0,
            src2: 0,
            src3: 0,
            evex: 0,
            link: Lnk {
                kind: LinkKind::$k,
                table: $t,
            },
            options: 0,
        }
    };
}

// Prefix byte entry (reached only when a prefix ends the section).
macro_rules! pfx {
    ($n:expr, $f:expr) => {
        op!($n, 0, 0, $f)
    };
}

// Table registry indices, in the order of the TABLES array below.
pub const T_MAP0: u16 = 0;
pub const T_0F: u16 = 1;
pub const T_0F38: u16 = 2;
pub const T_0F3A: u16 = 3;
pub const T_G1_80: u16 = 4;
pub const T_G1_81: u16 = 5;
pub const T_G1_82: u16 = 6;
pub const T_G1_83: u16 = 7;
pub const T_G1A_8F: u16 = 8;
pub const T_G2_C0: u16 = 9;
pub const T_G2_C1: u16 = 10;
pub const T_G2_D0: u16 = 11;
pub const T_G2_D1: u16 = 12;
pub const T_G2_D2: u16 = 13;
pub const T_G2_D3: u16 = 14;
pub const T_G3_F6: u16 = 15;
pub const T_G3_F7: u16 = 16;
pub const T_G4_FE: u16 = 17;
pub const T_G5_FF: u16 = 18;
pub const T_G6: u16 = 19;
pub const T_G7: u16 = 20;
pub const T_G7_R7: u16 = 21;
pub const T_G8: u16 = 22;
pub const T_G9: u16 = 23;
pub const T_G9_M1: u16 = 24;
pub const T_G11_C6: u16 = 25;
pub const T_G11_C7: u16 = 26;
pub const T_G12: u16 = 27;
pub const T_G13: u16 = 28;
pub const T_G14: u16 = 29;
pub const T_G15: u16 = 30;
pub const T_G16: u16 = 31;
pub const T_90: u16 = 32;
pub const T_63: u16 = 33;
pub const T_6D: u16 = 34;
pub const T_6F: u16 = 35;
pub const T_98: u16 = 36;
pub const T_99: u16 = 37;
pub const T_9C: u16 = 38;
pub const T_9D: u16 = 39;
pub const T_A5: u16 = 40;
pub const T_A7: u16 = 41;
pub const T_AB: u16 = 42;
pub const T_AD: u16 = 43;
pub const T_AF: u16 = 44;
pub const T_CF: u16 = 45;
pub const T_E3: u16 = 46;
pub const T_60: u16 = 47;
pub const T_61: u16 = 48;
pub const T_0F10: u16 = 49;
pub const T_0F11: u16 = 50;
pub const T_0F12: u16 = 51;
pub const T_0F13: u16 = 52;
pub const T_0F16: u16 = 53;
pub const T_0F17: u16 = 54;
pub const T_0F1E: u16 = 55;
pub const T_0F1E_F3: u16 = 56;
pub const T_ENDBR: u16 = 57;
pub const T_0F28: u16 = 58;
pub const T_0F29: u16 = 59;
pub const T_0F2A: u16 = 60;
pub const T_0F2B: u16 = 61;
pub const T_0F2C: u16 = 62;
pub const T_0F2D: u16 = 63;
pub const T_0F2E: u16 = 64;
pub const T_0F2F: u16 = 65;
pub const T_0F50: u16 = 66;
pub const T_0F5A: u16 = 67;
pub const T_0F5B: u16 = 68;
pub const T_0F6F: u16 = 69;
pub const T_0F70: u16 = 70;
pub const T_0F77: u16 = 71;
pub const T_0F7E: u16 = 72;
pub const T_0F7F: u16 = 73;
pub const T_0FB8: u16 = 74;
pub const T_0FBC: u16 = 75;
pub const T_0FBD: u16 = 76;
pub const T_0FD0: u16 = 77;
pub const T_0FD6: u16 = 78;
pub const T_0FE6: u16 = 79;
pub const T_0FE7: u16 = 80;
pub const T_0FF0: u16 = 81;
pub const T_0FF7: u16 = 82;
pub const T_D8: u16 = 83;
pub const T_D9: u16 = 84;
pub const T_DA: u16 = 85;
pub const T_DB: u16 = 86;
pub const T_DC: u16 = 87;
pub const T_DD: u16 = 88;
pub const T_DE: u16 = 89;
pub const T_DF: u16 = 90;
pub const T_D9_2: u16 = 91;
pub const T_D9_4: u16 = 92;
pub const T_D9_5: u16 = 93;
pub const T_D9_6: u16 = 94;
pub const T_D9_7: u16 = 95;
pub const T_DA_5: u16 = 96;
pub const T_DB_4: u16 = 97;
pub const T_DE_3: u16 = 98;
pub const T_DF_4: u16 = 99;
pub const T_3DNOW: u16 = 100;
pub const T_XOP8: u16 = 101;
pub const T_XOP9: u16 = 102;
pub const T_XOPA: u16 = 103;
pub const T_0F38F0: u16 = 104;
pub const T_0F38F1: u16 = 105;
pub const T_0F38F5: u16 = 106;
pub const T_0F38F6: u16 = 107;
pub const T_0F38F7: u16 = 108;
pub const T_G17: u16 = 109;
pub const T_0F3A16: u16 = 110;
pub const T_0F3A22: u16 = 111;

// ---------------------------------------------------------------------
// Map 0: one-byte opcodes.
// ---------------------------------------------------------------------

const ALU_NAMES: [&str; 8] = ["add", "or", "adc", "sbb", "and", "sub", "xor", "cmp"];
const JCC_NAMES: [&str; 16] = [
    "jo", "jno", "jb", "jae", "je", "jne", "jbe", "ja", "js", "jns", "jp", "jnp", "jl", "jge",
    "jle", "jg",
];
const CC_NAMES: [&str; 16] = [
    "o", "no", "b", "ae", "e", "ne", "be", "a", "s", "ns", "p", "np", "l", "ge", "le", "g",
];

const fn map0() -> [Op; 256] {
    let mut t = [ILL; 256];

    // The eight classic ALU families at 00..3D.
    let mut f = 0;
    while f < 8 {
        let base = f * 8;
        // cmp writes nothing, so LOCK is not allowed on it.
        let lock: u32 = if f == 7 { 0 } else { 0x10 };
        let lockv: u32 = if f == 7 { 0x1100 } else { 0x1110 };
        t[base] = op!(ALU_NAMES[f], 0, lock, 0x13, 1, 1);
        t[base + 1] = op!(ALU_NAMES[f], 0, lockv, 0x13, 9, 9);
        t[base + 2] = op!(ALU_NAMES[f], 0, 0, 0x12, 1, 1);
        t[base + 3] = op!(ALU_NAMES[f], 0, 0x1100, 0x12, 9, 9);
        t[base + 4] = op!(ALU_NAMES[f], 0, 0, 0x41, 0xa1, 0x11);
        t[base + 5] = op!(ALU_NAMES[f], 0, 0x1100, 0x81, 0xa9, 0x28);
        f += 1;
    }
    t[0x06] = op!("push es", 0x8000, 2, 2);
    t[0x07] = op!("pop es", 0x8000, 2, 2);
    t[0x0E] = op!("push cs", 0x8000, 2, 2);
    t[0x0F] = lnk!(NextByte, T_0F);
    t[0x16] = op!("push ss", 0x8000, 2, 2);
    t[0x17] = op!("pop ss", 0x8000, 2, 2);
    t[0x1E] = op!("push ds", 0x8000, 2, 2);
    t[0x1F] = op!("pop ds", 0x8000, 2, 2);
    t[0x26] = pfx!("es:", 0x8001);
    t[0x27] = op!("daa", 0x8000, 0, 2);
    t[0x2E] = pfx!("cs:", 0x8001);
    t[0x2F] = op!("das", 0x8000, 0, 2);
    t[0x36] = pfx!("ss:", 0x8001);
    t[0x37] = op!("aaa", 0x8000, 0, 2);
    t[0x3E] = pfx!("ds:", 0x8001);
    t[0x3F] = op!("aas", 0x8000, 0, 2);

    // inc/dec reg. In 64-bit mode these bytes are REX prefixes and the
    // prefix scanner consumes them before the map lookup.
    let mut r = 0;
    while r < 8 {
        t[0x40 + r] = op!("inc", 0x8000, 0x100, 3, 9);
        t[0x48 + r] = op!("dec", 0x8000, 0x100, 3, 9);
        t[0x50 + r] = op!("push", 0, 0x102, 3, 0x0A);
        t[0x58 + r] = op!("pop", 0, 0x102, 3, 0x0A);
        r += 1;
    }

    t[0x60] = lnk!(OperandSize, T_60);
    t[0x61] = lnk!(OperandSize, T_61);
    t[0x62] = op!("bound", 0x8000, 0x100, 0x12, 9, 0x2006);
    t[0x63] = lnk!(Mode, T_63);
    t[0x64] = pfx!("fs:", 0x8001);
    t[0x65] = pfx!("gs:", 0x8001);
    t[0x66] = pfx!("66", 0x8000);
    t[0x67] = pfx!("67", 0x8000);
    t[0x68] = op!("push", 1, 0x102, 0x82, 0, 0x28);
    t[0x69] = op!("imul", 1, 0x1100, 0x92, 9, 9, 0x28);
    t[0x6A] = op!("push", 1, 0x102, 0x42, 0, 0x21);
    t[0x6B] = op!("imul", 1, 0x1100, 0x52, 9, 9, 0x21);
    t[0x6C] = op!("insb", 1, 0x25, 1);
    t[0x6D] = lnk!(OperandSize, T_6D);
    t[0x6E] = op!("outsb", 1, 0x25, 1);
    t[0x6F] = lnk!(OperandSize, T_6F);

    let mut c = 0;
    while c < 16 {
        t[0x70 + c] = op!(JCC_NAMES[c], 0, 8, 0x42, 0x81);
        c += 1;
    }

    t[0x80] = lnk!(Reg, T_G1_80);
    t[0x81] = lnk!(Reg, T_G1_81);
    t[0x82] = lnk!(Reg, T_G1_82);
    t[0x83] = lnk!(Reg, T_G1_83);
    t[0x84] = op!("test", 0, 0, 0x13, 1, 1; 4);
    t[0x85] = op!("test", 0, 0x1100, 0x13, 9, 9; 4);
    t[0x86] = op!("xchg", 0, 0x10, 0x13, 1, 1);
    t[0x87] = op!("xchg", 0, 0x1110, 0x13, 9, 9);
    t[0x88] = op!("mov", 0, 0, 0x13, 1, 1);
    t[0x89] = op!("mov", 0, 0x1100, 0x13, 9, 9);
    t[0x8A] = op!("mov", 0, 0, 0x12, 1, 1);
    t[0x8B] = op!("mov", 0, 0x1100, 0x12, 9, 9);
    t[0x8C] = op!("mov", 0, 0x1100, 0x13, 9, 0x91);
    t[0x8D] = op!("lea", 0, 0x1100, 0x12, 9, 0x2006; 0x800);
    t[0x8E] = op!("mov", 0, 0, 0x12, 0x91, 2);
    t[0x8F] = lnk!(Reg, T_G1A_8F);

    t[0x90] = lnk!(PrefixClass, T_90);
    let mut x = 1;
    while x < 8 {
        t[0x90 + x] = op!("xchg", 0, 0x1100, 3, 9, 0xa9);
        x += 1;
    }
    t[0x98] = lnk!(OperandSize, T_98);
    t[0x99] = lnk!(OperandSize, T_99);
    t[0x9A] = op!("call", 0x8000, 0x100, 0x202, 0x85; 8);
    t[0x9B] = op!("fwait", 0x100, 0, 1);
    t[0x9C] = lnk!(Mode, T_9C);
    t[0x9D] = lnk!(Mode, T_9D);
    t[0x9E] = op!("sahf", 0, 0, 2);
    t[0x9F] = op!("lahf", 0, 0, 2);

    t[0xA0] = op!("mov", 0, 5, 0x401, 0xa1, 1);
    t[0xA1] = op!("mov", 0, 0x1105, 0x401, 0xa9, 9);
    t[0xA2] = op!("mov", 0, 5, 0x401, 1, 0xa1);
    t[0xA3] = op!("mov", 0, 0x1105, 0x401, 9, 0xa9);
    t[0xA4] = op!("movsb", 0, 0x25, 1);
    t[0xA5] = lnk!(OperandSize, T_A5);
    t[0xA6] = op!("cmpsb", 0, 0x45, 1);
    t[0xA7] = lnk!(OperandSize, T_A7);
    t[0xA8] = op!("test", 0, 0, 0x41, 0xa1, 0x11; 4);
    t[0xA9] = op!("test", 0, 0x1100, 0x81, 0xa9, 0x28; 4);
    t[0xAA] = op!("stosb", 0, 0x25, 1);
    t[0xAB] = lnk!(OperandSize, T_AB);
    t[0xAC] = op!("lodsb", 0, 0x25, 1);
    t[0xAD] = lnk!(OperandSize, T_AD);
    t[0xAE] = op!("scasb", 0, 0x45, 1);
    t[0xAF] = lnk!(OperandSize, T_AF);

    let mut b = 0;
    while b < 8 {
        t[0xB0 + b] = op!("mov", 0, 0, 0x43, 1, 0x31);
        t[0xB8 + b] = op!("mov", 0, 0x1100, 0x103, 9, 0x39);
        b += 1;
    }

    t[0xC0] = lnk!(Reg, T_G2_C0);
    t[0xC1] = lnk!(Reg, T_G2_C1);
    t[0xC2] = op!("ret", 0, 2, 0x22, 0, 0x12; 0x10);
    t[0xC3] = op!("ret", 0, 2, 2; 0x10);
    t[0xC4] = op!("les", 0x8000, 0x100, 0x12, 9, 0x200D);
    t[0xC5] = op!("lds", 0x8000, 0x100, 0x12, 9, 0x200D);
    t[0xC6] = lnk!(Reg, T_G11_C6);
    t[0xC7] = lnk!(Reg, T_G11_C7);
    t[0xC8] = op!("enter", 1, 2, 0x62, 0, 0x12, 0x11);
    t[0xC9] = op!("leave", 1, 2, 2);
    t[0xCA] = op!("retf", 0, 2, 0x22, 0, 0x12; 0x10);
    t[0xCB] = op!("retf", 0, 2, 2; 0x10);
    t[0xCC] = op!("int3", 0, 0, 2; 0x40);
    t[0xCD] = op!("int", 0, 0, 0x42, 0, 0x31; 8);
    t[0xCE] = op!("into", 0x8000, 0, 2);
    t[0xCF] = lnk!(OperandSize, T_CF);

    t[0xD0] = lnk!(Reg, T_G2_D0);
    t[0xD1] = lnk!(Reg, T_G2_D1);
    t[0xD2] = lnk!(Reg, T_G2_D2);
    t[0xD3] = lnk!(Reg, T_G2_D3);
    t[0xD4] = op!("aam", 0x8000, 0, 0x42, 0, 0x11);
    t[0xD5] = op!("aad", 0x8000, 0, 0x42, 0, 0x11);
    t[0xD6] = op!("salc", 0x8000, 0, 0x4002);
    t[0xD7] = op!("xlat", 0, 5, 1);
    t[0xD8] = lnk!(ModReg, T_D8);
    t[0xD9] = lnk!(ModReg, T_D9);
    t[0xDA] = lnk!(ModReg, T_DA);
    t[0xDB] = lnk!(ModReg, T_DB);
    t[0xDC] = lnk!(ModReg, T_DC);
    t[0xDD] = lnk!(ModReg, T_DD);
    t[0xDE] = lnk!(ModReg, T_DE);
    t[0xDF] = lnk!(ModReg, T_DF);

    t[0xE0] = op!("loopne", 0, 1, 0x42, 0x81);
    t[0xE1] = op!("loope", 0, 1, 0x42, 0x81);
    t[0xE2] = op!("loop", 0, 1, 0x42, 0x81);
    t[0xE3] = lnk!(AddressSize, T_E3);
    t[0xE4] = op!("in", 0, 0, 0x41, 0xa1, 0x31);
    t[0xE5] = op!("in", 0, 0x100, 0x41, 0xa8, 0x31);
    t[0xE6] = op!("out", 0, 0, 0x41, 0x31, 0xa1);
    t[0xE7] = op!("out", 0, 0x100, 0x41, 0x31, 0xa8);
    t[0xE8] = op!("call", 0, 0x88, 0x82, 0x83; 8);
    t[0xE9] = op!("jmp", 0, 0x88, 0x82, 0x82; 0x10);
    t[0xEA] = op!("jmp", 0x8000, 0x100, 0x202, 0x84; 0x10);
    t[0xEB] = op!("jmp", 0, 8, 0x42, 0x81; 0x10);
    t[0xEC] = op!("in", 0, 0, 1, 0xa1, 0xb2);
    t[0xED] = op!("in", 0, 0x100, 1, 0xa8, 0xb2);
    t[0xEE] = op!("out", 0, 0, 1, 0xb2, 0xa1);
    t[0xEF] = op!("out", 0, 0x100, 1, 0xb2, 0xa8);

    t[0xF0] = pfx!("lock", 0x8000);
    t[0xF1] = op!("icebp", 0, 0, 0x4002);
    t[0xF2] = pfx!("repne", 0x8000);
    t[0xF3] = pfx!("rep", 0x8000);
    t[0xF4] = op!("hlt", 0x800, 0, 2);
    t[0xF5] = op!("cmc", 0, 0, 2);
    t[0xF6] = lnk!(Reg, T_G3_F6);
    t[0xF7] = lnk!(Reg, T_G3_F7);
    t[0xF8] = op!("clc", 0, 0, 2);
    t[0xF9] = op!("stc", 0, 0, 2);
    t[0xFA] = op!("cli", 0x800, 0, 2);
    t[0xFB] = op!("sti", 0x800, 0, 2);
    t[0xFC] = op!("cld", 0, 0, 2);
    t[0xFD] = op!("std", 0, 0, 2);
    t[0xFE] = lnk!(Reg, T_G4_FE);
    t[0xFF] = lnk!(Reg, T_G5_FF);

    t
}

static MAP0: [Op; 256] = map0();

// ---------------------------------------------------------------------
// Map 0F: two-byte opcodes, also the VEX/EVEX mmmmm=1 page.
// ---------------------------------------------------------------------

const fn map_0f() -> [Op; 256] {
    let mut t = [ILL; 256];

    t[0x00] = lnk!(Reg, T_G6);
    t[0x01] = lnk!(ModReg, T_G7);
    t[0x02] = op!("lar", 2, 0x1100, 0x12, 9, 2);
    t[0x03] = op!("lsl", 2, 0x1100, 0x12, 9, 2);
    t[0x05] = op!("syscall", 0x4000, 0, 2; 8);
    t[0x06] = op!("clts", 0x802, 0, 2);
    t[0x07] = op!("sysret", 0x4800, 0, 2; 0x10);
    t[0x08] = op!("invd", 0x804, 0, 2);
    t[0x09] = op!("wbinvd", 0x804, 0, 2);
    t[0x0B] = op!("ud2", 6, 0, 2; 0x10);
    t[0x0D] = op!("prefetchw", 0x1002, 0, 0x11, 0x2001; 4);
    t[0x0E] = op!("femms", 0x1001, 0, 2);
    t[0x0F] = lnk!(TrailingImm, T_3DNOW, 0x52);

    t[0x10] = lnk!(PrefixClass, T_0F10);
    t[0x11] = lnk!(PrefixClass, T_0F11);
    t[0x12] = lnk!(PrefixClass, T_0F12);
    t[0x13] = lnk!(PrefixClass, T_0F13);
    t[0x14] = op!("unpckl", 0x11, 0x8D0200, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x21);
    t[0x15] = op!("unpckh", 0x11, 0x8D0200, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x21);
    t[0x16] = lnk!(PrefixClass, T_0F16);
    t[0x17] = lnk!(PrefixClass, T_0F17);
    t[0x18] = lnk!(Reg, T_G16);
    t[0x19] = op!("nop", 6, 0x1100, 0x11, 9; 0x40);
    t[0x1A] = op!("nop", 6, 0x1100, 0x11, 9; 0x40);
    t[0x1B] = op!("nop", 6, 0x1100, 0x11, 9; 0x40);
    t[0x1C] = op!("nop", 6, 0x1100, 0x11, 9; 0x40);
    t[0x1D] = op!("nop", 6, 0x1100, 0x11, 9; 0x40);
    t[0x1E] = lnk!(PrefixClass, T_0F1E);
    t[0x1F] = op!("nop", 6, 0x1100, 0x11, 9; 0x40);

    t[0x20] = op!("mov", 0x803, 0, 0x13, 0x1009, 0x92);
    t[0x21] = op!("mov", 0x803, 0, 0x13, 0x1009, 0x93);
    t[0x22] = op!("mov", 0x803, 0, 0x12, 0x92, 0x1009);
    t[0x23] = op!("mov", 0x803, 0, 0x12, 0x93, 0x1009);
    t[0x28] = lnk!(PrefixClass, T_0F28);
    t[0x29] = lnk!(PrefixClass, T_0F29);
    t[0x2A] = lnk!(PrefixClass, T_0F2A);
    t[0x2B] = lnk!(PrefixClass, T_0F2B);
    t[0x2C] = lnk!(PrefixClass, T_0F2C);
    t[0x2D] = lnk!(PrefixClass, T_0F2D);
    t[0x2E] = lnk!(PrefixClass, T_0F2E);
    t[0x2F] = lnk!(PrefixClass, T_0F2F);

    t[0x30] = op!("wrmsr", 0x805, 0, 2);
    t[0x31] = op!("rdtsc", 5, 0, 2);
    t[0x32] = op!("rdmsr", 0x805, 0, 2);
    t[0x33] = op!("rdpmc", 0x806, 0, 2);
    t[0x34] = op!("sysenter", 8, 0, 2; 8);
    t[0x35] = op!("sysexit", 0x808, 0, 2; 0x10);
    t[0x37] = op!("getsec", 0x813, 0, 2);
    t[0x38] = lnk!(NextByte, T_0F38);
    t[0x3A] = lnk!(NextByte, T_0F3A);

    let mut c = 0;
    while c < 16 {
        t[0x40 + c] = Op {
            name: "cmov",
            iset: 6,
            prefixes: 0x1100,
            format: 0x12,
            dest: 9,
            src1: 9,
            src2: 0,
            src3: 0,
            evex: 0,
            link: NONE,
            options: 0x2000, // append condition code from opcode bits 0-3
        };
        t[0x80 + c] = Op {
            name: "j",
            iset: 3,
            prefixes: 0x88,
            format: 0x82,
            dest: 0x82,
            src1: 0,
            src2: 0,
            src3: 0,
            evex: 0,
            link: NONE,
            options: 0x2000,
        };
        t[0x90 + c] = Op {
            name: "set",
            iset: 3,
            prefixes: 0,
            format: 0x11,
            dest: 1,
            src1: 0,
            src2: 0,
            src3: 0,
            evex: 0,
            link: NONE,
            options: 0x2000,
        };
        c += 1;
    }

    t[0x50] = lnk!(PrefixClass, T_0F50);
    t[0x51] = op!("sqrt", 0x11, 0x8D0E00, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x26);
    t[0x52] = op!("rsqrt", 0x11, 0x850600, 0x19, 0x24F, 0x24F, 0x24F; 3);
    t[0x53] = op!("rcp", 0x11, 0x850600, 0x19, 0x24F, 0x24F, 0x24F; 3);
    t[0x54] = op!("and", 0x11, 0x8D0200, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x21);
    t[0x55] = op!("andn", 0x11, 0x8D0200, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x21);
    t[0x56] = op!("or", 0x11, 0x8D0200, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x21);
    t[0x57] = op!("xor", 0x11, 0x8D0200, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x21);
    t[0x58] = op!("add", 0x11, 0x8D0E00, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x26);
    t[0x59] = op!("mul", 0x11, 0x8D0E00, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x26);
    t[0x5A] = lnk!(PrefixClass, T_0F5A);
    t[0x5B] = lnk!(PrefixClass, T_0F5B);
    t[0x5C] = op!("sub", 0x11, 0x8D0E00, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x26);
    t[0x5D] = op!("min", 0x11, 0x8D0E00, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x26);
    t[0x5E] = op!("div", 0x11, 0x8D0E00, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x26);
    t[0x5F] = op!("max", 0x11, 0x8D0E00, 0x19, 0x24F, 0x24F, 0x24F; 3; 0x26);

    t[0x60] = op!("punpcklbw", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0x61] = op!("punpcklwd", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0x62] = op!("punpckldq", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x63] = op!("packsswb", 7, 0x8D0200, 0x19, 0x101, 0x102, 0x102; 2; 0x20);
    t[0x64] = op!("pcmpgtb", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0x65] = op!("pcmpgtw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0x66] = op!("pcmpgtd", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x67] = op!("packuswb", 7, 0x8D0200, 0x19, 0x101, 0x102, 0x102; 2; 0x20);
    t[0x68] = op!("punpckhbw", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0x69] = op!("punpckhwd", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0x6A] = op!("punpckhdq", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x6B] = op!("packssdw", 7, 0x8D0200, 0x19, 0x102, 0x103, 0x103; 2; 0x21);
    t[0x6C] = op!("punpcklqdq", 0x12, 0x8D8200, 0x19, 0x104, 0x104, 0x104; 2; 0x21);
    t[0x6D] = op!("punpckhqdq", 0x12, 0x8D8200, 0x19, 0x104, 0x104, 0x104; 2; 0x21);
    t[0x6E] = op!("mov", 7, 0x813200, 0x12, 0x1109, 9; 3; 0x08);
    t[0x6F] = lnk!(PrefixClass, T_0F6F);
    t[0x70] = lnk!(PrefixClass, T_0F70);
    t[0x71] = lnk!(Reg, T_G12);
    t[0x72] = lnk!(Reg, T_G13);
    t[0x73] = lnk!(Reg, T_G14);
    t[0x74] = op!("pcmpeqb", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0x75] = op!("pcmpeqw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0x76] = op!("pcmpeqd", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x77] = lnk!(VexL, T_0F77);
    t[0x78] = op!("vmread", 0x80D, 0, 0x13, 0x0A, 0x0A);
    t[0x79] = op!("vmwrite", 0x80D, 0, 0x12, 0x0A, 0x0A);
    t[0x7E] = lnk!(PrefixClass, T_0F7E);
    t[0x7F] = lnk!(PrefixClass, T_0F7F);

    t[0xA0] = op!("push fs", 3, 2, 2);
    t[0xA1] = op!("pop fs", 3, 2, 2);
    t[0xA2] = op!("cpuid", 4, 0, 2; 8);
    t[0xA3] = op!("bt", 3, 0x1100, 0x13, 9, 9; 4);
    t[0xA4] = op!("shld", 3, 0x1100, 0x53, 9, 9, 0x11);
    t[0xA5] = op!("shld", 3, 0x1100, 0x13, 9, 9, 0xb3);
    t[0xA8] = op!("push gs", 3, 2, 2);
    t[0xA9] = op!("pop gs", 3, 2, 2);
    t[0xAA] = op!("rsm", 0x805, 0, 2);
    t[0xAB] = op!("bts", 3, 0x1110, 0x13, 9, 9);
    t[0xAC] = op!("shrd", 3, 0x1100, 0x53, 9, 9, 0x11);
    t[0xAD] = op!("shrd", 3, 0x1100, 0x13, 9, 9, 0xb3);
    t[0xAE] = lnk!(ModReg, T_G15);
    t[0xAF] = op!("imul", 3, 0x1100, 0x12, 9, 9);

    t[0xB0] = op!("cmpxchg", 4, 0x10, 0x13, 1, 1);
    t[0xB1] = op!("cmpxchg", 4, 0x1110, 0x13, 9, 9);
    t[0xB2] = op!("lss", 3, 0x1100, 0x12, 9, 0x200D);
    t[0xB3] = op!("btr", 3, 0x1110, 0x13, 9, 9);
    t[0xB4] = op!("lfs", 3, 0x1100, 0x12, 9, 0x200D);
    t[0xB5] = op!("lgs", 3, 0x1100, 0x12, 9, 0x200D);
    t[0xB6] = op!("movzx", 3, 0x1100, 0x12, 9, 1);
    t[0xB7] = op!("movzx", 3, 0x1100, 0x12, 9, 2);
    t[0xB8] = lnk!(PrefixClass, T_0FB8);
    t[0xB9] = op!("ud1", 6, 0x1100, 0x4012, 9, 9);
    t[0xBA] = lnk!(Reg, T_G8);
    t[0xBB] = op!("btc", 3, 0x1110, 0x13, 9, 9);
    t[0xBC] = lnk!(PrefixClass, T_0FBC);
    t[0xBD] = lnk!(PrefixClass, T_0FBD);
    t[0xBE] = op!("movsx", 3, 0x1100, 0x12, 9, 1);
    t[0xBF] = op!("movsx", 3, 0x1100, 0x12, 9, 2);

    t[0xC0] = op!("xadd", 4, 0x10, 0x13, 1, 1);
    t[0xC1] = op!("xadd", 4, 0x1110, 0x13, 9, 9);
    t[0xC2] = op!("cmp", 0x11, 0x8D0E00, 0x59, 0x24F, 0x24F, 0x24F, 0x11; 3; 0x26);
    t[0xC3] = op!("movnti", 0x12, 0x1100, 0x13, 0x2009, 9);
    t[0xC4] = op!("pinsrw", 7, 0x8D0200, 0x59, 0x102, 0x102, 2, 0x11; 2);
    t[0xC5] = op!("pextrw", 7, 0x850200, 0x52, 0x1009, 0x1102, 0x11; 2);
    t[0xC6] = op!("shuf", 0x11, 0x8D0200, 0x59, 0x24F, 0x24F, 0x24F, 0x11; 3; 0x21);
    t[0xC7] = lnk!(ModReg, T_G9);
    let mut w = 0;
    while w < 8 {
        t[0xC8 + w] = op!("bswap", 4, 0x1000, 3, 9);
        w += 1;
    }

    t[0xD0] = lnk!(PrefixClass, T_0FD0);
    t[0xD1] = op!("psrlw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x402; 2; 0x20);
    t[0xD2] = op!("psrld", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x402; 2; 0x20);
    t[0xD3] = op!("psrlq", 7, 0x8D0200, 0x19, 0x104, 0x104, 0x402; 2; 0x20);
    t[0xD4] = op!("paddq", 0x12, 0x8D0200, 0x19, 0x104, 0x104, 0x104; 2; 0x21);
    t[0xD5] = op!("pmullw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xD6] = lnk!(PrefixClass, T_0FD6);
    t[0xD7] = op!("pmovmskb", 0x11, 0x850200, 0x12, 0x1003, 0x1101; 2);
    t[0xD8] = op!("psubusb", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xD9] = op!("psubusw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xDA] = op!("pminub", 0x11, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xDB] = op!("pand", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0xDC] = op!("paddusb", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xDD] = op!("paddusw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xDE] = op!("pmaxub", 0x11, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xDF] = op!("pandn", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);

    t[0xE0] = op!("pavgb", 0x11, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xE1] = op!("psraw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x402; 2; 0x20);
    t[0xE2] = op!("psrad", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x402; 2; 0x20);
    t[0xE3] = op!("pavgw", 0x11, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xE4] = op!("pmulhuw", 0x11, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xE5] = op!("pmulhw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xE6] = lnk!(PrefixClass, T_0FE6);
    t[0xE7] = lnk!(PrefixClass, T_0FE7);
    t[0xE8] = op!("psubsb", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xE9] = op!("psubsw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xEA] = op!("pminsw", 0x11, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xEB] = op!("por", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0xEC] = op!("paddsb", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xED] = op!("paddsw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xEE] = op!("pmaxsw", 0x11, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xEF] = op!("pxor", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);

    t[0xF0] = lnk!(PrefixClass, T_0FF0);
    t[0xF1] = op!("psllw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x402; 2; 0x20);
    t[0xF2] = op!("pslld", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x402; 2; 0x20);
    t[0xF3] = op!("psllq", 7, 0x8D0200, 0x19, 0x104, 0x104, 0x402; 2; 0x20);
    t[0xF4] = op!("pmuludq", 0x12, 0x8D0200, 0x19, 0x104, 0x103, 0x103; 2; 0x21);
    t[0xF5] = op!("pmaddwd", 7, 0x8D0200, 0x19, 0x103, 0x102, 0x102; 2; 0x20);
    t[0xF6] = op!("psadbw", 0x11, 0x8D0200, 0x19, 0x102, 0x101, 0x101; 2; 0x20);
    t[0xF7] = lnk!(PrefixClass, T_0FF7);
    t[0xF8] = op!("psubb", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xF9] = op!("psubw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xFA] = op!("psubd", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0xFB] = op!("psubq", 0x12, 0x8D0200, 0x19, 0x104, 0x104, 0x104; 2; 0x21);
    t[0xFC] = op!("paddb", 7, 0x8D0200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0xFD] = op!("paddw", 7, 0x8D0200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0xFE] = op!("paddd", 7, 0x8D0200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0xFF] = op!("ud0", 6, 0x1100, 0x4012, 9, 9);

    t
}

static MAP_0F: [Op; 256] = map_0f();

// ---------------------------------------------------------------------
// Maps 0F 38 and 0F 3A: three-byte opcodes, also the VEX mmmmm=2/3 pages.
// ---------------------------------------------------------------------

const fn map_0f38() -> [Op; 256] {
    let mut t = [ILL; 256];

    t[0x00] = op!("pshufb", 0x14, 0x8D8200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0x01] = op!("phaddw", 0x14, 0x8D8200, 0x19, 0x102, 0x102, 0x102; 2);
    t[0x02] = op!("phaddd", 0x14, 0x8D8200, 0x19, 0x103, 0x103, 0x103; 2);
    t[0x03] = op!("phaddsw", 0x14, 0x8D8200, 0x19, 0x102, 0x102, 0x102; 2);
    t[0x04] = op!("pmaddubsw", 0x14, 0x8D8200, 0x19, 0x102, 0x101, 0x101; 2; 0x20);
    t[0x05] = op!("phsubw", 0x14, 0x8D8200, 0x19, 0x102, 0x102, 0x102; 2);
    t[0x06] = op!("phsubd", 0x14, 0x8D8200, 0x19, 0x103, 0x103, 0x103; 2);
    t[0x07] = op!("phsubsw", 0x14, 0x8D8200, 0x19, 0x102, 0x102, 0x102; 2);
    t[0x08] = op!("psignb", 0x14, 0x8D8200, 0x19, 0x101, 0x101, 0x101; 2);
    t[0x09] = op!("psignw", 0x14, 0x8D8200, 0x19, 0x102, 0x102, 0x102; 2);
    t[0x0A] = op!("psignd", 0x14, 0x8D8200, 0x19, 0x103, 0x103, 0x103; 2);
    t[0x0B] = op!("pmulhrsw", 0x14, 0x8D8200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0x10] = op!("pblendvb", 0x15, 0x858200, 0x12, 0x401, 0x401, 0xae);
    t[0x14] = op!("blendvps", 0x15, 0x858200, 0x12, 0x44B, 0x44B, 0xae);
    t[0x15] = op!("blendvpd", 0x15, 0x858200, 0x12, 0x44C, 0x44C, 0xae);
    t[0x17] = op!("ptest", 0x15, 0x858200, 0x12, 0x251, 0x251; 2; 0x02);
    t[0x18] = op!("vbroadcastss", 0x19, 0x878200, 0x12, 0x24B, 0x44B; 0; 0x28);
    t[0x19] = op!("vbroadcastsd", 0x19, 0x978200, 0x12, 0x24C, 0x44C; 0; 0x28);
    t[0x1C] = op!("pabsb", 0x14, 0x858200, 0x12, 0x101, 0x101; 2; 0x20);
    t[0x1D] = op!("pabsw", 0x14, 0x858200, 0x12, 0x102, 0x102; 2; 0x20);
    t[0x1E] = op!("pabsd", 0x14, 0x858200, 0x12, 0x103, 0x103; 2; 0x21);
    t[0x20] = op!("pmovsxbw", 0x15, 0x858200, 0x12, 0x102, 0xF01; 2; 0x28);
    t[0x21] = op!("pmovsxbd", 0x15, 0x858200, 0x12, 0x103, 0xF01; 2; 0x28);
    t[0x22] = op!("pmovsxbq", 0x15, 0x858200, 0x12, 0x104, 0xF01; 2; 0x28);
    t[0x23] = op!("pmovsxwd", 0x15, 0x858200, 0x12, 0x103, 0xF02; 2; 0x28);
    t[0x24] = op!("pmovsxwq", 0x15, 0x858200, 0x12, 0x104, 0xF02; 2; 0x28);
    t[0x25] = op!("pmovsxdq", 0x15, 0x858200, 0x12, 0x104, 0xF03; 2; 0x28);
    t[0x28] = op!("pmuldq", 0x15, 0x8D8200, 0x19, 0x104, 0x103, 0x103; 2; 0x21);
    t[0x29] = op!("pcmpeqq", 0x15, 0x8D8200, 0x19, 0x104, 0x104, 0x104; 2; 0x21);
    t[0x2A] = op!("movntdqa", 0x15, 0x858200, 0x12, 0x1400, 0x2450; 2; 0x20);
    t[0x2B] = op!("packusdw", 0x15, 0x8D8200, 0x19, 0x102, 0x103, 0x103; 2; 0x21);
    t[0x30] = op!("pmovzxbw", 0x15, 0x858200, 0x12, 0x102, 0xF01; 2; 0x28);
    t[0x31] = op!("pmovzxbd", 0x15, 0x858200, 0x12, 0x103, 0xF01; 2; 0x28);
    t[0x32] = op!("pmovzxbq", 0x15, 0x858200, 0x12, 0x104, 0xF01; 2; 0x28);
    t[0x33] = op!("pmovzxwd", 0x15, 0x858200, 0x12, 0x103, 0xF02; 2; 0x28);
    t[0x34] = op!("pmovzxwq", 0x15, 0x858200, 0x12, 0x104, 0xF02; 2; 0x28);
    t[0x35] = op!("pmovzxdq", 0x15, 0x858200, 0x12, 0x104, 0xF03; 2; 0x28);
    t[0x37] = op!("pcmpgtq", 0x16, 0x8D8200, 0x19, 0x104, 0x104, 0x104; 2; 0x21);
    t[0x38] = op!("pminsb", 0x15, 0x8D8200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0x39] = op!("pminsd", 0x15, 0x8D8200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x3A] = op!("pminuw", 0x15, 0x8D8200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0x3B] = op!("pminud", 0x15, 0x8D8200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x3C] = op!("pmaxsb", 0x15, 0x8D8200, 0x19, 0x101, 0x101, 0x101; 2; 0x20);
    t[0x3D] = op!("pmaxsd", 0x15, 0x8D8200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x3E] = op!("pmaxuw", 0x15, 0x8D8200, 0x19, 0x102, 0x102, 0x102; 2; 0x20);
    t[0x3F] = op!("pmaxud", 0x15, 0x8D8200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x40] = op!("pmulld", 0x15, 0x8D8200, 0x19, 0x103, 0x103, 0x103; 2; 0x21);
    t[0x41] = op!("phminposuw", 0x15, 0x858200, 0x12, 0x402, 0x402; 2);
    t[0x58] = op!("vpbroadcastd", 0x1C, 0x878200, 0x12, 0x103, 0x1403; 0; 0x28);
    t[0x59] = op!("vpbroadcastq", 0x1C, 0x878200, 0x12, 0x104, 0x1404; 0; 0x28);
    t[0xDB] = op!("aesimc", 0x17, 0x858200, 0x12, 0x400, 0x400; 2);
    t[0xDC] = op!("aesenc", 0x17, 0x8D8200, 0x19, 0x400, 0x400, 0x400; 2);
    t[0xDD] = op!("aesenclast", 0x17, 0x8D8200, 0x19, 0x400, 0x400, 0x400; 2);
    t[0xDE] = op!("aesdec", 0x17, 0x8D8200, 0x19, 0x400, 0x400, 0x400; 2);
    t[0xDF] = op!("aesdeclast", 0x17, 0x8D8200, 0x19, 0x400, 0x400, 0x400; 2);
    t[0xF0] = lnk!(PrefixClass, T_0F38F0);
    t[0xF1] = lnk!(PrefixClass, T_0F38F1);
    t[0xF2] = op!("andn", 0x1D, 0xB0000, 0x19, 9, 9, 9);
    t[0xF3] = lnk!(Reg, T_G17);
    t[0xF5] = lnk!(PrefixClass, T_0F38F5);
    t[0xF6] = lnk!(PrefixClass, T_0F38F6);
    t[0xF7] = lnk!(PrefixClass, T_0F38F7);

    t
}

static MAP_0F38: [Op; 256] = map_0f38();

const fn map_0f3a() -> [Op; 256] {
    let mut t = [ILL; 256];

    t[0x08] = op!("roundps", 0x15, 0x858200, 0x52, 0x24B, 0x24B, 0x11; 2);
    t[0x09] = op!("roundpd", 0x15, 0x858200, 0x52, 0x24C, 0x24C, 0x11; 2);
    t[0x0A] = op!("roundss", 0x15, 0x8D8200, 0x59, 0x44B, 0x44B, 0x44B, 0x11; 2);
    t[0x0B] = op!("roundsd", 0x15, 0x8D8200, 0x59, 0x44C, 0x44C, 0x44C, 0x11; 2);
    t[0x0C] = op!("blendps", 0x15, 0x8D8200, 0x59, 0x24B, 0x24B, 0x24B, 0x11; 2);
    t[0x0D] = op!("blendpd", 0x15, 0x8D8200, 0x59, 0x24C, 0x24C, 0x24C, 0x11; 2);
    t[0x0E] = op!("pblendw", 0x15, 0x8D8200, 0x59, 0x102, 0x102, 0x102, 0x11; 2);
    t[0x0F] = op!("palignr", 0x14, 0x8D8200, 0x59, 0x101, 0x101, 0x101, 0x11; 2);
    t[0x14] = op!("pextrb", 0x15, 0x858200, 0x53, 1, 0x1401, 0x11; 2);
    t[0x15] = op!("pextrw", 0x15, 0x858200, 0x53, 2, 0x1402, 0x11; 2);
    t[0x16] = lnk!(VexW, T_0F3A16);
    t[0x17] = op!("extractps", 0x15, 0x858200, 0x53, 3, 0x1404, 0x11; 2);
    t[0x18] = op!("vinsertf128", 0x19, 0x9F8200, 0x59, 0x500, 0x500, 0x400, 0x11);
    t[0x19] = op!("vextractf128", 0x19, 0x978200, 0x53, 0x400, 0x1500, 0x11);
    t[0x20] = op!("pinsrb", 0x15, 0x8D8200, 0x59, 0x401, 0x401, 1, 0x11; 2);
    t[0x21] = op!("insertps", 0x15, 0x8D8200, 0x59, 0x44B, 0x44B, 0x44B, 0x11; 2);
    t[0x22] = lnk!(VexW, T_0F3A22);
    t[0x38] = op!("vinserti128", 0x1C, 0x9F8200, 0x59, 0x500, 0x500, 0x400, 0x11);
    t[0x39] = op!("vextracti128", 0x1C, 0x978200, 0x53, 0x400, 0x1500, 0x11);
    t[0x40] = op!("dpps", 0x15, 0x8D8200, 0x59, 0x24B, 0x24B, 0x24B, 0x11; 2);
    t[0x41] = op!("dppd", 0x15, 0x8D8200, 0x59, 0x44C, 0x44C, 0x44C, 0x11; 2);
    t[0x42] = op!("mpsadbw", 0x15, 0x8D8200, 0x59, 0x101, 0x101, 0x101, 0x11; 2);
    t[0x44] = op!("pclmulqdq", 0x18, 0x8D8200, 0x59, 0x104, 0x104, 0x104, 0x11; 2);
    t[0x60] = op!("pcmpestrm", 0x16, 0x858200, 0x52, 0x401, 0x401, 0x11; 2);
    t[0x61] = op!("pcmpestri", 0x16, 0x858200, 0x52, 0x401, 0x401, 0x11; 2);
    t[0x62] = op!("pcmpistrm", 0x16, 0x858200, 0x52, 0x401, 0x401, 0x11; 2);
    t[0x63] = op!("pcmpistri", 0x16, 0x858200, 0x52, 0x401, 0x401, 0x11; 2);
    t[0xDF] = op!("aeskeygenassist", 0x17, 0x858200, 0x52, 0x400, 0x400, 0x11; 2);

    t
}

static MAP_0F3A: [Op; 256] = map_0f3a();

// 3DNow: the operation is selected by the immediate byte that trails the
// mod/reg/rm operand. Entries not defined here decode as illegal but
// still consume the right number of bytes.
const fn map_3dnow() -> [Op; 256] {
    const UNDEF: Op = op!("", 0x1001, 0, 0x4052, 0x300, 0x300);
    let mut t = [UNDEF; 256];
    t[0x0D] = op!("pi2fd", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0x1D] = op!("pf2id", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0x90] = op!("pfcmpge", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0x94] = op!("pfmin", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0x96] = op!("pfrcp", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0x9A] = op!("pfsub", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0x9E] = op!("pfadd", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0xA0] = op!("pfcmpgt", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0xA4] = op!("pfmax", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0xAA] = op!("pfsubr", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0xAE] = op!("pfacc", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0xB4] = op!("pfmul", 0x1001, 0, 0x52, 0x300, 0x300);
    t[0xB7] = op!("pmulhrw", 0x1002, 0, 0x52, 0x300, 0x300);
    t
}

static MAP_3DNOW: [Op; 256] = map_3dnow();

// The retired AMD XOP maps. Instruction lengths stay plausible through
// the default formats; the names are not enumerated.
const fn map_xop(format: u16) -> [Op; 256] {
    let undef = Op {
        name: "",
        iset: 0x1005,
        prefixes: 0x20000,
        format,
        dest: 0,
        src1: 0,
        src2: 0,
        src3: 0,
        evex: 0,
        link: NONE,
        options: 0,
    };
    [undef; 256]
}

static MAP_XOP8: [Op; 256] = map_xop(0x4052);
static MAP_XOP9: [Op; 256] = map_xop(0x4012);
static MAP_XOPA: [Op; 256] = map_xop(0x4092);

// ---------------------------------------------------------------------
// Group tables.
// ---------------------------------------------------------------------

static G1_80: [Op; 8] = [
    op!("add", 0, 0x10, 0x51, 1, 0x11),
    op!("or", 0, 0x10, 0x51, 1, 0x11),
    op!("adc", 0, 0x10, 0x51, 1, 0x11),
    op!("sbb", 0, 0x10, 0x51, 1, 0x11),
    op!("and", 0, 0x10, 0x51, 1, 0x11),
    op!("sub", 0, 0x10, 0x51, 1, 0x11),
    op!("xor", 0, 0x10, 0x51, 1, 0x11),
    op!("cmp", 0, 0, 0x51, 1, 0x11),
];

static G1_81: [Op; 8] = [
    op!("add", 0, 0x1110, 0x91, 9, 0x28),
    op!("or", 0, 0x1110, 0x91, 9, 0x28),
    op!("adc", 0, 0x1110, 0x91, 9, 0x28),
    op!("sbb", 0, 0x1110, 0x91, 9, 0x28),
    op!("and", 0, 0x1110, 0x91, 9, 0x28),
    op!("sub", 0, 0x1110, 0x91, 9, 0x28),
    op!("xor", 0, 0x1110, 0x91, 9, 0x28),
    op!("cmp", 0, 0x1100, 0x91, 9, 0x28),
];

// Byte 82 is an alias of 80 that the long mode dropped.
static G1_82: [Op; 8] = [
    op!("add", 0x8000, 0x10, 0x4051, 1, 0x11),
    op!("or", 0x8000, 0x10, 0x4051, 1, 0x11),
    op!("adc", 0x8000, 0x10, 0x4051, 1, 0x11),
    op!("sbb", 0x8000, 0x10, 0x4051, 1, 0x11),
    op!("and", 0x8000, 0x10, 0x4051, 1, 0x11),
    op!("sub", 0x8000, 0x10, 0x4051, 1, 0x11),
    op!("xor", 0x8000, 0x10, 0x4051, 1, 0x11),
    op!("cmp", 0x8000, 0, 0x4051, 1, 0x11),
];

static G1_83: [Op; 8] = [
    op!("add", 0, 0x1110, 0x51, 9, 0x21),
    op!("or", 0, 0x1110, 0x51, 9, 0x21),
    op!("adc", 0, 0x1110, 0x51, 9, 0x21),
    op!("sbb", 0, 0x1110, 0x51, 9, 0x21),
    op!("and", 0, 0x1110, 0x51, 9, 0x21),
    op!("sub", 0, 0x1110, 0x51, 9, 0x21),
    op!("xor", 0, 0x1110, 0x51, 9, 0x21),
    op!("cmp", 0, 0x1100, 0x51, 9, 0x21),
];

static G1A_8F: [Op; 8] = [
    op!("pop", 0, 0x102, 0x11, 0x0A),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

const SHIFT_NAMES: [&str; 8] = ["rol", "ror", "rcl", "rcr", "shl", "shr", "sal", "sar"];

const fn shift_group(format: u16, dest: u32, src: u32, prefixes: u32) -> [Op; 8] {
    let mut t = [ILL; 8];
    let mut i = 0;
    while i < 8 {
        t[i] = Op {
            name: SHIFT_NAMES[i],
            iset: 1,
            prefixes,
            format,
            dest,
            src1: src,
            src2: 0,
            src3: 0,
            evex: 0,
            link: NONE,
            options: 0,
        };
        i += 1;
    }
    t
}

static G2_C0: [Op; 8] = shift_group(0x51, 1, 0x11, 0);
static G2_C1: [Op; 8] = shift_group(0x51, 9, 0x11, 0x1100);
static G2_D0: [Op; 8] = shift_group(0x11, 1, 0xb1, 0);
static G2_D1: [Op; 8] = shift_group(0x11, 9, 0xb1, 0x1100);
static G2_D2: [Op; 8] = shift_group(0x11, 1, 0xb3, 0);
static G2_D3: [Op; 8] = shift_group(0x11, 9, 0xb3, 0x1100);

static G3_F6: [Op; 8] = [
    op!("test", 0, 0, 0x51, 1, 0x11; 4),
    op!("test", 0, 0, 0x4051, 1, 0x11; 4),
    op!("not", 0, 0x10, 0x11, 1),
    op!("neg", 0, 0x10, 0x11, 1),
    op!("mul", 0, 0, 0x11, 1; 8),
    op!("imul", 0, 0, 0x11, 1; 8),
    op!("div", 0, 0, 0x11, 1; 8),
    op!("idiv", 0, 0, 0x11, 1; 8),
];

static G3_F7: [Op; 8] = [
    op!("test", 0, 0x1100, 0x91, 9, 0x28; 4),
    op!("test", 0, 0x1100, 0x4091, 9, 0x28; 4),
    op!("not", 0, 0x1110, 0x11, 9),
    op!("neg", 0, 0x1110, 0x11, 9),
    op!("mul", 0, 0x1100, 0x11, 9; 8),
    op!("imul", 0, 0x1100, 0x11, 9; 8),
    op!("div", 0, 0x1100, 0x11, 9; 8),
    op!("idiv", 0, 0x1100, 0x11, 9; 8),
];

static G4_FE: [Op; 8] = [
    op!("inc", 0, 0x10, 0x11, 1),
    op!("dec", 0, 0x10, 0x11, 1),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

static G5_FF: [Op; 8] = [
    op!("inc", 0, 0x1110, 0x11, 9),
    op!("dec", 0, 0x1110, 0x11, 9),
    op!("call", 0, 2, 0x11, 0x0C; 8),
    op!("call", 0, 0x100, 0x811, 0x200D; 8),
    op!("jmp", 0, 0, 0x11, 0x0B; 0x10),
    op!("jmp", 0, 0x100, 0x811, 0x200D; 0x10),
    op!("push", 0, 0x102, 0x11, 0x0A),
    ILL,
];

static G6: [Op; 8] = [
    op!("sldt", 0x802, 0x100, 0x11, 2),
    op!("str", 0x802, 0x100, 0x11, 2),
    op!("lldt", 0x802, 0, 0x11, 2),
    op!("ltr", 0x802, 0, 0x11, 2),
    op!("verr", 0x802, 0, 0x11, 2),
    op!("verw", 0x802, 0, 0x11, 2),
    ILL,
    ILL,
];

static G7: [Op; 16] = [
    // memory forms
    op!("sgdt", 0x802, 0, 0x11, 0x2007),
    op!("sidt", 0x802, 0, 0x11, 0x2007),
    op!("lgdt", 0x802, 0, 0x11, 0x2007),
    op!("lidt", 0x802, 0, 0x11, 0x2007),
    op!("smsw", 2, 0x100, 0x11, 2),
    ILL,
    op!("lmsw", 0x802, 0, 0x11, 2),
    op!("invlpg", 0x804, 0, 0x11, 0x2001),
    // register forms
    ILL,
    ILL,
    ILL,
    ILL,
    op!("smsw", 2, 0x100, 0x11, 2),
    ILL,
    op!("lmsw", 0x802, 0, 0x11, 2),
    lnk!(Rm, T_G7_R7),
];

static G7_R7: [Op; 8] = [
    op!("swapgs", 0x4800, 0, 0x10),
    op!("rdtscp", 0x16, 0, 0x10),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

static G8: [Op; 8] = [
    ILL,
    ILL,
    ILL,
    ILL,
    op!("bt", 3, 0x1100, 0x51, 9, 0x11; 4),
    op!("bts", 3, 0x1110, 0x51, 9, 0x11),
    op!("btr", 3, 0x1110, 0x51, 9, 0x11),
    op!("btc", 3, 0x1110, 0x51, 9, 0x11),
];

static G9: [Op; 16] = [
    // memory forms
    ILL,
    lnk!(VexW, T_G9_M1),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    // register forms
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    op!("rdrand", 0x1D, 0x1100, 0x11, 0x1009),
    op!("rdseed", 0x1D, 0x1100, 0x11, 0x1009),
];

static G9_M1: [Op; 2] = [
    op!("cmpxchg8b", 5, 0x10, 0x11, 0x2004),
    op!("cmpxchg16b", 0x4010, 0x10, 0x11, 0x2006),
];

static G11_C6: [Op; 8] = [
    op!("mov", 0, 0, 0x51, 1, 0x11),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

static G11_C7: [Op; 8] = [
    op!("mov", 0, 0x1100, 0x91, 9, 0x38),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

static G12: [Op; 8] = [
    ILL,
    ILL,
    op!("psrlw", 7, 0x8D8200, 0x58, 0x1102, 0x1102, 0x11; 2),
    ILL,
    op!("psraw", 7, 0x8D8200, 0x58, 0x1102, 0x1102, 0x11; 2),
    ILL,
    op!("psllw", 7, 0x8D8200, 0x58, 0x1102, 0x1102, 0x11; 2),
    ILL,
];

static G13: [Op; 8] = [
    ILL,
    ILL,
    op!("psrld", 7, 0x8D8200, 0x58, 0x1103, 0x1103, 0x11; 2),
    ILL,
    op!("psrad", 7, 0x8D8200, 0x58, 0x1103, 0x1103, 0x11; 2),
    ILL,
    op!("pslld", 7, 0x8D8200, 0x58, 0x1103, 0x1103, 0x11; 2),
    ILL,
];

static G14: [Op; 8] = [
    ILL,
    ILL,
    op!("psrlq", 7, 0x8D8200, 0x58, 0x1104, 0x1104, 0x11; 2),
    op!("psrldq", 0x12, 0x8D8200, 0x58, 0x1401, 0x1401, 0x11; 2),
    ILL,
    ILL,
    op!("psllq", 7, 0x8D8200, 0x58, 0x1104, 0x1104, 0x11; 2),
    op!("pslldq", 0x12, 0x8D8200, 0x58, 0x1401, 0x1401, 0x11; 2),
];

static G15: [Op; 16] = [
    // memory forms
    op!("fxsave", 8, 0, 0x11, 0x2006),
    op!("fxrstor", 8, 0, 0x11, 0x2006),
    op!("ldmxcsr", 0x11, 0x850000, 0x11, 0x2003; 2),
    op!("stmxcsr", 0x11, 0x850000, 0x11, 0x2003; 2),
    op!("xsave", 0x1D, 0, 0x11, 0x2006),
    op!("xrstor", 0x1D, 0, 0x11, 0x2006),
    op!("xsaveopt", 0x1D, 0, 0x11, 0x2006),
    op!("clflush", 0x12, 0, 0x11, 0x2001),
    // register forms
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    op!("lfence", 0x12, 0, 0x10),
    op!("mfence", 0x12, 0, 0x10),
    op!("sfence", 0x11, 0, 0x10),
];

static G16: [Op; 8] = [
    op!("prefetchnta", 0x11, 0, 0x11, 0x2001; 4),
    op!("prefetcht0", 0x11, 0, 0x11, 0x2001; 4),
    op!("prefetcht1", 0x11, 0, 0x11, 0x2001; 4),
    op!("prefetcht2", 0x11, 0, 0x11, 0x2001; 4),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
];

static G17: [Op; 8] = [
    ILL,
    op!("blsr", 0x1D, 0xB0000, 0x18, 9, 9),
    op!("blsmsk", 0x1D, 0xB0000, 0x18, 9, 9),
    op!("blsi", 0x1D, 0xB0000, 0x18, 9, 9),
    ILL,
    ILL,
    ILL,
    ILL,
];

// ---------------------------------------------------------------------
// Small dispatch tables for prefix class, mode, operand and address size.
// ---------------------------------------------------------------------

static TBL_90: [Op; 4] = [
    op!("nop", 0, 0, 2; 0x40),
    op!("nop", 0, 0, 2; 0x40),
    ILL,
    op!("pause", 8, 0, 2),
];

static TBL_63: [Op; 3] = [
    op!("arpl", 0x8002, 0, 0x13, 2, 2),
    op!("arpl", 0x8002, 0, 0x13, 2, 2),
    op!("movsxd", 0x4000, 0x1100, 0x12, 9, 3),
];

static TBL_6D: [Op; 3] = [
    op!("insw", 1, 0x25, 1),
    op!("insd", 3, 0x25, 1),
    op!("insd", 3, 0x25, 1),
];

static TBL_6F: [Op; 3] = [
    op!("outsw", 1, 0x25, 1),
    op!("outsd", 3, 0x25, 1),
    op!("outsd", 3, 0x25, 1),
];

static TBL_98: [Op; 3] = [
    op!("cbw", 0, 0x1100, 2),
    op!("cwde", 3, 0x1100, 2),
    op!("cdqe", 0x4000, 0x1100, 2),
];

static TBL_99: [Op; 3] = [
    op!("cwd", 0, 0x1100, 2),
    op!("cdq", 3, 0x1100, 2),
    op!("cqo", 0x4000, 0x1100, 2),
];

static TBL_9C: [Op; 3] = [
    op!("pushf", 0, 0x102, 2),
    op!("pushfd", 3, 0x102, 2),
    op!("pushfq", 0x4000, 0x102, 2),
];

static TBL_9D: [Op; 3] = [
    op!("popf", 0, 0x102, 2),
    op!("popfd", 3, 0x102, 2),
    op!("popfq", 0x4000, 0x102, 2),
];

static TBL_A5: [Op; 3] = [
    op!("movsw", 0, 0x1125, 1),
    op!("movsd", 3, 0x1125, 1),
    op!("movsq", 0x4000, 0x1125, 1),
];

static TBL_A7: [Op; 3] = [
    op!("cmpsw", 0, 0x1145, 1),
    op!("cmpsd", 3, 0x1145, 1),
    op!("cmpsq", 0x4000, 0x1145, 1),
];

static TBL_AB: [Op; 3] = [
    op!("stosw", 0, 0x1125, 1),
    op!("stosd", 3, 0x1125, 1),
    op!("stosq", 0x4000, 0x1125, 1),
];

static TBL_AD: [Op; 3] = [
    op!("lodsw", 0, 0x1125, 1),
    op!("lodsd", 3, 0x1125, 1),
    op!("lodsq", 0x4000, 0x1125, 1),
];

static TBL_AF: [Op; 3] = [
    op!("scasw", 0, 0x1145, 1),
    op!("scasd", 3, 0x1145, 1),
    op!("scasq", 0x4000, 0x1145, 1),
];

static TBL_CF: [Op; 3] = [
    op!("iret", 0, 0x1100, 2; 0x10),
    op!("iretd", 3, 0x1100, 2; 0x10),
    op!("iretq", 0x4000, 0x1100, 2; 0x10),
];

static TBL_E3: [Op; 3] = [
    op!("jcxz", 0, 1, 0x42, 0x81),
    op!("jecxz", 3, 1, 0x42, 0x81),
    op!("jrcxz", 0x4000, 1, 0x42, 0x81),
];

static TBL_60: [Op; 3] = [
    op!("pusha", 0x8001, 0x102, 2),
    op!("pushad", 0x8003, 0x102, 2),
    ILL,
];

static TBL_61: [Op; 3] = [
    op!("popa", 0x8001, 0x102, 2),
    op!("popad", 0x8003, 0x102, 2),
    ILL,
];

// ---------------------------------------------------------------------
// SSE tables selected by the repurposed 66/F2/F3 prefix.
// ---------------------------------------------------------------------

static TBL_0F10: [Op; 4] = [
    op!("movups", 0x11, 0x850000, 0x12, 0x251, 0x251; 2; 0x20),
    op!("movupd", 0x12, 0x850200, 0x12, 0x251, 0x251; 2; 0x20),
    op!("movsd", 0x12, 0x850800, 0x12, 0x44C, 0x44C; 2; 0x28),
    op!("movss", 0x11, 0x850400, 0x12, 0x44B, 0x44B; 2; 0x28),
];

static TBL_0F11: [Op; 4] = [
    op!("movups", 0x11, 0x850000, 0x13, 0x251, 0x251; 2; 0x20),
    op!("movupd", 0x12, 0x850200, 0x13, 0x251, 0x251; 2; 0x20),
    op!("movsd", 0x12, 0x850800, 0x13, 0x44C, 0x44C; 2; 0x28),
    op!("movss", 0x11, 0x850400, 0x13, 0x44B, 0x44B; 2; 0x28),
];

static TBL_0F12: [Op; 4] = [
    op!("movlps", 0x11, 0x8D0000, 0x19, 0x400, 0x400, 0x2044; 2; 0x28),
    op!("movlpd", 0x12, 0x8D0200, 0x19, 0x400, 0x400, 0x2044; 2; 0x28),
    op!("movddup", 0x13, 0x850800, 0x12, 0x24C, 0x44C; 2; 0x28),
    op!("movsldup", 0x13, 0x850400, 0x12, 0x24B, 0x24B; 2; 0x20),
];

static TBL_0F13: [Op; 4] = [
    op!("movlps", 0x11, 0x850000, 0x13, 0x2044, 0x400; 2; 0x28),
    op!("movlpd", 0x12, 0x850200, 0x13, 0x2044, 0x400; 2; 0x28),
    ILL,
    ILL,
];

static TBL_0F16: [Op; 4] = [
    op!("movhps", 0x11, 0x8D0000, 0x19, 0x400, 0x400, 0x2044; 2; 0x28),
    op!("movhpd", 0x12, 0x8D0200, 0x19, 0x400, 0x400, 0x2044; 2; 0x28),
    ILL,
    op!("movshdup", 0x13, 0x850400, 0x12, 0x24B, 0x24B; 2; 0x20),
];

static TBL_0F17: [Op; 4] = [
    op!("movhps", 0x11, 0x850000, 0x13, 0x2044, 0x400; 2; 0x28),
    op!("movhpd", 0x12, 0x850200, 0x13, 0x2044, 0x400; 2; 0x28),
    ILL,
    ILL,
];

static TBL_0F1E: [Op; 4] = [
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    lnk!(ModReg, T_0F1E_F3),
];

static TBL_0F1E_F3: [Op; 16] = [
    // memory forms
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    // register forms
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    op!("nop", 6, 0x1100, 0x11, 9; 0x40),
    lnk!(Rm, T_ENDBR),
];

static TBL_ENDBR: [Op; 8] = [
    ILL,
    ILL,
    op!("endbr64", 0x1D, 0, 0x10),
    op!("endbr32", 0x1D, 0, 0x10),
    ILL,
    ILL,
    ILL,
    ILL,
];

static TBL_0F28: [Op; 4] = [
    op!("movaps", 0x11, 0x850000, 0x12, 0x250, 0x250; 2 | 0x100; 0x20),
    op!("movapd", 0x12, 0x850200, 0x12, 0x250, 0x250; 2 | 0x100; 0x20),
    ILL,
    ILL,
];

static TBL_0F29: [Op; 4] = [
    op!("movaps", 0x11, 0x850000, 0x13, 0x250, 0x250; 2 | 0x100; 0x20),
    op!("movapd", 0x12, 0x850200, 0x13, 0x250, 0x250; 2 | 0x100; 0x20),
    ILL,
    ILL,
];

static TBL_0F2A: [Op; 4] = [
    op!("cvtpi2ps", 0x11, 0, 0x12, 0x44B, 0x303),
    op!("cvtpi2pd", 0x12, 0x200, 0x12, 0x44C, 0x303),
    op!("cvtsi2sd", 0x12, 0x891800, 0x19, 0x44C, 0x44C, 9; 2; 0x2E),
    op!("cvtsi2ss", 0x11, 0x891400, 0x19, 0x44B, 0x44B, 9; 2; 0x2E),
];

static TBL_0F2B: [Op; 4] = [
    op!("movntps", 0x11, 0x850000, 0x13, 0x2250, 0x250; 2 | 0x100; 0x20),
    op!("movntpd", 0x12, 0x850200, 0x13, 0x2250, 0x250; 2 | 0x100; 0x20),
    ILL,
    ILL,
];

static TBL_0F2C: [Op; 4] = [
    op!("cvttps2pi", 0x11, 0, 0x12, 0x303, 0x44B),
    op!("cvttpd2pi", 0x12, 0x200, 0x12, 0x303, 0x400),
    op!("cvttsd2si", 0x12, 0x851800, 0x12, 0x1009, 0x44C; 2; 0x2E),
    op!("cvttss2si", 0x11, 0x851400, 0x12, 0x1009, 0x44B; 2; 0x2E),
];

static TBL_0F2D: [Op; 4] = [
    op!("cvtps2pi", 0x11, 0, 0x12, 0x303, 0x44B),
    op!("cvtpd2pi", 0x12, 0x200, 0x12, 0x303, 0x400),
    op!("cvtsd2si", 0x12, 0x851800, 0x12, 0x1009, 0x44C; 2; 0x2E),
    op!("cvtss2si", 0x11, 0x851400, 0x12, 0x1009, 0x44B; 2; 0x2E),
];

static TBL_0F2E: [Op; 4] = [
    op!("ucomiss", 0x11, 0x850000, 0x12, 0x44B, 0x44B; 2; 0x0A),
    op!("ucomisd", 0x12, 0x850200, 0x12, 0x44C, 0x44C; 2; 0x0A),
    ILL,
    ILL,
];

static TBL_0F2F: [Op; 4] = [
    op!("comiss", 0x11, 0x850000, 0x12, 0x44B, 0x44B; 2; 0x0A),
    op!("comisd", 0x12, 0x850200, 0x12, 0x44C, 0x44C; 2; 0x0A),
    ILL,
    ILL,
];

static TBL_0F50: [Op; 4] = [
    op!("movmskps", 0x11, 0x850000, 0x12, 0x1003, 0x1251; 2),
    op!("movmskpd", 0x12, 0x850200, 0x12, 0x1003, 0x1251; 2),
    ILL,
    ILL,
];

static TBL_0F5A: [Op; 4] = [
    op!("cvtps2pd", 0x12, 0x850000, 0x12, 0x24C, 0xF4B; 2; 0x21),
    op!("cvtpd2ps", 0x12, 0x850200, 0x12, 0xF4B, 0x24C; 2; 0x21),
    op!("cvtsd2ss", 0x12, 0x8D0800, 0x19, 0x44B, 0x44B, 0x44C; 2; 0x2E),
    op!("cvtss2sd", 0x12, 0x8D0400, 0x19, 0x44C, 0x44C, 0x44B; 2; 0x2E),
];

static TBL_0F5B: [Op; 4] = [
    op!("cvtdq2ps", 0x12, 0x850000, 0x12, 0x24B, 0x203; 2; 0x21),
    op!("cvtps2dq", 0x12, 0x850200, 0x12, 0x203, 0x24B; 2; 0x21),
    ILL,
    op!("cvttps2dq", 0x12, 0x850400, 0x12, 0x203, 0x24B; 2; 0x21),
];

static TBL_0F6F: [Op; 4] = [
    op!("movq", 7, 0, 0x12, 0x303, 0x303),
    op!("movdqa", 0x12, 0x850200, 0x12, 0x250, 0x250; 2 | 0x100 | 0x1000; 0x20),
    ILL,
    op!("movdqu", 0x12, 0x850400, 0x12, 0x251, 0x251; 2 | 0x1000; 0x20),
];

static TBL_0F70: [Op; 4] = [
    op!("pshufw", 7, 0, 0x52, 0x1302, 0x302, 0x11),
    op!("pshufd", 0x12, 0x850200, 0x52, 0x1203, 0x203, 0x11; 2; 0x21),
    op!("pshuflw", 0x12, 0x850800, 0x52, 0x1202, 0x202, 0x11; 2; 0x20),
    op!("pshufhw", 0x12, 0x850400, 0x52, 0x1202, 0x202, 0x11; 2; 0x20),
];

static TBL_0F77: [Op; 5] = [
    op!("emms", 7, 0, 2),
    op!("vzeroupper", 0x19, 0x30000, 2),
    op!("vzeroall", 0x19, 0x130000, 2),
    ILL,
    ILL,
];

static TBL_0F7E: [Op; 4] = [
    op!("mov", 7, 0x813200, 0x13, 9, 0x1109; 3; 0x08),
    op!("mov", 0x12, 0x813200, 0x13, 9, 0x1109; 3; 0x08),
    ILL,
    op!("movq", 0x12, 0x850400, 0x12, 0x1404, 0x404; 2; 0x28),
];

static TBL_0F7F: [Op; 4] = [
    op!("movq", 7, 0, 0x13, 0x303, 0x303),
    op!("movdqa", 0x12, 0x850200, 0x13, 0x250, 0x250; 2 | 0x100 | 0x1000; 0x20),
    ILL,
    op!("movdqu", 0x12, 0x850400, 0x13, 0x251, 0x251; 2 | 0x1000; 0x20),
];

static TBL_0FB8: [Op; 4] = [
    ILL,
    ILL,
    ILL,
    op!("popcnt", 0x16, 0x1100, 0x12, 9, 9),
];

static TBL_0FBC: [Op; 4] = [
    op!("bsf", 3, 0x1100, 0x12, 9, 9),
    op!("bsf", 3, 0x1100, 0x12, 9, 9),
    ILL,
    op!("tzcnt", 0x1D, 0x1100, 0x12, 9, 9),
];

static TBL_0FBD: [Op; 4] = [
    op!("bsr", 3, 0x1100, 0x12, 9, 9),
    op!("bsr", 3, 0x1100, 0x12, 9, 9),
    ILL,
    op!("lzcnt", 0x1D, 0x1100, 0x12, 9, 9),
];

static TBL_0FD0: [Op; 4] = [
    ILL,
    op!("addsubpd", 0x13, 0x8D0200, 0x19, 0x24C, 0x24C, 0x24C; 2),
    op!("addsubps", 0x13, 0x8D0800, 0x19, 0x24B, 0x24B, 0x24B; 2),
    ILL,
];

static TBL_0FD6: [Op; 4] = [
    ILL,
    op!("movq", 0x12, 0x850200, 0x13, 0x404, 0x1404; 2; 0x28),
    op!("movdq2q", 0x12, 0x800, 0x12, 0x303, 0x1404),
    op!("movq2dq", 0x12, 0x400, 0x12, 0x1404, 0x303),
];

static TBL_0FE6: [Op; 4] = [
    ILL,
    op!("cvttpd2dq", 0x12, 0x850200, 0x12, 0xF03, 0x24C; 2; 0x21),
    op!("cvtpd2dq", 0x12, 0x850800, 0x12, 0xF03, 0x24C; 2; 0x21),
    op!("cvtdq2pd", 0x12, 0x850400, 0x12, 0x24C, 0xF03; 2; 0x21),
];

static TBL_0FE7: [Op; 4] = [
    op!("movntq", 0x11, 0, 0x13, 0x2303, 0x303),
    op!("movntdq", 0x12, 0x850200, 0x13, 0x2250, 0x250; 2 | 0x100; 0x20),
    ILL,
    ILL,
];

static TBL_0FF0: [Op; 4] = [
    ILL,
    ILL,
    op!("lddqu", 0x13, 0x850800, 0x12, 0x251, 0x2251; 2),
    ILL,
];

static TBL_0FF7: [Op; 4] = [
    op!("maskmovq", 0x11, 0, 0x12, 0x1303, 0x1303),
    op!("maskmovdqu", 0x12, 0x850200, 0x12, 0x1401, 0x1401; 2),
    ILL,
    ILL,
];

static TBL_0F38F0: [Op; 4] = [
    op!("movbe", 0x1D, 0x1100, 0x12, 9, 0x2009),
    op!("movbe", 0x1D, 0x1100, 0x12, 2, 0x2002),
    op!("crc32", 0x16, 0x1100, 0x12, 3, 1),
    ILL,
];

static TBL_0F38F1: [Op; 4] = [
    op!("movbe", 0x1D, 0x1100, 0x13, 0x2009, 9),
    op!("movbe", 0x1D, 0x1100, 0x13, 0x2002, 2),
    op!("crc32", 0x16, 0x1100, 0x12, 3, 9),
    ILL,
];

static TBL_0F38F5: [Op; 4] = [
    op!("bzhi", 0x1D, 0xB1000, 0x1A, 9, 9, 9),
    ILL,
    op!("pdep", 0x1D, 0xB1000, 0x19, 9, 9, 9),
    op!("pext", 0x1D, 0xB1000, 0x19, 9, 9, 9),
];

static TBL_0F38F6: [Op; 4] = [
    ILL,
    op!("adcx", 0x1D, 0x1100, 0x12, 9, 9),
    op!("mulx", 0x1D, 0xB1000, 0x19, 9, 9, 9),
    op!("adox", 0x1D, 0x1100, 0x12, 9, 9),
];

static TBL_0F38F7: [Op; 4] = [
    op!("bextr", 0x1D, 0xB1000, 0x1A, 9, 9, 9),
    op!("shlx", 0x1D, 0xB1000, 0x1A, 9, 9, 9),
    op!("shrx", 0x1D, 0xB1000, 0x1A, 9, 9, 9),
    op!("sarx", 0x1D, 0xB1000, 0x1A, 9, 9, 9),
];

static TBL_0F3A16: [Op; 2] = [
    op!("pextrd", 0x15, 0x858200, 0x53, 3, 0x1403, 0x11; 2),
    op!("pextrq", 0x4015, 0x858200, 0x53, 4, 0x1404, 0x11; 2),
];

static TBL_0F3A22: [Op; 2] = [
    op!("pinsrd", 0x15, 0x8D8200, 0x59, 0x403, 0x403, 3, 0x11; 2),
    op!("pinsrq", 0x4015, 0x8D8200, 0x59, 0x404, 0x404, 4, 0x11; 2),
];

// ---------------------------------------------------------------------
// x87 tables. Each escape byte D8..DF dispatches on mod and reg; a few
// register rows dispatch once more on rm.
// ---------------------------------------------------------------------

static FPU_D8: [Op; 16] = [
    op!("fadd", 0x100, 0, 0x11, 0x2043),
    op!("fmul", 0x100, 0, 0x11, 0x2043),
    op!("fcom", 0x100, 0, 0x11, 0x2043; 4),
    op!("fcomp", 0x100, 0, 0x11, 0x2043; 4),
    op!("fsub", 0x100, 0, 0x11, 0x2043),
    op!("fsubr", 0x100, 0, 0x11, 0x2043),
    op!("fdiv", 0x100, 0, 0x11, 0x2043),
    op!("fdivr", 0x100, 0, 0x11, 0x2043),
    op!("fadd", 0x100, 0, 0x11, 0xaf, 0x1040),
    op!("fmul", 0x100, 0, 0x11, 0xaf, 0x1040),
    op!("fcom", 0x100, 0, 0x11, 0x1040; 4),
    op!("fcomp", 0x100, 0, 0x11, 0x1040; 4),
    op!("fsub", 0x100, 0, 0x11, 0xaf, 0x1040),
    op!("fsubr", 0x100, 0, 0x11, 0xaf, 0x1040),
    op!("fdiv", 0x100, 0, 0x11, 0xaf, 0x1040),
    op!("fdivr", 0x100, 0, 0x11, 0xaf, 0x1040),
];

static FPU_D9: [Op; 16] = [
    op!("fld", 0x100, 0, 0x11, 0x2043),
    ILL,
    op!("fst", 0x100, 0, 0x11, 0x2043),
    op!("fstp", 0x100, 0, 0x11, 0x2043),
    op!("fldenv", 0x100, 0, 0x11, 0x2006),
    op!("fldcw", 0x100, 0, 0x11, 0x2002),
    op!("fnstenv", 0x100, 0, 0x11, 0x2006),
    op!("fnstcw", 0x100, 0, 0x11, 0x2002),
    op!("fld", 0x100, 0, 0x11, 0x1040),
    op!("fxch", 0x100, 0, 0x11, 0x1040),
    lnk!(Rm, T_D9_2),
    ILL,
    lnk!(Rm, T_D9_4),
    lnk!(Rm, T_D9_5),
    lnk!(Rm, T_D9_6),
    lnk!(Rm, T_D9_7),
];

static FPU_DA: [Op; 16] = [
    op!("fiadd", 0x100, 0, 0x11, 0x2003),
    op!("fimul", 0x100, 0, 0x11, 0x2003),
    op!("ficom", 0x100, 0, 0x11, 0x2003; 4),
    op!("ficomp", 0x100, 0, 0x11, 0x2003; 4),
    op!("fisub", 0x100, 0, 0x11, 0x2003),
    op!("fisubr", 0x100, 0, 0x11, 0x2003),
    op!("fidiv", 0x100, 0, 0x11, 0x2003),
    op!("fidivr", 0x100, 0, 0x11, 0x2003),
    op!("fcmovb", 0x106, 0, 0x11, 0xaf, 0x1040),
    op!("fcmove", 0x106, 0, 0x11, 0xaf, 0x1040),
    op!("fcmovbe", 0x106, 0, 0x11, 0xaf, 0x1040),
    op!("fcmovu", 0x106, 0, 0x11, 0xaf, 0x1040),
    ILL,
    lnk!(Rm, T_DA_5),
    ILL,
    ILL,
];

static FPU_DB: [Op; 16] = [
    op!("fild", 0x100, 0, 0x11, 0x2003),
    op!("fisttp", 0x13, 0, 0x11, 0x2003),
    op!("fist", 0x100, 0, 0x11, 0x2003),
    op!("fistp", 0x100, 0, 0x11, 0x2003),
    ILL,
    op!("fld", 0x100, 0, 0x11, 0x2045),
    ILL,
    op!("fstp", 0x100, 0, 0x11, 0x2045),
    op!("fcmovnb", 0x106, 0, 0x11, 0xaf, 0x1040),
    op!("fcmovne", 0x106, 0, 0x11, 0xaf, 0x1040),
    op!("fcmovnbe", 0x106, 0, 0x11, 0xaf, 0x1040),
    op!("fcmovnu", 0x106, 0, 0x11, 0xaf, 0x1040),
    lnk!(Rm, T_DB_4),
    op!("fucomi", 0x106, 0, 0x11, 0xaf, 0x1040; 4),
    op!("fcomi", 0x106, 0, 0x11, 0xaf, 0x1040; 4),
    ILL,
];

static FPU_DC: [Op; 16] = [
    op!("fadd", 0x100, 0, 0x11, 0x2044),
    op!("fmul", 0x100, 0, 0x11, 0x2044),
    op!("fcom", 0x100, 0, 0x11, 0x2044; 4),
    op!("fcomp", 0x100, 0, 0x11, 0x2044; 4),
    op!("fsub", 0x100, 0, 0x11, 0x2044),
    op!("fsubr", 0x100, 0, 0x11, 0x2044),
    op!("fdiv", 0x100, 0, 0x11, 0x2044),
    op!("fdivr", 0x100, 0, 0x11, 0x2044),
    op!("fadd", 0x100, 0, 0x11, 0x1040, 0xaf),
    op!("fmul", 0x100, 0, 0x11, 0x1040, 0xaf),
    ILL,
    ILL,
    op!("fsubr", 0x100, 0, 0x11, 0x1040, 0xaf),
    op!("fsub", 0x100, 0, 0x11, 0x1040, 0xaf),
    op!("fdivr", 0x100, 0, 0x11, 0x1040, 0xaf),
    op!("fdiv", 0x100, 0, 0x11, 0x1040, 0xaf),
];

static FPU_DD: [Op; 16] = [
    op!("fld", 0x100, 0, 0x11, 0x2044),
    op!("fisttp", 0x13, 0, 0x11, 0x2044),
    op!("fst", 0x100, 0, 0x11, 0x2044),
    op!("fstp", 0x100, 0, 0x11, 0x2044),
    op!("frstor", 0x100, 0, 0x11, 0x2006),
    ILL,
    op!("fnsave", 0x100, 0, 0x11, 0x2006),
    op!("fnstsw", 0x100, 0, 0x11, 0x2002),
    op!("ffree", 0x100, 0, 0x11, 0x1040),
    ILL,
    op!("fst", 0x100, 0, 0x11, 0x1040),
    op!("fstp", 0x100, 0, 0x11, 0x1040),
    op!("fucom", 0x100, 0, 0x11, 0x1040; 4),
    op!("fucomp", 0x100, 0, 0x11, 0x1040; 4),
    ILL,
    ILL,
];

static FPU_DE: [Op; 16] = [
    op!("fiadd", 0x100, 0, 0x11, 0x2002),
    op!("fimul", 0x100, 0, 0x11, 0x2002),
    op!("ficom", 0x100, 0, 0x11, 0x2002; 4),
    op!("ficomp", 0x100, 0, 0x11, 0x2002; 4),
    op!("fisub", 0x100, 0, 0x11, 0x2002),
    op!("fisubr", 0x100, 0, 0x11, 0x2002),
    op!("fidiv", 0x100, 0, 0x11, 0x2002),
    op!("fidivr", 0x100, 0, 0x11, 0x2002),
    op!("faddp", 0x100, 0, 0x11, 0x1040, 0xaf),
    op!("fmulp", 0x100, 0, 0x11, 0x1040, 0xaf),
    ILL,
    lnk!(Rm, T_DE_3),
    op!("fsubrp", 0x100, 0, 0x11, 0x1040, 0xaf),
    op!("fsubp", 0x100, 0, 0x11, 0x1040, 0xaf),
    op!("fdivrp", 0x100, 0, 0x11, 0x1040, 0xaf),
    op!("fdivp", 0x100, 0, 0x11, 0x1040, 0xaf),
];

static FPU_DF: [Op; 16] = [
    op!("fild", 0x100, 0, 0x11, 0x2002),
    op!("fisttp", 0x13, 0, 0x11, 0x2002),
    op!("fist", 0x100, 0, 0x11, 0x2002),
    op!("fistp", 0x100, 0, 0x11, 0x2002),
    op!("fbld", 0x100, 0, 0x11, 0x2005),
    op!("fild", 0x100, 0, 0x11, 0x2004),
    op!("fbstp", 0x100, 0, 0x11, 0x2005),
    op!("fistp", 0x100, 0, 0x11, 0x2004),
    ILL,
    ILL,
    ILL,
    ILL,
    lnk!(Rm, T_DF_4),
    op!("fucomip", 0x106, 0, 0x11, 0xaf, 0x1040; 4),
    op!("fcomip", 0x106, 0, 0x11, 0xaf, 0x1040; 4),
    ILL,
];

static FPU_D9_2: [Op; 8] = [
    op!("fnop", 0x100, 0, 0x10),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

static FPU_D9_4: [Op; 8] = [
    op!("fchs", 0x100, 0, 0x10),
    op!("fabs", 0x100, 0, 0x10),
    ILL,
    ILL,
    op!("ftst", 0x100, 0, 0x10),
    op!("fxam", 0x100, 0, 0x10),
    ILL,
    ILL,
];

static FPU_D9_5: [Op; 8] = [
    op!("fld1", 0x100, 0, 0x10),
    op!("fldl2t", 0x100, 0, 0x10),
    op!("fldl2e", 0x100, 0, 0x10),
    op!("fldpi", 0x100, 0, 0x10),
    op!("fldlg2", 0x100, 0, 0x10),
    op!("fldln2", 0x100, 0, 0x10),
    op!("fldz", 0x100, 0, 0x10),
    ILL,
];

static FPU_D9_6: [Op; 8] = [
    op!("f2xm1", 0x100, 0, 0x10),
    op!("fyl2x", 0x100, 0, 0x10),
    op!("fptan", 0x100, 0, 0x10),
    op!("fpatan", 0x100, 0, 0x10),
    op!("fxtract", 0x100, 0, 0x10),
    op!("fprem1", 0x101, 0, 0x10),
    op!("fdecstp", 0x100, 0, 0x10),
    op!("fincstp", 0x100, 0, 0x10),
];

static FPU_D9_7: [Op; 8] = [
    op!("fprem", 0x100, 0, 0x10),
    op!("fyl2xp1", 0x100, 0, 0x10),
    op!("fsqrt", 0x100, 0, 0x10),
    op!("fsincos", 0x101, 0, 0x10),
    op!("frndint", 0x100, 0, 0x10),
    op!("fscale", 0x100, 0, 0x10),
    op!("fsin", 0x101, 0, 0x10),
    op!("fcos", 0x101, 0, 0x10),
];

static FPU_DA_5: [Op; 8] = [
    ILL,
    op!("fucompp", 0x101, 0, 0x10),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

static FPU_DB_4: [Op; 8] = [
    ILL,
    ILL,
    op!("fnclex", 0x100, 0, 0x10),
    op!("fninit", 0x100, 0, 0x10),
    ILL,
    ILL,
    ILL,
    ILL,
];

static FPU_DE_3: [Op; 8] = [
    ILL,
    op!("fcompp", 0x100, 0, 0x10; 4),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

static FPU_DF_4: [Op; 8] = [
    op!("fnstsw", 0x100, 0, 0x10, 0xa2),
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
    ILL,
];

// ---------------------------------------------------------------------
// Registry. Order must match the T_* constants above.
// ---------------------------------------------------------------------

pub static TABLES: &[&[Op]] = &[
    &MAP0,       // 0
    &MAP_0F,     // 1
    &MAP_0F38,   // 2
    &MAP_0F3A,   // 3
    &G1_80,      // 4
    &G1_81,      // 5
    &G1_82,      // 6
    &G1_83,      // 7
    &G1A_8F,     // 8
    &G2_C0,      // 9
    &G2_C1,      // 10
    &G2_D0,      // 11
    &G2_D1,      // 12
    &G2_D2,      // 13
    &G2_D3,      // 14
    &G3_F6,      // 15
    &G3_F7,      // 16
    &G4_FE,      // 17
    &G5_FF,      // 18
    &G6,         // 19
    &G7,         // 20
    &G7_R7,      // 21
    &G8,         // 22
    &G9,         // 23
    &G9_M1,      // 24
    &G11_C6,     // 25
    &G11_C7,     // 26
    &G12,        // 27
    &G13,        // 28
    &G14,        // 29
    &G15,        // 30
    &G16,        // 31
    &TBL_90,     // 32
    &TBL_63,     // 33
    &TBL_6D,     // 34
    &TBL_6F,     // 35
    &TBL_98,     // 36
    &TBL_99,     // 37
    &TBL_9C,     // 38
    &TBL_9D,     // 39
    &TBL_A5,     // 40
    &TBL_A7,     // 41
    &TBL_AB,     // 42
    &TBL_AD,     // 43
    &TBL_AF,     // 44
    &TBL_CF,     // 45
    &TBL_E3,     // 46
    &TBL_60,     // 47
    &TBL_61,     // 48
    &TBL_0F10,   // 49
    &TBL_0F11,   // 50
    &TBL_0F12,   // 51
    &TBL_0F13,   // 52
    &TBL_0F16,   // 53
    &TBL_0F17,   // 54
    &TBL_0F1E,   // 55
    &TBL_0F1E_F3, // 56
    &TBL_ENDBR,  // 57
    &TBL_0F28,   // 58
    &TBL_0F29,   // 59
    &TBL_0F2A,   // 60
    &TBL_0F2B,   // 61
    &TBL_0F2C,   // 62
    &TBL_0F2D,   // 63
    &TBL_0F2E,   // 64
    &TBL_0F2F,   // 65
    &TBL_0F50,   // 66
    &TBL_0F5A,   // 67
    &TBL_0F5B,   // 68
    &TBL_0F6F,   // 69
    &TBL_0F70,   // 70
    &TBL_0F77,   // 71
    &TBL_0F7E,   // 72
    &TBL_0F7F,   // 73
    &TBL_0FB8,   // 74
    &TBL_0FBC,   // 75
    &TBL_0FBD,   // 76
    &TBL_0FD0,   // 77
    &TBL_0FD6,   // 78
    &TBL_0FE6,   // 79
    &TBL_0FE7,   // 80
    &TBL_0FF0,   // 81
    &TBL_0FF7,   // 82
    &FPU_D8,     // 83
    &FPU_D9,     // 84
    &FPU_DA,     // 85
    &FPU_DB,     // 86
    &FPU_DC,     // 87
    &FPU_DD,     // 88
    &FPU_DE,     // 89
    &FPU_DF,     // 90
    &FPU_D9_2,   // 91
    &FPU_D9_4,   // 92
    &FPU_D9_5,   // 93
    &FPU_D9_6,   // 94
    &FPU_D9_7,   // 95
    &FPU_DA_5,   // 96
    &FPU_DB_4,   // 97
    &FPU_DE_3,   // 98
    &FPU_DF_4,   // 99
    &MAP_3DNOW,  // 100
    &MAP_XOP8,   // 101
    &MAP_XOP9,   // 102
    &MAP_XOPA,   // 103
    &TBL_0F38F0, // 104
    &TBL_0F38F1, // 105
    &TBL_0F38F5, // 106
    &TBL_0F38F6, // 107
    &TBL_0F38F7, // 108
    &G17,        // 109
    &TBL_0F3A16, // 110
    &TBL_0F3A22, // 111
];

pub fn table(index: u16) -> &'static [Op] {
    TABLES[index as usize]
}

/// Table a VEX or EVEX prefix starts in, from its mmmmm bits.
pub fn start_page_vex(mmmmm: u8) -> Option<u16> {
    match mmmmm & 0x1F {
        1 => Some(T_0F),
        2 => Some(T_0F38),
        3 => Some(T_0F3A),
        _ => None,
    }
}

/// Table an XOP prefix starts in, from its mmmmm bits.
pub fn start_page_xop(mmmmm: u8) -> Option<u16> {
    match mmmmm & 0x1F {
        8 => Some(T_XOP8),
        9 => Some(T_XOP9),
        0xA => Some(T_XOPA),
        _ => None,
    }
}

/// How many entries a table indexed by this link kind must have.
pub fn link_arity(kind: LinkKind) -> usize {
    match kind {
        LinkKind::None => 0,
        LinkKind::NextByte | LinkKind::TrailingImm | LinkKind::ByteAfterPrefixes => 256,
        LinkKind::Reg | LinkKind::Rm => 8,
        LinkKind::Mod | LinkKind::VexW | LinkKind::MvexE => 2,
        LinkKind::ModReg => 16,
        LinkKind::Mode | LinkKind::OperandSize | LinkKind::AddressSize | LinkKind::Dialect => 3,
        LinkKind::PrefixClass | LinkKind::VectorSize | LinkKind::VexKind => 4,
        LinkKind::VexL => 5,
    }
}

// ---------------------------------------------------------------------
// Register name tables.
// ---------------------------------------------------------------------

pub static REG8: [&str; 8] = ["al", "cl", "dl", "bl", "ah", "ch", "dh", "bh"];
pub static REG8X: [&str; 16] = [
    "al", "cl", "dl", "bl", "spl", "bpl", "sil", "dil", "r8b", "r9b", "r10b", "r11b", "r12b",
    "r13b", "r14b", "r15b",
];
pub static REG16: [&str; 16] = [
    "ax", "cx", "dx", "bx", "sp", "bp", "si", "di", "r8w", "r9w", "r10w", "r11w", "r12w", "r13w",
    "r14w", "r15w",
];
pub static REG32: [&str; 16] = [
    "eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi", "r8d", "r9d", "r10d", "r11d", "r12d",
    "r13d", "r14d", "r15d",
];
pub static REG64: [&str; 16] = [
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12",
    "r13", "r14", "r15",
];
pub static REG_SEG: [&str; 8] = ["es", "cs", "ss", "ds", "fs", "gs", "?", "?"];

/// Condition-code suffix for opcodes carrying option bit 0x2000.
pub fn cc_name(low_bits: u8) -> &'static str {
    CC_NAMES[(low_bits & 0x0F) as usize]
}

// ---------------------------------------------------------------------
// Operand descriptor helpers shared by the decoder and the formatter.
// ---------------------------------------------------------------------

/// Immediate-style operand: a constant rendered from the immediate field.
pub fn is_constant(t: u32) -> bool {
    matches!(t & 0xFF, 0x11..=0x39)
}

/// Jump or call target rendered from the immediate field.
pub fn is_jump_target(t: u32) -> bool {
    matches!(t & 0xFF, 0x81..=0x85)
}

/// General purpose integer operand (register or memory).
pub fn is_gp(t: u32) -> bool {
    t & 0xF00 == 0 && matches!(t & 0xFF, 1..=0x0D)
}

pub fn is_vector(t: u32) -> bool {
    t & 0xF00 != 0 || matches!(t & 0xFF, 0x48..=0x51)
}

pub fn is_x87(t: u32) -> bool {
    matches!(t & 0xFF, 0x40..=0x45)
}

pub fn register_only(t: u32) -> bool {
    t & 0x1000 != 0
}

pub fn memory_only(t: u32) -> bool {
    t & 0x2000 != 0
}

/// Size in bits of an integer operand, given the resolved operand size.
pub fn int_bits(t: u32, operand_size: u32) -> u32 {
    match t & 0xFF {
        1 | 0x11 | 0x21 | 0x31 | 0x81 | 0xa1 | 0xb1 | 0xb3 => 8,
        2 | 0x12 | 0x22 | 0x32 | 0xa2 | 0xb2 => 16,
        5 | 0x45 => 80,
        3 | 0x13 | 0x23 | 0x33 | 0xa3 => 32,
        4 | 0x34 | 0xa4 => 64,
        8 | 0x18 | 0x28 | 0x38 | 0xa8 => {
            if operand_size == 16 {
                16
            } else {
                32
            }
        }
        9 | 0x0A | 0x0B | 0x0C | 0x19 | 0x29 | 0x39 | 0x82 | 0x83 | 0xa9 => operand_size,
        _ => 0,
    }
}

/// Element size in bytes for a float or vector element type; used for the
/// EVEX compressed-displacement multiplier.
pub fn element_bytes(t: u32, prefix_class: u8, vex_w: bool) -> u32 {
    match t & 0xFF {
        0x4A => 2,
        0x4B => 4,
        0x4C => 8,
        0x4F => match prefix_class {
            0x66 => 8, // pd
            0xF2 => 8, // sd
            0xF3 => 4, // ss
            _ => 4,    // ps
        },
        1 => 1,
        2 => 2,
        3 => 4,
        4 => 8,
        9 => {
            if vex_w {
                8
            } else {
                4
            }
        }
        _ => 4,
    }
}

/// Vector size in bytes from the descriptor's size selector.
/// `ll` is 0 for XMM, 1 for YMM, 2 for ZMM; 66 selects XMM over MMX for
/// the prefix-dependent selector.
pub fn vector_bytes(t: u32, has_66: bool, has_vex: bool, ll: u32) -> u32 {
    match t & 0xF00 {
        0x100 => {
            if !has_66 && !has_vex {
                8
            } else {
                16 << ll
            }
        }
        0x200 => 16 << ll,
        0x300 => 8,
        0x400 => 16,
        0x500 => 32,
        0x600 => 64,
        0xF00 => {
            let full = 16 << ll;
            if full / 2 < 8 {
                8
            } else {
                full / 2
            }
        }
        _ => 0,
    }
}

/// Scalar float operands read memory of element size, not vector size.
pub fn is_scalar_float(t: u32, prefix_class: u8) -> bool {
    match t & 0xFF {
        0x4A | 0x4B | 0x4C => t & 0xF00 == 0x400 || t & 0xF00 == 0,
        0x4F => prefix_class == 0xF2 || prefix_class == 0xF3,
        _ => false,
    }
}

/// Name of the highest instruction set for the output header.
pub fn instruction_set_name(iset: u32) -> &'static str {
    match iset & 0xFFF {
        0 => "8086",
        1 => "80186",
        2 => "80286",
        3 => "80386",
        4 => "80486",
        5 => "Pentium",
        6 => "Pentium Pro",
        7 => "MMX",
        8 => "Pentium II",
        0x11 => "SSE",
        0x12 => "SSE2",
        0x13 => "SSE3",
        0x14 => "Suppl. SSE3",
        0x15 => "SSE4.1",
        0x16 => "SSE4.2",
        0x17 => "AES",
        0x18 => "CLMUL",
        0x19 => "AVX",
        0x1A => "FMA3",
        0x1C => "AVX2",
        0x1D => "BMI etc.",
        0x20 => "AVX-512",
        0x100 => "8087",
        0x101 => "80387",
        _ => "x86",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_closed() {
        // Every link points at a registered table with the arity its
        // discriminator requires.
        for (ti, table) in TABLES.iter().enumerate() {
            for (ei, entry) in table.iter().enumerate() {
                if entry.is_link() {
                    let target = entry.link.table as usize;
                    assert!(
                        target < TABLES.len(),
                        "table {} entry {:#x} links past the registry",
                        ti,
                        ei
                    );
                    assert_eq!(
                        TABLES[target].len(),
                        link_arity(entry.link.kind),
                        "table {} entry {:#x} links to a table of the wrong arity",
                        ti,
                        ei
                    );
                }
            }
        }
    }

    #[test]
    fn root_map_spot_checks() {
        assert_eq!(MAP0[0x90].link.kind, LinkKind::PrefixClass);
        assert_eq!(MAP0[0x0F].link.kind, LinkKind::NextByte);
        assert_eq!(MAP0[0x0F].link.table, T_0F);
        assert_eq!(MAP0[0xC3].name, "ret");
        assert!(MAP0[0xC3].options & 0x10 != 0);
        assert_eq!(MAP0[0xE8].name, "call");
        assert_eq!(MAP0[0xE8].dest & 0xFF, 0x83);
        assert!(MAP0[0x89].has_modrm());
        assert!(!MAP0[0xC3].has_modrm());
        assert!(MAP0[0x66].is_prefix());
    }

    #[test]
    fn two_byte_map_spot_checks() {
        assert_eq!(MAP_0F[0x0B].name, "ud2");
        assert!(MAP_0F[0x0B].options & 0x10 != 0);
        assert_eq!(MAP_0F[0x10].link.kind, LinkKind::PrefixClass);
        assert_eq!(TBL_0F10[0].name, "movups");
        // movups accepts EVEX so the 512-bit form decodes.
        assert!(TBL_0F10[0].prefixes & 0x800000 != 0);
        assert_eq!(MAP_0F[0x1F].name, "nop");
    }

    #[test]
    fn vex_pages_reuse_escape_maps() {
        assert_eq!(start_page_vex(1), Some(T_0F));
        assert_eq!(start_page_vex(2), Some(T_0F38));
        assert_eq!(start_page_vex(3), Some(T_0F3A));
        assert_eq!(start_page_vex(4), None);
        assert_eq!(start_page_xop(8), Some(T_XOP8));
        assert_eq!(start_page_xop(1), None);
    }

    #[test]
    fn descriptor_helpers() {
        assert!(is_constant(0x11));
        assert!(is_constant(0x39));
        assert!(!is_constant(0x40));
        assert!(is_jump_target(0x81));
        assert!(is_gp(9));
        assert!(!is_gp(0x101));
        assert!(is_vector(0x24F));
        assert_eq!(int_bits(9, 64), 64);
        assert_eq!(int_bits(8, 64), 32);
        assert_eq!(int_bits(1, 64), 8);
        assert_eq!(vector_bytes(0x251, false, false, 2), 64);
        assert_eq!(vector_bytes(0x101, false, false, 0), 8);
        assert_eq!(vector_bytes(0x101, true, false, 0), 16);
    }
}
