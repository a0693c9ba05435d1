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

//! The single-instruction decoder.
//!
//! Decoding runs in a strict order: scan prefixes into their eight
//! category slots, walk the opcode table forest until a terminal entry
//! is found, consume mod/reg/rm, SIB and displacement, size the
//! immediate field, assign operand descriptors, post-process EVEX bits,
//! and bind relocations to the displacement and immediate fields.
//!
//! A decode never fails: anything unrecognized sets a bit in the error
//! set and the caller re-classifies the byte as data. Every decode
//! consumes at least one byte and never reads past the initialized end
//! of the section.

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::{ErrorFlags, WarningFlags};
use crate::opcodes::{self, LinkKind, Op, ILL};
use crate::sections::RelocationIndex;

// Prefix category slots.
pub const P_SEG: usize = 0; // 26, 2E, 36, 3E, 64, 65
pub const P_ASIZE: usize = 1; // 67
pub const P_LOCK: usize = 2; // F0
pub const P_REP: usize = 3; // F2, F3, or the VEX/EVEX/XOP marker byte
pub const P_OSIZE: usize = 4; // 66
pub const P_TYPE: usize = 5; // 66/F2/F3 in their repurposed role
pub const P_VEX: usize = 6; // mmmmm | 0x20 if VEX.L | 0x40 if EVEX
pub const P_REX: usize = 7; // B/X/R/W plus prefix kind bits below

pub const RX_B: u8 = 1;
pub const RX_X: u8 = 2;
pub const RX_R: u8 = 4;
pub const RX_W: u8 = 8;
pub const RX_VEX2: u8 = 0x10;
pub const RX_VEX3: u8 = 0x20;
pub const RX_REX: u8 = 0x40;
pub const RX_XOP: u8 = 0x80;

// Operand placement flags OR'ed onto the table descriptors.
pub const OP_DIRECT_MEM: u32 = 0x10000; // moffs, no mod/reg/rm
pub const OP_SHORT_REG: u32 = 0x20000; // opcode bits 0-2 plus REX.B
pub const OP_RM: u32 = 0x30000; // mod/rm with B and X
pub const OP_REG: u32 = 0x40000; // reg field with R
pub const OP_VVVV: u32 = 0x60000; // VEX.vvvv
pub const OP_IMM_REG: u32 = 0x70000; // register in immediate bits 4-7
pub const OP_PLACE: u32 = 0xF0000;
pub const OP_IMM: u32 = 0x100000; // first immediate part
pub const OP_IMM2: u32 = 0x200000; // second immediate part

bitflags! {
    /// Memory-operand shape of the decoded instruction.
    pub struct MFlags: u32 {
        const HAS_MEMORY   = 0x001;
        const HAS_MODRM    = 0x002;
        const HAS_SIB      = 0x004;
        const HAS_VEX      = 0x008;
        const HAS_EVEX     = 0x010;
        const RIP_RELATIVE = 0x100;
    }
}

/// Everything known about one decoded instruction. Reset for every
/// decode; scoped to a single decode call.
#[derive(Clone)]
pub struct Decoded {
    pub entry: &'static Op,
    pub table: u16,
    pub index: u16,
    pub start: u32,
    pub end: u32,
    pub prefixes: [u8; 8],
    pub conflicts: [u8; 8],
    pub warnings: WarningFlags,
    pub errors: ErrorFlags,
    pub word_size: u32,
    pub address_size: u32,
    pub operand_size: u32,
    pub modrm: u8,
    pub mod_bits: u8,
    pub reg_bits: u8,
    pub rm_bits: u8,
    pub mflags: MFlags,
    pub base_reg: u8,  // register number + 1, 0 if none
    pub index_reg: u8, // register number + 1, 0 if none
    pub scale: u8,     // scale factor = 1 << scale
    pub vreg: u8,      // VEX.vvvv, already complemented
    pub kreg: u8,      // EVEX.aaa mask register
    pub esss: u8,      // EVEX z | L'L | b
    pub offset_multiplier: u32,
    pub operands: [u32; 5],
    pub opcode_start1: u32, // first byte after prefixes
    pub opcode_start2: u32, // first byte after the opcode itself
    pub address_field: u32,
    pub address_field_size: u32,
    pub address_relocation: usize,
    pub immediate_field: u32,
    pub immediate_field_size: u32,
    pub immediate_relocation: usize,
    pub opcode_byte: u8, // last opcode byte consumed
}

impl Default for Decoded {
    fn default() -> Self {
        Decoded {
            entry: &ILL,
            table: 0,
            index: 0,
            start: 0,
            end: 0,
            prefixes: [0; 8],
            conflicts: [0; 8],
            warnings: WarningFlags::empty(),
            errors: ErrorFlags::empty(),
            word_size: 32,
            address_size: 32,
            operand_size: 32,
            modrm: 0,
            mod_bits: 0,
            reg_bits: 0,
            rm_bits: 0,
            mflags: MFlags::empty(),
            base_reg: 0,
            index_reg: 0,
            scale: 0,
            vreg: 0,
            kreg: 0,
            esss: 0,
            offset_multiplier: 1,
            operands: [0; 5],
            opcode_start1: 0,
            opcode_start2: 0,
            address_field: 0,
            address_field_size: 0,
            address_relocation: 0,
            immediate_field: 0,
            immediate_field_size: 0,
            immediate_relocation: 0,
            opcode_byte: 0,
        }
    }
}

impl Decoded {
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn has_vex(&self) -> bool {
        self.prefixes[P_REX] & (RX_VEX2 | RX_VEX3 | RX_XOP) != 0
    }

    pub fn has_evex(&self) -> bool {
        self.mflags.contains(MFlags::HAS_EVEX)
    }

    pub fn vex_w(&self) -> bool {
        self.prefixes[P_REX] & RX_W != 0
    }

    /// Vector length bits: 0 = XMM, 1 = YMM, 2 = ZMM.
    pub fn ll(&self) -> u32 {
        (self.esss >> 1 & 3) as u32
    }

    pub fn has_memory(&self) -> bool {
        self.mflags.contains(MFlags::HAS_MEMORY)
    }

    pub fn is_unconditional(&self) -> bool {
        self.entry.options & 0x10 != 0
    }

    pub fn is_filler(&self) -> bool {
        self.entry.options & 0x40 != 0
    }

    /// Sign-extended displacement, read back from the section bytes.
    pub fn displacement(&self, bytes: &[u8]) -> i64 {
        read_signed(bytes, self.address_field as usize, self.address_field_size as usize)
    }

    /// Sign-extended first immediate part.
    pub fn immediate(&self, bytes: &[u8]) -> i64 {
        let size = self.first_imm_size() as usize;
        read_signed(bytes, self.immediate_field as usize, size)
    }

    /// The trailing immediate part (enter, far pointers, insertq).
    pub fn immediate2(&self, bytes: &[u8]) -> i64 {
        let first = self.first_imm_size();
        let rest = self.immediate_field_size - first;
        read_signed(
            bytes,
            (self.immediate_field + first) as usize,
            rest as usize,
        )
    }

    fn first_imm_size(&self) -> u32 {
        match self.entry.imm_code() {
            0x60 => 2,
            0x200 => self.immediate_field_size - 2,
            _ => self.immediate_field_size,
        }
    }
}

fn read_signed(bytes: &[u8], at: usize, size: usize) -> i64 {
    if size == 0 || at + size > bytes.len() {
        return 0;
    }
    let field = &bytes[at..at + size];
    match size {
        1 => field[0] as i8 as i64,
        2 => LittleEndian::read_i16(field) as i64,
        4 => LittleEndian::read_i32(field) as i64,
        8 => LittleEndian::read_i64(field),
        _ => LittleEndian::read_int(field, size),
    }
}

/// Decoder for one section's bytes. Holds no mutable state; `decode` is
/// pure apart from the flag sets in the record it returns.
pub struct Decoder<'a> {
    bytes: &'a [u8],
    word_size: u32,
    section: i32,
    dialect: u16,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8], word_size: u32, section: i32, dialect: u16) -> Self {
        Decoder {
            bytes,
            word_size,
            section,
            dialect,
        }
    }

    fn store_prefix(d: &mut Decoded, category: usize, byte: u8) {
        if d.prefixes[category] != 0 && d.prefixes[category] != byte {
            d.conflicts[category] += 1;
        }
        d.prefixes[category] = byte;
    }

    /// Decode the instruction starting at `begin`. `begin` must lie
    /// inside the initialized bytes.
    pub fn decode(&self, begin: u32, relocations: &RelocationIndex) -> Decoded {
        let mut d = Decoded::default();
        d.start = begin;
        d.word_size = self.word_size;
        let mut pos = begin as usize;

        if !self.scan_prefixes(&mut d, &mut pos) {
            return self.truncate(d);
        }
        d.opcode_start1 = pos as u32;

        if d.errors.contains(ErrorFlags::UNSUPPORTED_ISA) {
            // MVEX encodings are not carried; re-classify as data.
            d.end = begin + 1;
            return d;
        }

        if !self.find_map_entry(&mut d, &mut pos) {
            return self.truncate(d);
        }
        d.opcode_start2 = pos as u32;
        self.resolve_sizes(&mut d);

        if !self.find_operands(&mut d, &mut pos) {
            return self.truncate(d);
        }
        d.end = pos as u32;
        if d.end <= d.start {
            d.end = d.start + 1;
        }
        self.find_operand_types(&mut d);
        self.find_broadcast(&mut d);
        self.find_relocations(&mut d, relocations);
        self.find_warnings(&mut d);
        self.find_errors(&mut d);
        d
    }

    fn truncate(&self, mut d: Decoded) -> Decoded {
        d.errors |= ErrorFlags::TRUNCATED;
        d.end = self.bytes.len() as u32;
        if d.end <= d.start {
            d.end = d.start + 1;
        }
        d
    }

    fn next(&self, pos: &mut usize) -> Option<u8> {
        let b = self.bytes.get(*pos).copied()?;
        *pos += 1;
        Some(b)
    }

    fn peek(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    // --- step 1: prefixes -------------------------------------------------

    fn scan_prefixes(&self, d: &mut Decoded, pos: &mut usize) -> bool {
        loop {
            let b = match self.peek(*pos) {
                Some(b) => b,
                None => return false,
            };
            match b {
                0x26 | 0x2E | 0x36 | 0x3E | 0x64 | 0x65 => {
                    Self::store_prefix(d, P_SEG, b);
                }
                0x67 => Self::store_prefix(d, P_ASIZE, b),
                0xF0 => Self::store_prefix(d, P_LOCK, b),
                0xF2 | 0xF3 => {
                    Self::store_prefix(d, P_REP, b);
                    Self::store_prefix(d, P_TYPE, b);
                }
                0x66 => {
                    Self::store_prefix(d, P_OSIZE, b);
                    // F2/F3 outrank 66 in the operand-type category.
                    if d.prefixes[P_TYPE] == 0 {
                        d.prefixes[P_TYPE] = 0x66;
                    }
                }
                0x40..=0x4F if self.word_size == 64 => {
                    if d.prefixes[P_REX] != 0 {
                        d.conflicts[P_REX] += 1;
                    }
                    d.prefixes[P_REX] = RX_REX | (b & 0x0F);
                }
                0xC5 => {
                    if !self.vex_possible(*pos) {
                        return true; // lds
                    }
                    let p = match self.peek(*pos + 1) {
                        Some(p) => p,
                        None => return false,
                    };
                    Self::store_prefix(d, P_REP, b);
                    let mut rex = RX_VEX2;
                    if p & 0x80 == 0 {
                        rex |= RX_R;
                    }
                    d.prefixes[P_REX] |= rex;
                    d.vreg = (!p >> 3) & 0x0F;
                    d.esss = (p >> 2 & 1) << 1;
                    d.prefixes[P_VEX] = 1 | ((p >> 2 & 1) << 5);
                    self.set_vex_pp(d, p & 3);
                    d.mflags |= MFlags::HAS_VEX;
                    *pos += 2;
                    return self.peek(*pos).is_some();
                }
                0xC4 => {
                    if !self.vex_possible(*pos) {
                        return true; // les
                    }
                    let p1 = match self.peek(*pos + 1) {
                        Some(p) => p,
                        None => return false,
                    };
                    let p2 = match self.peek(*pos + 2) {
                        Some(p) => p,
                        None => return false,
                    };
                    Self::store_prefix(d, P_REP, b);
                    let mut rex = RX_VEX3;
                    if p1 & 0x80 == 0 {
                        rex |= RX_R;
                    }
                    if p1 & 0x40 == 0 {
                        rex |= RX_X;
                    }
                    if p1 & 0x20 == 0 {
                        rex |= RX_B;
                    }
                    if p2 & 0x80 != 0 {
                        rex |= RX_W;
                    }
                    d.prefixes[P_REX] |= rex;
                    d.vreg = (!p2 >> 3) & 0x0F;
                    d.esss = (p2 >> 2 & 1) << 1;
                    d.prefixes[P_VEX] = (p1 & 0x1F) | ((p2 >> 2 & 1) << 5);
                    self.set_vex_pp(d, p2 & 3);
                    d.mflags |= MFlags::HAS_VEX;
                    *pos += 3;
                    return self.peek(*pos).is_some();
                }
                0x62 => {
                    if !self.vex_possible(*pos) {
                        return true; // bound
                    }
                    let p0 = match self.peek(*pos + 1) {
                        Some(p) => p,
                        None => return false,
                    };
                    let p1 = match self.peek(*pos + 2) {
                        Some(p) => p,
                        None => return false,
                    };
                    let p2 = match self.peek(*pos + 3) {
                        Some(p) => p,
                        None => return false,
                    };
                    if p1 & 0x04 == 0 {
                        // MVEX, the Knights Corner encoding.
                        d.errors |= ErrorFlags::UNSUPPORTED_ISA;
                        *pos += 4;
                        return true;
                    }
                    Self::store_prefix(d, P_REP, b);
                    let mut rex = 0;
                    if p0 & 0x80 == 0 {
                        rex |= RX_R;
                    }
                    if p0 & 0x40 == 0 {
                        rex |= RX_X;
                    }
                    if p0 & 0x20 == 0 {
                        rex |= RX_B;
                    }
                    if p1 & 0x80 != 0 {
                        rex |= RX_W;
                    }
                    d.prefixes[P_REX] |= rex | RX_VEX3;
                    d.vreg = (!p1 >> 3) & 0x0F;
                    d.kreg = p2 & 7;
                    d.esss = ((p2 >> 7) & 1) << 3 | ((p2 >> 5) & 3) << 1 | ((p2 >> 4) & 1);
                    d.prefixes[P_VEX] = (p0 & 0x07) | 0x40;
                    self.set_vex_pp(d, p1 & 3);
                    d.mflags |= MFlags::HAS_VEX | MFlags::HAS_EVEX;
                    *pos += 4;
                    return self.peek(*pos).is_some();
                }
                0x8F => {
                    // XOP when the would-be reg field is nonzero, else pop.
                    let p1 = match self.peek(*pos + 1) {
                        Some(p) => p,
                        None => return true,
                    };
                    if p1 & 0x38 == 0 || p1 & 0x1F < 8 {
                        return true;
                    }
                    let p2 = match self.peek(*pos + 2) {
                        Some(p) => p,
                        None => return false,
                    };
                    Self::store_prefix(d, P_REP, b);
                    let mut rex = RX_XOP;
                    if p1 & 0x80 == 0 {
                        rex |= RX_R;
                    }
                    if p1 & 0x40 == 0 {
                        rex |= RX_X;
                    }
                    if p1 & 0x20 == 0 {
                        rex |= RX_B;
                    }
                    if p2 & 0x80 != 0 {
                        rex |= RX_W;
                    }
                    d.prefixes[P_REX] |= rex;
                    d.vreg = (!p2 >> 3) & 0x0F;
                    d.esss = (p2 >> 2 & 1) << 1;
                    d.prefixes[P_VEX] = (p1 & 0x1F) | ((p2 >> 2 & 1) << 5);
                    self.set_vex_pp(d, p2 & 3);
                    d.mflags |= MFlags::HAS_VEX;
                    *pos += 3;
                    return self.peek(*pos).is_some();
                }
                _ => return true,
            }
            *pos += 1;
        }
    }

    /// C4/C5/62 open a VEX or EVEX prefix in 64-bit mode always, and in
    /// 16/32-bit mode only when the following byte has both top bits set
    /// (otherwise they are les/lds/bound).
    fn vex_possible(&self, pos: usize) -> bool {
        if self.word_size == 64 {
            return true;
        }
        matches!(self.peek(pos + 1), Some(b) if b & 0xC0 == 0xC0)
    }

    fn set_vex_pp(&self, d: &mut Decoded, pp: u8) {
        let byte = match pp {
            1 => 0x66,
            2 => 0xF2,
            3 => 0xF3,
            _ => 0,
        };
        if byte != 0 {
            Self::store_prefix(d, P_TYPE, byte);
        }
    }

    // --- step 2: map walk -------------------------------------------------

    fn find_map_entry(&self, d: &mut Decoded, pos: &mut usize) -> bool {
        let mut table = if d.prefixes[P_REX] & RX_XOP != 0 {
            match opcodes::start_page_xop(d.prefixes[P_VEX] & 0x1F) {
                Some(t) => t,
                None => {
                    d.errors |= ErrorFlags::RESERVED_BITS;
                    opcodes::T_MAP0
                }
            }
        } else if d.mflags.contains(MFlags::HAS_VEX) {
            match opcodes::start_page_vex(d.prefixes[P_VEX] & 0x1F) {
                Some(t) => t,
                None => {
                    d.errors |= ErrorFlags::RESERVED_BITS;
                    opcodes::T_MAP0
                }
            }
        } else {
            opcodes::T_MAP0
        };

        let mut index = match self.next(pos) {
            Some(b) => b as usize,
            None => return false,
        };
        d.opcode_byte = index as u8;

        loop {
            let tab = opcodes::table(table);
            let entry = tab.get(index).unwrap_or(&ILL);
            if !entry.is_link() {
                d.table = table;
                d.index = index as u16;
                d.entry = tab.get(index).unwrap_or(&ILL);
                return true;
            }
            let link = entry.link;
            index = match link.kind {
                LinkKind::NextByte => {
                    let b = match self.next(pos) {
                        Some(b) => b,
                        None => return false,
                    };
                    d.opcode_byte = b;
                    table = link.table;
                    b as usize
                }
                kind => {
                    table = link.table;
                    match self.link_index(d, *pos, kind, entry) {
                        Some(i) => i,
                        None => return false,
                    }
                }
            };
        }
    }

    fn link_index(&self, d: &Decoded, pos: usize, kind: LinkKind, entry: &Op) -> Option<usize> {
        let modrm = || self.peek(pos);
        Some(match kind {
            LinkKind::Reg => (modrm()? >> 3 & 7) as usize,
            LinkKind::Mod => {
                if modrm()? >> 6 == 3 {
                    1
                } else {
                    0
                }
            }
            LinkKind::ModReg => {
                let m = modrm()?;
                let base = if m >> 6 == 3 { 8 } else { 0 };
                base + (m >> 3 & 7) as usize
            }
            LinkKind::Rm => (modrm()? & 7) as usize,
            LinkKind::TrailingImm => {
                let at = self.trailing_imm_offset(pos, entry)?;
                self.peek(at)? as usize
            }
            LinkKind::Mode => match self.word_size {
                16 => 0,
                32 => 1,
                _ => 2,
            },
            LinkKind::OperandSize => match self.quick_operand_size(d) {
                16 => 0,
                32 => 1,
                _ => 2,
            },
            LinkKind::PrefixClass => match d.prefixes[P_TYPE] {
                0x66 => 1,
                0xF2 => 2,
                0xF3 => 3,
                _ => 0,
            },
            LinkKind::AddressSize => match self.quick_address_size(d) {
                16 => 0,
                32 => 1,
                _ => 2,
            },
            LinkKind::VexL => {
                if !d.mflags.contains(MFlags::HAS_VEX) {
                    0
                } else {
                    (d.ll() + 1).min(4) as usize
                }
            }
            LinkKind::VexW => {
                if d.vex_w() {
                    1
                } else {
                    0
                }
            }
            LinkKind::VectorSize => d.ll().min(3) as usize,
            LinkKind::VexKind => {
                if d.has_evex() {
                    2
                } else if d.mflags.contains(MFlags::HAS_VEX) {
                    1
                } else {
                    0
                }
            }
            LinkKind::MvexE => 0,
            LinkKind::Dialect => self.dialect.min(2) as usize,
            LinkKind::ByteAfterPrefixes => self.peek(d.opcode_start1 as usize)? as usize,
            LinkKind::None | LinkKind::NextByte => unreachable!(),
        })
    }

    /// Where the trailing selector byte sits: after mod/reg/rm, SIB and
    /// the displacement implied by the linking entry's format.
    fn trailing_imm_offset(&self, pos: usize, entry: &Op) -> Option<usize> {
        if !entry.has_modrm() {
            return Some(pos);
        }
        let m = self.peek(pos)?;
        let md = m >> 6;
        let rm = m & 7;
        let mut at = pos + 1;
        if md != 3 && self.quick_address_size_raw() != 16 && rm == 4 {
            at += 1; // SIB
        }
        at += match (md, rm) {
            (0, 5) if self.quick_address_size_raw() != 16 => 4,
            (0, 6) if self.quick_address_size_raw() == 16 => 2,
            (1, _) => 1,
            (2, _) => {
                if self.quick_address_size_raw() == 16 {
                    2
                } else {
                    4
                }
            }
            _ => 0,
        };
        Some(at)
    }

    fn quick_operand_size(&self, d: &Decoded) -> u32 {
        if d.vex_w() {
            return 64;
        }
        let has_66 = d.prefixes[P_OSIZE] != 0;
        match self.word_size {
            16 => {
                if has_66 {
                    32
                } else {
                    16
                }
            }
            _ => {
                if has_66 {
                    16
                } else {
                    32
                }
            }
        }
    }

    fn quick_address_size(&self, d: &Decoded) -> u32 {
        let has_67 = d.prefixes[P_ASIZE] != 0;
        match self.word_size {
            16 => {
                if has_67 {
                    32
                } else {
                    16
                }
            }
            32 => {
                if has_67 {
                    16
                } else {
                    32
                }
            }
            _ => {
                if has_67 {
                    32
                } else {
                    64
                }
            }
        }
    }

    fn quick_address_size_raw(&self) -> u32 {
        self.word_size
    }

    // --- step 3: sizes ----------------------------------------------------

    fn resolve_sizes(&self, d: &mut Decoded) {
        d.address_size = self.quick_address_size(d);

        let allowed = d.entry.prefixes;
        let mut size = if self.word_size == 16 { 16 } else { 32 };
        if d.prefixes[P_OSIZE] != 0 && allowed & 0x100 != 0 {
            size = if size == 16 { 32 } else { 16 };
        }
        if d.vex_w() && allowed & 0x1000 != 0 {
            size = 64;
        }
        d.operand_size = size;
    }

    // --- step 4: mod/reg/rm, SIB, displacement, immediate -----------------

    fn find_operands(&self, d: &mut Decoded, pos: &mut usize) -> bool {
        let rex = d.prefixes[P_REX];

        if d.entry.has_modrm() {
            let m = match self.next(pos) {
                Some(m) => m,
                None => return false,
            };
            d.modrm = m;
            d.mflags |= MFlags::HAS_MODRM;
            d.mod_bits = m >> 6;
            d.reg_bits = (m >> 3 & 7) | if rex & RX_R != 0 { 8 } else { 0 };
            d.rm_bits = m & 7;

            if d.mod_bits == 3 {
                d.rm_bits |= if rex & RX_B != 0 { 8 } else { 0 };
            } else {
                d.mflags |= MFlags::HAS_MEMORY;
                if d.address_size == 16 {
                    if !self.walk_mem16(d, pos) {
                        return false;
                    }
                } else if !self.walk_mem(d, pos) {
                    return false;
                }
            }
        }

        // Immediate field.
        let imm = match d.entry.imm_code() {
            0x20 => 2,
            0x40 => 1,
            0x60 => 3,
            0x80 => {
                if d.operand_size == 16 {
                    2
                } else {
                    4
                }
            }
            0x100 => d.operand_size / 8,
            0x200 => (if d.operand_size == 16 { 2 } else { 4 }) + 2,
            0x400 => {
                // Direct memory operand replaces the mod/reg/rm walk.
                d.mflags |= MFlags::HAS_MEMORY;
                d.address_field = *pos as u32;
                d.address_field_size = d.address_size / 8;
                *pos += d.address_field_size as usize;
                if *pos > self.bytes.len() {
                    return false;
                }
                0
            }
            _ => 0,
        };
        if imm > 0 {
            d.immediate_field = *pos as u32;
            d.immediate_field_size = imm;
            *pos += imm as usize;
            if *pos > self.bytes.len() {
                return false;
            }
        }
        true
    }

    fn walk_mem16(&self, d: &mut Decoded, pos: &mut usize) -> bool {
        // Base and index register numbers for the eight 16-bit forms.
        const BASES: [u8; 8] = [3 + 1, 3 + 1, 5 + 1, 5 + 1, 0, 0, 5 + 1, 3 + 1];
        const INDEXES: [u8; 8] = [6 + 1, 7 + 1, 6 + 1, 7 + 1, 6 + 1, 7 + 1, 0, 0];
        let rm = d.rm_bits as usize;
        let mut disp = match d.mod_bits {
            1 => 1,
            2 => 2,
            _ => 0,
        };
        if d.mod_bits == 0 && rm == 6 {
            disp = 2; // direct 16-bit address
        } else {
            d.base_reg = BASES[rm];
            d.index_reg = INDEXES[rm];
        }
        self.take_displacement(d, pos, disp)
    }

    fn walk_mem(&self, d: &mut Decoded, pos: &mut usize) -> bool {
        let rex = d.prefixes[P_REX];
        let bbit = if rex & RX_B != 0 { 8 } else { 0 };
        let xbit = if rex & RX_X != 0 { 8 } else { 0 };
        let mut disp: u32 = match d.mod_bits {
            1 => 1,
            2 => 4,
            _ => 0,
        };

        if d.rm_bits == 4 {
            let sib = match self.next(pos) {
                Some(s) => s,
                None => return false,
            };
            d.mflags |= MFlags::HAS_SIB;
            d.scale = sib >> 6;
            let index = (sib >> 3 & 7) | xbit;
            if index != 4 || xbit != 0 {
                d.index_reg = index + 1;
            }
            let base = sib & 7;
            if base == 5 && d.mod_bits == 0 {
                disp = 4; // no base, 32-bit displacement
            } else {
                d.base_reg = (base | bbit) + 1;
            }
        } else if d.rm_bits == 5 && d.mod_bits == 0 {
            disp = 4;
            if self.word_size == 64 {
                d.mflags |= MFlags::RIP_RELATIVE;
            }
        } else {
            d.base_reg = (d.rm_bits | bbit) + 1;
        }
        self.take_displacement(d, pos, disp)
    }

    fn take_displacement(&self, d: &mut Decoded, pos: &mut usize, size: u32) -> bool {
        if size > 0 {
            d.address_field = *pos as u32;
            d.address_field_size = size;
            *pos += size as usize;
            if *pos > self.bytes.len() {
                return false;
            }
        }
        true
    }

    // --- step 5: operand descriptors --------------------------------------

    fn find_operand_types(&self, d: &mut Decoded) {
        let e = d.entry;
        let shape = e.shape();
        let vex = d.mflags.contains(MFlags::HAS_VEX);
        let mut ops = [e.dest, e.src1, e.src2, e.src3, 0u32];

        match shape {
            3 => {
                // Register encoded in the opcode's low bits.
                for op in ops.iter_mut() {
                    if *op != 0 && opcodes::is_gp(*op) {
                        *op |= OP_SHORT_REG;
                        break;
                    }
                }
            }
            0x11 => {
                for op in ops.iter_mut() {
                    if *op != 0 && !opcodes::is_constant(*op) && *op & 0xFF != 0xaf && *op & 0xFF != 0xa2 {
                        *op |= OP_RM;
                        break;
                    }
                }
            }
            0x12 => {
                if ops[0] != 0 {
                    ops[0] |= OP_REG;
                }
                if ops[1] != 0 {
                    ops[1] |= OP_RM;
                }
            }
            0x13 => {
                if ops[0] != 0 {
                    ops[0] |= OP_RM;
                }
                if ops[1] != 0 {
                    ops[1] |= OP_REG;
                }
            }
            0x18 => {
                if vex {
                    ops[0] |= OP_VVVV;
                    ops[1] |= OP_RM;
                } else {
                    ops[0] |= OP_RM;
                    ops[1] = 0;
                }
            }
            0x19 => {
                if vex {
                    ops[0] |= OP_REG;
                    ops[1] |= OP_VVVV;
                    ops[2] |= OP_RM;
                } else {
                    ops[0] |= OP_REG;
                    ops[1] = if ops[2] != 0 { ops[2] | OP_RM } else { 0 };
                    ops[2] = 0;
                }
            }
            0x1A => {
                if vex {
                    ops[0] |= OP_RM;
                    ops[1] |= OP_VVVV;
                    ops[2] |= OP_REG;
                } else {
                    ops[0] |= OP_RM;
                    ops[1] = if ops[2] != 0 { ops[2] | OP_REG } else { 0 };
                    ops[2] = 0;
                }
            }
            0x1B => {
                ops[0] |= OP_REG;
                ops[1] |= OP_RM;
                if vex {
                    ops[2] |= OP_VVVV;
                } else {
                    ops[2] = 0;
                }
            }
            0x1C => {
                ops[0] |= OP_REG;
                ops[1] |= OP_VVVV;
                ops[2] |= OP_RM;
                ops[3] |= OP_IMM_REG;
            }
            0x1D => {
                ops[0] |= OP_REG;
                ops[1] |= OP_IMM_REG;
                ops[2] |= OP_RM;
                ops[3] |= OP_VVVV;
            }
            0x1E => {
                ops[0] |= OP_REG;
                ops[1] |= OP_RM;
                if vex && ops[2] != 0 {
                    ops[2] |= OP_VVVV;
                }
            }
            _ => {}
        }

        // Constants and jump targets come from the immediate field; the
        // direct memory form tags its non-accumulator integer operand.
        let mut imm_seen = false;
        for op in ops.iter_mut() {
            if *op == 0 {
                continue;
            }
            if opcodes::is_constant(*op) || opcodes::is_jump_target(*op) {
                *op |= if imm_seen { OP_IMM2 } else { OP_IMM };
                imm_seen = true;
            } else if e.imm_code() == 0x400 && *op & OP_PLACE == 0 && (*op & 0xFF) < 0x10 {
                *op |= OP_DIRECT_MEM;
            }
        }

        d.operands = ops;
    }

    // --- step 6: EVEX post-processing -------------------------------------

    fn find_broadcast(&self, d: &mut Decoded) {
        if !d.has_evex() {
            return;
        }
        let rule = d.entry.evex;
        let bcast = d.esss & 1 != 0;
        let scalar = rule & 8 != 0;

        // The memory operand's descriptor drives the multiplier.
        let mut mem_type = 0;
        for &op in d.operands.iter() {
            if op & OP_PLACE == OP_RM {
                mem_type = op;
                break;
            }
        }
        let elem = opcodes::element_bytes(mem_type, d.prefixes[P_TYPE], d.vex_w());

        d.offset_multiplier = if scalar || rule >> 12 == 1 {
            elem
        } else if bcast && rule & 1 != 0 {
            elem
        } else {
            let v = opcodes::vector_bytes(mem_type, d.prefixes[P_TYPE] == 0x66, true, d.ll());
            if v == 0 {
                elem
            } else {
                v
            }
        };
        if d.offset_multiplier == 0 {
            d.offset_multiplier = 1;
        }

        // Reserved-bit checks on z, b and the mask field.
        if bcast && rule & 0x0F == 0 {
            d.errors |= ErrorFlags::RESERVED_BITS;
        }
        if d.kreg != 0 && rule & 0xF0 == 0 {
            d.errors |= ErrorFlags::RESERVED_BITS;
        }
        if d.esss & 8 != 0 && d.kreg == 0 {
            // Zeroing without a mask register.
            d.errors |= ErrorFlags::RESERVED_BITS;
        }
    }

    // --- step 7: relocations ----------------------------------------------

    fn find_relocations(&self, d: &mut Decoded, relocations: &RelocationIndex) {
        if d.address_field_size > 0 {
            let i = relocations.find_in_range(
                self.section,
                d.address_field,
                d.address_field + d.address_field_size,
            );
            if i != 0 {
                d.address_relocation = i;
                let r = &relocations.list[i];
                if r.offset + r.size > d.address_field + d.address_field_size {
                    d.errors |= ErrorFlags::RELOCATION_MISPLACED;
                }
            }
        }
        if d.immediate_field_size > 0 {
            let i = relocations.find_in_range(
                self.section,
                d.immediate_field,
                d.immediate_field + d.immediate_field_size,
            );
            if i != 0 {
                d.immediate_relocation = i;
            }
        }
        // A relocation inside the opcode or mod/reg/rm bytes cannot be
        // applied by any assembler.
        let opcode_end = if d.address_field_size > 0 {
            d.address_field
        } else if d.immediate_field_size > 0 {
            d.immediate_field
        } else {
            d.end
        };
        if relocations.find_in_range(self.section, d.start, opcode_end.min(d.opcode_start2 + 1)) != 0
        {
            d.errors |= ErrorFlags::RELOCATION_MISPLACED;
        }
    }

    // --- step 8: warnings and errors --------------------------------------

    fn find_warnings(&self, d: &mut Decoded) {
        let allowed = d.entry.prefixes;

        if d.conflicts.iter().any(|&c| c != 0) {
            d.warnings |= WarningFlags::PREFIX_CONFLICT;
        }
        if d.prefixes[P_OSIZE] != 0 && allowed & 0x80 != 0 && self.word_size == 32 {
            d.warnings |= WarningFlags::OPSIZE_ON_JUMP;
        }
        if d.prefixes[P_ASIZE] != 0 && allowed & 2 != 0 {
            d.warnings |= WarningFlags::ADDRSIZE_ON_STACK;
        }
        if d.prefixes[P_OSIZE] != 0 && allowed & 0x380 == 0 && !d.entry.is_illegal() {
            d.warnings |= WarningFlags::REDUNDANT_PREFIX;
        }
        if (d.prefixes[P_REP] == 0xF2 || d.prefixes[P_REP] == 0xF3)
            && allowed & 0xE60 == 0
            && !d.entry.is_illegal()
        {
            d.warnings |= WarningFlags::REP_IGNORED;
        }
        if d.entry.format & 0x4000 != 0 && !d.entry.name.is_empty() {
            d.warnings |= WarningFlags::UNDOCUMENTED;
        }
        if d.entry.options & 0x80 != 0 {
            d.warnings |= WarningFlags::SHORTER_EXISTS;
        }
    }

    fn find_errors(&self, d: &mut Decoded) {
        let e = d.entry;
        let allowed = e.prefixes;

        if e.is_illegal() {
            d.errors |= ErrorFlags::ILLEGAL;
        }
        if e.iset & 0x4000 != 0 && self.word_size != 64 {
            d.errors |= ErrorFlags::WRONG_MODE;
        }
        if e.iset & 0x8000 != 0 && self.word_size == 64 {
            d.errors |= ErrorFlags::WRONG_MODE;
        }
        if d.prefixes[P_LOCK] != 0 && allowed & 0x10 == 0 {
            d.errors |= ErrorFlags::LOCK_ILLEGAL;
        }
        if d.prefixes[P_LOCK] != 0 && !d.has_memory() {
            d.errors |= ErrorFlags::LOCK_ILLEGAL;
        }
        if allowed & 0x20000 != 0 && !d.mflags.contains(MFlags::HAS_VEX) {
            d.errors |= ErrorFlags::ILLEGAL;
        }
        if d.mflags.contains(MFlags::HAS_VEX) && allowed & 0x30000 == 0 {
            d.errors |= ErrorFlags::PREFIX_ILLEGAL;
        }
        if d.has_evex() && allowed & 0x800000 == 0 {
            d.errors |= ErrorFlags::PREFIX_ILLEGAL;
        }
        if d.esss & 6 != 0
            && d.mflags.contains(MFlags::HAS_VEX)
            && allowed & 0x40000 == 0
            && allowed & 0x100000 == 0
            && !d.has_evex()
        {
            d.errors |= ErrorFlags::RESERVED_BITS;
        }
        if d.prefixes[P_OSIZE] != 0 && allowed & 0x80 != 0 && self.word_size == 64 {
            d.errors |= ErrorFlags::PREFIX_ILLEGAL;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::RelocationIndex;

    fn decode64(bytes: &[u8]) -> Decoded {
        let relocs = RelocationIndex::new();
        Decoder::new(bytes, 64, 1, 0).decode(0, &relocs)
    }

    fn decode32(bytes: &[u8]) -> Decoded {
        let relocs = RelocationIndex::new();
        Decoder::new(bytes, 32, 1, 0).decode(0, &relocs)
    }

    fn decode16(bytes: &[u8]) -> Decoded {
        let relocs = RelocationIndex::new();
        Decoder::new(bytes, 16, 1, 0).decode(0, &relocs)
    }

    #[test]
    fn nop_is_one_byte() {
        let d = decode64(&[0x90]);
        assert_eq!(d.entry.name, "nop");
        assert_eq!(d.len(), 1);
        assert!(d.warnings.is_empty());
        assert!(d.errors.is_empty());
    }

    #[test]
    fn mov_rbx_rax() {
        let d = decode64(&[0x48, 0x89, 0xC3]);
        assert_eq!(d.entry.name, "mov");
        assert_eq!(d.len(), 3);
        assert_eq!(d.operand_size, 64);
        assert_eq!(d.mod_bits, 3);
        assert_eq!(d.reg_bits, 0); // rax
        assert_eq!(d.rm_bits, 3); // rbx
        assert!(d.errors.is_empty());
        // r/m destination, register source
        assert_eq!(d.operands[0] & OP_PLACE, OP_RM);
        assert_eq!(d.operands[1] & OP_PLACE, OP_REG);
    }

    #[test]
    fn call_rel32() {
        let d = decode64(&[0xE8, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(d.entry.name, "call");
        assert_eq!(d.len(), 5);
        assert_eq!(d.immediate_field, 1);
        assert_eq!(d.immediate_field_size, 4);
        assert_eq!(d.immediate(&[0xE8, 0x00, 0x00, 0x00, 0x00]), 0);
    }

    #[test]
    fn jmp_through_table() {
        // jmp [rax*4 + disp32]
        let bytes = [0xFF, 0x24, 0x85, 0x40, 0x00, 0x00, 0x00];
        let d = decode64(&bytes);
        assert_eq!(d.entry.name, "jmp");
        assert!(d.is_unconditional());
        assert!(d.mflags.contains(MFlags::HAS_SIB));
        assert_eq!(d.base_reg, 0);
        assert_eq!(d.index_reg, 1); // rax
        assert_eq!(d.scale, 2);
        assert_eq!(d.address_field, 3);
        assert_eq!(d.address_field_size, 4);
        assert_eq!(d.displacement(&bytes), 0x40);
        assert_eq!(d.len(), 7);
    }

    #[test]
    fn evex_vmovups_zmm() {
        let bytes = [0x62, 0xF1, 0x7C, 0x48, 0x10, 0x04, 0x25, 0x40, 0x00, 0x00, 0x00];
        let d = decode64(&bytes);
        assert_eq!(d.entry.name, "movups");
        assert!(d.has_evex());
        assert_eq!(d.ll(), 2); // ZMM
        assert_eq!(d.offset_multiplier, 64);
        assert_eq!(d.kreg, 0);
        assert_eq!(d.esss & 1, 0); // no broadcast
        assert_eq!(d.displacement(&bytes), 0x40);
        assert_eq!(d.len(), 11);
        assert!(d.errors.is_empty());
    }

    #[test]
    fn ud2_ends_block() {
        let d = decode64(&[0x0F, 0x0B]);
        assert_eq!(d.entry.name, "ud2");
        assert!(d.is_unconditional());
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn truncated_at_section_end() {
        let d = decode64(&[0x48, 0x89]);
        assert!(d.errors.contains(ErrorFlags::TRUNCATED));
        assert!(d.len() >= 1);
        assert!(d.end as usize <= 2);
    }

    #[test]
    fn prefix_conflict_is_warned() {
        let d = decode64(&[0xF2, 0xF3, 0x90]);
        assert!(d.warnings.contains(WarningFlags::PREFIX_CONFLICT));
    }

    #[test]
    fn rip_relative_lea() {
        let bytes = [0x48, 0x8D, 0x05, 0x10, 0x00, 0x00, 0x00];
        let d = decode64(&bytes);
        assert_eq!(d.entry.name, "lea");
        assert!(d.mflags.contains(MFlags::RIP_RELATIVE));
        assert_eq!(d.displacement(&bytes), 0x10);
    }

    #[test]
    fn mode16_addressing() {
        // mov ax, [bp+2]
        let d = decode16(&[0x8B, 0x46, 0x02]);
        assert_eq!(d.entry.name, "mov");
        assert_eq!(d.operand_size, 16);
        assert_eq!(d.base_reg, 6); // bp + 1
        assert_eq!(d.index_reg, 0);
        assert_eq!(d.address_field_size, 1);
    }

    #[test]
    fn group_dispatch_by_reg() {
        // not rbx = F7 /2
        let d = decode64(&[0x48, 0xF7, 0xD3]);
        assert_eq!(d.entry.name, "not");
        // neg rbx = F7 /3
        let d = decode64(&[0x48, 0xF7, 0xDB]);
        assert_eq!(d.entry.name, "neg");
    }

    #[test]
    fn condition_codes_from_opcode_byte() {
        let d = decode64(&[0x0F, 0x84, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(d.entry.name, "j");
        assert_eq!(opcodes::cc_name(d.opcode_byte & 0x0F), "e");
        assert_eq!(d.len(), 6);
    }

    #[test]
    fn vex2_encoded_xorps() {
        // vxorps xmm0, xmm1, xmm2 = C5 F0 57 C2
        let d = decode64(&[0xC5, 0xF0, 0x57, 0xC2]);
        assert_eq!(d.entry.name, "xor");
        assert!(d.mflags.contains(MFlags::HAS_VEX));
        assert_eq!(d.vreg, 1); // xmm1
        assert_eq!(d.operands[1] & OP_PLACE, OP_VVVV);
        assert!(d.errors.is_empty());
    }

    #[test]
    fn c5_in_32bit_mode_is_lds() {
        // C5 06: modrm 06 = mod 0, so this is lds, not VEX.
        let d = decode32(&[0xC5, 0x06]);
        assert_eq!(d.entry.name, "lds");
    }

    #[test]
    fn mvex_is_reported_unsupported() {
        // 62 with P1 bit 2 clear would be an MVEX (Knights Corner) prefix.
        let d = decode64(&[0x62, 0xF1, 0x78, 0x48, 0x10]);
        assert!(d.errors.contains(ErrorFlags::UNSUPPORTED_ISA));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn lock_on_non_lockable_is_error() {
        let d = decode64(&[0xF0, 0x90]);
        assert!(d.errors.contains(ErrorFlags::LOCK_ILLEGAL));
    }

    #[test]
    fn decode_is_pure() {
        let bytes = [0x48, 0x89, 0xC3];
        let relocs = RelocationIndex::new();
        let dec = Decoder::new(&bytes, 64, 1, 0);
        let a = dec.decode(0, &relocs);
        let b = dec.decode(0, &relocs);
        assert_eq!(a.entry.name, b.entry.name);
        assert_eq!(a.end, b.end);
        assert_eq!(a.operands, b.operands);
        assert_eq!(a.errors, b.errors);
        assert_eq!(a.warnings, b.warnings);
    }

    #[test]
    fn push_uses_default_64bit_operand() {
        let d = decode64(&[0x55]);
        assert_eq!(d.entry.name, "push");
        assert_eq!(d.operands[0] & OP_PLACE, OP_SHORT_REG);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn x87_dispatch() {
        // fadd st, st(1) = D8 C1
        let d = decode64(&[0xD8, 0xC1]);
        assert_eq!(d.entry.name, "fadd");
        // fld1 = D9 E8
        let d = decode64(&[0xD9, 0xE8]);
        assert_eq!(d.entry.name, "fld1");
        // fnstsw ax = DF E0
        let d = decode64(&[0xDF, 0xE0]);
        assert_eq!(d.entry.name, "fnstsw");
    }
}
