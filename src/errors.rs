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

use thiserror::Error;

pub type DisasmResult<T> = std::result::Result<T, DisasmError>;

/// Errors reported to the caller from `go()`.
///
/// Only gross input invariants surface here. Anything discovered while
/// decoding is recovered locally and reported through the per-instruction
/// flag sets below.
#[derive(Debug, Error)]
pub enum DisasmError {
    #[error("section index {section} out of range (have {count} sections)")]
    SectionOutOfRange { section: i32, count: usize },

    #[error("section {section} has initialized size {init} larger than total size {total}")]
    BadSectionSize { section: i32, init: u32, total: u32 },

    #[error("relocation at section {section} offset 0x{offset:x} lies outside the section")]
    RelocationOutsideSection { section: i32, offset: u32 },

    #[error("relocation at section {section} offset 0x{offset:x} has no target symbol (old index {old_index})")]
    RelocationWithoutTarget {
        section: i32,
        offset: u32,
        old_index: u32,
    },

    #[error("unsupported word size {0}, must be 16, 32 or 64")]
    BadWordSize(u32),
}

bitflags! {
    /// Conditions that prevent execution or are unlikely to be intentional.
    /// Additive over one decoded instruction; never halt the analysis.
    pub struct ErrorFlags: u32 {
        /// Byte sequence matches no defined opcode.
        const ILLEGAL            = 0x0001;
        /// Instruction continues past the initialized end of the section.
        const TRUNCATED          = 0x0002;
        /// Reserved VEX/EVEX bit set.
        const RESERVED_BITS      = 0x0004;
        /// Instruction set not supported (MVEX / Knights Corner, retired AMD).
        const UNSUPPORTED_ISA    = 0x0008;
        /// Opcode is 64-bit-only but mode is 16/32, or vice versa.
        const WRONG_MODE         = 0x0010;
        /// LOCK prefix on an instruction that does not allow it.
        const LOCK_ILLEGAL       = 0x0020;
        /// Required VEX/EVEX prefix missing, or prefix where none allowed.
        const PREFIX_ILLEGAL     = 0x0040;
        /// Relocation does not line up with a displacement or immediate field.
        const RELOCATION_MISPLACED = 0x0080;
        /// Relocation target symbol cannot be resolved.
        const MISSING_TARGET     = 0x0100;
        /// Self-relative addend inconsistent with the instruction length.
        const ADDEND_MISMATCH    = 0x0200;
    }
}

bitflags! {
    /// Conditions that could be intentional but deserve a comment.
    pub struct WarningFlags: u32 {
        /// More than one prefix in the same category.
        const PREFIX_CONFLICT    = 0x0001;
        /// Prefix has no effect on this opcode.
        const REDUNDANT_PREFIX   = 0x0002;
        /// 66 prefix on a jump truncates EIP in 32-bit mode.
        const OPSIZE_ON_JUMP     = 0x0004;
        /// Address-size prefix truncates the stack pointer on a stack op.
        const ADDRSIZE_ON_STACK  = 0x0008;
        /// REP/REPNE prefix on an instruction that ignores it.
        const REP_IGNORED        = 0x0010;
        /// Opcode is undocumented.
        const UNDOCUMENTED       = 0x0020;
        /// A shorter encoding of the same instruction exists.
        const SHORTER_EXISTS     = 0x0040;
        /// Vector memory operand not aligned as required.
        const MISALIGNED_VECTOR  = 0x0080;
        /// Jump from outside into the middle of a function.
        const JUMP_INTO_FUNCTION = 0x0100;
        /// Code follows an unconditional branch with no label in between.
        const CODE_AFTER_JUMP    = 0x0200;
        /// Region could not be firmly classified as code or data.
        const DUBIOUS_CODE       = 0x0400;
        /// Symbol name contained illegal characters and was rewritten.
        const NAME_SANITIZED     = 0x0800;
        /// A label was synthesized where the input supplied no symbol.
        const SYNTHETIC_LABEL    = 0x1000;
        /// Segment register use without a matching assume directive.
        const ASSUME_MISSING     = 0x2000;
    }
}

/// Comment texts for error flags, in bit order.
pub static ERROR_TEXTS: &[(ErrorFlags, &str)] = &[
    (ErrorFlags::ILLEGAL, "Error: illegal opcode"),
    (ErrorFlags::TRUNCATED, "Error: instruction truncated at end of section"),
    (ErrorFlags::RESERVED_BITS, "Error: reserved prefix bits set"),
    (ErrorFlags::UNSUPPORTED_ISA, "Error: unsupported instruction set"),
    (ErrorFlags::WRONG_MODE, "Error: not available in this mode"),
    (ErrorFlags::LOCK_ILLEGAL, "Error: lock prefix not allowed here"),
    (ErrorFlags::PREFIX_ILLEGAL, "Error: illegal prefix"),
    (ErrorFlags::RELOCATION_MISPLACED, "Error: misplaced relocation"),
    (ErrorFlags::MISSING_TARGET, "Error: relocation target not found"),
    (ErrorFlags::ADDEND_MISMATCH, "Error: inline address does not match relocation addend"),
];

/// Comment texts for warning flags, in bit order.
pub static WARNING_TEXTS: &[(WarningFlags, &str)] = &[
    (WarningFlags::PREFIX_CONFLICT, "Note: conflicting prefixes"),
    (WarningFlags::REDUNDANT_PREFIX, "Note: redundant prefix"),
    (WarningFlags::OPSIZE_ON_JUMP, "Note: operand size prefix on jump"),
    (WarningFlags::ADDRSIZE_ON_STACK, "Note: address size prefix on stack operation"),
    (WarningFlags::REP_IGNORED, "Note: repeat prefix has no effect"),
    (WarningFlags::UNDOCUMENTED, "Note: undocumented opcode"),
    (WarningFlags::SHORTER_EXISTS, "Note: a shorter encoding exists"),
    (WarningFlags::MISALIGNED_VECTOR, "Note: vector operand may be misaligned"),
    (WarningFlags::JUMP_INTO_FUNCTION, "Note: jump into middle of function"),
    (WarningFlags::CODE_AFTER_JUMP, "Note: unreachable code after unconditional jump"),
    (WarningFlags::DUBIOUS_CODE, "Note: this may be data, not code"),
    (WarningFlags::NAME_SANITIZED, "Note: symbol name was sanitized"),
    (WarningFlags::SYNTHETIC_LABEL, "Note: label inserted"),
    (WarningFlags::ASSUME_MISSING, "Note: no assume for this segment register"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_additive() {
        let mut e = ErrorFlags::empty();
        e |= ErrorFlags::ILLEGAL;
        e |= ErrorFlags::TRUNCATED;
        assert!(e.contains(ErrorFlags::ILLEGAL));
        assert!(e.contains(ErrorFlags::TRUNCATED));
        assert!(!e.contains(ErrorFlags::WRONG_MODE));
    }

    #[test]
    fn every_flag_has_a_text() {
        for &(flag, text) in ERROR_TEXTS {
            assert_eq!(flag.bits().count_ones(), 1);
            assert!(text.starts_with("Error:"));
        }
        for &(flag, text) in WARNING_TEXTS {
            assert_eq!(flag.bits().count_ones(), 1);
            assert!(text.starts_with("Note:"));
        }
    }
}
