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

//! x86/x86-64 instruction decoder and symbolic disassembler.
//!
//! The caller describes a program as sections, symbols and relocations,
//! then runs the two-pass analysis and drains an assembler listing in
//! MASM, NASM or GAS syntax:
//!
//! ```
//! use x86dis::{Dialect, Disassembler, SECTION_CODE};
//!
//! let code = [0x48, 0x89, 0xC3, 0xC3]; // mov rbx, rax; ret
//! let mut dis = Disassembler::new(Dialect::Nasm);
//! dis.init(0, 0);
//! dis.add_section(&code, 4, 4, 0x1000, SECTION_CODE, 4, 64, "text");
//! dis.go().unwrap();
//! assert!(dis.output().contains("mov"));
//! ```

#[macro_use]
extern crate bitflags;

pub mod decoder;
pub mod disasm;
pub mod errors;
pub mod format;
pub mod opcodes;
pub mod sections;
pub mod symbols;

pub use crate::disasm::Disassembler;
pub use crate::errors::{DisasmError, DisasmResult, ErrorFlags, WarningFlags};
pub use crate::format::Dialect;
pub use crate::sections::{
    RELOC_APPLIED, RELOC_DIRECT, RELOC_FAR, RELOC_GOT, RELOC_GOT_SELFREL, RELOC_IFUNC_PLT,
    RELOC_IMGREL, RELOC_PLT, RELOC_PLT_SELFREL, RELOC_REFPOINT, RELOC_SEGREL, RELOC_SELFREL,
    SECTION_BSS, SECTION_CODE, SECTION_COMMUNAL, SECTION_CONST, SECTION_DATA, SECTION_DEBUG,
    SECTION_EXCEPTION, SECTION_GROUP, SECTION_UNKNOWN,
};
pub use crate::symbols::{
    SCOPE_COMMUNAL, SCOPE_EXTERNAL, SCOPE_FILE_LOCAL, SCOPE_FUNCTION_LOCAL, SCOPE_PUBLIC,
    SCOPE_WEAK_PUBLIC,
};
