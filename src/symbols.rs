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

///
/// The symbol table.
///
/// Symbols live in a list sorted by (section, offset). Callers refer to
/// symbols by the sparse "old index" they assigned when adding them;
/// relocations use old indices too. Internally symbols get dense "new"
/// indices that move when the list re-sorts, so a translation table maps
/// old to new after every mutation. Index 0 of the list is a dummy entry
/// meaning "no symbol".
///

// Symbol scope values. WRITTEN is OR'ed in by pass 2.
pub const SCOPE_INACCESSIBLE: u32 = 0;
pub const SCOPE_FUNCTION_LOCAL: u32 = 1;
pub const SCOPE_FILE_LOCAL: u32 = 2;
pub const SCOPE_PUBLIC: u32 = 4;
pub const SCOPE_WEAK_PUBLIC: u32 = 8;
pub const SCOPE_COMMUNAL: u32 = 0x10;
pub const SCOPE_EXTERNAL: u32 = 0x20;
pub const SCOPE_WRITTEN: u32 = 0x100;

#[derive(Clone, Default, Debug)]
pub struct Symbol {
    pub section: i32, // 0 = external, -1 = absolute, -16 = image relative
    pub offset: u32,
    pub size: u32, // 0 = unknown
    pub stype: u32, // operand-type taxonomy from opcodes.rs, 0 = unknown
    pub scope: u32,
    pub old_index: u32,
    pub name: String, // empty until assigned
    pub dll_name: String,
}

impl Symbol {
    fn key(&self) -> (i32, u32) {
        (self.section, self.offset)
    }

    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn is_public(&self) -> bool {
        self.scope & (SCOPE_PUBLIC | SCOPE_WEAK_PUBLIC | SCOPE_COMMUNAL) != 0
    }

    pub fn is_external(&self) -> bool {
        self.scope & SCOPE_EXTERNAL != 0
    }
}

pub struct SymbolTable {
    list: Vec<Symbol>, // sorted by (section, offset); [0] is the dummy
    translate: Vec<u32>, // old index -> new index, 0 = absent
    old_num: u32, // highest old index seen + 1
    unnamed_num: u32, // counter behind synthesized names
    /// How many names were rewritten because of illegal characters.
    pub names_changed: u32,
    pub import_prefix: &'static str,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            list: vec![Symbol::default()],
            translate: vec![0],
            old_num: 1,
            unnamed_num: 0,
            names_changed: 0,
            import_prefix: "imp_",
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Highest old symbol number + 1.
    pub fn old_limit(&self) -> u32 {
        self.old_num
    }

    pub fn get(&self, new_index: usize) -> &Symbol {
        &self.list[new_index]
    }

    pub fn get_mut(&mut self, new_index: usize) -> &mut Symbol {
        &mut self.list[new_index]
    }

    /// Add a symbol supplied by the caller. Adding the same old index twice
    /// merges the records, preferring non-zero fields of the first.
    /// Returns the (possibly assigned) old index.
    pub fn add(
        &mut self,
        section: i32,
        offset: u32,
        size: u32,
        stype: u32,
        scope: u32,
        old_index: u32,
        name: Option<&str>,
        dll_name: Option<&str>,
    ) -> u32 {
        let old_index = if old_index == 0 {
            self.old_num
        } else {
            old_index
        };

        if let Some(existing) = self.old_to_new(old_index) {
            let sym = &mut self.list[existing];
            if sym.size == 0 {
                sym.size = size;
            }
            if sym.stype == 0 {
                sym.stype = stype;
            }
            if sym.scope == 0 {
                sym.scope = scope;
            }
            if !sym.has_name() {
                if let Some(n) = name {
                    sym.name = n.to_owned();
                }
            }
            if sym.dll_name.is_empty() {
                if let Some(d) = dll_name {
                    sym.dll_name = d.to_owned();
                }
            }
            return old_index;
        }

        let sym = Symbol {
            section,
            offset,
            size,
            stype,
            scope,
            old_index,
            name: name.unwrap_or("").to_owned(),
            dll_name: dll_name.unwrap_or("").to_owned(),
        };
        self.insert(sym);
        old_index
    }

    /// Add a symbol discovered during analysis. Allocates a fresh old index
    /// and returns the new internal index.
    pub fn new_symbol(&mut self, section: i32, offset: u32, scope: u32) -> usize {
        // Reuse an existing symbol at the same address if any.
        let (first, last, _) = self.find_by_address(section, offset);
        if first != 0 {
            // Prefer one that is not merely a segment marker.
            for i in first..=last {
                if self.list[i].stype != 0x80000000 {
                    return i;
                }
            }
            return first;
        }

        let sym = Symbol {
            section,
            offset,
            size: 0,
            stype: 0,
            scope,
            old_index: self.old_num,
            name: String::new(),
            dll_name: String::new(),
        };
        let old = sym.old_index;
        self.insert(sym);
        self.old_to_new(old).unwrap_or(0)
    }

    fn insert(&mut self, sym: Symbol) {
        let key = sym.key();
        // Insert after any existing symbols at the same address so that
        // discovery order is preserved (public first, aliases after).
        let mut pos = match self.list[1..].binary_search_by_key(&key, |s| s.key()) {
            Ok(i) | Err(i) => i + 1,
        };
        while pos < self.list.len() && self.list[pos].key() == key {
            pos += 1;
        }
        if sym.old_index >= self.old_num {
            self.old_num = sym.old_index + 1;
        }
        self.list.insert(pos, sym);
        self.update_index();
    }

    /// Rebuild the old-to-new translation table. Called after every
    /// mutation of the list order.
    fn update_index(&mut self) {
        self.translate = vec![0; self.old_num as usize];
        for (new_index, sym) in self.list.iter().enumerate().skip(1) {
            if (sym.old_index as usize) < self.translate.len() {
                self.translate[sym.old_index as usize] = new_index as u32;
            }
        }
    }

    /// Translate a caller-supplied old index to the internal index.
    pub fn old_to_new(&self, old_index: u32) -> Option<usize> {
        match self.translate.get(old_index as usize) {
            Some(&n) if n != 0 => Some(n as usize),
            _ => None,
        }
    }

    /// All symbols at exactly (section, offset): (first, last, next_after).
    /// first == 0 means none; next_after is the index of the first symbol
    /// strictly after the address, or 0 at the end of the list.
    pub fn find_by_address(&self, section: i32, offset: u32) -> (usize, usize, usize) {
        let key = (section, offset);
        let lo = self.list[1..]
            .partition_point(|s| s.key() < key)
            + 1;
        if lo >= self.list.len() || self.list[lo].key() != key {
            let next = if lo < self.list.len() { lo } else { 0 };
            return (0, 0, next);
        }
        let mut hi = lo;
        while hi + 1 < self.list.len() && self.list[hi + 1].key() == key {
            hi += 1;
        }
        let next = if hi + 1 < self.list.len() { hi + 1 } else { 0 };
        (lo, hi, next)
    }

    /// Walk all unnamed symbols and synthesize names. Import-table entries
    /// get the import prefix; everything else the numbered format.
    pub fn assign_names(&mut self) {
        for i in 1..self.list.len() {
            if self.list[i].has_name() {
                continue;
            }
            self.unnamed_num += 1;
            let name = if !self.list[i].dll_name.is_empty() {
                format!("{}{:04}", self.import_prefix, self.unnamed_num)
            } else {
                format!("?_{:04}", self.unnamed_num)
            };
            self.list[i].name = name;
        }
    }

    /// Name of a symbol by internal index, synthesizing one if needed.
    pub fn name(&mut self, new_index: usize) -> &str {
        if !self.list[new_index].has_name() {
            self.unnamed_num += 1;
            self.list[new_index].name = format!("?_{:04}", self.unnamed_num);
        }
        &self.list[new_index].name
    }

    pub fn assign_name(&mut self, new_index: usize, name: &str) {
        self.list[new_index].name = name.to_owned();
    }

    /// Replace characters that no assembler dialect accepts. The change is
    /// applied in place so definitions and references stay consistent.
    pub fn sanitize_names(&mut self) {
        for sym in self.list.iter_mut().skip(1) {
            if !sym.has_name() {
                continue;
            }
            let ok = sym
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "_$?@.".contains(c));
            if !ok {
                let fixed: String = sym
                    .name
                    .chars()
                    .map(|c| {
                        if c.is_ascii_alphanumeric() || "_$?@.".contains(c) {
                            c
                        } else {
                            '_'
                        }
                    })
                    .collect();
                sym.name = fixed;
                self.names_changed += 1;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Symbol)> {
        self.list.iter().enumerate().skip(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_translate() {
        let mut t = SymbolTable::new();
        let a = t.add(1, 0x100, 0, 0, SCOPE_PUBLIC, 5, Some("foo"), None);
        let b = t.add(1, 0x40, 0, 0, SCOPE_FILE_LOCAL, 9, Some("bar"), None);
        assert_eq!(a, 5);
        assert_eq!(b, 9);

        // Sorted by offset: bar comes first.
        assert_eq!(t.get(1).name, "bar");
        assert_eq!(t.get(2).name, "foo");

        // Old-to-new holds for every symbol after the re-sort.
        for (new_index, sym) in t.iter() {
            assert_eq!(t.old_to_new(sym.old_index), Some(new_index));
        }
    }

    #[test]
    fn add_is_idempotent_on_old_index() {
        let mut t = SymbolTable::new();
        t.add(1, 0x10, 0, 0, SCOPE_PUBLIC, 3, None, None);
        t.add(1, 0x10, 8, 0x83, 0, 3, Some("target"), None);
        assert_eq!(t.len(), 2);
        let s = t.get(1);
        assert_eq!(s.size, 8);
        assert_eq!(s.name, "target");
        assert_eq!(s.scope, SCOPE_PUBLIC);
    }

    #[test]
    fn aliases_at_same_address() {
        let mut t = SymbolTable::new();
        t.add(1, 0x20, 0, 0, SCOPE_PUBLIC, 1, Some("public_name"), None);
        t.add(1, 0x20, 0, 0, SCOPE_FILE_LOCAL, 2, Some("local_alias"), None);
        t.add(1, 0x30, 0, 0, SCOPE_PUBLIC, 3, Some("after"), None);

        let (first, last, next) = t.find_by_address(1, 0x20);
        assert_eq!(last - first, 1);
        assert_eq!(t.get(first).name, "public_name");
        assert_eq!(t.get(next).name, "after");

        let (none, _, next) = t.find_by_address(1, 0x21);
        assert_eq!(none, 0);
        assert_eq!(t.get(next).name, "after");
    }

    #[test]
    fn name_synthesis_is_stable() {
        let mut run = || {
            let mut t = SymbolTable::new();
            t.new_symbol(1, 0x10, SCOPE_FUNCTION_LOCAL);
            t.new_symbol(1, 0x20, SCOPE_FUNCTION_LOCAL);
            t.assign_names();
            let names: Vec<String> = t.iter().map(|(_, s)| s.name.clone()).collect();
            names
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn sanitize_counts_changes() {
        let mut t = SymbolTable::new();
        t.add(1, 0, 0, 0, SCOPE_PUBLIC, 1, Some("evil name!"), None);
        t.add(1, 4, 0, 0, SCOPE_PUBLIC, 2, Some("fine_name"), None);
        t.sanitize_names();
        assert_eq!(t.names_changed, 1);
        assert_eq!(t.get(1).name, "evil_name_");
    }
}
