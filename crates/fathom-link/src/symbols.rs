//! Symbol sets and the readers that extract them from files.

use std::collections::HashSet;
use std::collections::hash_set;
use std::path::Path;
use std::process::Command;

use object::{Object, ObjectSymbol, SymbolKind};
use tracing::trace;

use crate::error::{LinkError, LinkResult};
use crate::tools::{ToolCommand, run_tool};

/// A set of symbol names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolSet(HashSet<String>);

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>) -> bool {
        self.0.insert(symbol.into())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, String> {
        self.0.iter()
    }

    /// Whether the two sets share a symbol. Probes the smaller set against
    /// the larger one.
    pub fn intersects(&self, other: &SymbolSet) -> bool {
        let (smaller, larger) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        smaller.iter().any(|symbol| larger.contains(symbol))
    }

    /// Remove every symbol of `other` from this set.
    pub fn remove_all(&mut self, other: &SymbolSet) {
        if other.len() < self.len() {
            for symbol in other.iter() {
                self.0.remove(symbol);
            }
        } else {
            self.0.retain(|symbol| !other.contains(symbol));
        }
    }

    /// Add every symbol of `other` to this set.
    pub fn insert_all(&mut self, other: &SymbolSet) {
        self.0.extend(other.iter().cloned());
    }

    /// Symbols in sorted order, for stable output.
    pub fn sorted(&self) -> Vec<&str> {
        let mut symbols: Vec<_> = self.iter().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

impl<S: Into<String>> FromIterator<S> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for SymbolSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Global symbols a file defines and references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTable {
    pub defined: SymbolSet,
    pub undefined: SymbolSet,
}

/// Extracts the symbol table of a single object or bitcode file.
pub trait SymbolReader {
    fn read_symbols(&self, path: &Path) -> LinkResult<SymbolTable>;
}

/// Reads native object files (ELF, Mach-O, COFF, wasm) in-process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjectSymbolReader;

impl SymbolReader for ObjectSymbolReader {
    fn read_symbols(&self, path: &Path) -> LinkResult<SymbolTable> {
        let data = std::fs::read(path)?;
        let file = object::File::parse(&*data).map_err(|e| LinkError::SymbolRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut table = SymbolTable::default();
        for symbol in file.symbols() {
            if matches!(symbol.kind(), SymbolKind::File | SymbolKind::Section) {
                continue;
            }
            let Ok(name) = symbol.name() else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            if symbol.is_undefined() {
                table.undefined.insert(name);
            } else if symbol.is_global() {
                table.defined.insert(name);
            }
        }

        trace!(
            "{}: {} defined, {} undefined",
            path.display(),
            table.defined.len(),
            table.undefined.len()
        );
        Ok(table)
    }
}

/// Runs an `nm`-compatible symbol-listing tool and parses its output.
#[derive(Clone, Debug)]
pub struct ToolSymbolReader {
    tool: ToolCommand,
}

impl ToolSymbolReader {
    pub fn new(tool: ToolCommand) -> Self {
        Self { tool }
    }
}

impl SymbolReader for ToolSymbolReader {
    fn read_symbols(&self, path: &Path) -> LinkResult<SymbolTable> {
        let mut command: Command = self.tool.command();
        command.arg(path);
        let output = run_tool(&self.tool, &mut command)?;
        Ok(parse_nm_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `nm` output lines of the form `[address] TYPE name`.
///
/// Uppercase types are global; `U` marks an undefined reference and
/// lowercase types are local and ignored.
pub(crate) fn parse_nm_output(output: &str) -> SymbolTable {
    let mut table = SymbolTable::default();
    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (kind, name) = match fields.as_slice() {
            [kind, name] | [_, kind, name] => (*kind, *name),
            _ => continue,
        };

        match kind {
            "U" => {
                table.undefined.insert(name);
            }
            _ if kind.len() == 1 && kind.chars().all(|c| c.is_ascii_uppercase()) => {
                table.defined.insert(name);
            }
            _ => {}
        }
    }
    table
}

const BITCODE_MAGIC: &[u8; 4] = b"BC\xC0\xDE";
const BITCODE_WRAPPER_MAGIC: &[u8; 4] = b"\xDE\xC0\x17\x0B";

/// Reads LLVM bitcode through the symbol-listing tool and everything else
/// with [`ObjectSymbolReader`].
#[derive(Clone, Debug)]
pub struct DefaultSymbolReader {
    bitcode: ToolSymbolReader,
    object: ObjectSymbolReader,
}

impl DefaultSymbolReader {
    pub fn new(symbol_lister: ToolCommand) -> Self {
        Self {
            bitcode: ToolSymbolReader::new(symbol_lister),
            object: ObjectSymbolReader,
        }
    }
}

impl SymbolReader for DefaultSymbolReader {
    fn read_symbols(&self, path: &Path) -> LinkResult<SymbolTable> {
        let magic = crate::file::read_magic::<4>(path)?;
        if &magic == BITCODE_MAGIC || &magic == BITCODE_WRAPPER_MAGIC {
            self.bitcode.read_symbols(path)
        } else {
            self.object.read_symbols(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(symbols: &[&str]) -> SymbolSet {
        symbols.iter().copied().collect()
    }

    #[test]
    fn test_intersects_is_commutative() {
        let cases = [
            (set(&[]), set(&[])),
            (set(&["a"]), set(&[])),
            (set(&["a", "b", "c"]), set(&["c"])),
            (set(&["a", "b"]), set(&["x", "y", "z"])),
            (set(&["main"]), set(&["helper", "main", "other"])),
        ];

        for (a, b) in &cases {
            assert_eq!(a.intersects(b), b.intersects(a), "{a:?} vs {b:?}");
        }
        assert!(cases[2].0.intersects(&cases[2].1));
        assert!(!cases[3].0.intersects(&cases[3].1));
        assert!(!cases[0].0.intersects(&cases[0].1));
    }

    #[test]
    fn test_remove_and_insert_all() {
        let mut unresolved = set(&["main", "helper", "print"]);
        unresolved.remove_all(&set(&["main"]));
        unresolved.insert_all(&set(&["alloc"]));
        assert_eq!(unresolved.sorted(), ["alloc", "helper", "print"]);

        unresolved.remove_all(&set(&["alloc", "helper", "print", "unrelated"]));
        assert!(unresolved.is_empty());
    }

    #[test]
    fn test_parse_nm_output() {
        let output = "\
0000000000000000 T main
                 U helper
0000000000000010 t local_fn
0000000000000020 D table
                 w weak_ref
---------------- W inline_fn
";
        let table = parse_nm_output(output);
        assert_eq!(table.defined.sorted(), ["inline_fn", "main", "table"]);
        assert_eq!(table.undefined.sorted(), ["helper"]);
    }
}
