//! Files known to a link session.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::LinkResult;
use crate::symbols::{SymbolReader, SymbolTable};

const ARCHIVE_MAGIC: &[u8; 8] = b"!<arch>\n";

/// How the linker treats a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// A static archive; expanded into its members before resolution.
    Archive,
    /// A single object or bitcode file.
    Module,
}

/// A candidate input with a lazily computed symbol table.
#[derive(Debug)]
pub struct ByteCodeFile {
    path: PathBuf,
    symbols: Option<SymbolTable>,
}

impl ByteCodeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            symbols: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> LinkResult<FileKind> {
        if &read_magic::<8>(&self.path)? == ARCHIVE_MAGIC {
            Ok(FileKind::Archive)
        } else {
            Ok(FileKind::Module)
        }
    }

    /// The file's symbol table, read on first use and cached afterwards.
    pub fn symbols(&mut self, reader: &dyn SymbolReader) -> LinkResult<&SymbolTable> {
        let table = match self.symbols.take() {
            Some(table) => table,
            None => reader.read_symbols(&self.path)?,
        };
        Ok(self.symbols.insert(table))
    }
}

/// Read the first `N` bytes of a file, zero-padded if it is shorter.
pub(crate) fn read_magic<const N: usize>(path: &Path) -> LinkResult<[u8; N]> {
    let mut magic = [0u8; N];
    let mut prefix = Vec::with_capacity(N);
    File::open(path)?.take(N as u64).read_to_end(&mut prefix)?;
    magic[..prefix.len()].copy_from_slice(&prefix);
    Ok(magic)
}
