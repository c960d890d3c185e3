//! A single tree-shaking link.
//!
//! ```text
//! seed ─► expand archives ─► fixed-point inclusion ─► external link
//! ```
//!
//! All state (candidates, unresolved symbols, included files and the
//! extraction directory) lives in the session value and is released with it.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, trace};

use crate::error::LinkResult;
use crate::file::{ByteCodeFile, FileKind};
use crate::symbols::{SymbolReader, SymbolSet};
use crate::tools::Toolchain;

pub struct LinkSession<'a> {
    reader: &'a dyn SymbolReader,
    toolchain: &'a Toolchain,
    candidates: Vec<ByteCodeFile>,
    included: Vec<ByteCodeFile>,
    unresolved: SymbolSet,
    /// Symbols defined by included files; never re-added to `unresolved`.
    provided: SymbolSet,
    scratch: Option<TempDir>,
}

impl<'a> LinkSession<'a> {
    /// Seed a session with its candidate files and entry symbols.
    pub fn new(
        reader: &'a dyn SymbolReader,
        toolchain: &'a Toolchain,
        candidates: impl IntoIterator<Item = PathBuf>,
        entry_symbols: SymbolSet,
    ) -> Self {
        Self {
            reader,
            toolchain,
            candidates: candidates.into_iter().map(ByteCodeFile::new).collect(),
            included: Vec::new(),
            unresolved: entry_symbols,
            provided: SymbolSet::new(),
            scratch: None,
        }
    }

    pub fn unresolved(&self) -> &SymbolSet {
        &self.unresolved
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Path> {
        self.candidates.iter().map(ByteCodeFile::path)
    }

    pub fn included(&self) -> impl Iterator<Item = &Path> {
        self.included.iter().map(ByteCodeFile::path)
    }

    /// Replace every archive candidate by its extracted members. Each archive
    /// is extracted once into its own directory under the session scratch space.
    pub fn expand_archives(&mut self) -> LinkResult<()> {
        let mut pending = std::mem::take(&mut self.candidates);
        let mut extracted = 0usize;

        while let Some(file) = pending.pop() {
            if file.kind()? != FileKind::Archive {
                self.candidates.push(file);
                continue;
            }

            let scratch = match self.scratch.take() {
                Some(scratch) => scratch,
                None => tempfile::Builder::new().prefix("fathom-link-").tempdir()?,
            };
            let target_dir = self
                .scratch
                .insert(scratch)
                .path()
                .join(format!("archive-{extracted}"));
            extracted += 1;
            std::fs::create_dir(&target_dir)?;

            // The archiver runs inside `target_dir`
            let archive = std::path::absolute(file.path())?;
            debug!("expanding {} into {}", archive.display(), target_dir.display());
            self.toolchain.extract_archive(&archive, &target_dir)?;

            let mut members = Vec::new();
            for entry in std::fs::read_dir(&target_dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    members.push(entry.path());
                }
            }
            members.sort();
            trace!("{} yielded {} members", file.path().display(), members.len());

            // Members may themselves be archives
            pending.extend(members.into_iter().map(ByteCodeFile::new));
        }

        self.candidates.reverse();
        Ok(())
    }

    /// Include files until a full scan over the remaining candidates adds
    /// nothing. Symbols may stay unresolved; the final link step decides.
    pub fn resolve(&mut self) -> LinkResult<()> {
        loop {
            let mut changed = false;
            let mut index = 0;

            while index < self.candidates.len() {
                let reachable = self.candidates[index]
                    .symbols(self.reader)?
                    .defined
                    .intersects(&self.unresolved);

                if !reachable {
                    index += 1;
                    continue;
                }

                let mut file = self.candidates.remove(index);
                let symbols = file.symbols(self.reader)?;
                self.unresolved.remove_all(&symbols.defined);
                self.provided.insert_all(&symbols.defined);
                self.unresolved.insert_all(&symbols.undefined);
                self.unresolved.remove_all(&self.provided);

                debug!(
                    "including {} ({} unresolved)",
                    file.path().display(),
                    self.unresolved.len()
                );
                self.included.push(file);
                changed = true;
            }

            if !changed {
                return Ok(());
            }
        }
    }

    /// Pass the included files to the external linker, producing `output`.
    pub fn link(&self, output: &Path) -> LinkResult<()> {
        debug!(
            "linking {} files into {}",
            self.included.len(),
            output.display()
        );
        self.toolchain.link(self.included(), output)
    }
}
