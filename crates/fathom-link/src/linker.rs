//! Linker front door: registers inputs and runs one session per link.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{LinkError, LinkResult};
use crate::runtime::RuntimeDistribution;
use crate::session::LinkSession;
use crate::symbols::{DefaultSymbolReader, SymbolReader, SymbolSet};
use crate::tools::Toolchain;

/// Result of a successful link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkedArtifact {
    pub path: PathBuf,
    /// Files handed to the external linker.
    pub files: Vec<PathBuf>,
    /// Symbols no candidate defined; resolved (or rejected) by the external linker.
    pub external_symbols: SymbolSet,
}

/// Links compiled units with just the runtime files they need.
///
/// Registration only records paths. Every call to [`BitcodeLinker::link`]
/// runs an independent [`LinkSession`], so links for different entry sets
/// share no mutable state.
pub struct BitcodeLinker<R = DefaultSymbolReader> {
    toolchain: Toolchain,
    reader: R,
    files: Vec<PathBuf>,
}

impl BitcodeLinker {
    pub fn new(toolchain: Toolchain) -> Self {
        let reader = DefaultSymbolReader::new(toolchain.symbol_lister.clone());
        Self::with_reader(toolchain, reader)
    }
}

impl<R: SymbolReader> BitcodeLinker<R> {
    pub fn with_reader(toolchain: Toolchain, reader: R) -> Self {
        Self {
            toolchain,
            reader,
            files: Vec::new(),
        }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Register an input file. Fails if it does not exist; registering the
    /// same file twice has no effect.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> LinkResult<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LinkError::MissingFile {
                path: path.to_path_buf(),
            });
        }

        let path = std::path::absolute(path)?;
        if !self.files.contains(&path) {
            self.files.push(path);
        }
        Ok(())
    }

    /// Register every linkable file of a runtime distribution.
    pub fn add_runtime(&mut self, runtime: &RuntimeDistribution) -> LinkResult<()> {
        for path in runtime.candidates()? {
            self.add_file(path)?;
        }
        Ok(())
    }

    /// Link the files reachable from `entry_symbols` into `output`.
    pub fn link<S: AsRef<str>>(
        &self,
        entry_symbols: &[S],
        output: &Path,
    ) -> LinkResult<LinkedArtifact> {
        let entry: SymbolSet = entry_symbols
            .iter()
            .map(|symbol| AsRef::<str>::as_ref(symbol))
            .collect();
        debug!("link {} for entry symbols {:?}", output.display(), entry.sorted());

        let mut session = LinkSession::new(&self.reader, &self.toolchain, self.files.clone(), entry);
        session.expand_archives()?;
        session.resolve()?;
        session.link(output)?;

        Ok(LinkedArtifact {
            path: output.to_path_buf(),
            files: session.included().map(Path::to_path_buf).collect(),
            external_symbols: session.unresolved().clone(),
        })
    }
}
