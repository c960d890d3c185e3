//! From typed syntax trees to a linked program.
//!
//! ```text
//! SourceFile ─► compile_unit ─► <build_dir>/<unit>.o ─┐
//! SourceFile ─► compile_unit ─► <build_dir>/<unit>.o ─┼─► BitcodeLinker ─► output
//!                              runtime distribution ──┘
//! ```
//!
//! Every unit is compiled before anything is linked, so one run reports the
//! diagnostics of all units together.

use std::path::{Path, PathBuf};

use derive_more::{Display, Error, From};
use fathom_codegen::{CompilationError, CompilerOptions, compile_unit};
use fathom_core::{Diagnostic, SyntaxNode};
use fathom_link::{BitcodeLinker, LinkError, LinkedArtifact, RuntimeDistribution, Toolchain};
use target_lexicon::Triple;
use tracing::debug;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Display, Error, From)]
pub enum PipelineError {
    /// Source-level errors of every unit that failed to compile.
    #[display("{}", render_diagnostics(_0))]
    Diagnostics(#[error(not(source))] Vec<Diagnostic>),

    #[display("Failed to compile `{unit}`: {source}")]
    Compilation {
        unit: String,
        source: CompilationError,
    },

    #[display("{_0}")]
    #[from]
    Link(LinkError),

    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),
}

impl PipelineError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            PipelineError::Diagnostics(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A named compilation unit.
#[derive(Clone, Copy, Debug)]
pub struct Unit<'a> {
    pub name: &'a str,
    pub syntax: &'a SyntaxNode,
}

impl<'a> Unit<'a> {
    pub fn new(name: &'a str, syntax: &'a SyntaxNode) -> Self {
        Self { name, syntax }
    }
}

pub struct Pipeline {
    build_dir: PathBuf,
    toolchain: Toolchain,
    runtime: Option<RuntimeDistribution>,
    target: Option<Triple>,
}

impl Pipeline {
    /// Object files are written to `build_dir`, which must exist.
    pub fn new(build_dir: impl Into<PathBuf>, toolchain: Toolchain) -> Self {
        Self {
            build_dir: build_dir.into(),
            toolchain,
            runtime: None,
            target: None,
        }
    }

    pub fn with_runtime(mut self, runtime: RuntimeDistribution) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_target(mut self, target: Triple) -> Self {
        self.target = Some(target);
        self
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Compile every unit and write `<name>.o` for each. Fails with the
    /// diagnostics of all units if any unit has one.
    pub fn compile(&self, units: &[Unit<'_>]) -> PipelineResult<Vec<PathBuf>> {
        let mut diagnostics = Vec::new();
        let mut objects = Vec::new();

        for unit in units {
            let options = CompilerOptions {
                target: self.target.clone(),
                unit_name: unit.name.to_string(),
            };

            match compile_unit(unit.syntax, &options) {
                Ok(compiled) => {
                    let path = self.build_dir.join(format!("{}.o", compiled.name));
                    std::fs::write(&path, &compiled.object)?;
                    debug!(
                        "wrote {} ({} exported, {} imported)",
                        path.display(),
                        compiled.exported.len(),
                        compiled.imported.len()
                    );
                    objects.push(path);
                }
                Err(error) if !error.diagnostics().is_empty() => {
                    diagnostics.extend_from_slice(error.diagnostics());
                }
                Err(source) => {
                    return Err(PipelineError::Compilation {
                        unit: unit.name.to_string(),
                        source,
                    });
                }
            }
        }

        if diagnostics.is_empty() {
            Ok(objects)
        } else {
            Err(PipelineError::Diagnostics(diagnostics))
        }
    }

    /// Compile `units` and link them, with the runtime files they reach, into
    /// `output`.
    pub fn build<S: AsRef<str>>(
        &self,
        units: &[Unit<'_>],
        entry_symbols: &[S],
        output: &Path,
    ) -> PipelineResult<LinkedArtifact> {
        let objects = self.compile(units)?;
        let mut toolchain = self.toolchain.clone();

        if let Some(runtime) = &self.runtime {
            let support = runtime.support_files();
            if support.is_empty() {
                debug!("no support file in {}", runtime.dir().display());
            }
            // Support files bypass tree-shaking and are always linked
            for file in support {
                toolchain.linker = toolchain.linker.arg(file);
            }
        }

        let mut linker = BitcodeLinker::new(toolchain);
        for object in &objects {
            linker.add_file(object)?;
        }
        if let Some(runtime) = &self.runtime {
            linker.add_runtime(runtime)?;
        }

        Ok(linker.link(entry_symbols, output)?)
    }
}
