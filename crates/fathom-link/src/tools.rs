//! External tools used by the linker and how they are invoked.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::error::{LinkError, LinkResult};

/// A program plus the leading arguments it is always invoked with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    fn name(&self) -> String {
        self.program.display().to_string()
    }
}

/// The archive, link and symbol-listing tools of one target toolchain.
///
/// - archiver: `<archiver> <args> <archive>`, run inside the extraction directory
/// - linker: `<linker> <args> -o <output> <files>...`
/// - symbol lister: `<nm> <args> <file>`, `nm`-format output on stdout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolchain {
    pub archiver: ToolCommand,
    pub linker: ToolCommand,
    pub symbol_lister: ToolCommand,
}

impl Toolchain {
    /// LLVM tools producing a single linked bitcode module.
    pub fn llvm_bitcode() -> Self {
        Self {
            archiver: ToolCommand::new("llvm-ar").arg("x"),
            linker: ToolCommand::new("llvm-link"),
            symbol_lister: ToolCommand::new("llvm-nm"),
        }
    }

    /// System tools producing a native executable.
    pub fn native() -> Self {
        Self {
            archiver: ToolCommand::new("ar").arg("x"),
            linker: ToolCommand::new("cc"),
            symbol_lister: ToolCommand::new("nm"),
        }
    }

    /// Extract every member of `archive` into `target_dir`.
    pub(crate) fn extract_archive(&self, archive: &Path, target_dir: &Path) -> LinkResult<()> {
        let mut command = self.archiver.command();
        command.arg(archive).current_dir(target_dir);
        run_tool(&self.archiver, &mut command).map(drop)
    }

    /// Link `files` into `output`.
    pub(crate) fn link<'a>(
        &self,
        files: impl IntoIterator<Item = &'a Path>,
        output: &Path,
    ) -> LinkResult<()> {
        let mut command = self.linker.command();
        command.arg("-o").arg(output).args(files);
        run_tool(&self.linker, &mut command).map(drop)
    }
}

/// The system tools, matching the native objects the compiler emits.
impl Default for Toolchain {
    fn default() -> Self {
        Self::native()
    }
}

/// Run a tool to completion. A non-zero exit becomes [`LinkError::ToolFailed`]
/// carrying the tool's stderr unmodified.
pub(crate) fn run_tool(tool: &ToolCommand, command: &mut Command) -> LinkResult<Output> {
    debug!("running {:?}", command);

    let output = command.output().map_err(|source| LinkError::ToolSpawn {
        tool: tool.name(),
        source,
    })?;

    if !output.status.success() {
        return Err(LinkError::ToolFailed {
            tool: tool.name(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output)
}
