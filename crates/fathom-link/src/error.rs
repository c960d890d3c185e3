//! Error types for linking.

use std::path::PathBuf;
use std::process::ExitStatus;

use derive_more::{Display, Error, From};

pub type LinkResult<T> = Result<T, LinkError>;

#[derive(Debug, Display, Error, From)]
pub enum LinkError {
    #[display("File does not exist: {}", path.display())]
    MissingFile { path: PathBuf },

    /// An external tool exited unsuccessfully; `stderr` is its output, unmodified.
    #[display("`{tool}` failed ({status}):\n{stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[display("Failed to run `{tool}`: {source}")]
    ToolSpawn { tool: String, source: std::io::Error },

    #[display("Failed to read symbols of {}: {message}", path.display())]
    SymbolRead { path: PathBuf, message: String },

    #[display("I/O error: {_0}")]
    #[from]
    Io(std::io::Error),
}
