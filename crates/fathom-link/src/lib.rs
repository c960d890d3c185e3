//! Tree-shaking linker.
//!
//! Starting from a set of entry symbols, the linker includes only the object,
//! bitcode and archive-member files whose definitions are transitively
//! reachable, then hands that set to an external link tool once.

pub mod error;
pub mod file;
pub mod linker;
pub mod runtime;
pub mod session;
pub mod symbols;
pub mod tools;

pub use error::{LinkError, LinkResult};
pub use file::{ByteCodeFile, FileKind};
pub use linker::{BitcodeLinker, LinkedArtifact};
pub use runtime::RuntimeDistribution;
pub use session::LinkSession;
pub use symbols::{
    DefaultSymbolReader, ObjectSymbolReader, SymbolReader, SymbolSet, SymbolTable,
    ToolSymbolReader,
};
pub use tools::{ToolCommand, Toolchain};
