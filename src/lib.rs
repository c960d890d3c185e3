//! Ahead-of-time compilation of the typed subset to native programs.
//!
//! Compilation units come from the frontend as typed syntax trees; each is
//! compiled to one object file, and the objects are linked together with just
//! the runtime files their entry symbols reach.

pub mod pipeline;

pub use fathom_codegen::{CompiledUnit, CompilerOptions};
pub use fathom_core::{Diagnostic, SyntaxKind, SyntaxNode, ValueType};
pub use fathom_link::{LinkedArtifact, RuntimeDistribution, Toolchain};
pub use pipeline::{Pipeline, PipelineError, PipelineResult, Unit};
