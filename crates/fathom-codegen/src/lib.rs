//! Cranelift-based native code generation for the typed subset.
//!
//! Syntax nodes are turned into Cranelift IR through a dispatch table keyed
//! by node kind. Kinds without a generator are rejected with a diagnostic
//! attributed to the offending node; each compilation unit becomes one
//! native object file.

pub mod compiler;
pub mod context;
pub mod dispatch;
pub mod errors;
pub mod generators;
pub mod types;

pub use compiler::{CompiledUnit, CompilerOptions, UnitCompiler};
pub use context::{CodeGenerationContext, TypedValue};
pub use dispatch::{GenerateFn, Generator, GeneratorTable};
pub use errors::{CompilationError, CompilationErrorKind, CompilationResult};

use fathom_core::SyntaxNode;

/// Compile a `SourceFile` node to a native object file.
pub fn compile_unit(unit: &SyntaxNode, options: &CompilerOptions) -> CompilationResult<CompiledUnit> {
    UnitCompiler::new(options)?.compile(unit)
}
