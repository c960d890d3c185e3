//! Error types for code generation.
//!
//! Source-level problems are [`Diagnostic`]s; everything else is a failure of
//! the backend itself and carries no location.

use derive_more::Display;
use fathom_core::Diagnostic;

pub type CompilationResult<T> = Result<T, CompilationError>;

#[derive(Display, Debug)]
#[display("{kind}")]
pub struct CompilationError {
    kind: Box<CompilationErrorKind>,
}

impl<E> From<E> for CompilationError
where
    CompilationErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        CompilationError {
            kind: Box::new(CompilationErrorKind::from(error)),
        }
    }
}

impl CompilationError {
    pub fn kind(&self) -> &CompilationErrorKind {
        &self.kind
    }

    /// Diagnostics carried by this error; empty for backend failures.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &*self.kind {
            CompilationErrorKind::Diagnostic(diagnostic) => std::slice::from_ref(diagnostic),
            CompilationErrorKind::Diagnostics(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

#[derive(Display, Debug)]
pub enum CompilationErrorKind {
    /// A problem attributable to one syntax node.
    #[display("{_0}")]
    Diagnostic(Diagnostic),

    /// Every diagnostic reported for a compilation unit.
    #[display("{} error(s) in compilation unit", _0.len())]
    Diagnostics(Vec<Diagnostic>),

    /// No code generator could be set up for the target.
    #[display("Cannot generate code for `{triple}`: {reason}")]
    Target { triple: String, reason: String },

    #[display("Module error: {_0}")]
    Module(cranelift_module::ModuleError),

    #[display("Object emission failed: {_0}")]
    Object(object::write::Error),
}

impl From<Diagnostic> for CompilationErrorKind {
    fn from(diagnostic: Diagnostic) -> Self {
        CompilationErrorKind::Diagnostic(diagnostic)
    }
}

impl From<cranelift_module::ModuleError> for CompilationErrorKind {
    fn from(error: cranelift_module::ModuleError) -> Self {
        CompilationErrorKind::Module(error)
    }
}

impl From<object::write::Error> for CompilationErrorKind {
    fn from(error: object::write::Error) -> Self {
        CompilationErrorKind::Object(error)
    }
}

impl std::error::Error for CompilationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &*self.kind {
            CompilationErrorKind::Module(e) => Some(e),
            CompilationErrorKind::Object(e) => Some(e),
            _ => None,
        }
    }
}
