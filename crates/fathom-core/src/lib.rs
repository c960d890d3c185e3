//! Shared compiler data: syntax nodes handed over by the frontend and the
//! diagnostics the backend reports against them.
pub mod diagnostic;
pub mod syntax;

pub use diagnostic::{Diagnostic, DiagnosticCategory};
pub use syntax::{Location, SyntaxKind, SyntaxNode, ValueType};
