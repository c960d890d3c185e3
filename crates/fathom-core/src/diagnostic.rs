//! Diagnostic messages emitted during code generation.

use derive_more::Display;

use crate::syntax::{Location, SyntaxNode};

/// What went wrong, independent of where.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    #[display("unsupported-syntax-kind")]
    UnsupportedSyntaxKind,
    #[display("unsupported-operator")]
    UnsupportedOperator,
    #[display("unknown-identifier")]
    UnknownIdentifier,
    #[display("unknown-function")]
    UnknownFunction,
    #[display("type-mismatch")]
    TypeMismatch,
    #[display("missing-return")]
    MissingReturn,
    #[display("malformed-node")]
    MalformedNode,
}

/// A compiler error attributed to exactly one syntax node.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("{location}: error[{category}]: {message}")]
pub struct Diagnostic {
    pub location: Location,
    pub category: DiagnosticCategory,
    pub message: String,
}

impl Diagnostic {
    pub fn new(node: &SyntaxNode, category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            location: node.location.clone(),
            category,
            message: message.into(),
        }
    }

    /// The fallback diagnostic for a node kind without a generator.
    pub fn unsupported_syntax(node: &SyntaxNode) -> Self {
        Self::new(
            node,
            DiagnosticCategory::UnsupportedSyntaxKind,
            format!("syntax kind `{}` is not supported", node.kind),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxKind;
    use insta::assert_snapshot;

    #[test]
    fn test_unsupported_syntax_rendering() {
        let node = SyntaxNode::new(SyntaxKind::WhileStatement, Location::new("loop.ts", 7, 5));
        let diagnostic = Diagnostic::unsupported_syntax(&node);

        assert_eq!(diagnostic.category, DiagnosticCategory::UnsupportedSyntaxKind);
        assert_eq!(diagnostic.location, node.location);
        assert_snapshot!(
            diagnostic,
            @"loop.ts:7:5: error[unsupported-syntax-kind]: syntax kind `WhileStatement` is not supported"
        );
    }

    #[test]
    fn test_category_display() {
        assert_snapshot!(DiagnosticCategory::TypeMismatch, @"type-mismatch");
    }
}
