//! Dispatch from syntax kinds to code generators.
//!
//! Every kind maps to a [`Generator`]. Kinds without a registered emitter
//! resolve to [`Generator::Unsupported`], which fails with a diagnostic for
//! the node instead of skipping it, so callers treat supported and
//! unsupported nodes alike.

use std::collections::HashMap;

use fathom_core::{Diagnostic, SyntaxKind, SyntaxNode};
use tracing::{debug, trace};

use crate::context::CodeGenerationContext;
use crate::errors::CompilationResult;
use crate::generators;

/// Emits the code for one node into the context.
pub type GenerateFn = fn(&SyntaxNode, &mut CodeGenerationContext<'_, '_>) -> CompilationResult<()>;

#[derive(Clone, Copy)]
pub enum Generator {
    Emit(GenerateFn),
    /// Fallback for kinds outside the supported subset.
    Unsupported,
}

impl Generator {
    pub fn generate(
        self,
        node: &SyntaxNode,
        ctx: &mut CodeGenerationContext<'_, '_>,
    ) -> CompilationResult<()> {
        match self {
            Generator::Emit(emit) => emit(node, ctx),
            Generator::Unsupported => {
                debug!("no generator for {} at {}", node.kind, node.location);
                Err(Diagnostic::unsupported_syntax(node).into())
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct GeneratorTable {
    generators: HashMap<SyntaxKind, GenerateFn>,
}

impl GeneratorTable {
    /// A table where every kind is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The generators for the supported typed subset.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(SyntaxKind::NumericLiteral, generators::numeric_literal);
        table.register(SyntaxKind::BooleanLiteral, generators::boolean_literal);
        table.register(SyntaxKind::Identifier, generators::identifier);
        table.register(SyntaxKind::ParenthesizedExpression, generators::parenthesized);
        table.register(SyntaxKind::PrefixUnaryExpression, generators::prefix_unary);
        table.register(SyntaxKind::BinaryExpression, generators::binary);
        table.register(SyntaxKind::CallExpression, generators::call);
        table.register(SyntaxKind::VariableStatement, generators::variable_statement);
        table.register(SyntaxKind::ExpressionStatement, generators::expression_statement);
        table.register(SyntaxKind::ReturnStatement, generators::return_statement);
        table.register(SyntaxKind::IfStatement, generators::if_statement);
        table.register(SyntaxKind::Block, generators::block);
        table
    }

    pub fn register(&mut self, kind: SyntaxKind, generate: GenerateFn) {
        self.generators.insert(kind, generate);
    }

    pub fn supports(&self, kind: SyntaxKind) -> bool {
        self.generators.contains_key(&kind)
    }

    pub fn generator(&self, kind: SyntaxKind) -> Generator {
        self.generators
            .get(&kind)
            .copied()
            .map_or(Generator::Unsupported, Generator::Emit)
    }

    pub fn generate(
        &self,
        node: &SyntaxNode,
        ctx: &mut CodeGenerationContext<'_, '_>,
    ) -> CompilationResult<()> {
        trace!("generate {} at {}", node.kind, node.location);
        self.generator(node.kind).generate(node, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_covers_typed_subset() {
        let table = GeneratorTable::standard();
        assert!(table.supports(SyntaxKind::BinaryExpression));
        assert!(table.supports(SyntaxKind::IfStatement));
        assert!(!table.supports(SyntaxKind::WhileStatement));
        assert!(!table.supports(SyntaxKind::StringLiteral));
        assert!(matches!(
            table.generator(SyntaxKind::ClassDeclaration),
            Generator::Unsupported
        ));
    }

    #[test]
    fn test_empty_table_supports_nothing() {
        let table = GeneratorTable::empty();
        assert!(SyntaxKind::ALL.iter().all(|kind| !table.supports(*kind)));
    }
}
