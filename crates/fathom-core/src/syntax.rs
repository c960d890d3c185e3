//! Typed syntax tree as produced by the frontend.
//!
//! The backend only ever reads these nodes. Token payloads (identifier names,
//! literal text, operators) travel in [`SyntaxNode::text`], resolved types in
//! [`SyntaxNode::ty`].

use std::sync::Arc;

use derive_more::Display;

/// Syntax node kinds the frontend can produce.
///
/// Only a subset has a code generator; the rest is rejected with a
/// diagnostic by the dispatch table.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyntaxKind {
    SourceFile,
    FunctionDeclaration,
    Parameter,
    Block,
    VariableStatement,
    ExpressionStatement,
    ReturnStatement,
    IfStatement,
    WhileStatement,
    ForStatement,
    ForOfStatement,
    SwitchStatement,
    ClassDeclaration,
    InterfaceDeclaration,
    ImportDeclaration,
    NumericLiteral,
    BooleanLiteral,
    StringLiteral,
    ArrayLiteralExpression,
    ObjectLiteralExpression,
    Identifier,
    ParenthesizedExpression,
    PrefixUnaryExpression,
    PostfixUnaryExpression,
    BinaryExpression,
    CallExpression,
    ElementAccessExpression,
    PropertyAccessExpression,
    ConditionalExpression,
    ArrowFunction,
    NewExpression,
}

impl SyntaxKind {
    pub const ALL: &'static [SyntaxKind] = &[
        SyntaxKind::SourceFile,
        SyntaxKind::FunctionDeclaration,
        SyntaxKind::Parameter,
        SyntaxKind::Block,
        SyntaxKind::VariableStatement,
        SyntaxKind::ExpressionStatement,
        SyntaxKind::ReturnStatement,
        SyntaxKind::IfStatement,
        SyntaxKind::WhileStatement,
        SyntaxKind::ForStatement,
        SyntaxKind::ForOfStatement,
        SyntaxKind::SwitchStatement,
        SyntaxKind::ClassDeclaration,
        SyntaxKind::InterfaceDeclaration,
        SyntaxKind::ImportDeclaration,
        SyntaxKind::NumericLiteral,
        SyntaxKind::BooleanLiteral,
        SyntaxKind::StringLiteral,
        SyntaxKind::ArrayLiteralExpression,
        SyntaxKind::ObjectLiteralExpression,
        SyntaxKind::Identifier,
        SyntaxKind::ParenthesizedExpression,
        SyntaxKind::PrefixUnaryExpression,
        SyntaxKind::PostfixUnaryExpression,
        SyntaxKind::BinaryExpression,
        SyntaxKind::CallExpression,
        SyntaxKind::ElementAccessExpression,
        SyntaxKind::PropertyAccessExpression,
        SyntaxKind::ConditionalExpression,
        SyntaxKind::ArrowFunction,
        SyntaxKind::NewExpression,
    ];
}

/// Resolved static type of an expression or declaration.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum ValueType {
    #[display("number")]
    Number,
    #[display("int")]
    Int,
    #[display("boolean")]
    Boolean,
    #[display("void")]
    Void,
}

/// Source position of a node, 1-based.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash)]
#[display("{file}:{line}:{column}")]
pub struct Location {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// An immutable syntax node.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    pub location: Location,
    pub text: Option<String>,
    pub ty: Option<ValueType>,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, location: Location) -> Self {
        Self {
            kind,
            location,
            text: None,
            ty: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_type(mut self, ty: ValueType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SyntaxNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// The token text, or an empty string for nodes without one.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Children of the given kind, in source order.
    pub fn children_of(&self, kind: SyntaxKind) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |child| child.kind == kind)
    }
}
