//! Common test utilities for pipeline tests.

use std::path::Path;

use fathom::{SyntaxKind, SyntaxNode, ValueType};
use fathom_core::Location;
use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};

pub fn node(kind: SyntaxKind, line: u32) -> SyntaxNode {
    SyntaxNode::new(kind, Location::new("app.ts", line, 1))
}

/// `function name(): int { return value; }`
pub fn int_function(name: &str, line: u32, value: SyntaxNode) -> SyntaxNode {
    node(SyntaxKind::FunctionDeclaration, line)
        .with_text(name)
        .with_type(ValueType::Int)
        .with_children([node(SyntaxKind::Block, line)
            .with_children([node(SyntaxKind::ReturnStatement, line).with_children([value])])])
}

/// `declare function name(): int;`
pub fn int_import(name: &str, line: u32) -> SyntaxNode {
    node(SyntaxKind::FunctionDeclaration, line)
        .with_text(name)
        .with_type(ValueType::Int)
}

pub fn call(name: &str, line: u32) -> SyntaxNode {
    node(SyntaxKind::CallExpression, line).with_text(name)
}

pub fn int(value: &str, line: u32) -> SyntaxNode {
    node(SyntaxKind::NumericLiteral, line)
        .with_text(value)
        .with_type(ValueType::Int)
}

pub fn source_file(items: impl IntoIterator<Item = SyntaxNode>) -> SyntaxNode {
    node(SyntaxKind::SourceFile, 1).with_children(items)
}

/// Write an ELF object defining `defined` and referencing `undefined`.
#[allow(dead_code)]
pub fn write_object(path: &Path, defined: &[&str], undefined: &[&str]) {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text = obj.section_id(StandardSection::Text);

    for name in defined {
        let offset = obj.append_section_data(text, &[0xc3], 1);
        obj.add_symbol(Symbol {
            name: name.as_bytes().to_vec(),
            value: offset,
            size: 1,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Section(text),
            flags: SymbolFlags::None,
        });
    }

    for name in undefined {
        obj.add_symbol(Symbol {
            name: name.as_bytes().to_vec(),
            value: 0,
            size: 0,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: SymbolSection::Undefined,
            flags: SymbolFlags::None,
        });
    }

    std::fs::write(path, obj.write().unwrap()).unwrap();
}
