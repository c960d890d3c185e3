//! End-to-end linking over real object files.

use std::path::{Path, PathBuf};

use fathom_link::{
    BitcodeLinker, LinkError, ObjectSymbolReader, RuntimeDistribution, ToolCommand, Toolchain,
};
use object::write::{Object, StandardSection, Symbol, SymbolSection};
use object::{Architecture, BinaryFormat, Endianness, SymbolFlags, SymbolKind, SymbolScope};

/// Write an ELF object defining `defined` and referencing `undefined`.
fn write_object(path: &Path, defined: &[&str], undefined: &[&str]) {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text = obj.section_id(StandardSection::Text);

    for (i, name) in defined.iter().enumerate() {
        let offset = obj.append_section_data(text, &[0xc3], 1);
        assert_eq!(offset, i as u64);
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

/// A stand-in link tool that concatenates its inputs into the output file.
fn concatenating_linker() -> Toolchain {
    Toolchain {
        linker: ToolCommand::new("sh")
            .arg("-c")
            .arg(r#"out="$1"; shift; cat "$@" > "$out""#),
        ..Toolchain::native()
    }
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    let mut names: Vec<_> = paths
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_object_reader_extracts_global_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.o");
    write_object(&path, &["main"], &["helper"]);

    let table = fathom_link::SymbolReader::read_symbols(&ObjectSymbolReader, &path).unwrap();
    assert_eq!(table.defined.sorted(), ["main"]);
    assert_eq!(table.undefined.sorted(), ["helper"]);
}

#[cfg(unix)]
#[test]
fn test_link_includes_only_reachable_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.o");
    let b = dir.path().join("b.o");
    let c = dir.path().join("c.o");
    write_object(&a, &["main"], &["helper"]);
    write_object(&b, &["helper"], &[]);
    write_object(&c, &["unused"], &[]);

    let mut linker = BitcodeLinker::with_reader(concatenating_linker(), ObjectSymbolReader);
    for file in [&c, &b, &a] {
        linker.add_file(file).unwrap();
    }

    let output = dir.path().join("program");
    let artifact = linker.link(&["main"], &output).unwrap();

    assert_eq!(file_names(&artifact.files), ["a.o", "b.o"]);
    assert!(artifact.external_symbols.is_empty());

    let linked = std::fs::read(&output).unwrap();
    let expected_len = std::fs::metadata(&a).unwrap().len() + std::fs::metadata(&b).unwrap().len();
    assert_eq!(linked.len() as u64, expected_len);
}

#[cfg(unix)]
#[test]
fn test_runtime_support_file_is_not_tree_shaken_in() {
    let dir = tempfile::tempdir().unwrap();
    let runtime_dir = dir.path().join("runtime");
    std::fs::create_dir(&runtime_dir).unwrap();
    write_object(&runtime_dir.join("array.o"), &["fathom_array_f64_new"], &[]);
    write_object(&runtime_dir.join("support.o"), &["fathom_array_f64_new"], &[]);

    let unit = dir.path().join("unit.o");
    write_object(&unit, &["main"], &["fathom_array_f64_new"]);

    let mut linker = BitcodeLinker::with_reader(concatenating_linker(), ObjectSymbolReader);
    linker.add_file(&unit).unwrap();
    linker.add_runtime(&RuntimeDistribution::new(&runtime_dir)).unwrap();

    let artifact = linker.link(&["main"], &dir.path().join("program")).unwrap();
    assert_eq!(file_names(&artifact.files), ["array.o", "unit.o"]);
}

#[cfg(unix)]
#[test]
fn test_linker_failure_is_surfaced_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let unit = dir.path().join("unit.o");
    write_object(&unit, &["main"], &["missing"]);

    let toolchain = Toolchain {
        linker: ToolCommand::new("sh")
            .arg("-c")
            .arg("echo \"undefined reference to 'missing'\" >&2; exit 1"),
        ..Toolchain::native()
    };
    let mut linker = BitcodeLinker::with_reader(toolchain, ObjectSymbolReader);
    linker.add_file(&unit).unwrap();

    match linker.link(&["main"], &dir.path().join("program")) {
        Err(LinkError::ToolFailed { stderr, .. }) => {
            assert_eq!(stderr, "undefined reference to 'missing'\n");
        }
        other => panic!("expected tool failure, got {other:?}"),
    }
}

#[test]
fn test_registering_missing_file_fails_fast() {
    let mut linker = BitcodeLinker::new(Toolchain::default());
    let error = linker.add_file("/nonexistent/unit.o").unwrap_err();
    assert!(matches!(error, LinkError::MissingFile { .. }));
    assert!(linker.files().is_empty());
}
