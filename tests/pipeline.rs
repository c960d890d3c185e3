//! Compiling units and linking them against a runtime distribution.

mod common;

use common::{call, int, int_function, int_import, source_file, write_object};
use fathom::{Pipeline, PipelineError, RuntimeDistribution, Toolchain, Unit};
use fathom_link::ToolCommand;
use insta::assert_snapshot;

/// A link tool that records its arguments, one per line, in `log`.
fn recording_linker(log: &std::path::Path) -> Toolchain {
    Toolchain {
        linker: ToolCommand::new("sh")
            .arg("-c")
            .arg(r#"printf '%s\n' "$@" > "$0""#)
            .arg(log),
        ..Toolchain::native()
    }
}

#[test]
fn test_diagnostics_of_all_units_are_reported_together() {
    let build_dir = tempfile::tempdir().unwrap();

    let first = source_file([int_function("answer", 2, call("missing", 2))]);
    let second = source_file([
        int_function("fine", 3, int("1", 3)),
        int_function("bad", 5, int("1.5", 5)),
    ]);

    let pipeline = Pipeline::new(build_dir.path(), Toolchain::native());
    let error = pipeline
        .compile(&[Unit::new("first", &first), Unit::new("second", &second)])
        .unwrap_err();

    assert!(matches!(error, PipelineError::Diagnostics(_)));
    assert_eq!(error.diagnostics().len(), 2);
    assert_snapshot!(error.to_string(), @r"
    app.ts:2:1: error[unknown-function]: cannot find function `missing`
    app.ts:5:1: error[malformed-node]: invalid int `1.5`
    ");

    assert!(!build_dir.path().join("first.o").exists());
    assert!(!build_dir.path().join("second.o").exists());
}

#[test]
fn test_compile_writes_one_object_per_unit() {
    let build_dir = tempfile::tempdir().unwrap();
    let main = source_file([int_import("helper", 1), int_function("main", 2, call("helper", 2))]);
    let helper = source_file([int_function("helper", 1, int("42", 1))]);

    let pipeline = Pipeline::new(build_dir.path(), Toolchain::native());
    let objects = pipeline
        .compile(&[Unit::new("main", &main), Unit::new("helper", &helper)])
        .unwrap();

    assert_eq!(
        objects,
        [build_dir.path().join("main.o"), build_dir.path().join("helper.o")]
    );
    assert!(objects.iter().all(|path| path.is_file()));
}

#[cfg(target_os = "linux")]
#[test]
fn test_build_links_reachable_units_and_runtime_files() {
    let dir = tempfile::tempdir().unwrap();
    let build_dir = dir.path().join("build");
    let runtime_dir = dir.path().join("runtime");
    std::fs::create_dir(&build_dir).unwrap();
    std::fs::create_dir(&runtime_dir).unwrap();

    write_object(&runtime_dir.join("array.o"), &["fathom_array_i32_new"], &[]);
    write_object(&runtime_dir.join("unused.o"), &["fathom_array_bool_new"], &[]);
    write_object(&runtime_dir.join("support.o"), &["fathom_support_init"], &[]);

    let main = source_file([
        int_import("helper", 1),
        int_import("fathom_array_i32_new", 1),
        int_function("main", 2, call("helper", 2)),
        int_function("make", 3, call("fathom_array_i32_new", 3)),
    ]);
    let helper = source_file([int_function("helper", 1, int("42", 1))]);
    let dead = source_file([int_function("dead", 1, int("0", 1))]);

    let log = dir.path().join("link.log");
    let output = dir.path().join("program");
    let pipeline = Pipeline::new(&build_dir, recording_linker(&log))
        .with_runtime(RuntimeDistribution::new(&runtime_dir));

    let artifact = pipeline
        .build(
            &[
                Unit::new("main", &main),
                Unit::new("helper", &helper),
                Unit::new("dead", &dead),
            ],
            &["main"],
            &output,
        )
        .unwrap();

    let mut linked: Vec<_> = artifact
        .files
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    linked.sort();
    // `make` lives in main.o, so its runtime reference is linked too
    assert_eq!(linked, ["array.o", "helper.o", "main.o"]);
    assert!(artifact.external_symbols.is_empty());

    let args = std::fs::read_to_string(&log).unwrap();
    let args: Vec<_> = args.lines().collect();
    assert_eq!(args[0], runtime_dir.join("support.o").to_string_lossy());
    assert_eq!(args[1], "-o");
    assert_eq!(args[2], output.to_string_lossy());
    assert_eq!(args.len(), 3 + linked.len());
}
