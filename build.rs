use std::env;
use std::path::PathBuf;
use std::process::Command;

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Build fathom-runtime as a staticlib with the `runtime` profile, in its own
    // target directory since the parent cargo process holds the main one.
    let runtime_target_dir = out_dir.join("runtime-target");
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());

    let status = Command::new(&cargo)
        .arg("rustc")
        .args(["-p", "fathom-runtime"])
        .arg("--lib")
        .args(["--profile", "runtime"])
        .args(["--crate-type", "staticlib"])
        .arg("--target-dir")
        .arg(&runtime_target_dir)
        .current_dir(&manifest_dir)
        .status();

    // Without a bundled runtime the CLI needs --runtime-dir
    match status {
        Ok(status) if status.success() => {
            // libfathom_runtime.a lands in {target_dir}/runtime
            let static_lib_dir = runtime_target_dir.join("runtime");
            println!(
                "cargo:rustc-env=FATHOM_RUNTIME_STATIC_LIB_DIR={}",
                static_lib_dir.display()
            );
        }
        Ok(status) => println!("cargo:warning=building fathom-runtime failed ({status})"),
        Err(e) => println!("cargo:warning=could not run cargo for fathom-runtime: {e}"),
    }

    println!("cargo:rerun-if-changed=crates/fathom-runtime/src");
    println!("cargo:rerun-if-changed=crates/fathom-runtime/Cargo.toml");
}
