//! fathom CLI entry point.

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Command, LinkArgs, ToolArgs};
use fathom_link::{
    BitcodeLinker, DefaultSymbolReader, LinkResult, RuntimeDistribution, SymbolReader,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Runtime staticlib built alongside the CLI, if the build script managed to.
const BUNDLED_RUNTIME_DIR: Option<&str> = option_env!("FATHOM_RUNTIME_STATIC_LIB_DIR");

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Link(args) => link(args),
        Command::Symbols { tools, files } => symbols(&tools, &files),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn runtime_dir(args: &LinkArgs) -> Option<PathBuf> {
    args.runtime_dir.clone().or_else(|| {
        BUNDLED_RUNTIME_DIR
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir())
    })
}

fn link(args: LinkArgs) -> LinkResult<()> {
    let mut toolchain = args.tools.toolchain();

    let runtime = runtime_dir(&args).map(|dir| {
        args.exclude
            .iter()
            .fold(RuntimeDistribution::new(dir), |runtime, file| {
                runtime.exclude(file.clone())
            })
    });
    if let Some(runtime) = &runtime {
        debug!("runtime distribution at {}", runtime.dir().display());
        for file in runtime.support_files() {
            toolchain.linker = toolchain.linker.arg(file);
        }
    }

    let mut linker = BitcodeLinker::new(toolchain);
    for file in &args.files {
        linker.add_file(file)?;
    }
    if let Some(runtime) = &runtime {
        linker.add_runtime(runtime)?;
    }

    let artifact = linker.link(args.entry.as_slice(), &args.output)?;
    for file in &artifact.files {
        debug!("linked {}", file.display());
    }
    if !artifact.external_symbols.is_empty() {
        debug!(
            "left to the link tool: {}",
            artifact.external_symbols.sorted().join(", ")
        );
    }
    println!("{}", artifact.path.display());
    Ok(())
}

fn symbols(tools: &ToolArgs, files: &[PathBuf]) -> LinkResult<()> {
    let reader = DefaultSymbolReader::new(tools.toolchain().symbol_lister);
    for file in files {
        print_symbols(&reader, file)?;
    }
    Ok(())
}

fn print_symbols(reader: &dyn SymbolReader, path: &Path) -> LinkResult<()> {
    let table = reader.read_symbols(path)?;
    println!("{}:", path.display());
    for symbol in table.defined.sorted() {
        println!("  T {symbol}");
    }
    for symbol in table.undefined.sorted() {
        println!("  U {symbol}");
    }
    Ok(())
}
