//! Command-line interface for fathom.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fathom_link::{ToolCommand, Toolchain};

#[derive(Parser)]
#[command(name = "fathom")]
#[command(about = "Native backend and tree-shaking linker for the typed subset", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Link object and bitcode files, keeping only what the entry symbols reach
    Link(LinkArgs),
    /// Print the symbols each file defines and references
    Symbols {
        #[command(flatten)]
        tools: ToolArgs,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Args)]
pub struct LinkArgs {
    /// Entry symbol; repeat for several
    #[arg(short, long = "entry", value_name = "SYMBOL", required = true)]
    pub entry: Vec<String>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory of precompiled runtime objects and archives
    #[arg(long, env = "FATHOM_RUNTIME_DIR")]
    pub runtime_dir: Option<PathBuf>,

    /// Runtime file linked explicitly instead of by reachability
    #[arg(long, value_name = "FILE")]
    pub exclude: Vec<OsString>,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Compiled units to link
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ToolArgs {
    #[arg(long, value_enum, default_value_t = ToolchainKind::Native)]
    pub toolchain: ToolchainKind,

    /// Archive extraction tool
    #[arg(long, env = "FATHOM_AR")]
    pub ar: Option<PathBuf>,

    /// Link tool
    #[arg(long, env = "FATHOM_LINKER")]
    pub linker: Option<PathBuf>,

    /// Symbol-listing tool
    #[arg(long, env = "FATHOM_NM")]
    pub nm: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ToolchainKind {
    /// ar, cc and nm; produces a native executable
    Native,
    /// llvm-ar, llvm-link and llvm-nm; produces one bitcode module
    Llvm,
}

impl ToolArgs {
    pub fn toolchain(&self) -> Toolchain {
        let mut toolchain = match self.toolchain {
            ToolchainKind::Llvm => Toolchain::llvm_bitcode(),
            ToolchainKind::Native => Toolchain::native(),
        };

        for (program, tool) in [
            (&self.ar, &mut toolchain.archiver),
            (&self.linker, &mut toolchain.linker),
            (&self.nm, &mut toolchain.symbol_lister),
        ] {
            if let Some(program) = program {
                *tool = ToolCommand {
                    program: program.clone(),
                    args: std::mem::take(&mut tool.args),
                };
            }
        }
        toolchain
    }
}
