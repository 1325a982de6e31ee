//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{Architecture, Toolchain};

/// Command-line arguments for `algomgr`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "algomgr",
    version,
    about = "Configure, build and run CMake algorithm projects.",
    long_about = None
)]
pub struct CliArgs {
    /// Folder holding the `<index>_<name>` algorithm directories.
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ALGOMGR_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the algorithm directories under the root.
    List,

    /// Show the CMakeLists.txt and configure command an algorithm would use.
    Preview(PreviewArgs),

    /// Configure, build and launch an algorithm.
    Build(BuildArgs),
}

/// Parameters shared by `preview` and `build`.
#[derive(Debug, Clone, Default, Args)]
pub struct ParamArgs {
    /// Algorithm directory name, e.g. `3_sorting`.
    pub algorithm: String,

    #[arg(long, value_enum)]
    pub toolchain: Option<Toolchain>,

    /// Compiler path, used with `--toolchain manual`.
    #[arg(long, value_name = "PATH")]
    pub compiler: Option<String>,

    #[arg(long = "arch", value_enum)]
    pub architecture: Option<Architecture>,

    #[arg(long, value_name = "TYPE")]
    pub build_type: Option<String>,

    /// CMake executable; looked up on PATH when omitted.
    #[arg(long, value_name = "PATH")]
    pub cmake: Option<String>,

    #[arg(long, value_name = "N")]
    pub cxx_standard: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub params: ParamArgs,

    /// Project name for the generated CMakeLists.txt.
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,

    /// Source to include, relative to the algorithm directory. Repeatable;
    /// every discovered source is included when omitted.
    #[arg(long = "source", value_name = "PATH")]
    pub sources: Vec<PathBuf>,

    /// Write the preview over CMakeLists.txt.
    #[arg(long)]
    pub write: bool,
}

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub params: ParamArgs,

    /// Stop after the build and report the executable.
    #[arg(long)]
    pub no_launch: bool,

    /// Print the resolved build configuration as JSON before building.
    #[arg(long)]
    pub dump_config: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
