//! # algomgr
//!
//! Configure, build and launch CMake based algorithm projects.
//!
//! An algorithms root holds one directory per algorithm, named
//! `<index>_<name>` (`3_sorting`). For a chosen directory `algomgr`
//! resolves the toolchain into a [`BuildConfig`], then runs
//! `cmake` configure, `cmake --build` and finally the produced executable,
//! one stage after another.
//!
//! ```no_run
//! use algomgr::{BuildForm, Orchestrator, OutputDecoder, Toolchain};
//!
//! let config = BuildForm::new("/algos/3_sorting")
//!     .set_toolchain(Toolchain::Gcc)
//!     .set_build_type("Debug")
//!     .submit()?;
//!
//! let rx = Orchestrator::system(OutputDecoder::default()).spawn(config);
//! for event in rx {
//!     println!("{event:?}");
//! }
//! # Ok::<(), algomgr::Error>(())
//! ```

pub mod cli;
pub mod cmake;
pub mod cmd;
pub mod config;
pub mod error;
pub mod launch;
pub mod logging;
pub mod orchestrator;
pub mod process;
pub mod project;

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use tracing::debug;

pub use cmd::Cmd;
pub use config::{Architecture, BuildConfig, BuildForm, Settings, Toolchain};
pub use error::{Error, Result};
pub use orchestrator::{BuildEvent, BuildOutcome, BuildState, Orchestrator};
pub use process::{OutputDecoder, Stream};

use crate::cli::{BuildArgs, CliArgs, Command, ParamArgs, PreviewArgs};
use crate::cmake::CMakeListsPreview;

/// High-level entry point used by `main.rs`.
pub fn run(args: CliArgs) -> anyhow::Result<()> {
    run_with(args, &mut io::stdout().lock())
}

/// Like [`run`], writing the command's report to `out`.
///
/// Process stderr is still relayed to the real stderr.
pub fn run_with(args: CliArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    match args.command {
        Command::List => list(&args.root, out),
        Command::Preview(preview_args) => preview(&args.root, preview_args, out),
        Command::Build(build_args) => build(&args.root, build_args, out),
    }
}

fn list(root: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    for name in project::list_algorithms(root)? {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

fn preview(root: &Path, args: PreviewArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let settings = Settings::load(root)?;
    let dir = project::algorithm_directory(root, &args.params.algorithm)?;
    cmake::ensure_cmakelists(&dir)?;

    let discovered = cmake::discover_sources(&dir)?;
    let sources = cmake::select_sources(&discovered, &args.sources)?;

    let mut form = form(dir.clone(), &settings, &args.params);
    if let Some(project) = &args.project {
        form = form.set_project_name(project.as_str());
    }
    for source in sources {
        form = form.add_source(source);
    }
    let config = form.submit()?;

    let cmakelists = CMakeListsPreview::new(
        config.project_name.as_str(),
        config.cxx_standard.as_str(),
        config.selected_sources.clone(),
    );

    writeln!(out, "# {}", dir.join(cmake::CMAKELISTS).display())?;
    write!(out, "{}", cmakelists.render())?;
    writeln!(out)?;
    writeln!(out, "# configure")?;
    writeln!(out, "{}", Cmd::configure(&config))?;

    if args.write {
        let path = cmakelists.write(&dir)?;
        writeln!(out, "wrote {}", path.display())?;
    }
    Ok(())
}

fn build(root: &Path, args: BuildArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let settings = Settings::load(root)?;
    let dir = project::algorithm_directory(root, &args.params.algorithm)?;
    cmake::ensure_cmakelists(&dir)?;

    let config = form(dir, &settings, &args.params).submit()?;
    if args.dump_config {
        writeln!(out, "{}", serde_json::to_string_pretty(&config)?)?;
    }

    let decoder = OutputDecoder::new(settings.output_encoding())?;
    let rx = Orchestrator::system(decoder)
        .set_launch(!args.no_launch)
        .spawn(config);

    let mut outcome = None;
    for event in rx {
        match event {
            BuildEvent::State(state) => debug!(?state, "state changed"),
            BuildEvent::Output {
                stream: Stream::Stdout,
                text,
            } => write!(out, "{text}")?,
            BuildEvent::Output {
                stream: Stream::Stderr,
                text,
            } => eprint!("{text}"),
            BuildEvent::Message(message) => writeln!(out, "{message}")?,
            BuildEvent::Finished(finished) => outcome = Some(finished),
        }
    }

    let outcome = outcome.context("build worker stopped without reporting an outcome")?;
    if !outcome.success() {
        bail!("{outcome}");
    }
    writeln!(out, "{outcome}")?;
    Ok(())
}

/// Build the form from settings, then apply command-line overrides.
fn form(dir: PathBuf, settings: &Settings, params: &ParamArgs) -> BuildForm {
    let mut form = BuildForm::new(dir).with_settings(settings);

    if let Some(toolchain) = params.toolchain {
        form = form.set_toolchain(toolchain);
    }
    if let Some(compiler) = &params.compiler {
        form = form.set_manual_compiler(compiler.as_str());
    }
    if let Some(architecture) = params.architecture {
        form = form.set_architecture(architecture);
    }
    if let Some(build_type) = &params.build_type {
        form = form.set_build_type(build_type.as_str());
    }
    if let Some(cmake) = &params.cmake {
        form = form.set_cmake(cmake.as_str());
    }
    if let Some(standard) = &params.cxx_standard {
        form = form.set_cxx_standard(standard.as_str());
    }
    form
}
