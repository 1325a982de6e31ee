//! Configure → build → launch pipeline.
//!
//! Stages run strictly one after another. A stage's output is fully relayed
//! before the next stage starts, and a non-zero exit code ends the pipeline
//! without running anything further.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
    thread,
};

use tracing::{error, info, warn};

use crate::{
    cmd::Cmd,
    config::{BuildConfig, Toolchain},
    launch::{self, Launcher, SystemLauncher},
    process::{OutputDecoder, ProcessResult, ProcessRunner, SPAWN_FAILED, Stream, SystemRunner},
    project,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Configuring,
    Building,
    Launching,
    Done,
    ConfigureFailed,
    BuildFailed,
    LaunchFailed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildState::Done
                | BuildState::ConfigureFailed
                | BuildState::BuildFailed
                | BuildState::LaunchFailed
        )
    }
}

/// How a build attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Launched { executable: PathBuf },
    /// Built and located, launching was disabled.
    Built { executable: PathBuf },
    ConfigureFailed { exit_code: i32 },
    BuildFailed { exit_code: i32 },
    ArtifactNotFound { searched: Vec<PathBuf> },
    LaunchFailed { executable: PathBuf, reason: String },
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        matches!(self, BuildOutcome::Launched { .. } | BuildOutcome::Built { .. })
    }

    pub fn state(&self) -> BuildState {
        match self {
            BuildOutcome::Launched { .. } | BuildOutcome::Built { .. } => BuildState::Done,
            BuildOutcome::ConfigureFailed { .. } => BuildState::ConfigureFailed,
            BuildOutcome::BuildFailed { .. } => BuildState::BuildFailed,
            BuildOutcome::ArtifactNotFound { .. } | BuildOutcome::LaunchFailed { .. } => {
                BuildState::LaunchFailed
            }
        }
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Launched { executable } => write!(f, "running {}", executable.display()),
            BuildOutcome::Built { executable } => write!(f, "built {}", executable.display()),
            BuildOutcome::ConfigureFailed { exit_code } => {
                write!(f, "configure failed with exit code {exit_code}")
            }
            BuildOutcome::BuildFailed { exit_code } => {
                write!(f, "build failed with exit code {exit_code}")
            }
            BuildOutcome::ArtifactNotFound { searched } => {
                write!(f, "executable not found, searched:")?;
                for path in searched {
                    write!(f, " {}", path.display())?;
                }
                Ok(())
            }
            BuildOutcome::LaunchFailed { executable, reason } => {
                write!(f, "failed to launch {}: {reason}", executable.display())
            }
        }
    }
}

/// Result of the locate-and-launch stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchResult {
    Launched(PathBuf),
    Located(PathBuf),
    NotFound(Vec<PathBuf>),
    Failed { executable: PathBuf, reason: String },
}

impl From<LaunchResult> for BuildOutcome {
    fn from(result: LaunchResult) -> Self {
        match result {
            LaunchResult::Launched(executable) => BuildOutcome::Launched { executable },
            LaunchResult::Located(executable) => BuildOutcome::Built { executable },
            LaunchResult::NotFound(searched) => BuildOutcome::ArtifactNotFound { searched },
            LaunchResult::Failed { executable, reason } => {
                BuildOutcome::LaunchFailed { executable, reason }
            }
        }
    }
}

/// Progress reported to the caller while a build runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    State(BuildState),
    Output { stream: Stream, text: String },
    Message(String),
    Finished(BuildOutcome),
}

pub struct Orchestrator<R, L> {
    runner: R,
    launcher: L,
    state: BuildState,
    launch: bool,
}

impl Orchestrator<SystemRunner, SystemLauncher> {
    pub fn system(decoder: OutputDecoder) -> Self {
        Self::new(SystemRunner::new(decoder), SystemLauncher)
    }
}

impl<R, L> Orchestrator<R, L>
where
    R: ProcessRunner,
    L: Launcher,
{
    pub fn new(runner: R, launcher: L) -> Self {
        Self {
            runner,
            launcher,
            state: BuildState::Idle,
            launch: true,
        }
    }

    /// Stop after locating the artifact instead of launching it.
    pub fn set_launch(mut self, launch: bool) -> Self {
        self.launch = launch;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn configure(&mut self, config: &BuildConfig, emit: &mut dyn FnMut(BuildEvent)) -> ProcessResult {
        let cmd = Cmd::configure(config);
        self.run_stage(&cmd, emit)
    }

    pub fn build(
        &mut self,
        cmake: &str,
        build_directory: &Path,
        build_type: &str,
        toolchain: Toolchain,
        emit: &mut dyn FnMut(BuildEvent),
    ) -> ProcessResult {
        let cmd = Cmd::build(cmake, build_directory, build_type, toolchain);
        self.run_stage(&cmd, emit)
    }

    pub fn locate_and_launch(
        &mut self,
        build_directory: &Path,
        algorithm_name: &str,
        build_type: &str,
        emit: &mut dyn FnMut(BuildEvent),
    ) -> LaunchResult {
        let Some(executable) = launch::locate_executable(build_directory, algorithm_name, build_type)
        else {
            return LaunchResult::NotFound(launch::candidate_paths(
                build_directory,
                algorithm_name,
                build_type,
            ));
        };

        if !self.launch {
            return LaunchResult::Located(executable);
        }

        emit(BuildEvent::Message(format!("running {} ...", executable.display())));
        if let Err(err) = self.launcher.launch(&executable) {
            error!(executable = %executable.display(), error = %err, "launch failed");
            return LaunchResult::Failed {
                executable,
                reason: err.to_string(),
            };
        }

        if let Some(dir) = executable.parent() {
            if let Err(err) = self.launcher.reveal(dir) {
                warn!(dir = %dir.display(), error = %err, "could not open containing folder");
            }
        }

        LaunchResult::Launched(executable)
    }

    /// Run the whole pipeline for `config`, reporting through `emit`.
    ///
    /// The returned outcome is also sent as the final
    /// [`BuildEvent::Finished`].
    pub fn run(&mut self, config: &BuildConfig, emit: &mut dyn FnMut(BuildEvent)) -> BuildOutcome {
        let outcome = self.run_inner(config, emit);
        self.transition(outcome.state(), emit);

        if outcome.success() {
            info!(%outcome, "build finished");
        } else {
            error!(%outcome, "build finished");
        }
        emit(BuildEvent::Finished(outcome.clone()));
        outcome
    }

    /// Run the pipeline on a worker thread.
    pub fn spawn(mut self, config: BuildConfig) -> Receiver<BuildEvent>
    where
        R: 'static,
        L: 'static,
    {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            self.run(&config, &mut |event| {
                let _ = tx.send(event);
            });
        });

        rx
    }

    fn run_inner(&mut self, config: &BuildConfig, emit: &mut dyn FnMut(BuildEvent)) -> BuildOutcome {
        let name = config.algorithm_name();

        self.transition(BuildState::Configuring, emit);
        emit(BuildEvent::Message(format!("configuring {name} ...")));
        if let Err(err) = project::prepare_build_directory(&config.build_directory, &config.algorithm_directory) {
            emit(BuildEvent::Message(format!(
                "cannot prepare {}: {err}",
                config.build_directory.display()
            )));
            return BuildOutcome::ConfigureFailed {
                exit_code: SPAWN_FAILED,
            };
        }

        let configured = self.configure(config, emit);
        if !configured.success() {
            return BuildOutcome::ConfigureFailed {
                exit_code: configured.exit_code,
            };
        }

        self.transition(BuildState::Building, emit);
        emit(BuildEvent::Message(format!("building {name} ...")));
        let built = self.build(
            &config.cmake_executable,
            &config.build_directory,
            &config.build_type,
            config.toolchain,
            emit,
        );
        if !built.success() {
            return BuildOutcome::BuildFailed {
                exit_code: built.exit_code,
            };
        }

        self.transition(BuildState::Launching, emit);
        self.locate_and_launch(&config.build_directory, &name, &config.build_type, emit)
            .into()
    }

    fn run_stage(&mut self, cmd: &Cmd, emit: &mut dyn FnMut(BuildEvent)) -> ProcessResult {
        info!(command = %cmd, "starting process");
        emit(BuildEvent::Message(cmd.to_string()));

        let result = self.runner.run(cmd, &mut |stream, text| {
            emit(BuildEvent::Output {
                stream,
                text: text.to_string(),
            });
        });

        emit(BuildEvent::Message(format!(
            "process exited with code {}",
            result.exit_code
        )));
        result
    }

    fn transition(&mut self, next: BuildState, emit: &mut dyn FnMut(BuildEvent)) {
        info!(from = ?self.state, to = ?next, "build state");
        self.state = next;
        emit(BuildEvent::State(next));
    }
}
