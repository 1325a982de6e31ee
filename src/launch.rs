//! Locating and launching the produced executable.

use std::{
    env::consts::EXE_SUFFIX,
    io,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::{debug, info, warn};

/// Base name of the executable an algorithm directory builds.
///
/// `3_sorting` builds `sorting`; a name without `_` is used as is.
pub fn executable_base_name(algorithm_name: &str) -> String {
    match algorithm_name.split_once('_') {
        Some((_, rest)) => rest.to_string(),
        None => algorithm_name.to_string(),
    }
}

pub fn executable_name(algorithm_name: &str) -> String {
    format!("{}{}", executable_base_name(algorithm_name), EXE_SUFFIX)
}

/// Paths checked for the artifact, in order.
pub fn candidate_paths(build_directory: &Path, algorithm_name: &str, build_type: &str) -> Vec<PathBuf> {
    let exe = executable_name(algorithm_name);
    vec![
        build_directory.join(&exe),
        build_directory.join(build_type).join(&exe),
    ]
}

pub fn locate_executable(build_directory: &Path, algorithm_name: &str, build_type: &str) -> Option<PathBuf> {
    candidate_paths(build_directory, algorithm_name, build_type)
        .into_iter()
        .inspect(|path| debug!(path = %path.display(), "looking for executable"))
        .find(|path| path.is_file())
}

pub trait Launcher: Send {
    /// Start `executable` detached, in its own console window.
    fn launch(&mut self, executable: &Path) -> io::Result<()>;

    /// Show `directory` in the platform file browser.
    fn reveal(&mut self, directory: &Path) -> io::Result<()>;
}

/// Launches through the host OS.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&mut self, executable: &Path) -> io::Result<()> {
        let mut command = console_command(executable);
        if let Some(dir) = executable.parent() {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = command.spawn()?;
        info!(pid = child.id(), executable = %executable.display(), "launched");
        Ok(())
    }

    fn reveal(&mut self, directory: &Path) -> io::Result<()> {
        let opener = if cfg!(windows) {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };

        if !cfg!(windows) && which::which(opener).is_err() {
            warn!(opener, "no file browser opener found");
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{opener} not found in path"),
            ));
        }

        Command::new(opener)
            .arg(directory)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

#[cfg(windows)]
fn console_command(executable: &Path) -> Command {
    use std::os::windows::process::CommandExt;

    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

    let mut command = Command::new(executable);
    command.creation_flags(CREATE_NEW_CONSOLE);
    command
}

#[cfg(target_os = "macos")]
fn console_command(executable: &Path) -> Command {
    let mut command = Command::new("open");
    command.args(["-a", "Terminal"]).arg(executable);
    command
}

#[cfg(all(unix, not(target_os = "macos")))]
fn console_command(executable: &Path) -> Command {
    // Fall back to a plain detached child when there is no terminal emulator.
    match which::which("x-terminal-emulator") {
        Ok(terminal) => {
            let mut command = Command::new(terminal);
            command.arg("-e").arg(executable);
            command
        }
        Err(_) => Command::new(executable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_strips_index_prefix() {
        assert_eq!(executable_base_name("3_sorting"), "sorting");
        assert_eq!(executable_base_name("12_graph_search"), "graph_search");
        assert_eq!(executable_base_name("noUnderscore"), "noUnderscore");
        assert_eq!(executable_base_name("_lead"), "lead");
    }

    #[test]
    fn candidates_are_flat_then_per_config() {
        let build = Path::new("/algos/3_sorting/build");
        let exe = format!("sorting{EXE_SUFFIX}");
        assert_eq!(
            candidate_paths(build, "3_sorting", "Release"),
            vec![build.join(&exe), build.join("Release").join(&exe)]
        );
    }

    #[test]
    fn locate_prefers_flat_layout() {
        let dir = tempfile::tempdir().unwrap();
        let exe = executable_name("1_dp");
        std::fs::create_dir_all(dir.path().join("Debug")).unwrap();
        std::fs::write(dir.path().join("Debug").join(&exe), b"").unwrap();

        assert_eq!(
            locate_executable(dir.path(), "1_dp", "Debug"),
            Some(dir.path().join("Debug").join(&exe))
        );

        std::fs::write(dir.path().join(&exe), b"").unwrap();
        assert_eq!(
            locate_executable(dir.path(), "1_dp", "Debug"),
            Some(dir.path().join(&exe))
        );
    }

    #[test]
    fn locate_ignores_directories_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(executable_name("2_bfs"))).unwrap();
        assert_eq!(locate_executable(dir.path(), "2_bfs", "Release"), None);
    }
}
