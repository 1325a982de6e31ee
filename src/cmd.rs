use std::{
    fmt,
    path::{Path, PathBuf},
    process::Command,
};

use crate::config::{BuildConfig, Toolchain};

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl Cmd {
    pub fn new<T>(program: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn add_arg<T>(mut self, arg: T) -> Self
    where
        T: Into<String>,
    {
        self.args.push(arg.into());
        self
    }

    pub fn add_define<K, V>(self, key: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.add_arg(format!("-D{}={}", key.as_ref(), value.as_ref()))
    }

    pub fn set_current_dir<T>(mut self, dir: T) -> Self
    where
        T: Into<PathBuf>,
    {
        self.current_dir = Some(dir.into());
        self
    }

    /// `cmake -G .. -S .. -B .. -DCMAKE_BUILD_TYPE=..` plus the
    /// toolchain specific architecture and compiler switches.
    pub fn configure(config: &BuildConfig) -> Self {
        let mut cmd = Cmd::new(config.cmake_executable.as_str())
            .add_arg("-G")
            .add_arg(config.generator.as_str())
            .add_arg("-S")
            .add_arg(path_arg(&config.algorithm_directory))
            .add_arg("-B")
            .add_arg(path_arg(&config.build_directory))
            .add_define("CMAKE_BUILD_TYPE", &config.build_type)
            .set_current_dir(&config.algorithm_directory);

        // GCC has no platform switch, the bitness goes through the flags.
        cmd = match config.toolchain {
            Toolchain::Gcc => cmd.add_define("CMAKE_CXX_FLAGS", config.architecture.gcc_flag()),
            Toolchain::Msvc | Toolchain::Manual => cmd
                .add_arg("-A")
                .add_arg(config.architecture.platform_name()),
        };

        if !config.compiler_path.is_empty() {
            cmd = cmd.add_define("CMAKE_CXX_COMPILER", &config.compiler_path);
        }

        cmd
    }

    /// `cmake --build <dir> [--config <type>]`.
    pub fn build(cmake: &str, build_directory: &Path, build_type: &str, toolchain: Toolchain) -> Self {
        let mut cmd = Cmd::new(cmake)
            .add_arg("--build")
            .add_arg(path_arg(build_directory));

        if toolchain.is_multi_config() {
            cmd = cmd.add_arg("--config").add_arg(build_type);
        }

        cmd
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

/// Renders the invocation as a copy-pasteable shell line.
impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '"') {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Architecture, BuildForm};

    fn config(toolchain: Toolchain, architecture: Architecture, compiler: &str) -> BuildConfig {
        let mut config = BuildForm::new("/algos/3_sorting")
            .set_toolchain(toolchain)
            .set_architecture(architecture)
            .set_cmake("cmake")
            .submit_with(|_| None)
            .unwrap();
        config.compiler_path = compiler.to_string();
        config
    }

    #[test]
    fn configure_msvc_uses_platform_switch() {
        let cmd = Cmd::configure(&config(Toolchain::Msvc, Architecture::X86, "C:/VC/cl.exe"));

        assert_eq!(cmd.program(), "cmake");
        assert_eq!(
            cmd.args(),
            [
                "-G",
                "Visual Studio 17 2022",
                "-S",
                "/algos/3_sorting",
                "-B",
                "/algos/3_sorting/build",
                "-DCMAKE_BUILD_TYPE=Release",
                "-A",
                "Win32",
                "-DCMAKE_CXX_COMPILER=C:/VC/cl.exe",
            ]
        );
        assert_eq!(cmd.current_dir(), Some(Path::new("/algos/3_sorting")));
    }

    #[test]
    fn configure_gcc_uses_compiler_flag_instead_of_platform() {
        let cmd = Cmd::configure(&config(Toolchain::Gcc, Architecture::X64, ""));

        assert!(cmd.args().contains(&"-DCMAKE_CXX_FLAGS=-m64".to_string()));
        assert!(cmd.args().contains(&"MinGW Makefiles".to_string()));
        assert!(!cmd.args().contains(&"-A".to_string()));
        assert!(!cmd.args().iter().any(|a| a.starts_with("-DCMAKE_CXX_COMPILER")));
    }

    #[test]
    fn build_passes_config_only_for_multi_config_generators() {
        let dir = Path::new("/algos/3_sorting/build");

        let msvc = Cmd::build("cmake", dir, "Debug", Toolchain::Msvc);
        assert_eq!(msvc.args(), ["--build", "/algos/3_sorting/build", "--config", "Debug"]);

        let gcc = Cmd::build("cmake", dir, "Debug", Toolchain::Gcc);
        assert_eq!(gcc.args(), ["--build", "/algos/3_sorting/build"]);
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let cmd = Cmd::new("cmake").add_arg("-G").add_arg("MinGW Makefiles").add_arg("");
        assert_eq!(cmd.to_string(), "cmake -G \"MinGW Makefiles\" \"\"");
    }
}
