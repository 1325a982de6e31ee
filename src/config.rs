use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const MINGW_GENERATOR: &str = "MinGW Makefiles";
pub const VISUAL_STUDIO_GENERATOR: &str = "Visual Studio 17 2022";

/// Name of the optional settings file looked up in the algorithms root.
pub const SETTINGS_FILE: &str = "algomgr.json";

const DEFAULT_BUILD_TYPE: &str = "Release";
const DEFAULT_CXX_STANDARD: &str = "17";
const DEFAULT_BUILD_DIR: &str = "build";
const DEFAULT_OUTPUT_ENCODING: &str = "gbk";

/// Compiler family used for a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Toolchain {
    #[default]
    Msvc,
    Gcc,
    /// Compiler path typed in by the user.
    Manual,
}

impl Toolchain {
    pub fn generator(self) -> &'static str {
        match self {
            Toolchain::Gcc => MINGW_GENERATOR,
            Toolchain::Msvc | Toolchain::Manual => VISUAL_STUDIO_GENERATOR,
        }
    }

    /// Program looked up on `PATH` for this toolchain.
    pub fn compiler_program(self) -> Option<&'static str> {
        match self {
            Toolchain::Msvc => Some("cl"),
            Toolchain::Gcc => Some("g++"),
            Toolchain::Manual => None,
        }
    }

    /// Multi-config generators take `--config` at build time.
    pub fn is_multi_config(self) -> bool {
        self != Toolchain::Gcc
    }

    pub fn resolve_compiler(self, manual: &str) -> String {
        self.resolve_compiler_with(manual, |program| which::which(program).ok())
    }

    /// Resolve the compiler path with a custom `PATH` lookup.
    ///
    /// Only `Manual` ever looks at `manual`; a tool missing from the search
    /// path resolves to an empty string.
    pub fn resolve_compiler_with<F>(self, manual: &str, lookup: F) -> String
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let Some(program) = self.compiler_program() else {
            return manual.to_string();
        };

        match lookup(program) {
            Some(path) => path.to_string_lossy().into_owned(),
            None => {
                warn!(program, "compiler not found on PATH");
                String::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Architecture {
    #[serde(rename = "x86")]
    #[value(name = "x86")]
    X86,
    #[default]
    #[serde(rename = "x64")]
    #[value(name = "x64")]
    X64,
}

impl Architecture {
    /// Platform name passed to CMake's `-A` switch.
    pub fn platform_name(self) -> &'static str {
        match self {
            Architecture::X86 => "Win32",
            Architecture::X64 => "x64",
        }
    }

    pub fn gcc_flag(self) -> &'static str {
        match self {
            Architecture::X86 => "-m32",
            Architecture::X64 => "-m64",
        }
    }
}

/// Fully resolved parameters of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    pub algorithm_directory: PathBuf,
    pub build_directory: PathBuf,
    pub toolchain: Toolchain,
    pub compiler_path: String,
    pub architecture: Architecture,
    pub build_type: String,
    pub cmake_executable: String,
    pub generator: String,
    pub project_name: String,
    pub cxx_standard: String,
    pub selected_sources: Vec<PathBuf>,
}

impl BuildConfig {
    /// Directory name of the algorithm, e.g. `3_sorting`.
    pub fn algorithm_name(&self) -> String {
        self.algorithm_directory
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Defaults read from `algomgr.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub toolchain: Option<Toolchain>,
    pub compiler: Option<String>,
    pub architecture: Option<Architecture>,
    pub build_type: Option<String>,
    pub cmake: Option<String>,
    pub cxx_standard: Option<String>,
    pub build_dir: Option<String>,
    pub output_encoding: Option<String>,
}

impl Settings {
    /// Load the settings file from `root`, falling back to defaults when it
    /// does not exist.
    pub fn load<T>(root: T) -> Result<Self>
    where
        T: Into<PathBuf>,
    {
        let path = root.into();
        let path = if path.ends_with(SETTINGS_FILE) {
            path
        } else {
            path.join(SETTINGS_FILE)
        };

        if !path.is_file() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| Error::Settings { path, source })?;
        if let Some(name) = &settings.build_dir {
            check_build_dir_name(name)?;
        }
        Ok(settings)
    }

    pub fn output_encoding(&self) -> &str {
        self.output_encoding
            .as_deref()
            .unwrap_or(DEFAULT_OUTPUT_ENCODING)
    }
}

/// Values submitted by the user before resolution.
#[derive(Debug, Clone, Default)]
pub struct BuildForm {
    algorithm_directory: PathBuf,
    build_dir: Option<String>,
    toolchain: Toolchain,
    manual_compiler: String,
    architecture: Architecture,
    build_type: Option<String>,
    cmake: Option<String>,
    project_name: Option<String>,
    cxx_standard: Option<String>,
    selected_sources: Vec<PathBuf>,
}

impl BuildForm {
    pub fn new<T>(algorithm_directory: T) -> Self
    where
        T: Into<PathBuf>,
    {
        Self {
            algorithm_directory: algorithm_directory.into(),
            ..Self::default()
        }
    }

    /// Seed the form with values from a settings file.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        if let Some(toolchain) = settings.toolchain {
            self.toolchain = toolchain;
        }
        if let Some(architecture) = settings.architecture {
            self.architecture = architecture;
        }
        if let Some(compiler) = &settings.compiler {
            self.manual_compiler = compiler.clone();
        }
        self.build_type = settings.build_type.clone().or(self.build_type);
        self.cmake = settings.cmake.clone().or(self.cmake);
        self.cxx_standard = settings.cxx_standard.clone().or(self.cxx_standard);
        self.build_dir = settings.build_dir.clone().or(self.build_dir);
        self
    }

    pub fn set_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn set_manual_compiler<T>(mut self, compiler: T) -> Self
    where
        T: Into<String>,
    {
        self.manual_compiler = compiler.into();
        self
    }

    pub fn set_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn set_build_type<T>(mut self, build_type: T) -> Self
    where
        T: Into<String>,
    {
        self.build_type = Some(build_type.into());
        self
    }

    pub fn set_cmake<T>(mut self, cmake: T) -> Self
    where
        T: Into<String>,
    {
        self.cmake = Some(cmake.into());
        self
    }

    pub fn set_build_dir<T>(mut self, name: T) -> Self
    where
        T: Into<String>,
    {
        self.build_dir = Some(name.into());
        self
    }

    pub fn set_project_name<T>(mut self, name: T) -> Self
    where
        T: Into<String>,
    {
        self.project_name = Some(name.into());
        self
    }

    pub fn set_cxx_standard<T>(mut self, standard: T) -> Self
    where
        T: Into<String>,
    {
        self.cxx_standard = Some(standard.into());
        self
    }

    pub fn add_source<T>(mut self, source: T) -> Self
    where
        T: Into<PathBuf>,
    {
        self.selected_sources.push(source.into());
        self
    }

    pub fn submit(self) -> Result<BuildConfig> {
        self.submit_with(|program| which::which(program).ok())
    }

    /// Resolve the form into a [`BuildConfig`] using `lookup` for `PATH`
    /// searches.
    pub fn submit_with<F>(self, lookup: F) -> Result<BuildConfig>
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        let build_dir = self.build_dir.as_deref().unwrap_or(DEFAULT_BUILD_DIR);
        check_build_dir_name(build_dir)?;
        let build_directory = self.algorithm_directory.join(build_dir);

        let compiler_path = self
            .toolchain
            .resolve_compiler_with(&self.manual_compiler, &lookup);

        let cmake_executable = match self.cmake {
            Some(cmake) => cmake,
            None => lookup("cmake")
                .map(|path| path.to_string_lossy().into_owned())
                .unwrap_or_else(|| {
                    warn!("cmake not found on PATH, falling back to `cmake`");
                    "cmake".to_string()
                }),
        };

        let project_name = self
            .project_name
            .unwrap_or_else(|| default_project_name(&self.algorithm_directory));

        Ok(BuildConfig {
            build_directory,
            toolchain: self.toolchain,
            compiler_path,
            architecture: self.architecture,
            build_type: self
                .build_type
                .unwrap_or_else(|| DEFAULT_BUILD_TYPE.to_string()),
            cmake_executable,
            generator: self.toolchain.generator().to_string(),
            project_name,
            cxx_standard: self
                .cxx_standard
                .unwrap_or_else(|| DEFAULT_CXX_STANDARD.to_string()),
            selected_sources: self.selected_sources,
            algorithm_directory: self.algorithm_directory,
        })
    }
}

/// The build directory is wiped before every build, so it must be a single
/// plain directory name inside the algorithm directory.
pub fn check_build_dir_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(Error::InvalidBuildDir(name.to_string())),
    }
}

fn default_project_name(algorithm_directory: &Path) -> String {
    algorithm_directory
        .file_name()
        .map(|name| crate::launch::executable_base_name(&name.to_string_lossy()))
        .unwrap_or_else(|| "algorithm".to_string())
}
