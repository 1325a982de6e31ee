use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::error::{Error, Result};

pub const CMAKELISTS: &str = "CMakeLists.txt";

const SOURCE_DIR: &str = "src";
const SOURCE_EXTENSIONS: [&str; 4] = ["cpp", "cc", "cxx", "c"];

/// Create an empty `CMakeLists.txt` in `dir` unless one already exists.
pub fn ensure_cmakelists(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CMAKELISTS);
    if !path.exists() {
        info!(path = %path.display(), "creating empty CMakeLists.txt");
        std::fs::write(&path, "")?;
    }
    Ok(path)
}

/// Sources of an algorithm project, relative to its directory: the root
/// `main` source followed by everything under `src/`.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    for ext in SOURCE_EXTENSIONS {
        let main = PathBuf::from(format!("main.{ext}"));
        if dir.join(&main).is_file() {
            sources.push(main);
            break;
        }
    }

    let src = dir.join(SOURCE_DIR);
    if src.is_dir() {
        let mut nested = Vec::new();
        for entry in std::fs::read_dir(&src)? {
            let path = entry?.path();
            if path.is_file() && is_source(&path) {
                if let Some(name) = path.file_name() {
                    nested.push(Path::new(SOURCE_DIR).join(name));
                }
            }
        }
        nested.sort();
        sources.extend(nested);
    }

    debug!(dir = %dir.display(), count = sources.len(), "discovered sources");
    Ok(sources)
}

/// Keep the checked subset of `discovered`; an empty selection checks
/// everything.
pub fn select_sources(discovered: &[PathBuf], selected: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if selected.is_empty() {
        return Ok(discovered.to_vec());
    }

    if let Some(unknown) = selected.iter().find(|s| !discovered.contains(s)) {
        return Err(Error::UnknownSource(unknown.clone()));
    }

    Ok(discovered
        .iter()
        .filter(|source| selected.contains(source))
        .cloned()
        .collect())
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Intended contents of a project's `CMakeLists.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeListsPreview {
    project_name: String,
    cxx_standard: String,
    sources: Vec<PathBuf>,
}

impl CMakeListsPreview {
    pub fn new<N, S>(project_name: N, cxx_standard: S, sources: Vec<PathBuf>) -> Self
    where
        N: Into<String>,
        S: Into<String>,
    {
        Self {
            project_name: project_name.into(),
            cxx_standard: cxx_standard.into(),
            sources,
        }
    }

    /// One `add_executable` per source, named after the file stem.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "cmake_minimum_required(VERSION 3.10)");
        let _ = writeln!(out, "project({})", self.project_name);
        let _ = writeln!(out);
        let _ = writeln!(out, "set(CMAKE_CXX_STANDARD {})", self.cxx_standard);
        let _ = writeln!(out, "set(CMAKE_CXX_STANDARD_REQUIRED ON)");

        if !self.sources.is_empty() {
            let _ = writeln!(out);
        }
        for source in &self.sources {
            let target = source
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "add_executable({target} {})",
                source.to_string_lossy().replace('\\', "/")
            );
        }
        out
    }

    /// Overwrite `dir/CMakeLists.txt` with the rendered preview.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(CMAKELISTS);
        std::fs::write(&path, self.render())?;
        info!(path = %path.display(), "wrote CMakeLists.txt");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.cpp"), "int main() {}").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/quick.cpp"), "").unwrap();
        std::fs::write(dir.path().join("src/heap.cc"), "").unwrap();
        std::fs::write(dir.path().join("src/heap.h"), "").unwrap();
        dir
    }

    #[test]
    fn ensure_creates_empty_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = ensure_cmakelists(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        std::fs::write(&path, "project(x)").unwrap();
        ensure_cmakelists(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "project(x)");
    }

    #[test]
    fn discovers_main_then_src_files() {
        let dir = project();
        let sources = discover_sources(dir.path()).unwrap();
        assert_eq!(
            sources,
            vec![
                PathBuf::from("main.cpp"),
                PathBuf::from("src").join("heap.cc"),
                PathBuf::from("src").join("quick.cpp"),
            ]
        );
    }

    #[test]
    fn selection_keeps_discovery_order_and_rejects_unknown() {
        let discovered = vec![PathBuf::from("main.cpp"), PathBuf::from("src/a.cpp")];

        let all = select_sources(&discovered, &[]).unwrap();
        assert_eq!(all, discovered);

        let some = select_sources(&discovered, &[PathBuf::from("src/a.cpp")]).unwrap();
        assert_eq!(some, vec![PathBuf::from("src/a.cpp")]);

        assert!(matches!(
            select_sources(&discovered, &[PathBuf::from("src/b.cpp")]),
            Err(Error::UnknownSource(_))
        ));
    }

    #[test]
    fn preview_has_one_executable_per_checked_source() {
        let sources = vec![PathBuf::from("main.cpp"), PathBuf::from("src/quick.cpp")];
        let text = CMakeListsPreview::new("sorting", "20", sources).render();

        let targets: Vec<&str> = text
            .lines()
            .filter(|line| line.starts_with("add_executable("))
            .collect();
        assert_eq!(
            targets,
            ["add_executable(main main.cpp)", "add_executable(quick src/quick.cpp)"]
        );
        assert!(text.contains("project(sorting)"));
        assert!(text.contains("set(CMAKE_CXX_STANDARD 20)"));
    }

    #[test]
    fn preview_is_written_only_on_request() {
        let dir = project();
        let existing = ensure_cmakelists(dir.path()).unwrap();
        let preview = CMakeListsPreview::new("p", "17", vec![PathBuf::from("main.cpp")]);
        let _ = preview.render();
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "");

        preview.write(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), preview.render());
    }
}
