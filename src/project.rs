//! Algorithm directories under a root folder.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Algorithm directories are named `<index>_<name>`, e.g. `3_sorting`.
///
/// Only ASCII digits count as an index; names led by other Unicode digits
/// (`٣_sorting`) are deliberately not algorithm directories.
pub fn is_algorithm_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_digit()) && name.contains('_')
}

/// Names of the algorithm directories directly under `root`, sorted.
pub fn list_algorithms(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Err(Error::InvalidRoot(root.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_algorithm_name(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Absolute path of the algorithm `name` under `root`.
pub fn algorithm_directory(root: &Path, name: &str) -> Result<PathBuf> {
    let dir = root.join(name);
    if !dir.is_dir() {
        return Err(Error::UnknownAlgorithm(name.to_string()));
    }
    Ok(std::path::absolute(&dir)?)
}

/// Delete and recreate `dir`; leaves an empty directory behind.
///
/// Refuses to touch a `dir` that is, or contains, `algorithm_directory`.
pub fn prepare_build_directory(dir: &Path, algorithm_directory: &Path) -> Result<()> {
    if dir.exists() {
        let build = dir.canonicalize()?;
        let algorithm = algorithm_directory
            .canonicalize()
            .unwrap_or_else(|_| algorithm_directory.to_path_buf());
        if algorithm.starts_with(&build) {
            return Err(Error::BuildDirContainsSources { build, algorithm });
        }

        debug!(dir = %dir.display(), "removing previous build directory");
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_indexed_names() {
        assert!(is_algorithm_name("3_sorting"));
        assert!(is_algorithm_name("10_graph_search"));
        assert!(!is_algorithm_name("sorting"));
        assert!(!is_algorithm_name("3sorting"));
        assert!(!is_algorithm_name("_3"));
        assert!(!is_algorithm_name(""));
        assert!(!is_algorithm_name("٣_sorting"));
    }

    #[test]
    fn lists_only_algorithm_directories() {
        let root = tempfile::tempdir().unwrap();
        for dir in ["2_graph", "1_dp", "dev", "build"] {
            std::fs::create_dir(root.path().join(dir)).unwrap();
        }
        std::fs::write(root.path().join("3_notes.txt"), "").unwrap();

        assert_eq!(list_algorithms(root.path()).unwrap(), ["1_dp", "2_graph"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            list_algorithms(&root.path().join("nope")),
            Err(Error::InvalidRoot(_))
        ));
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            algorithm_directory(root.path(), "9_missing"),
            Err(Error::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn prepare_discards_previous_contents() {
        let root = tempfile::tempdir().unwrap();
        let build = root.path().join("build");
        std::fs::create_dir_all(build.join("Release")).unwrap();
        std::fs::write(build.join("CMakeCache.txt"), "stale").unwrap();

        prepare_build_directory(&build, &root.path().join("1_dp")).unwrap();
        assert!(build.is_dir());
        assert_eq!(std::fs::read_dir(&build).unwrap().count(), 0);
    }

    #[test]
    fn prepare_refuses_to_remove_sources() {
        let root = tempfile::tempdir().unwrap();
        let algorithm = root.path().join("1_dp");
        std::fs::create_dir_all(&algorithm).unwrap();
        std::fs::write(algorithm.join("main.cpp"), "").unwrap();
        let sibling = root.path().join("2_other");
        std::fs::create_dir_all(&sibling).unwrap();
        std::fs::write(sibling.join("main.cpp"), "").unwrap();

        let dirs = [
            algorithm.clone(),
            algorithm.join("."),
            algorithm.join(".."),
            root.path().to_path_buf(),
        ];
        for dir in dirs {
            assert!(matches!(
                prepare_build_directory(&dir, &algorithm),
                Err(Error::BuildDirContainsSources { .. })
            ));
        }
        assert!(algorithm.join("main.cpp").is_file());
        assert!(sibling.join("main.cpp").is_file());
    }

    #[test]
    fn prepare_twice_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let build = root.path().join("build");

        let algorithm = root.path().join("1_dp");
        prepare_build_directory(&build, &algorithm).unwrap();
        prepare_build_directory(&build, &algorithm).unwrap();
        assert!(build.is_dir());
        assert_eq!(std::fs::read_dir(&build).unwrap().count(), 0);
    }
}
