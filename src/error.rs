//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("algorithm not found: {0}")]
    UnknownAlgorithm(String),

    #[error("algorithms root is not a directory: {0}")]
    InvalidRoot(PathBuf),

    #[error("build directory must be a single directory name, got {0:?}")]
    InvalidBuildDir(String),

    #[error("build directory {build:?} would remove the sources in {algorithm:?}")]
    BuildDirContainsSources { build: PathBuf, algorithm: PathBuf },

    #[error("unknown text encoding label: {0}")]
    UnknownEncoding(String),

    #[error("source {0} is not part of the discovered sources")]
    UnknownSource(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
