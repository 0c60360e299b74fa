// src/error.rs

use std::{io, path::PathBuf, process::ExitStatus, result::Result as StdResult};

use thiserror::Error;

pub type Result<T> = StdResult<T, Error>;

/// Everything that can go wrong between reading the settings file and
/// writing the rendered graph.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read settings file {}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings file {}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing key in settings file: {0}")]
    MissingSetting(&'static str),

    #[error("repository path does not exist: {}", .0.display())]
    RepoNotFound(PathBuf),

    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    GitFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("no commits touching file: {0}")]
    NoCommits(String),

    #[error("cannot render an empty commit list")]
    EmptyGraph,

    #[error("failed to load the label font")]
    Font,

    #[error("failed to write image {}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("fatal I/O error with output file")]
    Io(#[from] io::Error),
}
