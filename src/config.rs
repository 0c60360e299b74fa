// src/config.rs

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct RawCfg {
    #[serde(rename = "Settings")]
    settings: Option<RawSettings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSettings {
    repo_path: Option<PathBuf>,
    target_file: Option<String>,
    output_file: Option<PathBuf>,
}

/// What to inspect and where to put the picture, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root of the git working tree
    pub repo_path: PathBuf,
    /// Path of the tracked file, relative to the repository root
    pub target_file: String,
    /// Image to write, format taken from the extension
    pub output_file: PathBuf,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self> {
        let raw: RawCfg = toml::from_str(contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = raw.settings.ok_or(Error::MissingSetting("Settings"))?;

        Ok(Self {
            repo_path: settings.repo_path.ok_or(Error::MissingSetting("RepoPath"))?,
            target_file: settings
                .target_file
                .ok_or(Error::MissingSetting("TargetFile"))?,
            output_file: settings
                .output_file
                .ok_or(Error::MissingSetting("OutputFile"))?,
        })
    }
}
