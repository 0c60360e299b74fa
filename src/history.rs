// src/history.rs

use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output},
};

use log::{debug, warn};

use crate::{
    error::{Error, Result},
    model::{CommitList, CommitRecord},
};

/// Produces the raw `git log --name-only` text for a repository
pub trait LogSource {
    fn log(&self, repo: &Path) -> Result<String>;
}

/// Runs the git binary against the repository via `-C`, leaving the
/// process working directory alone.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
}

impl GitCli {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    fn stdout(&self, output: Output) -> Result<String> {
        if !output.status.success() {
            return Err(Error::GitFailed {
                program: self.program_name(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl LogSource for GitCli {
    fn log(&self, repo: &Path) -> Result<String> {
        // Commits without any changed files (merges, empty commits) would put
        // two headers back to back, so the diff filter drops them.
        let output = Command::new(&self.program)
            .arg("-c")
            .arg("core.quotePath=false")
            .arg("-C")
            .arg(repo)
            .arg("log")
            .arg("--name-only")
            .arg("--diff-filter=ACDMRTUXB")
            .arg("--pretty=format:%H %s")
            .output()
            .map_err(|source| Error::Spawn {
                program: self.program_name(),
                source,
            })?;

        self.stdout(output)
    }
}

enum State {
    /// Between commits, the next non-blank line is a header
    Idle,
    /// Reading the file list of a commit
    Open {
        record: CommitRecord,
        seen_files: bool,
    },
    /// The commit already matched, skipping the rest of its files
    Matched,
}

/// Picks the commits whose file list contains `target` out of
/// `git log --name-only` output, keeping the order of the input.
pub fn parse_log(output: &str, target: &str) -> CommitList {
    let mut commits = CommitList::new();
    let mut state = State::Idle;

    for line in output.lines() {
        let blank = line.trim().is_empty();

        state = match state {
            State::Idle if blank => State::Idle,
            State::Idle => State::Open {
                record: CommitRecord::from_header(line),
                seen_files: false,
            },
            // A blank line right after the header separates it from the file
            // list; anywhere else it ends the commit.
            State::Open {
                record,
                seen_files: false,
            } if blank => State::Open {
                record,
                seen_files: false,
            },
            State::Open { .. } | State::Matched if blank => State::Idle,
            State::Open { record, .. } if line.trim() == target => {
                commits.push(record);
                State::Matched
            }
            State::Open { record, .. } => State::Open {
                record,
                seen_files: true,
            },
            State::Matched => State::Matched,
        };
    }

    commits
}

/// Finds the commits that touched a file, newest first.
pub struct HistoryExtractor<S> {
    source: S,
}

impl<S: LogSource> HistoryExtractor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Like [`Self::extract_commits_touching_file`], but reports a failing
    /// log source instead of treating it as an empty history.
    pub fn try_extract(&self, repo: &Path, target: &str) -> Result<CommitList> {
        let output = self.source.log(repo)?;
        let commits = parse_log(&output, target);
        debug!(
            "{} commits touch {target} in {} lines of log output",
            commits.len(),
            output.lines().count()
        );
        Ok(commits)
    }

    /// Returns an empty list when the log cannot be obtained, so a failing
    /// git and a file nobody ever touched look the same to the caller.
    pub fn extract_commits_touching_file(&self, repo: &Path, target: &str) -> CommitList {
        self.try_extract(repo, target).unwrap_or_else(|err| {
            warn!("Error while running git log in {}: {err}", repo.display());
            CommitList::new()
        })
    }
}

impl Default for HistoryExtractor<GitCli> {
    fn default() -> Self {
        Self::new(GitCli::default())
    }
}
