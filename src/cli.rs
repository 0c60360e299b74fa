// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Settings file with RepoPath, TargetFile and OutputFile
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Width of the output image in pixels
    #[arg(long, default_value_t = 1280, value_parser = clap::value_parser!(u32).range(64..))]
    pub width: u32,

    /// Height of the output image in pixels
    #[arg(long, default_value_t = 720, value_parser = clap::value_parser!(u32).range(64..))]
    pub height: u32,

    /// Number of force-directed layout rounds
    #[arg(long, default_value_t = 50)]
    pub iterations: usize,

    /// Seed for the initial node placement
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Which text to draw next to each commit
    #[arg(long, value_enum, default_value_t = LabelMode::Both)]
    pub labels: LabelMode,

    /// The git executable to run
    #[arg(long, default_value = "git")]
    pub git: PathBuf,
}

#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// Only the commit subject
    Message,
    /// Only the abbreviated hash
    Hash,
    /// The abbreviated hash above the node and the subject below it
    Both,
}

impl LabelMode {
    pub fn shows_message(self) -> bool {
        matches!(self, LabelMode::Message | LabelMode::Both)
    }

    pub fn shows_hash(self) -> bool {
        matches!(self, LabelMode::Hash | LabelMode::Both)
    }
}
