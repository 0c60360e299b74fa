// src/main.rs

mod cli;
mod config;
mod error;
mod graph;
mod history;
mod layout;
mod model;
mod renderer;
#[cfg(test)]
mod test_support;

use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use cli::Args;
use config::Settings;
use error::{Error, Result};
use history::{GitCli, HistoryExtractor, LogSource};
use log::{debug, error, info, Level, LevelFilter};
use renderer::RenderOptions;

fn init_logging() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{level}: {}", record.args()),
        })
        .init();
}

/// Extracts the commits touching the configured file and renders them.
/// Stops before rendering when nothing was found, whether because the file
/// was never touched or because git could not be run.
fn execute<S: LogSource>(
    settings: &Settings,
    extractor: &HistoryExtractor<S>,
    options: &RenderOptions,
) -> Result<()> {
    if !settings.repo_path.exists() {
        return Err(Error::RepoNotFound(settings.repo_path.clone()));
    }

    info!("Searching for commits touching file: {}...", settings.target_file);
    let commits =
        extractor.extract_commits_touching_file(&settings.repo_path, &settings.target_file);
    if commits.is_empty() {
        return Err(Error::NoCommits(settings.target_file.clone()));
    }
    info!("Found {} commits", commits.len());

    info!("Building dependency graph...");
    renderer::render_chain(&commits, &settings.output_file, options)
}

fn run(args: &Args) -> anyhow::Result<()> {
    let settings = Settings::from_file(&args.config)?;
    let extractor = HistoryExtractor::new(GitCli::new(&args.git));
    execute(&settings, &extractor, &RenderOptions::from(args))?;
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    let start_time = Instant::now();

    let result = run(&args);
    debug!("Total time: {:.2?}", start_time.elapsed());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
