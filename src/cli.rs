//! Command-line interface for cart, built on clap.
//!
//! Flags map onto [`Settings`](crate::config::Settings) once merged with the
//! environment and `cart.toml`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::circle::Vcs;

/// Download an artifact from the latest green CircleCI build of a branch.
#[derive(Debug, Parser)]
#[command(name = "cart", version, about)]
pub struct Cli {
    /// Artifact to download, matched as a suffix of the artifact url or path.
    pub artifact: Option<String>,

    /// Project as <owner>/<repo>. Detected from the git origin remote if omitted.
    #[arg(long)]
    pub repo: Option<String>,

    /// Source control host of the project.
    #[arg(long, value_enum, default_value_t = VcsArg::Github)]
    pub vcs: VcsArg,

    /// Search builds for this branch [default: master].
    #[arg(long)]
    pub branch: Option<String>,

    /// Get artifacts for build #<n>, skipping the search.
    #[arg(long, default_value_t = 0)]
    pub build: u64,

    /// Only consider builds of this workflow.
    #[arg(long)]
    pub workflow: Option<String>,

    /// Only consider builds of this job.
    #[arg(long, visible_alias = "job-name")]
    pub job: Option<String>,

    /// Number of recent builds to search [default: 10].
    #[arg(long, allow_negative_numbers = true)]
    pub search_depth: Option<i64>,

    /// Accept builds from older runs of the workflow, not just the latest.
    #[arg(long)]
    pub ignore_later_workflows: bool,

    /// CircleCI API token. Falls back to $CIRCLE_TOKEN.
    #[arg(long)]
    pub token: Option<String>,

    /// Output file path [default: base name of <ARTIFACT>].
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Find the artifact but skip the download.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// List every artifact of the selected build.
    #[arg(short, long)]
    pub list_artifacts: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// VCS host accepted by the CLI, mapped to [`Vcs`] internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VcsArg {
    Github,
    Bitbucket,
}

impl From<VcsArg> for Vcs {
    fn from(arg: VcsArg) -> Self {
        match arg {
            VcsArg::Github => Vcs::Github,
            VcsArg::Bitbucket => Vcs::Bitbucket,
        }
    }
}
