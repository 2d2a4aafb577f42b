//! Configuration for cart, loaded from an optional `cart.toml`.
//!
//! [`CartConfig`] holds the values that may live in the file. The
//! `CIRCLE_TOKEN` environment variable takes precedence over the file, and
//! command-line flags take precedence over both. [`Settings`] is the merged,
//! validated result used for one invocation.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::circle::client::API_URL;
use crate::circle::{Project, Vcs};
use crate::cli::Cli;
use crate::error::CartError;
use crate::resolver::FilterSet;

pub const TOKEN_ENV: &str = "CIRCLE_TOKEN";

/// Top-level configuration loaded from `cart.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CartConfig {
    /// CircleCI API token.
    #[serde(default)]
    pub token: String,

    /// Branch searched when `--branch` is not given.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Number of recent builds to search.
    #[serde(default = "default_search_depth")]
    pub search_depth: i64,

    /// CircleCI API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_search_depth() -> i64 {
    10
}

fn default_base_url() -> String {
    API_URL.to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            branch: default_branch(),
            search_depth: default_search_depth(),
            base_url: default_base_url(),
        }
    }
}

impl CartConfig {
    /// Loads `cart.toml` from the current directory, falling back to defaults.
    pub fn load() -> Result<Self, CartError> {
        let token = std::env::var(TOKEN_ENV).ok();
        Self::load_from(Path::new("cart.toml"), token)
    }

    /// Loads `path` if it exists; a non-empty `env_token` replaces the file's token.
    pub fn load_from(path: &Path, env_token: Option<String>) -> Result<Self, CartError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<CartConfig>(&contents)?
        } else {
            Self::default()
        };

        if let Some(token) = env_token
            && !token.is_empty()
        {
            config.token = token;
        }

        Ok(config)
    }
}

/// Everything one invocation needs, after validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project: Project,
    /// Artifact suffix; `None` only in list mode.
    pub artifact: Option<String>,
    pub token: String,
    pub base_url: String,
    /// Explicit build number; skips resolution.
    pub build: Option<u64>,
    pub filters: FilterSet,
    pub output: Option<PathBuf>,
    pub dry_run: bool,
    pub list_artifacts: bool,
    pub verbose: bool,
}

impl Settings {
    /// Merges flags over `config`. `detected` is the project found from the
    /// git remote, used when `--repo` is absent.
    ///
    /// Checks run in order: project, artifact, token, branch, search depth.
    pub fn resolve(cli: Cli, config: CartConfig, detected: Option<String>) -> Result<Self, CartError> {
        let vcs = Vcs::from(cli.vcs);
        let slug = cli.repo.filter(|r| !r.is_empty()).or(detected).unwrap_or_default();
        if slug.is_empty() {
            return Err(CartError::Config("no <owner>/<repo> provided".into()));
        }
        let project = Project::parse(vcs, &slug)
            .ok_or_else(|| CartError::Config(format!("invalid project {slug:?}: expected <owner>/<repo>")))?;

        let artifact = cli.artifact.filter(|a| !a.is_empty());
        if artifact.is_none() && !cli.list_artifacts {
            return Err(CartError::Config("no <artifact> provided".into()));
        }

        let token = cli.token.filter(|t| !t.is_empty()).unwrap_or(config.token);
        if token.is_empty() {
            return Err(CartError::Credential);
        }

        let branch = cli.branch.unwrap_or(config.branch);
        if branch.is_empty() {
            return Err(CartError::Config("no branch provided".into()));
        }

        let depth = cli.search_depth.unwrap_or(config.search_depth);
        let search_depth = u32::try_from(depth)
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| CartError::Config(format!("search depth must be positive, got {depth}")))?;

        Ok(Self {
            project,
            artifact,
            token,
            base_url: config.base_url,
            build: (cli.build > 0).then_some(cli.build),
            filters: FilterSet {
                workflow: cli.workflow.unwrap_or_default(),
                job: cli.job.unwrap_or_default(),
                any_generation: cli.ignore_later_workflows,
                search_depth,
                ..FilterSet::new(branch)
            },
            output: cli.output,
            dry_run: cli.dry_run,
            list_artifacts: cli.list_artifacts,
            verbose: cli.verbose,
        })
    }

    /// Whether the artifact listing is shown: in list mode or with `-v`.
    pub fn shows_artifacts(&self) -> bool {
        self.list_artifacts || self.verbose
    }

    /// Destination file: `--output`, else the base name of the artifact.
    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        let artifact = self.artifact.as_deref()?;
        Path::new(artifact)
            .file_name()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(artifact)))
    }
}
