use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::circle::{ArtifactSource, BuildHistory, find_artifact};
use crate::config::Settings;
use crate::error::CartError;
use crate::resolver::resolve;
use crate::ui::{self, DownloadProgress};

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Artifacts were listed and no download was requested.
    Listed { build_num: u64 },
    /// The artifact exists but `--dry-run` skipped the download.
    DryRun { build_num: u64, url: String },
    Downloaded {
        build_num: u64,
        bytes: u64,
        path: PathBuf,
    },
}

/// Drives build selection and the artifact download for one invocation.
pub struct Runner<'a, C> {
    client: &'a C,
    settings: &'a Settings,
    /// Draw the download spinner.
    pub show_progress: bool,
}

impl<'a, C> Runner<'a, C>
where
    C: BuildHistory + ArtifactSource,
{
    pub fn new(client: &'a C, settings: &'a Settings) -> Self {
        Self {
            client,
            settings,
            show_progress: true,
        }
    }

    /// Returns `--build` if given, otherwise resolves one from the branch history.
    pub async fn select_build(&self) -> Result<u64, CartError> {
        let filters = &self.settings.filters;
        if let Some(build_num) = self.settings.build {
            info!("Build: {build_num}");
            return Ok(build_num);
        }

        let records = self
            .client
            .list_builds(&self.settings.project, &filters.branch, filters.search_depth)
            .await?;
        debug!(count = records.len(), branch = %filters.branch, "fetched build history");

        let build_num = resolve(&records, filters)?;
        info!("Build: {build_num} branch: {}", filters.branch);
        Ok(build_num)
    }

    pub async fn run(&self) -> Result<RunOutcome, CartError> {
        let settings = self.settings;
        let build_num = self.select_build().await?;

        let artifacts = self
            .client
            .list_artifacts(&settings.project, build_num)
            .await?;
        debug!(count = artifacts.len(), build_num, "fetched artifact list");
        for artifact in &artifacts {
            debug!(url = %artifact.url, "artifact");
        }

        if settings.shows_artifacts() {
            ui::print_artifacts(&artifacts, settings.artifact.as_deref());
        }

        let Some(name) = settings.artifact.as_deref() else {
            return Ok(RunOutcome::Listed { build_num });
        };

        let artifact = find_artifact(&artifacts, name)
            .ok_or_else(|| CartError::ArtifactNotFound(name.to_string()))?;
        debug!(url = %artifact.url, "artifact found");

        if settings.dry_run {
            ui::dry_run(name);
            return Ok(RunOutcome::DryRun {
                build_num,
                url: artifact.url.clone(),
            });
        }

        let path = settings
            .output_path()
            .ok_or_else(|| CartError::Config("no output path".into()))?;
        // Stream into a sibling temp file so a failed download never
        // touches an existing file at `path`.
        let staging = NamedTempFile::new_in(staging_dir(&path))?;
        let mut file = tokio::fs::File::from_std(staging.reopen()?);

        let progress = DownloadProgress::start(name, self.show_progress);
        let bytes = match self
            .client
            .fetch(artifact, &mut file, &mut |n| progress.update(n))
            .await
        {
            Ok(bytes) => bytes,
            Err(err) => {
                progress.abandon();
                return Err(err.into());
            }
        };
        file.sync_all().await?;
        drop(file);
        staging.persist(&path).map_err(|e| e.error)?;
        progress.finish(name, bytes, &path);

        Ok(RunOutcome::Downloaded {
            build_num,
            bytes,
            path,
        })
    }
}

/// Directory holding the download's temp file: the destination's parent.
fn staging_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}
