//! Project detection from the local git checkout via libgit2.
//!
//! [`detect_project`] reads the `origin` remote of the repository enclosing
//! a directory and turns its url into an `<owner>/<repo>` slug.

use anyhow::{Context, Result};
use git2::Repository;
use std::path::Path;
use tracing::debug;

const HOSTS: [&str; 2] = ["github.com", "bitbucket.org"];

/// Returns the `<owner>/<repo>` slug of the `origin` remote of the
/// repository containing `path`, or `None` if it cannot be determined.
pub fn detect_project(path: &Path) -> Option<String> {
    match origin_url(path) {
        Ok(url) => {
            let project = project_from_remote(&url);
            debug!(remote = %url, project = ?project, "read git origin");
            project
        }
        Err(err) => {
            debug!("no project from git: {err:#}");
            None
        }
    }
}

fn origin_url(path: &Path) -> Result<String> {
    let repo = Repository::discover(path).context("failed to open git repository")?;
    let remote = repo
        .find_remote("origin")
        .context("repository has no origin remote")?;
    let url = remote.url().context("origin url is not valid UTF-8")?;
    Ok(url.to_string())
}

/// Extracts `<owner>/<repo>` from a GitHub or Bitbucket remote url.
///
/// Handles `https://github.com/o/r`, `git@github.com:o/r.git`, and
/// `ssh://git@github.com/o/r.git`.
pub fn project_from_remote(url: &str) -> Option<String> {
    let rest = HOSTS.iter().find_map(|host| {
        let at = url.find(host)?;
        let rest = &url[at + host.len()..];
        rest.strip_prefix('/').or_else(|| rest.strip_prefix(':'))
    })?;

    let rest = rest.trim_end_matches('/');
    let rest = rest.strip_suffix(".git").unwrap_or(rest);
    let (owner, name) = rest.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(format!("{owner}/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn parses_https_remote() {
        assert_eq!(
            project_from_remote("https://github.com/nbio/cart"),
            Some("nbio/cart".into())
        );
    }

    #[test]
    fn parses_ssh_remote() {
        assert_eq!(
            project_from_remote("git@github.com:nbio/cart.git"),
            Some("nbio/cart".into())
        );
        assert_eq!(
            project_from_remote("ssh://git@github.com/nbio/cart.git"),
            Some("nbio/cart".into())
        );
    }

    #[test]
    fn parses_bitbucket_remote() {
        assert_eq!(
            project_from_remote("git@bitbucket.org:team/service.git"),
            Some("team/service".into())
        );
    }

    #[test]
    fn rejects_unknown_hosts_and_partial_paths() {
        assert_eq!(project_from_remote("https://gitlab.com/a/b.git"), None);
        assert_eq!(project_from_remote("https://github.com/nbio"), None);
    }

    #[test]
    fn detect_fails_quietly_outside_a_repo() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(detect_project(&PathBuf::from(tmp.path())), None);
    }

    #[test]
    fn detect_reads_origin_remote() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        repo.remote("origin", "git@github.com:nbio/cart.git").unwrap();
        drop(repo);

        let nested = tmp.path().join("sub");
        std::fs::create_dir(&nested).unwrap();
        assert_eq!(detect_project(&nested), Some("nbio/cart".into()));
    }

    #[test]
    fn detect_without_origin_is_none() {
        let tmp = TempDir::new().unwrap();
        Repository::init(tmp.path()).unwrap();
        assert_eq!(detect_project(tmp.path()), None);
    }
}
