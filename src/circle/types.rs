//! Payload types for the CircleCI v1.1 REST API.
//!
//! Only the fields cart needs are decoded; everything else in the
//! provider's JSON is ignored by serde.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source control host a project lives on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Vcs {
    #[default]
    Github,
    Bitbucket,
}

impl Vcs {
    /// Path segment used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Vcs::Github => "github",
            Vcs::Bitbucket => "bitbucket",
        }
    }
}

/// A CircleCI project, addressed as `<vcs>/<owner>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub vcs: Vcs,
    pub owner: String,
    pub name: String,
}

impl Project {
    /// Parses an `owner/name` slug. Anything else is rejected.
    pub fn parse(vcs: Vcs, slug: &str) -> Option<Self> {
        let (owner, name) = slug.trim().split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            vcs,
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Final outcome of a single job build.
///
/// CircleCI reports many outcomes (`failed`, `canceled`, `timedout`,
/// `infrastructure_fail`, ...) plus `null` while a build is running. Only
/// `success` matters for resolution, so everything else collapses to
/// [`Outcome::Other`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    #[default]
    #[serde(other)]
    Other,
}

impl Outcome {
    fn from_nullable<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Option::<Outcome>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// Workflow membership of a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInfo {
    pub workflow_name: String,
    /// Instance id shared by every job build of one workflow run.
    pub workflow_id: String,
    pub job_name: String,
    pub job_id: String,
}

/// One entry of a branch's build history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub build_num: u64,
    #[serde(default)]
    pub vcs_revision: String,
    #[serde(default, deserialize_with = "Outcome::from_nullable")]
    pub outcome: Outcome,
    /// Lifecycle status as reported by the provider (`success`, `running`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// `None` for builds that ran outside any workflow.
    #[serde(default, rename = "workflows")]
    pub workflow: Option<WorkflowInfo>,
}

impl BuildRecord {
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Short revision for status output.
    pub fn short_revision(&self) -> &str {
        let end = self
            .vcs_revision
            .char_indices()
            .nth(7)
            .map_or(self.vcs_revision.len(), |(i, _)| i);
        &self.vcs_revision[..end]
    }
}

impl fmt::Display for BuildRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.build_num, self.short_revision())?;
        if let Some(wf) = &self.workflow {
            write!(f, " {}/{} [{}]", wf.workflow_name, wf.job_name, wf.workflow_id)?;
        }
        Ok(())
    }
}

/// An artifact produced by a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub url: String,
}

impl Artifact {
    /// True if either the url or the path ends with `name`.
    pub fn matches(&self, name: &str) -> bool {
        self.url.ends_with(name) || self.path.ends_with(name)
    }
}

/// Returns the first artifact whose url or path ends with `name`.
pub fn find_artifact<'a>(artifacts: &'a [Artifact], name: &str) -> Option<&'a Artifact> {
    artifacts.iter().find(|a| a.matches(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_parse_accepts_owner_and_name() {
        let project = Project::parse(Vcs::Github, "nbio/cart").unwrap();
        assert_eq!(project.owner, "nbio");
        assert_eq!(project.name, "cart");
        assert_eq!(project.to_string(), "nbio/cart");
        assert_eq!(project.vcs.as_str(), "github");
    }

    #[test]
    fn project_parse_rejects_malformed_slugs() {
        assert!(Project::parse(Vcs::Github, "cart").is_none());
        assert!(Project::parse(Vcs::Github, "/cart").is_none());
        assert!(Project::parse(Vcs::Github, "nbio/").is_none());
        assert!(Project::parse(Vcs::Bitbucket, "a/b/c").is_none());
    }

    #[test]
    fn build_record_deserialize_from_api_format() {
        let json = r#"{
            "build_num": 812,
            "vcs_revision": "9f3c2e1d0a4b5c6d7e8f",
            "outcome": "success",
            "status": "success",
            "branch": "master",
            "workflows": {
                "job_name": "build",
                "job_id": "a1",
                "workflow_id": "wf-1",
                "workflow_name": "release",
                "upstream_job_ids": []
            }
        }"#;
        let record: BuildRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.build_num, 812);
        assert!(record.is_success());
        let wf = record.workflow.unwrap();
        assert_eq!(wf.workflow_name, "release");
        assert_eq!(wf.workflow_id, "wf-1");
        assert_eq!(wf.job_name, "build");
    }

    #[test]
    fn unknown_and_null_outcomes_are_other() {
        let failed: BuildRecord =
            serde_json::from_str(r#"{"build_num": 1, "outcome": "infrastructure_fail"}"#).unwrap();
        assert_eq!(failed.outcome, Outcome::Other);

        let running: BuildRecord =
            serde_json::from_str(r#"{"build_num": 2, "outcome": null, "status": "running"}"#)
                .unwrap();
        assert_eq!(running.outcome, Outcome::Other);
        assert_eq!(running.status.as_deref(), Some("running"));

        let missing: BuildRecord = serde_json::from_str(r#"{"build_num": 3}"#).unwrap();
        assert!(!missing.is_success());
        assert!(missing.workflow.is_none());
    }

    #[test]
    fn display_includes_workflow_when_present() {
        let record = BuildRecord {
            build_num: 42,
            vcs_revision: "abcdef0123456".into(),
            outcome: Outcome::Success,
            status: None,
            workflow: Some(WorkflowInfo {
                workflow_name: "ci".into(),
                workflow_id: "x1".into(),
                job_name: "test".into(),
                job_id: "j".into(),
            }),
        };
        assert_eq!(record.to_string(), "#42 (abcdef0) ci/test [x1]");
    }

    #[test]
    fn short_revision_tolerates_short_hashes() {
        let record: BuildRecord =
            serde_json::from_str(r#"{"build_num": 1, "vcs_revision": "abc"}"#).unwrap();
        assert_eq!(record.short_revision(), "abc");
    }

    #[test]
    fn find_artifact_matches_by_suffix() {
        let artifacts = vec![
            Artifact {
                path: "home/ubuntu/out.tar.gz".into(),
                url: "https://circle-artifacts.com/0/home/ubuntu/out.tar.gz".into(),
            },
            Artifact {
                path: "home/ubuntu/readme.txt".into(),
                url: "https://circle-artifacts.com/0/home/ubuntu/readme.txt".into(),
            },
        ];
        let found = find_artifact(&artifacts, "out.tar.gz").unwrap();
        assert_eq!(found.path, "home/ubuntu/out.tar.gz");
        assert!(find_artifact(&artifacts, "missing.zip").is_none());
    }

    #[test]
    fn artifact_matches_on_path_when_url_differs() {
        let artifact = Artifact {
            path: "dist/app.zip".into(),
            url: "https://example.com/download?id=7".into(),
        };
        assert!(artifact.matches("app.zip"));
    }
}
