//! Picks the build whose artifacts should be downloaded.
//!
//! CircleCI's build listing is flattened across every workflow touching a
//! branch and only exposes per-job outcomes, newest first. A workflow run is
//! a chain of job builds sharing one instance id, and its *last* job is the
//! first one seen when scanning. To find an earlier job of the current run
//! the scan anchors on the first build of the requested workflow, latches
//! that build's instance id, and keeps walking back through the same
//! instance until the requested job shows up. Builds of older instances are
//! never considered once an instance is latched.

use thiserror::Error;
use tracing::debug;

use crate::circle::BuildRecord;

/// Constraints for one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    pub branch: String,
    /// Workflow name; empty means any.
    pub workflow: String,
    /// Job name; empty means any.
    pub job: String,
    /// Accept matches from any workflow instance instead of only the newest.
    pub any_generation: bool,
    /// Number of history records requested from the provider.
    pub search_depth: u32,
}

impl FilterSet {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            workflow: String::new(),
            job: String::new(),
            any_generation: false,
            search_depth: 10,
        }
    }

    fn wants_workflow(&self) -> bool {
        !self.workflow.is_empty() || !self.job.is_empty()
    }
}

/// No build satisfied the filters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no builds found for branch: {branch}")]
    NoBuilds { branch: String },

    #[error("no successful build found for workflow: {workflow} job: {job} branch: {branch}")]
    NoMatch {
        workflow: String,
        job: String,
        branch: String,
    },
}

impl ResolveError {
    fn no_match(filters: &FilterSet) -> Self {
        let star = |s: &str| if s.is_empty() { "*".to_string() } else { s.to_string() };
        ResolveError::NoMatch {
            workflow: star(&filters.workflow),
            job: star(&filters.job),
            branch: filters.branch.clone(),
        }
    }
}

/// Why a record was passed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    NotInWorkflow,
    Unsuccessful,
    OtherInstance,
    OtherWorkflow,
    OtherJob,
}

/// Decision for a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Skip(Skip),
    Match,
}

/// State carried through one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Instance id of the workflow run being walked, once anchored.
    pub latched: Option<String>,
}

impl Scan {
    /// Judges `record` against `filters`, latching the workflow instance on the
    /// first record of the requested workflow.
    ///
    /// Returns the verdict and whether this record became the head of the
    /// latched workflow run.
    pub fn evaluate(&mut self, record: &BuildRecord, filters: &FilterSet) -> (Verdict, bool) {
        let workflow = match &record.workflow {
            Some(wf) => Some(wf),
            None if filters.wants_workflow() => {
                return (Verdict::Skip(Skip::NotInWorkflow), false);
            }
            None => None,
        };

        if !record.is_success() {
            return (Verdict::Skip(Skip::Unsuccessful), false);
        }

        let instance = workflow.map(|wf| wf.workflow_id.as_str());
        if let Some(latched) = &self.latched
            && instance != Some(latched.as_str())
        {
            return (Verdict::Skip(Skip::OtherInstance), false);
        }

        let name = workflow.map(|wf| wf.workflow_name.as_str());
        if !filters.workflow.is_empty() && name != Some(filters.workflow.as_str()) {
            return (Verdict::Skip(Skip::OtherWorkflow), false);
        }

        let mut head = false;
        if self.latched.is_none() && !filters.workflow.is_empty() && !filters.any_generation {
            self.latched = instance.map(str::to_string);
            head = true;
        }

        let job = workflow.map(|wf| wf.job_name.as_str());
        if !filters.job.is_empty() && job != Some(filters.job.as_str()) {
            return (Verdict::Skip(Skip::OtherJob), head);
        }

        (Verdict::Match, head)
    }
}

/// Returns the build number of the first record satisfying `filters`.
///
/// `records` must be ordered newest first.
pub fn resolve(records: &[BuildRecord], filters: &FilterSet) -> Result<u64, ResolveError> {
    if records.is_empty() {
        return Err(ResolveError::NoBuilds {
            branch: filters.branch.clone(),
        });
    }

    let mut scan = Scan::default();
    for record in records {
        let (verdict, head) = scan.evaluate(record, filters);
        if head {
            debug!(build = %record, "head of workflow");
        }
        match verdict {
            Verdict::Match => {
                debug!(
                    build = %record,
                    job_id = record.workflow.as_ref().map_or("-", |wf| wf.job_id.as_str()),
                    "matched"
                );
                return Ok(record.build_num);
            }
            Verdict::Skip(reason) => {
                debug!(build = %record, ?reason, status = record.status.as_deref().unwrap_or("-"), "skipped");
            }
        }
    }

    Err(ResolveError::no_match(filters))
}
