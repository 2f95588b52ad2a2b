//! Job state reconciliation: the authoritative client-side job map.

use std::collections::HashMap;

use crate::types::{JobRecord, JobStatus};

/// Always-current mapping from job id to its latest record
///
/// Refreshed with full-replace semantics: every incoming snapshot, whether
/// it arrived on the push channel or from a periodic poll, is the complete
/// authoritative set of currently known jobs, so applying one drops every
/// job it does not mention. The store never merges and never assumes status
/// monotonicity; whatever the latest snapshot says, goes.
///
/// Derived views are pure filters recomputed on demand; they can never
/// retain stale entries.
#[derive(Debug, Default)]
pub struct JobStateStore {
    jobs: HashMap<String, JobRecord>,
}

impl JobStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire job map with a snapshot
    pub fn apply_snapshot(&mut self, snapshot: Vec<JobRecord>) {
        self.jobs = snapshot
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        tracing::trace!(count = self.jobs.len(), "Applied job snapshot");
    }

    /// Look up one job by id
    pub fn get(&self, id: &str) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    /// Whether a job id is present in the live set
    pub fn contains(&self, id: &str) -> bool {
        self.jobs.contains_key(id)
    }

    /// Iterate over all live jobs, in no particular order
    pub fn jobs(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    /// Number of live jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the live set is empty
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs queued but not started
    pub fn pending(&self) -> Vec<&JobRecord> {
        self.filtered(|status| status == JobStatus::Pending)
    }

    /// Jobs actively transferring: downloads and livestream captures
    pub fn active(&self) -> Vec<&JobRecord> {
        self.filtered(|status| {
            matches!(status, JobStatus::Downloading | JobStatus::Livestream)
        })
    }

    /// Jobs that finished successfully
    pub fn completed(&self) -> Vec<&JobRecord> {
        self.filtered(|status| status == JobStatus::Completed)
    }

    /// Jobs that failed
    pub fn errored(&self) -> Vec<&JobRecord> {
        self.filtered(|status| status == JobStatus::Errored)
    }

    fn filtered(&self, predicate: impl Fn(JobStatus) -> bool) -> Vec<&JobRecord> {
        self.jobs
            .values()
            .filter(|record| predicate(record.status()))
            .collect()
    }
}
