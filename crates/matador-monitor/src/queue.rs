//! Queue summaries and job counters.

use crate::job::{Job, JobStatus};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Per-status job counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub completed: u64,
    pub failed: u64,
    pub active: u64,
    pub waiting: u64,
    pub delayed: u64,
}

impl JobCounts {
    pub fn get(&self, status: JobStatus) -> u64 {
        match status {
            JobStatus::Completed => self.completed,
            JobStatus::Failed => self.failed,
            JobStatus::Active => self.active,
            JobStatus::Waiting => self.waiting,
            JobStatus::Delayed => self.delayed,
        }
    }

    pub fn increment(&mut self, status: JobStatus) {
        let counter = match status {
            JobStatus::Completed => &mut self.completed,
            JobStatus::Failed => &mut self.failed,
            JobStatus::Active => &mut self.active,
            JobStatus::Waiting => &mut self.waiting,
            JobStatus::Delayed => &mut self.delayed,
        };
        *counter += 1;
    }

    pub fn total(&self) -> u64 {
        JobStatus::ALL.iter().map(|status| self.get(*status)).sum()
    }
}

/// A discovered queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub name: String,
    pub is_paused: bool,
    pub job_counts: JobCounts,
}

/// Aggregate job statistics.
///
/// Only the five counters are stored; `total` is derived when serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    counts: JobCounts,
}

impl Stats {
    /// Tallies one counter per job status.
    pub fn tally<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let mut counts = JobCounts::default();
        for job in jobs {
            counts.increment(job.status);
        }
        Self { counts }
    }

    pub fn counts(&self) -> &JobCounts {
        &self.counts
    }

    pub fn get(&self, status: JobStatus) -> u64 {
        self.counts.get(status)
    }

    pub fn total(&self) -> u64 {
        self.counts.total()
    }
}

impl From<JobCounts> for Stats {
    fn from(counts: JobCounts) -> Self {
        Self { counts }
    }
}

impl Serialize for Stats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Stats", 6)?;
        state.serialize_field("completed", &self.counts.completed)?;
        state.serialize_field("failed", &self.counts.failed)?;
        state.serialize_field("active", &self.counts.active)?;
        state.serialize_field("waiting", &self.counts.waiting)?;
        state.serialize_field("delayed", &self.counts.delayed)?;
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}
