//! Normalized job model.

use crate::record::JobRecord;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Job status as seen by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    Failed,
    Active,
    Waiting,
    Delayed,
}

impl JobStatus {
    /// Every status, in the order jobs are fetched and reported.
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Active,
        JobStatus::Waiting,
        JobStatus::Delayed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Active => "active",
            JobStatus::Waiting => "waiting",
            JobStatus::Delayed => "delayed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status `{0}`")]
pub struct ParseStatusError(pub String);

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "active" => Ok(JobStatus::Active),
            "waiting" | "wait" => Ok(JobStatus::Waiting),
            "delayed" => Ok(JobStatus::Delayed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// Lifecycle state reported by the store for a single job.
///
/// A superset of [`JobStatus`]: BullMQ also parks jobs as `prioritized` or
/// `waiting-children`, and answers `unknown` for ids it no longer tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    Completed,
    Failed,
    Active,
    Waiting,
    Delayed,
    Prioritized,
    WaitingChildren,
    Unknown,
}

impl JobState {
    /// Folds the lifecycle state into a dashboard status. Prioritized jobs and
    /// jobs waiting on children have not started yet, so they count as waiting.
    pub fn as_status(&self) -> Option<JobStatus> {
        match self {
            JobState::Completed => Some(JobStatus::Completed),
            JobState::Failed => Some(JobStatus::Failed),
            JobState::Active => Some(JobStatus::Active),
            JobState::Waiting | JobState::Prioritized | JobState::WaitingChildren => {
                Some(JobStatus::Waiting)
            }
            JobState::Delayed => Some(JobStatus::Delayed),
            JobState::Unknown => None,
        }
    }
}

impl From<JobStatus> for JobState {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Completed => JobState::Completed,
            JobStatus::Failed => JobState::Failed,
            JobStatus::Active => JobState::Active,
            JobStatus::Waiting => JobState::Waiting,
            JobStatus::Delayed => JobState::Delayed,
        }
    }
}

/// A point-in-time view of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub name: String,
    pub queue: String,
    pub status: JobStatus,
    pub progress: f64,
    pub attempts: u32,
    pub max_attempts: u32,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
    /// Processing time in ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl Job {
    /// Normalizes a stored record fetched from `queue` under `status`.
    ///
    /// `now` is the fetch time, used to derive `next_run_at` for delayed jobs.
    pub fn from_record(record: JobRecord, queue: &str, status: JobStatus, now: DateTime<Utc>) -> Self {
        let processed_at = record.processed_on.and_then(to_datetime);
        let finished_at = record.finished_on.and_then(to_datetime);

        let duration = match (record.processed_on, record.finished_on) {
            (Some(start), Some(end)) if processed_at.is_some() && finished_at.is_some() => {
                Some(end - start)
            }
            _ => None,
        };

        let next_run_at = match status {
            JobStatus::Delayed => record
                .configured_delay()
                .filter(|delay| *delay > 0)
                // Delays come from the producer; out-of-range values yield no run time.
                .and_then(ChronoDuration::try_milliseconds)
                .and_then(|delay| now.checked_add_signed(delay)),
            _ => None,
        };

        let failed_reason = match status {
            JobStatus::Failed => record.failed_reason.clone(),
            _ => None,
        };

        let max_attempts = record
            .opts_attempts()
            .filter(|attempts| *attempts >= 1)
            .map_or(1, |attempts| u32::try_from(attempts).unwrap_or(u32::MAX));

        Self {
            progress: parse_progress(record.progress.as_deref()),
            data: parse_data(record.data.as_deref()),
            created_at: record.timestamp.and_then(to_datetime).unwrap_or_default(),
            attempts: record.attempts_made.unwrap_or(0),
            max_attempts,
            name: record.name.unwrap_or_default(),
            id: record.id,
            queue: queue.to_string(),
            status,
            processed_at,
            finished_at,
            next_run_at,
            failed_reason,
            duration,
        }
    }

    /// Case-insensitive substring match against name or id.
    /// `needle` must already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.id.to_lowercase().contains(needle)
    }
}

/// Optional narrowing for job listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub queue: Option<String>,
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = Some(queue.into());
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Lowercased search term, or `None` when no search applies.
    pub(crate) fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Statuses to fetch.
    pub(crate) fn statuses(&self) -> Vec<JobStatus> {
        match self.status {
            Some(status) => vec![status],
            None => JobStatus::ALL.to_vec(),
        }
    }
}

// Zero means "never" in Bull's hashes.
fn to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    if millis == 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis).single()
}

fn parse_progress(raw: Option<&str>) -> f64 {
    raw.and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|value| value.as_f64())
        .map_or(0.0, |progress| progress.clamp(0.0, 100.0))
}

fn parse_data(raw: Option<&str>) -> Value {
    raw.and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_else(|| Value::Object(Map::new()))
}
