//! Job aggregation across queues and statuses.

use crate::connection::ConnectionManager;
use crate::discovery::QueueDiscovery;
use crate::error::MonitorResult;
use crate::job::{Job, JobFilter, JobStatus};
use crate::metrics::JobMetrics;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Reads jobs page-by-page from every (queue, status) pair in scope.
///
/// Each pair contributes at most `page_size` records, read from offset 0.
/// A failing pair contributes nothing and never affects its siblings.
pub struct JobAggregator {
    connections: Arc<ConnectionManager>,
    discovery: Arc<QueueDiscovery>,
    page_size: usize,
}

impl JobAggregator {
    pub fn new(
        connections: Arc<ConnectionManager>,
        discovery: Arc<QueueDiscovery>,
        page_size: usize,
    ) -> Self {
        Self {
            connections,
            discovery,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Lists jobs matching `filter`.
    ///
    /// Results are grouped by queue in scope order, then by status in
    /// [`JobStatus::ALL`] order.
    pub async fn get_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let started = Instant::now();

        let queues = match &filter.queue {
            Some(queue) => vec![queue.clone()],
            None => self.discovery.discover().await,
        };
        let statuses = filter.statuses();
        let needle = filter.search_needle();

        let per_queue = queues
            .iter()
            .map(|queue| self.fetch_queue(queue, &statuses, needle.as_deref()));
        let jobs: Vec<Job> = join_all(per_queue).await.into_iter().flatten().collect();

        let elapsed = started.elapsed();
        JobMetrics::aggregation_duration(elapsed);
        debug!(
            queues = queues.len(),
            count = jobs.len(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Aggregated jobs"
        );

        jobs
    }

    async fn fetch_queue(&self, queue: &str, statuses: &[JobStatus], needle: Option<&str>) -> Vec<Job> {
        let handle = self.connections.get_handle(queue);
        let end = self.page_size - 1;

        let fetches = statuses.iter().map(|&status| {
            let handle = Arc::clone(&handle);
            async move { (status, handle.page(status, 0, end).await) }
        });

        let now = Utc::now();
        join_all(fetches)
            .await
            .into_iter()
            .flat_map(|(status, result)| match result {
                Ok(records) => {
                    JobMetrics::jobs_fetched(queue, status.as_str(), records.len());
                    records
                        .into_iter()
                        .map(|record| Job::from_record(record, queue, status, now))
                        .collect::<Vec<_>>()
                }
                Err(e) => {
                    JobMetrics::fetch_failed(queue, status.as_str());
                    warn!(queue = %queue, status = %status, error = %e, "Error fetching jobs");
                    Vec::new()
                }
            })
            .filter(|job| needle.map_or(true, |needle| job.matches_search(needle)))
            .collect()
    }

    /// Looks up one job and reports it under its current lifecycle state.
    ///
    /// Returns `None` when the job does not exist, when its state no longer
    /// maps to a listed status, or when the store cannot be read.
    pub async fn get_job_by_id(&self, queue: &str, id: &str) -> Option<Job> {
        match self.lookup(queue, id).await {
            Ok(job) => job,
            Err(e) => {
                warn!(queue = %queue, job_id = %id, error = %e, "Error getting job");
                None
            }
        }
    }

    async fn lookup(&self, queue: &str, id: &str) -> MonitorResult<Option<Job>> {
        let handle = self.connections.get_handle(queue);

        let Some(record) = handle.get_job(id).await? else {
            debug!(queue = %queue, job_id = %id, "Job not found");
            return Ok(None);
        };

        let state = handle.get_state(id).await?;
        let Some(status) = state.as_status() else {
            debug!(queue = %queue, job_id = %id, state = ?state, "Job has no listable state");
            return Ok(None);
        };

        Ok(Some(Job::from_record(record, queue, status, Utc::now())))
    }
}
