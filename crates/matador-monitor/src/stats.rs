//! Status counters derived from job listings.

use crate::aggregator::JobAggregator;
use crate::job::JobFilter;
use crate::queue::Stats;
use std::sync::Arc;
use tracing::debug;

/// Tallies jobs by status.
///
/// Counts come from the same capped listing as [`JobAggregator::get_jobs`], so
/// a status holding more than one page of jobs is undercounted.
pub struct StatsAggregator {
    aggregator: Arc<JobAggregator>,
}

impl StatsAggregator {
    pub fn new(aggregator: Arc<JobAggregator>) -> Self {
        Self { aggregator }
    }

    /// Counters across every discovered queue.
    pub async fn get_stats(&self) -> Stats {
        self.tally(&JobFilter::new()).await
    }

    /// Counters for one queue.
    pub async fn get_queue_stats(&self, queue: &str) -> Stats {
        self.tally(&JobFilter::new().queue(queue)).await
    }

    async fn tally(&self, filter: &JobFilter) -> Stats {
        let jobs = self.aggregator.get_jobs(filter).await;
        let stats = Stats::tally(&jobs);
        debug!(queue = ?filter.queue, total = stats.total(), "Computed stats");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionManager;
    use crate::discovery::QueueDiscovery;
    use crate::job::{JobState, JobStatus};
    use crate::memory::InMemoryQueueStore;
    use crate::record::JobRecord;
    use std::time::Duration;

    fn build(store: &InMemoryQueueStore) -> (Arc<JobAggregator>, StatsAggregator) {
        let connections = Arc::new(ConnectionManager::new(Arc::new(store.clone())));
        let discovery = Arc::new(QueueDiscovery::new(
            Arc::clone(&connections),
            Duration::from_secs(5),
        ));
        let aggregator = Arc::new(JobAggregator::new(connections, discovery, 30));
        (Arc::clone(&aggregator), StatsAggregator::new(aggregator))
    }

    fn seed(store: &InMemoryQueueStore) {
        for i in 0..3 {
            store.add_job("email-queue", JobState::Completed, JobRecord::new(format!("c{i}")));
        }
        store.add_job("email-queue", JobState::Failed, JobRecord::new("f1"));
        store.add_job("image-processing", JobState::Active, JobRecord::new("a1"));
        store.add_job("image-processing", JobState::Delayed, JobRecord::new("d1"));
        store.add_job("image-processing", JobState::Waiting, JobRecord::new("w1"));
    }

    #[tokio::test]
    async fn test_total_matches_unfiltered_listing() {
        let store = InMemoryQueueStore::new();
        seed(&store);
        let (aggregator, stats) = build(&store);

        let overall = stats.get_stats().await;
        let jobs = aggregator.get_jobs(&JobFilter::new()).await;

        assert_eq!(overall.total(), jobs.len() as u64);
        assert_eq!(overall.get(JobStatus::Completed), 3);
        assert_eq!(overall.get(JobStatus::Failed), 1);
        assert_eq!(overall.get(JobStatus::Active), 1);
        assert_eq!(overall.get(JobStatus::Waiting), 1);
        assert_eq!(overall.get(JobStatus::Delayed), 1);
    }

    #[tokio::test]
    async fn test_queue_stats_partition_queue_listing() {
        let store = InMemoryQueueStore::new();
        seed(&store);
        let (aggregator, stats) = build(&store);

        let queue_stats = stats.get_queue_stats("image-processing").await;
        let jobs = aggregator
            .get_jobs(&JobFilter::new().queue("image-processing"))
            .await;

        for status in JobStatus::ALL {
            let listed = jobs.iter().filter(|j| j.status == status).count() as u64;
            assert_eq!(queue_stats.get(status), listed, "status {status}");
        }
        assert_eq!(queue_stats.total(), 3);
    }

    #[tokio::test]
    async fn test_stats_are_a_capped_sample() {
        let store = InMemoryQueueStore::new();
        for i in 0..45 {
            store.add_job("bulk", JobState::Completed, JobRecord::new(i.to_string()));
        }
        let (_, stats) = build(&store);

        let overall = stats.get_stats().await;
        assert_eq!(overall.get(JobStatus::Completed), 30);
    }

    #[tokio::test]
    async fn test_unknown_queue_has_zero_counters() {
        let store = InMemoryQueueStore::new();
        let (_, stats) = build(&store);

        assert_eq!(stats.get_queue_stats("nope").await.total(), 0);
    }
}
