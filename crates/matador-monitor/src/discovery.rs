//! Queue discovery.

use crate::connection::ConnectionManager;
use crate::error::MonitorResult;
use crate::job::JobStatus;
use crate::metrics::DiscoveryMetrics;
use crate::queue::{JobCounts, Queue};
use crate::redis::BullKeys;
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A discovered name list and when it was read.
#[derive(Debug, Clone)]
struct CachedNames {
    names: Vec<String>,
    fetched_at: Instant,
}

impl CachedNames {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Finds the queues present in the store.
///
/// BullMQ writes a `{prefix}:{queue}:meta` hash for every queue, which is
/// preferred. Legacy Bull has no such key, so when none match, every key under
/// the prefix is scanned and the first path segment taken as the queue name.
pub struct QueueDiscovery {
    connections: Arc<ConnectionManager>,
    keys: BullKeys,
    ttl: Duration,
    cache: RwLock<Option<CachedNames>>,
}

impl QueueDiscovery {
    pub fn new(connections: Arc<ConnectionManager>, ttl: Duration) -> Self {
        let keys = BullKeys::new(connections.key_prefix());
        Self {
            connections,
            keys,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Returns the deduplicated queue names, in first-seen order.
    ///
    /// Served from cache while fresh. Store errors yield an empty list and
    /// leave the cache untouched.
    pub async fn discover(&self) -> Vec<String> {
        if let Some(cached) = self.cache.read().as_ref().filter(|c| c.is_fresh(self.ttl)) {
            DiscoveryMetrics::cache_hit();
            debug!(count = cached.names.len(), "Using cached queue names");
            return cached.names.clone();
        }

        match self.scan().await {
            Ok(names) => {
                *self.cache.write() = Some(CachedNames {
                    names: names.clone(),
                    fetched_at: Instant::now(),
                });
                names
            }
            Err(e) => {
                DiscoveryMetrics::scan_failed();
                error!(error = %e, "Error discovering queues");
                Vec::new()
            }
        }
    }

    async fn scan(&self) -> MonitorResult<Vec<String>> {
        DiscoveryMetrics::scan();
        let meta_keys = self.connections.scan_keys(&self.keys.meta_pattern()).await?;
        let names = dedup(
            meta_keys
                .iter()
                .filter_map(|key| self.keys.queue_from_meta_key(key)),
        );

        if !names.is_empty() {
            debug!(count = names.len(), "Discovered queues from metadata keys");
            return Ok(names);
        }

        // Legacy Bull: no metadata hash, fall back to every key under the prefix.
        DiscoveryMetrics::scan();
        let all_keys = self.connections.scan_keys(&self.keys.any_pattern()).await?;
        let names = dedup(all_keys.iter().filter_map(|key| self.keys.queue_from_key(key)));

        info!(queues = ?names, "Discovered queues");
        Ok(names)
    }

    /// Discovers queues and reads their counters and pause flag.
    ///
    /// Each queue issues its six reads concurrently, and queues are read
    /// concurrently with each other. A queue with any failed read is left out.
    pub async fn get_queues(&self) -> Vec<Queue> {
        let names = self.discover().await;

        let reads = names.into_iter().map(|name| async move {
            let handle = self.connections.get_handle(&name);
            let result = tokio::try_join!(
                handle.count(JobStatus::Completed),
                handle.count(JobStatus::Failed),
                handle.count(JobStatus::Active),
                handle.count(JobStatus::Waiting),
                handle.count(JobStatus::Delayed),
                handle.is_paused(),
            );
            (name, result)
        });

        join_all(reads)
            .await
            .into_iter()
            .filter_map(|(name, result)| match result {
                Ok((completed, failed, active, waiting, delayed, is_paused)) => Some(Queue {
                    name,
                    is_paused,
                    job_counts: JobCounts {
                        completed,
                        failed,
                        active,
                        waiting,
                        delayed,
                    },
                }),
                Err(e) => {
                    warn!(queue = %name, error = %e, "Error getting queue");
                    None
                }
            })
            .collect()
    }

    /// Drops the cached name list.
    pub fn clear_cache(&self) {
        *self.cache.write() = None;
    }
}

fn dedup<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobState;
    use crate::memory::{InMemoryQueueStore, KeyLayout};
    use crate::record::JobRecord;

    fn discovery(store: &InMemoryQueueStore, ttl: Duration) -> QueueDiscovery {
        let connections = Arc::new(ConnectionManager::new(Arc::new(store.clone())));
        QueueDiscovery::new(connections, ttl)
    }

    #[tokio::test]
    async fn test_discovers_from_meta_keys() {
        let store = InMemoryQueueStore::new();
        store.add_queue("email-queue", KeyLayout::BullMq);
        store.add_queue("image-processing", KeyLayout::BullMq);
        store.add_job("email-queue", JobState::Completed, JobRecord::new("1"));

        let discovery = discovery(&store, Duration::from_secs(5));
        let names = discovery.discover().await;

        assert_eq!(names, vec!["email-queue".to_string(), "image-processing".to_string()]);
        assert_eq!(store.scan_calls(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_prefix_scan() {
        let store = InMemoryQueueStore::new();
        store.add_queue("legacy-a", KeyLayout::Legacy);
        store.add_job("legacy-a", JobState::Waiting, JobRecord::new("1"));
        store.add_job("legacy-a", JobState::Failed, JobRecord::new("2"));
        store.add_queue("legacy-b", KeyLayout::Legacy);

        let discovery = discovery(&store, Duration::from_secs(5));
        let names = discovery.discover().await;

        assert_eq!(names, vec!["legacy-a".to_string(), "legacy-b".to_string()]);
        assert_eq!(store.scan_calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_avoids_second_scan() {
        let store = InMemoryQueueStore::new();
        store.add_queue("q1", KeyLayout::BullMq);

        let discovery = discovery(&store, Duration::from_secs(5));
        let first = discovery.discover().await;
        let second = discovery.discover().await;

        assert_eq!(first, second);
        assert_eq!(store.scan_calls(), 1);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_rescan() {
        let store = InMemoryQueueStore::new();
        store.add_queue("q1", KeyLayout::BullMq);

        let discovery = discovery(&store, Duration::from_secs(5));
        discovery.discover().await;
        store.add_queue("q2", KeyLayout::BullMq);
        assert_eq!(discovery.discover().await.len(), 1);

        discovery.clear_cache();
        assert_eq!(discovery.discover().await.len(), 2);
        assert_eq!(store.scan_calls(), 2);
    }

    #[tokio::test]
    async fn test_stale_cache_rescans() {
        let store = InMemoryQueueStore::new();
        store.add_queue("q1", KeyLayout::BullMq);

        let discovery = discovery(&store, Duration::ZERO);
        discovery.discover().await;
        discovery.discover().await;

        assert_eq!(store.scan_calls(), 2);
    }

    #[tokio::test]
    async fn test_scan_error_yields_empty_and_is_not_cached() {
        let store = InMemoryQueueStore::new();
        store.add_queue("q1", KeyLayout::BullMq);
        store.fail_scans(true);

        let discovery = discovery(&store, Duration::from_secs(5));
        assert!(discovery.discover().await.is_empty());

        store.fail_scans(false);
        assert_eq!(discovery.discover().await, vec!["q1".to_string()]);
    }

    #[tokio::test]
    async fn test_get_queues_reads_counts_and_pause() {
        let store = InMemoryQueueStore::new();
        store.add_job("email-queue", JobState::Completed, JobRecord::new("1"));
        store.add_job("email-queue", JobState::Completed, JobRecord::new("2"));
        store.add_job("email-queue", JobState::Failed, JobRecord::new("3"));
        store.set_paused("email-queue", true);

        let discovery = discovery(&store, Duration::from_secs(5));
        let queues = discovery.get_queues().await;

        assert_eq!(queues.len(), 1);
        assert_eq!(queues[0].name, "email-queue");
        assert!(queues[0].is_paused);
        assert_eq!(queues[0].job_counts.completed, 2);
        assert_eq!(queues[0].job_counts.failed, 1);
        assert_eq!(queues[0].job_counts.total(), 3);
    }

    #[tokio::test]
    async fn test_get_queues_drops_failing_queue() {
        let store = InMemoryQueueStore::new();
        store.add_queue("healthy", KeyLayout::BullMq);
        store.add_queue("broken", KeyLayout::BullMq);
        store.fail_queue("broken");

        let discovery = discovery(&store, Duration::from_secs(5));
        let queues = discovery.get_queues().await;

        assert_eq!(queues.len(), 1);
        assert_eq!(queues[0].name, "healthy");
    }
}
