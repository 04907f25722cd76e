//! Monitoring facade.

use crate::aggregator::JobAggregator;
use crate::connection::ConnectionManager;
use crate::discovery::QueueDiscovery;
use crate::error::MonitorResult;
use crate::job::{Job, JobFilter};
use crate::queue::{Queue, Stats};
use crate::redis::{create_pool, RedisQueueStore};
use crate::stats::StatsAggregator;
use crate::store::QueueStore;
use matador_config::{MonitorConfig, RedisConfig};
use std::sync::Arc;
use tracing::info;

/// Single entry point for queue monitoring.
///
/// Wires the connection manager, discovery, job aggregation and stats over
/// one [`QueueStore`]. Every read returns plain data; "nothing found" is an
/// empty list or `None`, never an error.
pub struct QueueMonitor {
    connections: Arc<ConnectionManager>,
    discovery: Arc<QueueDiscovery>,
    aggregator: Arc<JobAggregator>,
    stats: StatsAggregator,
}

impl QueueMonitor {
    /// Builds the monitor over an existing store.
    pub fn new(store: Arc<dyn QueueStore>, config: &MonitorConfig) -> Self {
        let connections = Arc::new(ConnectionManager::new(store));
        let discovery = Arc::new(QueueDiscovery::new(
            Arc::clone(&connections),
            config.discovery_ttl(),
        ));
        let aggregator = Arc::new(JobAggregator::new(
            Arc::clone(&connections),
            Arc::clone(&discovery),
            config.page_size,
        ));
        let stats = StatsAggregator::new(Arc::clone(&aggregator));

        Self {
            connections,
            discovery,
            aggregator,
            stats,
        }
    }

    /// Connects to Redis and builds the monitor.
    pub async fn connect(redis: &RedisConfig, config: &MonitorConfig) -> MonitorResult<Self> {
        let pool = create_pool(redis).await?;
        let store = RedisQueueStore::new(pool, redis.key_prefix.clone());

        info!(
            prefix = %redis.key_prefix,
            page_size = config.page_size,
            discovery_ttl_ms = config.discovery_ttl_ms,
            "Queue monitor connected"
        );

        Ok(Self::new(Arc::new(store), config))
    }

    pub async fn get_queues(&self) -> Vec<Queue> {
        self.discovery.get_queues().await
    }

    pub async fn get_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        self.aggregator.get_jobs(filter).await
    }

    pub async fn get_job_by_id(&self, queue: &str, id: &str) -> Option<Job> {
        self.aggregator.get_job_by_id(queue, id).await
    }

    pub async fn get_stats(&self) -> Stats {
        self.stats.get_stats().await
    }

    pub async fn get_queue_stats(&self, queue: &str) -> Stats {
        self.stats.get_queue_stats(queue).await
    }

    /// Forgets the discovered queue names so the next read rescans.
    pub fn refresh(&self) {
        self.discovery.clear_cache();
    }

    /// Checks the store is reachable.
    pub async fn health_check(&self) -> MonitorResult<()> {
        self.connections.ping().await
    }

    /// Releases every connection. Safe to call more than once.
    pub async fn close(&self) -> MonitorResult<()> {
        self.discovery.clear_cache();
        self.connections.close().await
    }
}
