//! Matador Monitor - Read-only Bull / BullMQ queue monitoring
//!
//! Aggregates the state of job queues stored in Redis:
//! - Queue discovery from BullMQ metadata keys, with a legacy Bull fallback
//! - Per-queue job counters and pause state
//! - Concurrent job listing across queues and statuses, capped per page
//! - Job lookup by id with its current lifecycle state
//! - Status statistics derived from job listings
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        QueueMonitor                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │   ┌────────────────┐        ┌─────────────────┐               │
//! │   │ StatsAggregator│──────▶ │  JobAggregator  │               │
//! │   └────────────────┘        └────────┬────────┘               │
//! │                                      │ queue × status fan-out │
//! │   ┌────────────────┐                 │                        │
//! │   │ QueueDiscovery │◀────────────────┤                        │
//! │   │  (TTL cache)   │                 │                        │
//! │   └───────┬────────┘                 │                        │
//! │           │                          ▼                        │
//! │           │              ┌──────────────────────┐             │
//! │           └────────────▶ │  ConnectionManager   │             │
//! │                          │  (handle per queue)  │             │
//! │                          └──────────┬───────────┘             │
//! │                                     │                         │
//! │                          ┌──────────┴───────────┐             │
//! │                          ▼                      ▼             │
//! │                 ┌────────────────┐    ┌──────────────────┐    │
//! │                 │RedisQueueStore │    │InMemoryQueueStore│    │
//! │                 └────────────────┘    └──────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use matador_config::{MonitorConfig, RedisConfig};
//! use matador_monitor::{JobFilter, JobStatus, QueueMonitor};
//!
//! let monitor = QueueMonitor::connect(&RedisConfig::default(), &MonitorConfig::default()).await?;
//!
//! for queue in monitor.get_queues().await {
//!     println!("{}: {} jobs", queue.name, queue.job_counts.total());
//! }
//!
//! let failed = monitor
//!     .get_jobs(&JobFilter::new().status(JobStatus::Failed).search("email"))
//!     .await;
//!
//! monitor.close().await?;
//! ```

pub mod aggregator;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod job;
pub mod memory;
pub mod metrics;
pub mod monitor;
pub mod queue;
pub mod record;
pub mod redis;
pub mod stats;
pub mod store;

pub use aggregator::JobAggregator;
pub use connection::ConnectionManager;
pub use discovery::QueueDiscovery;
pub use error::{MonitorError, MonitorResult};
pub use job::{Job, JobFilter, JobState, JobStatus, ParseStatusError};
pub use memory::{InMemoryQueueStore, KeyLayout};
pub use metrics::{register_metrics, DiscoveryMetrics, JobMetrics, RedisMetrics};
pub use monitor::QueueMonitor;
pub use queue::{JobCounts, Queue, Stats};
pub use record::JobRecord;
pub use crate::redis::{BullKeys, RedisQueueHandle, RedisQueueStore};
pub use stats::StatsAggregator;
pub use store::{QueueHandle, QueueStore};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::job::{Job, JobFilter, JobStatus};
    pub use crate::monitor::QueueMonitor;
    pub use crate::queue::{Queue, Stats};
    pub use crate::store::{QueueHandle, QueueStore};
    pub use crate::{MonitorError, MonitorResult};
}
