//! Store boundary.
//!
//! The aggregation layer never talks to Redis directly; it goes through these
//! two traits so the key layout lives in one place and tests can substitute
//! [`InMemoryQueueStore`](crate::memory::InMemoryQueueStore).

use crate::error::MonitorResult;
use crate::job::{JobState, JobStatus};
use crate::record::JobRecord;
use async_trait::async_trait;
use std::sync::Arc;

/// The shared store connection.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Prefix every queue key starts with (`bull` by default).
    fn key_prefix(&self) -> &str;

    /// Opens a handle bound to one queue. Never fails; errors surface when
    /// the handle is used.
    fn open_queue(&self, queue: &str) -> Arc<dyn QueueHandle>;

    /// Returns every key matching a glob pattern.
    async fn scan_keys(&self, pattern: &str) -> MonitorResult<Vec<String>>;

    /// Round-trips to the store.
    async fn ping(&self) -> MonitorResult<()>;

    /// Releases the shared connection.
    async fn quit(&self) -> MonitorResult<()>;
}

/// Read operations against a single queue.
#[async_trait]
pub trait QueueHandle: Send + Sync {
    fn queue_name(&self) -> &str;

    async fn count(&self, status: JobStatus) -> MonitorResult<u64>;

    async fn is_paused(&self) -> MonitorResult<bool>;

    /// Records of `status` between `start` and `end`, both inclusive.
    async fn page(&self, status: JobStatus, start: usize, end: usize) -> MonitorResult<Vec<JobRecord>>;

    async fn get_job(&self, id: &str) -> MonitorResult<Option<JobRecord>>;

    async fn get_state(&self, id: &str) -> MonitorResult<JobState>;

    async fn close(&self) -> MonitorResult<()>;
}
