//! Shared store connection and per-queue handles.

use crate::error::{MonitorError, MonitorResult};
use crate::job::{JobState, JobStatus};
use crate::record::JobRecord;
use crate::store::{QueueHandle, QueueStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Owns the store connection and one cached handle per queue name.
///
/// Handles are created on first use and kept until [`close`](Self::close).
pub struct ConnectionManager {
    store: Arc<dyn QueueStore>,
    handles: RwLock<HashMap<String, Arc<dyn QueueHandle>>>,
    closed: AtomicBool,
}

impl ConnectionManager {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self {
            store,
            handles: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn key_prefix(&self) -> &str {
        self.store.key_prefix()
    }

    /// Returns the cached handle for `queue`, opening one on first use.
    ///
    /// The handle is created under the write lock, so concurrent callers for
    /// the same new name all receive the same handle. After `close`, returns a
    /// handle whose every operation fails with [`MonitorError::Closed`].
    pub fn get_handle(&self, queue: &str) -> Arc<dyn QueueHandle> {
        if self.is_closed() {
            return Arc::new(ClosedHandle(queue.to_string()));
        }

        if let Some(handle) = self.handles.read().get(queue) {
            return Arc::clone(handle);
        }

        let mut handles = self.handles.write();
        let handle = handles.entry(queue.to_string()).or_insert_with(|| {
            debug!(queue = %queue, "Opening queue handle");
            self.store.open_queue(queue)
        });
        Arc::clone(handle)
    }

    /// Number of cached handles.
    pub fn handle_count(&self) -> usize {
        self.handles.read().len()
    }

    pub async fn scan_keys(&self, pattern: &str) -> MonitorResult<Vec<String>> {
        if self.is_closed() {
            return Err(MonitorError::Closed);
        }
        self.store.scan_keys(pattern).await
    }

    pub async fn ping(&self) -> MonitorResult<()> {
        if self.is_closed() {
            return Err(MonitorError::Closed);
        }
        self.store.ping().await
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Releases the shared connection and every cached handle.
    ///
    /// Every handle is closed even if an earlier step fails; the first error
    /// is returned. Calling `close` again is a no-op.
    pub async fn close(&self) -> MonitorResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let handles: Vec<(String, Arc<dyn QueueHandle>)> = self.handles.write().drain().collect();
        info!(handles = handles.len(), "Closing store connections");

        let mut first_error = self.store.quit().await.err();

        for (queue, handle) in handles {
            if let Err(e) = handle.close().await {
                warn!(queue = %queue, error = %e, "Failed to close queue handle");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Stand-in returned once the manager is closed.
struct ClosedHandle(String);

#[async_trait]
impl QueueHandle for ClosedHandle {
    fn queue_name(&self) -> &str {
        &self.0
    }

    async fn count(&self, _status: JobStatus) -> MonitorResult<u64> {
        Err(MonitorError::Closed)
    }

    async fn is_paused(&self) -> MonitorResult<bool> {
        Err(MonitorError::Closed)
    }

    async fn page(&self, _status: JobStatus, _start: usize, _end: usize) -> MonitorResult<Vec<JobRecord>> {
        Err(MonitorError::Closed)
    }

    async fn get_job(&self, _id: &str) -> MonitorResult<Option<JobRecord>> {
        Err(MonitorError::Closed)
    }

    async fn get_state(&self, _id: &str) -> MonitorResult<JobState> {
        Err(MonitorError::Closed)
    }

    async fn close(&self) -> MonitorResult<()> {
        Ok(())
    }
}
