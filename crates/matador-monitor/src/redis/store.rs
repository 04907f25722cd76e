//! Redis queue store implementation.

use super::{is_sorted_set, BullKeys};
use crate::error::{MonitorError, MonitorResult};
use crate::job::{JobState, JobStatus};
use crate::metrics::RedisMetrics;
use crate::record::JobRecord;
use crate::store::{QueueHandle, QueueStore};
use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

const SCAN_BATCH: usize = 500;

/// Redis-backed store reading the Bull / BullMQ key layout.
pub struct RedisQueueStore {
    pool: Pool,
    keys: BullKeys,
}

impl RedisQueueStore {
    /// Create a new store over a pool.
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            keys: BullKeys::new(key_prefix),
        }
    }
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    fn key_prefix(&self) -> &str {
        self.keys.prefix()
    }

    fn open_queue(&self, queue: &str) -> Arc<dyn QueueHandle> {
        Arc::new(RedisQueueHandle::new(
            self.pool.clone(),
            self.keys.clone(),
            queue,
        ))
    }

    async fn scan_keys(&self, pattern: &str) -> MonitorResult<Vec<String>> {
        let started = Instant::now();
        let mut conn = self.pool.get().await?;
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await?;

            found.extend(keys);

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        RedisMetrics::operation_duration("scan", started.elapsed());
        debug!(pattern = %pattern, count = found.len(), "Scanned keys");

        Ok(found)
    }

    async fn ping(&self) -> MonitorResult<()> {
        let status = self.pool.status();
        RedisMetrics::update_pool_status(status.max_size, status.available);

        let mut conn = self.pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }

    async fn quit(&self) -> MonitorResult<()> {
        self.pool.close();
        info!("Redis connection pool closed");
        Ok(())
    }
}

/// Handle bound to one queue. Shares the store's pool.
pub struct RedisQueueHandle {
    pool: Pool,
    keys: BullKeys,
    queue: String,
    closed: AtomicBool,
}

impl RedisQueueHandle {
    fn new(pool: Pool, keys: BullKeys, queue: &str) -> Self {
        Self {
            pool,
            keys,
            queue: queue.to_string(),
            closed: AtomicBool::new(false),
        }
    }

    /// Get a connection from the pool.
    async fn conn(&self) -> MonitorResult<deadpool_redis::Connection> {
        if self.closed.load(Ordering::Acquire) {
            return Err(MonitorError::Closed);
        }
        Ok(self.pool.get().await?)
    }

    /// Ids in one container, honoring list vs. sorted-set storage.
    /// Sorted sets are read newest first, as Bull's getters do by default.
    async fn range_ids(
        &self,
        conn: &mut deadpool_redis::Connection,
        key: &str,
        sorted: bool,
        start: usize,
        end: usize,
    ) -> MonitorResult<Vec<String>> {
        let (start, end) = (to_index(start), to_index(end));
        let ids: Vec<String> = if sorted {
            conn.zrevrange(key, start, end).await?
        } else {
            conn.lrange(key, start, end).await?
        };
        Ok(ids)
    }

    async fn waiting_ids(
        &self,
        conn: &mut deadpool_redis::Connection,
        start: usize,
        end: usize,
    ) -> MonitorResult<Vec<String>> {
        let wanted = end + 1 - start;
        let mut ids = self
            .range_ids(conn, &self.keys.wait(&self.queue), false, start, end)
            .await?;

        if ids.len() < wanted {
            // A paused queue parks its waiting jobs in a separate list.
            let wait_len: usize = conn.llen(self.keys.wait(&self.queue)).await?;
            let paused_start = start.saturating_sub(wait_len);
            let paused_end = paused_start + (wanted - ids.len()) - 1;
            let paused = self
                .range_ids(conn, &self.keys.paused(&self.queue), false, paused_start, paused_end)
                .await?;
            ids.extend(paused);
        }

        Ok(ids)
    }
}

#[async_trait]
impl QueueHandle for RedisQueueHandle {
    fn queue_name(&self) -> &str {
        &self.queue
    }

    async fn count(&self, status: JobStatus) -> MonitorResult<u64> {
        let mut conn = self.conn().await?;
        let key = self.keys.status(&self.queue, status);

        let count: u64 = match status {
            JobStatus::Waiting => {
                let (wait, paused): (u64, u64) = redis::pipe()
                    .llen(&key)
                    .llen(self.keys.paused(&self.queue))
                    .query_async(&mut *conn)
                    .await?;
                wait + paused
            }
            status if is_sorted_set(status) => conn.zcard(&key).await?,
            _ => conn.llen(&key).await?,
        };

        Ok(count)
    }

    async fn is_paused(&self) -> MonitorResult<bool> {
        let mut conn = self.conn().await?;

        let (meta_flag, legacy_flag): (bool, bool) = redis::pipe()
            .hexists(self.keys.meta(&self.queue), "paused")
            .exists(self.keys.meta_paused(&self.queue))
            .query_async(&mut *conn)
            .await?;

        Ok(meta_flag || legacy_flag)
    }

    async fn page(&self, status: JobStatus, start: usize, end: usize) -> MonitorResult<Vec<JobRecord>> {
        if end < start {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let mut conn = self.conn().await?;

        let ids = match status {
            JobStatus::Waiting => self.waiting_ids(&mut conn, start, end).await?,
            status => {
                let key = self.keys.status(&self.queue, status);
                self.range_ids(&mut conn, &key, is_sorted_set(status), start, end)
                    .await?
            }
        };

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hgetall(self.keys.job(&self.queue, id));
        }
        let hashes: Vec<HashMap<String, String>> = pipe.query_async(&mut *conn).await?;

        // Jobs removed between the range read and the hash read come back empty.
        let records: Vec<JobRecord> = ids
            .into_iter()
            .zip(hashes)
            .filter_map(|(id, hash)| JobRecord::from_hash(id, hash))
            .collect();

        RedisMetrics::operation_duration("page", started.elapsed());

        Ok(records)
    }

    async fn get_job(&self, id: &str) -> MonitorResult<Option<JobRecord>> {
        let mut conn = self.conn().await?;
        let hash: HashMap<String, String> = conn.hgetall(self.keys.job(&self.queue, id)).await?;
        Ok(JobRecord::from_hash(id, hash))
    }

    async fn get_state(&self, id: &str) -> MonitorResult<JobState> {
        let mut conn = self.conn().await?;
        let q = &self.queue;

        type Membership = (
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<i64>,
            Option<i64>,
            Option<i64>,
            Option<f64>,
            Option<f64>,
        );

        let (completed, failed, delayed, active, wait, paused, prioritized, waiting_children): Membership =
            redis::pipe()
                .zscore(self.keys.completed(q), id)
                .zscore(self.keys.failed(q), id)
                .zscore(self.keys.delayed(q), id)
                .cmd("LPOS").arg(self.keys.active(q)).arg(id)
                .cmd("LPOS").arg(self.keys.wait(q)).arg(id)
                .cmd("LPOS").arg(self.keys.paused(q)).arg(id)
                .zscore(self.keys.prioritized(q), id)
                .zscore(self.keys.waiting_children(q), id)
                .query_async(&mut *conn)
                .await?;

        let state = if completed.is_some() {
            JobState::Completed
        } else if failed.is_some() {
            JobState::Failed
        } else if delayed.is_some() {
            JobState::Delayed
        } else if active.is_some() {
            JobState::Active
        } else if wait.is_some() || paused.is_some() {
            JobState::Waiting
        } else if prioritized.is_some() {
            JobState::Prioritized
        } else if waiting_children.is_some() {
            JobState::WaitingChildren
        } else {
            JobState::Unknown
        };

        Ok(state)
    }

    async fn close(&self) -> MonitorResult<()> {
        self.closed.store(true, Ordering::Release);
        debug!(queue = %self.queue, "Closed queue handle");
        Ok(())
    }
}

fn to_index(value: usize) -> isize {
    isize::try_from(value).unwrap_or(isize::MAX)
}
