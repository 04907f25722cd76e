//! Redis-backed queue store.

mod store;

pub use store::{RedisQueueHandle, RedisQueueStore};

use crate::error::{MonitorError, MonitorResult};
use crate::job::JobStatus;
use deadpool_redis::{Config, Pool, Runtime};
use matador_config::RedisConfig;
use tracing::info;

/// Create a Redis connection pool.
pub async fn create_pool(config: &RedisConfig) -> MonitorResult<Pool> {
    info!(host = %config.host, port = config.port, "Creating Redis connection pool...");

    let cfg = Config::from_url(config.connection_url()?);

    let pool = cfg
        .builder()
        .map_err(|e| MonitorError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .wait_timeout(Some(config.connect_timeout()))
        .create_timeout(Some(config.connect_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| MonitorError::Configuration(format!("Failed to create pool: {}", e)))?;

    // Test connection
    let mut conn = pool.get().await?;
    let _: String = redis::cmd("PING").query_async(&mut *conn).await?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Key builder for the Bull / BullMQ layout.
///
/// Every queue lives under `{prefix}:{queue}:`. Waiting and active jobs are
/// lists, finished and delayed jobs are sorted sets, and each job is a hash
/// keyed by its id.
#[derive(Debug, Clone)]
pub struct BullKeys {
    prefix: String,
}

impl BullKeys {
    /// Create a new key builder with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Pattern matching the BullMQ per-queue metadata hash.
    pub fn meta_pattern(&self) -> String {
        format!("{}:*:meta", self.prefix)
    }

    /// Pattern matching every key under the prefix.
    pub fn any_pattern(&self) -> String {
        format!("{}:*", self.prefix)
    }

    /// Metadata hash; a `paused` field marks a paused BullMQ queue.
    pub fn meta(&self, queue: &str) -> String {
        format!("{}:{}:meta", self.prefix, queue)
    }

    /// Legacy Bull pause marker.
    pub fn meta_paused(&self, queue: &str) -> String {
        format!("{}:{}:meta-paused", self.prefix, queue)
    }

    /// Waiting list (`wait`).
    pub fn wait(&self, queue: &str) -> String {
        format!("{}:{}:wait", self.prefix, queue)
    }

    /// Waiting list while the queue is paused.
    pub fn paused(&self, queue: &str) -> String {
        format!("{}:{}:paused", self.prefix, queue)
    }

    pub fn active(&self, queue: &str) -> String {
        format!("{}:{}:active", self.prefix, queue)
    }

    pub fn completed(&self, queue: &str) -> String {
        format!("{}:{}:completed", self.prefix, queue)
    }

    pub fn failed(&self, queue: &str) -> String {
        format!("{}:{}:failed", self.prefix, queue)
    }

    pub fn delayed(&self, queue: &str) -> String {
        format!("{}:{}:delayed", self.prefix, queue)
    }

    pub fn prioritized(&self, queue: &str) -> String {
        format!("{}:{}:prioritized", self.prefix, queue)
    }

    pub fn waiting_children(&self, queue: &str) -> String {
        format!("{}:{}:waiting-children", self.prefix, queue)
    }

    /// Job data hash.
    pub fn job(&self, queue: &str, job_id: &str) -> String {
        format!("{}:{}:{}", self.prefix, queue, job_id)
    }

    /// Container key holding jobs of `status`. Waiting jobs also spill into
    /// [`paused`](Self::paused).
    pub fn status(&self, queue: &str, status: JobStatus) -> String {
        match status {
            JobStatus::Completed => self.completed(queue),
            JobStatus::Failed => self.failed(queue),
            JobStatus::Active => self.active(queue),
            JobStatus::Waiting => self.wait(queue),
            JobStatus::Delayed => self.delayed(queue),
        }
    }

    /// Queue name from a metadata key (`{prefix}:{queue}:meta`).
    pub fn queue_from_meta_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?
            .strip_prefix(':')?
            .strip_suffix(":meta")
            .filter(|name| !name.is_empty())
    }

    /// Queue name as the first segment after the prefix
    /// (`{prefix}:{queue}:...`).
    pub fn queue_from_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?
            .strip_prefix(':')?
            .split_once(':')
            .map(|(name, _)| name)
            .filter(|name| !name.is_empty())
    }
}

impl Default for BullKeys {
    fn default() -> Self {
        Self::new("bull")
    }
}

/// Whether a status is stored as a sorted set (otherwise a list).
pub(crate) fn is_sorted_set(status: JobStatus) -> bool {
    matches!(
        status,
        JobStatus::Completed | JobStatus::Failed | JobStatus::Delayed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bull_keys() {
        let keys = BullKeys::new("bull");

        assert_eq!(keys.meta("email-queue"), "bull:email-queue:meta");
        assert_eq!(keys.wait("email-queue"), "bull:email-queue:wait");
        assert_eq!(keys.job("email-queue", "17"), "bull:email-queue:17");
        assert_eq!(keys.status("q", JobStatus::Delayed), "bull:q:delayed");
        assert_eq!(keys.meta_pattern(), "bull:*:meta");
        assert_eq!(keys.any_pattern(), "bull:*");
    }

    #[test]
    fn test_queue_from_meta_key() {
        let keys = BullKeys::default();
        assert_eq!(keys.queue_from_meta_key("bull:email-queue:meta"), Some("email-queue"));
        assert_eq!(keys.queue_from_meta_key("bull:ns:reports:meta"), Some("ns:reports"));
        assert_eq!(keys.queue_from_meta_key("bull::meta"), None);
        assert_eq!(keys.queue_from_meta_key("other:q:meta"), None);
        assert_eq!(keys.queue_from_meta_key("bull:q:meta-paused"), None);
    }

    #[test]
    fn test_queue_from_key() {
        let keys = BullKeys::default();
        assert_eq!(keys.queue_from_key("bull:image-processing:wait"), Some("image-processing"));
        assert_eq!(keys.queue_from_key("bull:image-processing:42"), Some("image-processing"));
        assert_eq!(keys.queue_from_key("bull:orphan"), None);
        assert_eq!(keys.queue_from_key("bullish:q:wait"), None);
    }

    #[test]
    fn test_storage_kinds() {
        assert!(is_sorted_set(JobStatus::Completed));
        assert!(is_sorted_set(JobStatus::Delayed));
        assert!(!is_sorted_set(JobStatus::Waiting));
        assert!(!is_sorted_set(JobStatus::Active));
    }
}
