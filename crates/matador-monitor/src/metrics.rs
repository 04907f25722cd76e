//! Metrics for queue monitoring.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding binary installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Metric names.
pub mod names {
    /// Discovery scans issued against the store.
    pub const DISCOVERY_SCANS_TOTAL: &str = "matador_discovery_scans_total";
    /// Discovery calls served from cache.
    pub const DISCOVERY_CACHE_HITS_TOTAL: &str = "matador_discovery_cache_hits_total";
    /// Discovery calls that failed.
    pub const DISCOVERY_FAILURES_TOTAL: &str = "matador_discovery_failures_total";

    /// Jobs read and normalized.
    pub const JOBS_FETCHED_TOTAL: &str = "matador_jobs_fetched_total";
    /// Failed (queue, status) page fetches.
    pub const FETCH_FAILURES_TOTAL: &str = "matador_fetch_failures_total";
    /// Duration of a full job aggregation.
    pub const AGGREGATION_DURATION: &str = "matador_aggregation_duration_seconds";

    /// Redis connection pool size.
    pub const REDIS_POOL_SIZE: &str = "matador_redis_pool_size";
    /// Redis connection pool available.
    pub const REDIS_POOL_AVAILABLE: &str = "matador_redis_pool_available";
    /// Redis operation duration in seconds.
    pub const REDIS_OPERATION_DURATION: &str = "matador_redis_operation_duration_seconds";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    // Discovery
    describe_counter!(
        names::DISCOVERY_SCANS_TOTAL,
        "Total number of key scans issued for queue discovery"
    );
    describe_counter!(
        names::DISCOVERY_CACHE_HITS_TOTAL,
        "Total number of discovery calls answered from cache"
    );
    describe_counter!(
        names::DISCOVERY_FAILURES_TOTAL,
        "Total number of discovery calls that failed"
    );

    // Jobs
    describe_counter!(
        names::JOBS_FETCHED_TOTAL,
        "Total number of jobs read from the store"
    );
    describe_counter!(
        names::FETCH_FAILURES_TOTAL,
        "Total number of failed page fetches"
    );
    describe_histogram!(
        names::AGGREGATION_DURATION,
        "Job aggregation duration in seconds"
    );

    // Redis
    describe_gauge!(names::REDIS_POOL_SIZE, "Redis connection pool size");
    describe_gauge!(
        names::REDIS_POOL_AVAILABLE,
        "Available connections in Redis pool"
    );
    describe_histogram!(
        names::REDIS_OPERATION_DURATION,
        "Redis operation duration in seconds"
    );
}

/// Discovery metrics recorder.
#[derive(Clone)]
pub struct DiscoveryMetrics;

impl DiscoveryMetrics {
    pub fn scan() {
        counter!(names::DISCOVERY_SCANS_TOTAL).increment(1);
    }

    pub fn cache_hit() {
        counter!(names::DISCOVERY_CACHE_HITS_TOTAL).increment(1);
    }

    pub fn scan_failed() {
        counter!(names::DISCOVERY_FAILURES_TOTAL).increment(1);
    }
}

/// Job metrics recorder.
#[derive(Clone)]
pub struct JobMetrics;

impl JobMetrics {
    /// Record jobs read from one (queue, status) pair.
    pub fn jobs_fetched(queue: &str, status: &str, count: usize) {
        counter!(
            names::JOBS_FETCHED_TOTAL,
            "queue" => queue.to_string(),
            "status" => status.to_string()
        )
        .increment(count as u64);
    }

    /// Record a failed page fetch.
    pub fn fetch_failed(queue: &str, status: &str) {
        counter!(
            names::FETCH_FAILURES_TOTAL,
            "queue" => queue.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
    }

    /// Record a full aggregation.
    pub fn aggregation_duration(duration: Duration) {
        histogram!(names::AGGREGATION_DURATION).record(duration.as_secs_f64());
    }
}

/// Redis metrics recorder.
#[derive(Clone)]
pub struct RedisMetrics;

impl RedisMetrics {
    /// Update pool status.
    pub fn update_pool_status(pool_size: usize, available: usize) {
        gauge!(names::REDIS_POOL_SIZE).set(pool_size as f64);
        gauge!(names::REDIS_POOL_AVAILABLE).set(available as f64);
    }

    /// Record operation duration.
    pub fn operation_duration(operation: &str, duration: Duration) {
        histogram!(
            names::REDIS_OPERATION_DURATION,
            "operation" => operation.to_string()
        )
        .record(duration.as_secs_f64());
    }
}
