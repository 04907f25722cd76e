//! Common test infrastructure for Redis integration tests.

use matador_config::RedisConfig;
use redis::aio::MultiplexedConnection;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::redis::Redis;

/// Test Redis container wrapper.
///
/// Manages a Redis testcontainer lifecycle and hands out configs and raw
/// connections for seeding queue keys.
pub struct TestRedis {
    _container: ContainerAsync<Redis>,
    url: String,
}

impl TestRedis {
    /// Starts a fresh Redis container.
    pub async fn new() -> Self {
        // LPOS needs Redis 6.0.6 or later
        let container = Redis::default()
            .with_tag("7.2")
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        Self {
            _container: container,
            url: format!("redis://127.0.0.1:{port}"),
        }
    }

    /// Redis config pointing at the container, under the given key prefix.
    pub fn config(&self, key_prefix: &str) -> RedisConfig {
        RedisConfig {
            url: Some(self.url.clone()),
            pool_size: 4,
            key_prefix: key_prefix.to_string(),
            ..RedisConfig::default()
        }
    }

    /// Raw connection used to write fixtures.
    pub async fn conn(&self) -> MultiplexedConnection {
        redis::Client::open(self.url.as_str())
            .expect("Invalid Redis URL")
            .get_multiplexed_async_connection()
            .await
            .expect("Failed to connect to Redis")
    }
}

/// Writes a job hash at `{prefix}:{queue}:{id}`.
pub async fn put_job(
    conn: &mut MultiplexedConnection,
    prefix: &str,
    queue: &str,
    id: &str,
    fields: &[(&str, &str)],
) {
    let _: () = redis::cmd("HSET")
        .arg(format!("{prefix}:{queue}:{id}"))
        .arg(fields)
        .query_async(conn)
        .await
        .expect("Failed to write job hash");
}
