//! Redis usage counter store using an atomic Lua check-and-increment.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use licensing_core::domain::UNLIMITED;
use licensing_core::ports::{
    CounterKey, IncrementResult, RateLimitStore, StoreError, validate_increment,
};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Redis counter store configuration.
#[derive(Debug, Clone)]
pub struct RedisRateLimitConfig {
    /// Redis connection config
    pub redis: RedisConfig,
    /// Key prefix for usage counter keys
    pub key_prefix: String,
}

impl Default for RedisRateLimitConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            key_prefix: "usage".to_string(),
        }
    }
}

impl RedisRateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            redis: RedisConfig::from_env(),
            key_prefix: std::env::var("LICENSING_KEY_PREFIX")
                .unwrap_or_else(|_| "usage".to_string()),
        }
    }
}

/// Redis-backed usage counter store.
///
/// Counters carry no TTL: a `never` period counter must not expire, and
/// cleanup of finished periods is left to operators.
/// Durability across a Redis restart depends on the server's persistence
/// settings (AOF with `appendfsync always` for no lost increments).
pub struct RedisRateLimitStore {
    conn: ConnectionManager,
    config: RedisRateLimitConfig,
    /// Lua script for atomic conditional increment
    script: Script,
}

impl RedisRateLimitStore {
    pub async fn new(config: RedisRateLimitConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.redis.url.as_str())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.redis.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| StoreError::Unavailable("Connection timed out".to_string()))?
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        // Returns: [allowed (0|1), count]
        let script = Script::new(
            r#"
            local key = KEYS[1]
            local amount = tonumber(ARGV[1])
            local limit = tonumber(ARGV[2])

            local current = tonumber(redis.call('GET', key) or '0')
            if current + amount > limit then
                return {0, current}
            end

            local updated = redis.call('INCRBY', key, amount)
            return {1, updated}
            "#,
        );

        tracing::info!(url = %config.redis.url, "Connected to Redis usage store");

        Ok(Self {
            conn,
            config,
            script,
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StoreError> {
        Self::new(RedisRateLimitConfig::from_env()).await
    }

    /// Subject goes last: feature and period keys never contain ':', so the
    /// key stays unambiguous whatever the subject id looks like.
    fn make_key(&self, key: &CounterKey) -> String {
        format!(
            "{}:{}:{}:{}",
            self.config.key_prefix, key.feature_key, key.period_key, key.subject_id
        )
    }
}

fn map_redis_error(e: redis::RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Query(e.to_string())
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment_and_check(
        &self,
        key: &CounterKey,
        amount: u64,
        limit: i64,
    ) -> Result<IncrementResult, StoreError> {
        validate_increment(amount, limit)?;
        if limit == UNLIMITED {
            return Ok(IncrementResult::unmetered());
        }

        let redis_key = self.make_key(key);
        let mut conn = self.conn.clone();

        let result: Vec<i64> = self
            .script
            .key(&redis_key)
            .arg(amount)
            .arg(limit)
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        let (allowed, count) = match result.as_slice() {
            [allowed, count] => (*allowed == 1, (*count).max(0) as u64),
            other => {
                return Err(StoreError::Query(format!(
                    "unexpected script reply: {other:?}"
                )));
            }
        };

        if !allowed {
            tracing::debug!(key = %redis_key, count, amount, limit, "Increment refused");
        }

        Ok(IncrementResult { allowed, count })
    }

    async fn get_count(&self, key: &CounterKey) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let count: Option<i64> = conn
            .get(self.make_key(key))
            .await
            .map_err(map_redis_error)?;
        Ok(count.unwrap_or(0).max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    // These run against a live server:
    // `REDIS_URL=redis://localhost:6379 cargo test -p licensing-infra -- --ignored`
    async fn get_test_store() -> RedisRateLimitStore {
        let config = RedisRateLimitConfig {
            redis: RedisConfig {
                url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
                connect_timeout: Duration::from_secs(1),
            },
            key_prefix: "test_usage".to_string(),
        };

        RedisRateLimitStore::new(config)
            .await
            .expect("REDIS_URL must point at a reachable Redis server")
    }

    fn unique_key() -> CounterKey {
        CounterKey::new(uuid::Uuid::new_v4().to_string(), "resume_tailoring", "2026-10")
    }

    #[tokio::test]
    #[ignore = "requires a Redis server at REDIS_URL"]
    async fn test_redis_increment_until_limit() {
        let store = get_test_store().await;
        let key = unique_key();

        let res = store.increment_and_check(&key, 7, 10).await.unwrap();
        assert_eq!(res, IncrementResult { allowed: true, count: 7 });

        // Refused batch leaves the counter alone
        let res = store.increment_and_check(&key, 5, 10).await.unwrap();
        assert_eq!(res, IncrementResult { allowed: false, count: 7 });

        let res = store.increment_and_check(&key, 3, 10).await.unwrap();
        assert_eq!(res, IncrementResult { allowed: true, count: 10 });
        assert_eq!(store.get_count(&key).await.unwrap(), 10);

        let res = store.increment_and_check(&key, u64::MAX, 10).await.unwrap();
        assert_eq!(res, IncrementResult { allowed: false, count: 10 });
    }

    #[tokio::test]
    #[ignore = "requires a Redis server at REDIS_URL"]
    async fn test_redis_unlimited_never_writes() {
        let store = get_test_store().await;
        let key = unique_key();

        for _ in 0..20 {
            assert!(store.increment_and_check(&key, 1, UNLIMITED).await.unwrap().allowed);
        }
        assert_eq!(store.get_count(&key).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    #[ignore = "requires a Redis server at REDIS_URL"]
    async fn test_redis_concurrent_increments_never_overshoot() {
        let store = Arc::new(get_test_store().await);
        let key = unique_key();

        let calls = (0..200).map(|_| {
            let store = store.clone();
            let key = key.clone();
            async move { store.increment_and_check(&key, 1, 15).await }
        });
        let results = futures::future::join_all(calls).await;

        let allowed = results
            .into_iter()
            .filter(|r| r.as_ref().is_ok_and(|r| r.allowed))
            .count();
        assert_eq!(allowed, 15);
        assert_eq!(store.get_count(&key).await.unwrap(), 15);
    }
}
