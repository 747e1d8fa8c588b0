//! In-memory usage counter store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use licensing_core::domain::UNLIMITED;
use licensing_core::ports::{
    CounterKey, IncrementResult, RateLimitStore, StoreError, validate_increment,
};

/// In-memory counter store using a HashMap behind an async RwLock.
///
/// Every increment runs its read-modify-write under the write lock, so
/// concurrent callers within one process never overshoot a limit.
/// Note: Counters are per-process and lost on restart. Use it for tests and
/// single-instance development only.
pub struct InMemoryRateLimitStore {
    counters: RwLock<HashMap<CounterKey, u64>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
        }
    }

    /// Number of counters created so far.
    pub async fn len(&self) -> usize {
        self.counters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.counters.read().await.is_empty()
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
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
        let limit = limit as u64;

        let mut counters = self.counters.write().await;
        let current = counters.get(key).copied().unwrap_or(0);

        match current.checked_add(amount) {
            Some(next) if next <= limit => {
                counters.insert(key.clone(), next);
                Ok(IncrementResult {
                    allowed: true,
                    count: next,
                })
            }
            _ => {
                tracing::debug!(key = %key, current, amount, limit, "Increment refused");
                Ok(IncrementResult {
                    allowed: false,
                    count: current,
                })
            }
        }
    }

    async fn get_count(&self, key: &CounterKey) -> Result<u64, StoreError> {
        let counters = self.counters.read().await;
        Ok(counters.get(key).copied().unwrap_or(0))
    }
}
