//! Usage counter store port.

use std::fmt;

use async_trait::async_trait;

/// Identity of one usage counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CounterKey {
    pub subject_id: String,
    pub feature_key: String,
    pub period_key: String,
}

impl CounterKey {
    pub fn new(
        subject_id: impl Into<String>,
        feature_key: impl Into<String>,
        period_key: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            feature_key: feature_key.into(),
            period_key: period_key.into(),
        }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.subject_id, self.feature_key, self.period_key
        )
    }
}

/// Outcome of an atomic increment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementResult {
    pub allowed: bool,
    /// Counter value after the call. Unchanged when the increment was refused,
    /// and `0` for unmetered (unlimited) calls, which never touch the counter.
    pub count: u64,
}

impl IncrementResult {
    pub fn unmetered() -> Self {
        Self {
            allowed: true,
            count: 0,
        }
    }
}

/// Durable counter store with an atomic conditional increment.
///
/// `increment_and_check` must be atomic per [`CounterKey`]: however many
/// callers race, the sum of granted `amount`s never exceeds `limit`. A refused
/// increment leaves the counter untouched. `limit == -1` means unlimited and
/// must return `allowed = true` without writing.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn increment_and_check(
        &self,
        key: &CounterKey,
        amount: u64,
        limit: i64,
    ) -> Result<IncrementResult, StoreError>;

    /// Current count, `0` if the counter was never created.
    async fn get_count(&self, key: &CounterKey) -> Result<u64, StoreError>;
}

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Invalid increment request: {0}")]
    InvalidRequest(String),
}

/// Validate the arguments every store implementation receives.
pub fn validate_increment(amount: u64, limit: i64) -> Result<(), StoreError> {
    if amount == 0 {
        return Err(StoreError::InvalidRequest("amount must be at least 1".into()));
    }
    if limit < -1 {
        return Err(StoreError::InvalidRequest(format!(
            "limit {limit} is below the unlimited sentinel"
        )));
    }
    Ok(())
}
