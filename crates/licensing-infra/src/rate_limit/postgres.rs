//! PostgreSQL usage counter store.
//!
//! The whole check-and-increment is one `INSERT ... ON CONFLICT DO UPDATE`
//! statement whose update is guarded by `count + amount <= limit`. Postgres
//! locks the conflicting row and re-evaluates the guard against its latest
//! version, so concurrent requests serialize on the row without an explicit
//! transaction.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DbBackend, DbConn, DbErr, EntityTrait, Statement};

use licensing_core::domain::UNLIMITED;
use licensing_core::ports::{
    CounterKey, IncrementResult, RateLimitStore, StoreError, validate_increment,
};

use crate::database::entity::usage_counter;
use crate::database::is_connection_failure;

/// Returns the new count, or no row when the increment would exceed the limit.
const INCREMENT_SQL: &str = r#"
INSERT INTO usage_counters (subject_id, feature_key, period_key, count, updated_at)
SELECT $1, $2, $3, $4::BIGINT, NOW()
WHERE $4::BIGINT <= $5::BIGINT
ON CONFLICT (subject_id, feature_key, period_key)
DO UPDATE SET count = usage_counters.count + EXCLUDED.count, updated_at = NOW()
WHERE usage_counters.count + EXCLUDED.count <= $5::BIGINT
RETURNING count
"#;

/// Postgres-backed usage counter store.
pub struct PostgresRateLimitStore {
    db: Arc<DbConn>,
}

impl PostgresRateLimitStore {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

fn map_db_error(e: DbErr) -> StoreError {
    if is_connection_failure(&e) {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Query(e.to_string())
    }
}

#[async_trait]
impl RateLimitStore for PostgresRateLimitStore {
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
        // Larger than any limit, so it can never fit.
        let Ok(amount) = i64::try_from(amount) else {
            let count = self.get_count(key).await?;
            tracing::debug!(key = %key, count, amount, limit, "Increment refused");
            return Ok(IncrementResult {
                allowed: false,
                count,
            });
        };

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            INCREMENT_SQL,
            [
                key.subject_id.as_str().into(),
                key.feature_key.as_str().into(),
                key.period_key.as_str().into(),
                amount.into(),
                limit.into(),
            ],
        );

        let row = self.db.query_one(stmt).await.map_err(map_db_error)?;

        match row {
            Some(row) => {
                let count: i64 = row
                    .try_get("", "count")
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(IncrementResult {
                    allowed: true,
                    count: count.max(0) as u64,
                })
            }
            None => {
                let count = self.get_count(key).await?;
                tracing::debug!(key = %key, count, amount, limit, "Increment refused");
                Ok(IncrementResult {
                    allowed: false,
                    count,
                })
            }
        }
    }

    async fn get_count(&self, key: &CounterKey) -> Result<u64, StoreError> {
        let counter = usage_counter::Entity::find_by_id((
            key.subject_id.clone(),
            key.feature_key.clone(),
            key.period_key.clone(),
        ))
        .one(self.db.as_ref())
        .await
        .map_err(map_db_error)?;

        Ok(counter.map(|c| c.count.max(0) as u64).unwrap_or(0))
    }
}
