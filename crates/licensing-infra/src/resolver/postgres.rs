//! PostgreSQL tier resolver reading the `subscriptions` table.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{DbConn, EntityTrait};

use licensing_core::ports::{ResolverError, TierResolver};

use crate::database::entity::subscription;
use crate::database::is_connection_failure;

/// Resolves tiers from subscription rows written by the billing subsystem.
///
/// Profiles without a row, or whose subscription is not active or trialing,
/// fall back to `fallback_tier`. The stored tier string is returned as is;
/// validating it is the licensing service's job.
pub struct PostgresTierResolver {
    db: Arc<DbConn>,
    fallback_tier: String,
}

impl PostgresTierResolver {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self {
            db,
            fallback_tier: "FREE".to_string(),
        }
    }

    pub fn with_fallback_tier(mut self, tier: impl Into<String>) -> Self {
        self.fallback_tier = tier.into();
        self
    }
}

#[async_trait]
impl TierResolver for PostgresTierResolver {
    async fn resolve_tier(&self, subject_id: &str) -> Result<String, ResolverError> {
        let row = subscription::Entity::find_by_id(subject_id.to_owned())
            .one(self.db.as_ref())
            .await
            .map_err(|e| {
                if is_connection_failure(&e) {
                    ResolverError::Unavailable(e.to_string())
                } else {
                    ResolverError::Lookup(e.to_string())
                }
            })?;

        match row {
            Some(sub) if sub.is_active() => Ok(sub.tier),
            Some(sub) => {
                tracing::debug!(
                    profile_id = %subject_id,
                    status = %sub.status,
                    "Inactive subscription, using fallback tier"
                );
                Ok(self.fallback_tier.clone())
            }
            None => Ok(self.fallback_tier.clone()),
        }
    }
}
