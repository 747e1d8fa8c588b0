//! In-memory tier resolver.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use licensing_core::ports::{ResolverError, TierResolver};

/// Tier resolver backed by a map, with a fallback tier for unknown subjects.
///
/// Used when no subscription database is configured, and in tests.
pub struct InMemoryTierResolver {
    tiers: RwLock<HashMap<String, String>>,
    default_tier: String,
}

impl InMemoryTierResolver {
    pub fn new(default_tier: impl Into<String>) -> Self {
        Self {
            tiers: RwLock::new(HashMap::new()),
            default_tier: default_tier.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("LICENSING_DEFAULT_TIER").unwrap_or_else(|_| "FREE".to_string()))
    }

    /// Assign a tier to a subject, replacing any previous one.
    pub async fn set_tier(&self, subject_id: impl Into<String>, tier: impl Into<String>) {
        self.tiers.write().await.insert(subject_id.into(), tier.into());
    }

    pub async fn remove(&self, subject_id: &str) {
        self.tiers.write().await.remove(subject_id);
    }
}

#[async_trait]
impl TierResolver for InMemoryTierResolver {
    async fn resolve_tier(&self, subject_id: &str) -> Result<String, ResolverError> {
        let tiers = self.tiers.read().await;
        Ok(tiers
            .get(subject_id)
            .cloned()
            .unwrap_or_else(|| self.default_tier.clone()))
    }
}
