//! Licensing service: tier resolution, plan lookup and quota consumption.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{Entitlements, FeatureLimit, FeatureUsage, PlanCatalog, SubscriptionTier, UNLIMITED};
use crate::error::LicensingError;
use crate::ports::{Clock, CounterKey, RateLimitStore, SystemClock, TierResolver};

/// Why a consumption request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    /// The plan grants the feature but this period's quota is used up.
    QuotaExceeded,
    /// The subject's plan does not include the feature at all.
    FeatureNotAvailable,
}

/// Result of [`LicensingService::check_and_consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConsumeOutcome {
    pub allowed: bool,
    /// Units left this period, `-1` when unlimited.
    pub remaining: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<Denial>,
}

impl ConsumeOutcome {
    fn unlimited() -> Self {
        Self {
            allowed: true,
            remaining: UNLIMITED,
            denial: None,
        }
    }

    fn denied(remaining: i64, denial: Denial) -> Self {
        Self {
            allowed: false,
            remaining,
            denial: Some(denial),
        }
    }
}

/// Stateless orchestrator over a [`TierResolver`] and a [`RateLimitStore`].
///
/// Tier and plan are looked up on every call so upgrades apply immediately.
/// All mutable state lives in the store; the service holds no locks and can
/// be shared freely behind an `Arc`.
pub struct LicensingService {
    catalog: Arc<PlanCatalog>,
    resolver: Arc<dyn TierResolver>,
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
}

impl LicensingService {
    pub fn new(
        catalog: Arc<PlanCatalog>,
        resolver: Arc<dyn TierResolver>,
        store: Arc<dyn RateLimitStore>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock used for period keys.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Resolve and validate the subject's tier.
    pub async fn tier_for(&self, subject_id: &str) -> Result<SubscriptionTier, LicensingError> {
        let raw = self.resolver.resolve_tier(subject_id).await?;
        raw.parse()
    }

    async fn feature_limit(
        &self,
        subject_id: &str,
        feature_key: &str,
    ) -> Result<Option<FeatureLimit>, LicensingError> {
        let tier = self.tier_for(subject_id).await?;
        let plan = self
            .catalog
            .plan(tier)
            .ok_or_else(|| LicensingError::MissingPlan(tier.to_string()))?;
        Ok(plan.limit(feature_key))
    }

    /// Atomically consume `amount` units of `feature_key` for `subject_id`.
    ///
    /// A refused request consumes nothing. Reaching the limit exactly is
    /// allowed.
    pub async fn check_and_consume(
        &self,
        subject_id: &str,
        feature_key: &str,
        amount: u64,
    ) -> Result<ConsumeOutcome, LicensingError> {
        if amount == 0 {
            return Err(LicensingError::InvalidAmount);
        }

        let Some(limit) = self.feature_limit(subject_id, feature_key).await? else {
            return Ok(ConsumeOutcome::denied(0, Denial::FeatureNotAvailable));
        };

        if limit.is_unlimited() {
            return Ok(ConsumeOutcome::unlimited());
        }

        let key = CounterKey::new(
            subject_id,
            feature_key,
            limit.reset_period().period_key(self.clock.now()),
        );
        let result = self
            .store
            .increment_and_check(&key, amount, limit.value())
            .await?;

        let remaining = limit.remaining(result.count);
        if result.allowed {
            Ok(ConsumeOutcome {
                allowed: true,
                remaining,
                denial: None,
            })
        } else {
            Ok(ConsumeOutcome::denied(remaining, Denial::QuotaExceeded))
        }
    }

    /// Whether one more unit could be consumed right now. Never writes.
    pub async fn can_use(&self, subject_id: &str, feature_key: &str) -> Result<bool, LicensingError> {
        let Some(limit) = self.feature_limit(subject_id, feature_key).await? else {
            return Ok(false);
        };

        if limit.is_unlimited() {
            return Ok(true);
        }

        let key = CounterKey::new(
            subject_id,
            feature_key,
            limit.reset_period().period_key(self.clock.now()),
        );
        let used = self.store.get_count(&key).await?;
        Ok(limit.admits(used, 1))
    }

    /// Usage snapshot for every feature of the subject's plan.
    pub async fn get_entitlements(&self, subject_id: &str) -> Result<Entitlements, LicensingError> {
        let tier = self.tier_for(subject_id).await?;
        let plan = self
            .catalog
            .plan(tier)
            .ok_or_else(|| LicensingError::MissingPlan(tier.to_string()))?;
        let now = self.clock.now();

        let mut features = BTreeMap::new();
        for (feature_key, limit) in plan.features() {
            let key = CounterKey::new(
                subject_id,
                feature_key,
                limit.reset_period().period_key(now),
            );
            let used = self.store.get_count(&key).await?;
            features.insert(feature_key.to_string(), FeatureUsage::new(*limit, used, now));
        }

        Ok(Entitlements { tier, features })
    }
}
