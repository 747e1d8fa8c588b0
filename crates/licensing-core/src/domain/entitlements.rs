use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{FeatureLimit, ResetPeriod, SubscriptionTier, UNLIMITED};

/// Point-in-time usage snapshot for one subject. Computed, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlements {
    pub tier: SubscriptionTier,
    pub features: BTreeMap<String, FeatureUsage>,
}

impl Entitlements {
    pub fn feature(&self, feature_key: &str) -> Option<&FeatureUsage> {
        self.features.get(feature_key)
    }
}

/// Limit and current usage of one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureUsage {
    /// Limit for the period, `-1` when unlimited.
    pub value: i64,
    pub used: u64,
    pub reset_period: ResetPeriod,
    pub period_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}

impl FeatureUsage {
    pub fn new(limit: FeatureLimit, used: u64, now: DateTime<Utc>) -> Self {
        let period = limit.reset_period();
        Self {
            value: limit.value(),
            used,
            reset_period: period,
            period_key: period.period_key(now),
            resets_at: period.resets_at(now),
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.value == UNLIMITED
    }

    /// Units left this period, `-1` when unlimited.
    pub fn remaining(&self) -> i64 {
        if self.is_unlimited() {
            return UNLIMITED;
        }
        let used = i64::try_from(self.used).unwrap_or(i64::MAX);
        self.value.saturating_sub(used).max(0)
    }
}
