//! Plan definitions: the static `(tier, feature) -> limit` table.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{FeatureLimit, ResetPeriod, SubscriptionTier, UNLIMITED};
use crate::error::LicensingError;

/// Feature limits granted by one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDefinition {
    tier: SubscriptionTier,
    features: BTreeMap<String, FeatureLimit>,
}

impl PlanDefinition {
    pub fn new(tier: SubscriptionTier) -> Self {
        Self {
            tier,
            features: BTreeMap::new(),
        }
    }

    /// Add or replace a feature limit.
    pub fn with_feature(mut self, feature_key: impl Into<String>, limit: FeatureLimit) -> Self {
        self.features.insert(feature_key.into(), limit);
        self
    }

    pub fn tier(&self) -> SubscriptionTier {
        self.tier
    }

    pub fn limit(&self, feature_key: &str) -> Option<FeatureLimit> {
        self.features.get(feature_key).copied()
    }

    pub fn features(&self) -> impl Iterator<Item = (&str, &FeatureLimit)> {
        self.features.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Immutable set of plans, one per tier.
///
/// Construction checks that every tier has a plan and that every plan
/// defines the same feature keys, so catalog drift fails at startup instead
/// of on a customer request.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: HashMap<SubscriptionTier, PlanDefinition>,
}

impl PlanCatalog {
    pub fn new(plans: impl IntoIterator<Item = PlanDefinition>) -> Result<Self, LicensingError> {
        let mut by_tier = HashMap::new();
        for plan in plans {
            let tier = plan.tier;
            if by_tier.insert(tier, plan).is_some() {
                return Err(LicensingError::DuplicatePlan(tier.to_string()));
            }
        }

        for tier in SubscriptionTier::ALL {
            if !by_tier.contains_key(&tier) {
                return Err(LicensingError::MissingPlan(tier.to_string()));
            }
        }

        let known: BTreeSet<&str> = by_tier
            .values()
            .flat_map(|plan| plan.features.keys().map(String::as_str))
            .collect();

        for key in &known {
            if !is_valid_feature_key(key) {
                return Err(LicensingError::InvalidFeatureKey(key.to_string()));
            }
        }

        for tier in SubscriptionTier::ALL {
            let plan = &by_tier[&tier];
            if let Some(missing) = known.iter().find(|key| !plan.features.contains_key(**key)) {
                return Err(LicensingError::CatalogDrift {
                    tier: tier.to_string(),
                    feature: missing.to_string(),
                });
            }
        }

        Ok(Self { plans: by_tier })
    }

    /// The plans this product ships with.
    pub fn standard() -> Result<Self, LicensingError> {
        use ResetPeriod::{Daily, Monthly, Never};

        // feature, reset period, [FREE, PRO, ENTERPRISE]
        const TABLE: &[(&str, ResetPeriod, [i64; 3])] = &[
            ("hunter_job_searches", Monthly, [5, 100, UNLIMITED]),
            ("resume_tailoring", Monthly, [3, 50, UNLIMITED]),
            ("cover_letter_generation", Monthly, [3, 50, UNLIMITED]),
            ("auto_apply", Monthly, [0, 25, UNLIMITED]),
            ("narrative_generation", Daily, [2, 20, UNLIMITED]),
            ("pdf_export", Monthly, [5, UNLIMITED, UNLIMITED]),
            ("custom_themes", Never, [0, 3, UNLIMITED]),
        ];

        let mut plans = Vec::with_capacity(SubscriptionTier::ALL.len());
        for (idx, tier) in SubscriptionTier::ALL.into_iter().enumerate() {
            let mut plan = PlanDefinition::new(tier);
            for (key, period, values) in TABLE {
                plan = plan.with_feature(*key, FeatureLimit::new(values[idx], *period)?);
            }
            plans.push(plan);
        }

        Self::new(plans)
    }

    pub fn plan(&self, tier: SubscriptionTier) -> Option<&PlanDefinition> {
        self.plans.get(&tier)
    }

    pub fn limit(&self, tier: SubscriptionTier, feature_key: &str) -> Option<FeatureLimit> {
        self.plan(tier)?.limit(feature_key)
    }

    /// All feature keys in the catalog.
    pub fn feature_keys(&self) -> BTreeSet<&str> {
        self.plans
            .values()
            .flat_map(|plan| plan.features.keys().map(String::as_str))
            .collect()
    }
}

fn is_valid_feature_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
