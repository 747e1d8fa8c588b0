//! Licensing error types.

use thiserror::Error;

use crate::ports::{ResolverError, StoreError};

/// Errors surfaced by the licensing core.
///
/// Quota exhaustion and missing features are *not* errors; they come back as
/// a denied [`ConsumeOutcome`](crate::service::ConsumeOutcome).
#[derive(Debug, Error)]
pub enum LicensingError {
    /// The tier resolver produced a tier outside the known set.
    #[error("Invalid subscription tier: {0:?}")]
    InvalidTier(String),

    /// The tier resolver itself failed.
    #[error("Tier resolution failed: {0}")]
    TierResolution(#[from] ResolverError),

    /// The usage counter store failed.
    #[error("Usage store error: {0}")]
    Store(#[from] StoreError),

    /// A plan does not define a feature that another plan defines.
    #[error("Plan catalog drift: tier {tier} does not define feature {feature:?}")]
    CatalogDrift { tier: String, feature: String },

    /// A tier has no plan in the catalog.
    #[error("Plan catalog has no plan for tier {0}")]
    MissingPlan(String),

    /// Two plans were given for the same tier.
    #[error("Plan catalog defines tier {0} more than once")]
    DuplicatePlan(String),

    /// A feature key that cannot be used as a counter key segment.
    #[error("Invalid feature key: {0:?}")]
    InvalidFeatureKey(String),

    /// A limit below the `-1` unlimited sentinel.
    #[error("Invalid feature limit {0}: must be -1 (unlimited) or non-negative")]
    InvalidLimit(i64),

    /// A consumption request for zero units.
    #[error("Consumption amount must be at least 1")]
    InvalidAmount,
}

impl LicensingError {
    /// Whether the failure is an infrastructure hiccup worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LicensingError::Store(StoreError::Unavailable(_))
                | LicensingError::TierResolution(ResolverError::Unavailable(_))
        )
    }
}
