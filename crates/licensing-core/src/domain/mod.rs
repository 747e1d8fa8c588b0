//! Licensing domain model: tiers, limits, periods and plans.

mod entitlements;
mod limit;
mod period;
mod plan;
mod tier;

pub use entitlements::{Entitlements, FeatureUsage};
pub use limit::{FeatureLimit, UNLIMITED};
pub use period::{LIFETIME_PERIOD_KEY, ResetPeriod};
pub use plan::{PlanCatalog, PlanDefinition};
pub use tier::SubscriptionTier;
