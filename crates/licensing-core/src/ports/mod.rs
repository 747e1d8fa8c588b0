//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod clock;
mod rate_limit;
mod tier_resolver;

pub use clock::{Clock, ManualClock, SystemClock};
pub use rate_limit::{CounterKey, IncrementResult, RateLimitStore, StoreError, validate_increment};
pub use tier_resolver::{ResolverError, TierResolver};
