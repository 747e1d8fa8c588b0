use serde::Serialize;

use super::ResetPeriod;
use crate::error::LicensingError;

/// Sentinel limit value meaning "no quota".
///
/// Kept as a literal `-1` rather than an `Option` because it is also the
/// value clients receive in JSON.
pub const UNLIMITED: i64 = -1;

/// Quota for one feature within one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureLimit {
    value: i64,
    reset_period: ResetPeriod,
}

impl FeatureLimit {
    /// Create a limit, rejecting anything below the unlimited sentinel.
    pub fn new(value: i64, reset_period: ResetPeriod) -> Result<Self, LicensingError> {
        if value < UNLIMITED {
            return Err(LicensingError::InvalidLimit(value));
        }
        Ok(Self {
            value,
            reset_period,
        })
    }

    pub fn unlimited(reset_period: ResetPeriod) -> Self {
        Self {
            value: UNLIMITED,
            reset_period,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn reset_period(&self) -> ResetPeriod {
        self.reset_period
    }

    pub fn is_unlimited(&self) -> bool {
        self.value == UNLIMITED
    }

    /// Units left after `used`, or [`UNLIMITED`].
    pub fn remaining(&self, used: u64) -> i64 {
        if self.is_unlimited() {
            return UNLIMITED;
        }
        let used = i64::try_from(used).unwrap_or(i64::MAX);
        self.value.saturating_sub(used).max(0)
    }

    /// Whether `amount` more units fit on top of `used`.
    pub fn admits(&self, used: u64, amount: u64) -> bool {
        if self.is_unlimited() {
            return true;
        }
        match used.checked_add(amount) {
            Some(total) => u64::try_from(self.value).is_ok_and(|limit| total <= limit),
            None => false,
        }
    }
}
