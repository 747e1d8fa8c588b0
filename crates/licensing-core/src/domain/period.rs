//! Calendar reset periods and the counter buckets they produce.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Period key used for features whose quota never resets.
pub const LIFETIME_PERIOD_KEY: &str = "lifetime";

/// How often a feature's usage counter starts over.
///
/// Periods are calendar buckets in UTC, not sliding windows: a monthly
/// counter resets at 00:00 UTC on the first of each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPeriod {
    Monthly,
    Daily,
    Never,
}

impl ResetPeriod {
    /// Bucket identifier for `now`: `YYYY-MM`, `YYYY-MM-DD` or `lifetime`.
    pub fn period_key(&self, now: DateTime<Utc>) -> String {
        match self {
            ResetPeriod::Monthly => format!("{:04}-{:02}", now.year(), now.month()),
            ResetPeriod::Daily => format!("{:04}-{:02}-{:02}", now.year(), now.month(), now.day()),
            ResetPeriod::Never => LIFETIME_PERIOD_KEY.to_string(),
        }
    }

    /// Start of the bucket following the one containing `now`.
    pub fn resets_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let next = match self {
            ResetPeriod::Monthly => {
                let (year, month) = if now.month() == 12 {
                    (now.year() + 1, 1)
                } else {
                    (now.year(), now.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)?
            }
            ResetPeriod::Daily => now.date_naive().succ_opt()?,
            ResetPeriod::Never => return None,
        };
        next.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResetPeriod::Monthly => "monthly",
            ResetPeriod::Daily => "daily",
            ResetPeriod::Never => "never",
        }
    }
}

impl fmt::Display for ResetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
