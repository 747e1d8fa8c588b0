//! Data Transfer Objects - response bodies for the licensing API.
//!
//! Quota values use `-1` for "unlimited", both for limits and remaining.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response to a successful consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeResponse {
    pub feature: String,
    pub allowed: bool,
    pub remaining: i64,
}

/// Response to a read-only availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanUseResponse {
    pub feature: String,
    pub allowed: bool,
}

/// Usage of one feature in the current period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureUsageDto {
    pub limit: i64,
    pub used: u64,
    pub remaining: i64,
    pub reset_period: String,
    pub period_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resets_at: Option<DateTime<Utc>>,
}

/// Snapshot of everything a profile is entitled to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementsResponse {
    pub profile_id: String,
    pub tier: String,
    pub features: BTreeMap<String, FeatureUsageDto>,
}
