//! RFC 7807 problem responses for the licensing API.

use serde::{Deserialize, Serialize};

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// A human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Feature the problem refers to, for licensing denials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,

    /// Quota left in the current period, `-1` when unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,

    /// Request ID for debugging purposes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            instance: None,
            feature: None,
            remaining: None,
            request_id: None,
        }
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = error_type.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request").with_detail(detail)
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }

    /// The subject's quota for `feature` is used up for this period.
    pub fn quota_exceeded(feature: impl Into<String>, remaining: i64) -> Self {
        let feature = feature.into();
        let mut problem = Self::new(403, "Quota Exceeded")
            .with_type("/problems/quota-exceeded")
            .with_detail(format!(
                "Usage quota for '{feature}' is exhausted for the current period. \
                 Upgrade your plan or wait for the quota to reset."
            ));
        problem.feature = Some(feature);
        problem.remaining = Some(remaining);
        problem
    }

    /// The subject's plan does not include `feature` at all.
    pub fn feature_not_available(feature: impl Into<String>) -> Self {
        let feature = feature.into();
        let mut problem = Self::new(403, "Feature Not Available")
            .with_type("/problems/feature-not-available")
            .with_detail(format!("'{feature}' is not part of your current plan."));
        problem.feature = Some(feature);
        problem.remaining = Some(0);
        problem
    }

    /// Licensing could not be evaluated, so access is refused.
    pub fn licensing_unavailable() -> Self {
        Self::internal_error()
            .with_type("/problems/licensing-unavailable")
            .with_detail("Feature access could not be verified. Please retry later.")
    }
}
