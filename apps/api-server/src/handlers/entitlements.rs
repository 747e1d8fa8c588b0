//! Entitlement snapshot endpoint.

use actix_web::{HttpResponse, web};

use licensing_core::domain::{Entitlements, FeatureUsage};
use licensing_shared::dto::{EntitlementsResponse, FeatureUsageDto};

use crate::middleware::error::AppResult;
use crate::middleware::profile::ProfileId;
use crate::state::AppState;

fn usage_dto(usage: &FeatureUsage) -> FeatureUsageDto {
    FeatureUsageDto {
        limit: usage.value,
        used: usage.used,
        remaining: usage.remaining(),
        reset_period: usage.reset_period.to_string(),
        period_key: usage.period_key.clone(),
        resets_at: usage.resets_at,
    }
}

fn entitlements_response(profile: &ProfileId, entitlements: &Entitlements) -> EntitlementsResponse {
    EntitlementsResponse {
        profile_id: profile.as_str().to_string(),
        tier: entitlements.tier.to_string(),
        features: entitlements
            .features
            .iter()
            .map(|(key, usage)| (key.clone(), usage_dto(usage)))
            .collect(),
    }
}

/// GET /api/entitlements
pub async fn get_entitlements(
    state: web::Data<AppState>,
    profile: ProfileId,
) -> AppResult<HttpResponse> {
    let entitlements = state.licensing.get_entitlements(profile.as_str()).await?;
    Ok(HttpResponse::Ok().json(entitlements_response(&profile, &entitlements)))
}
