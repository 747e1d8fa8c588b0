//! Per-feature endpoints.

use actix_web::{HttpResponse, web};

use licensing_core::ConsumeOutcome;
use licensing_shared::dto::{CanUseResponse, ConsumeResponse};

use crate::middleware::error::AppResult;
use crate::middleware::profile::ProfileId;
use crate::state::AppState;

/// Read-only availability check. Never consumes quota.
///
/// GET /api/features/{feature}/can-use
pub async fn can_use(
    state: web::Data<AppState>,
    profile: ProfileId,
    feature: web::Path<String>,
) -> AppResult<HttpResponse> {
    let feature = feature.into_inner();
    let allowed = state.licensing.can_use(profile.as_str(), &feature).await?;
    Ok(HttpResponse::Ok().json(CanUseResponse { feature, allowed }))
}

/// Reports the quota already charged by the feature gate.
///
/// POST /api/features/{feature}/consume?amount=N
pub async fn consume(
    feature: web::Path<String>,
    outcome: web::ReqData<ConsumeOutcome>,
) -> HttpResponse {
    HttpResponse::Ok().json(ConsumeResponse {
        feature: feature.into_inner(),
        allowed: outcome.allowed,
        remaining: outcome.remaining,
    })
}
