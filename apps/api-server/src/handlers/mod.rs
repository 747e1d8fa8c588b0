//! HTTP handlers and route configuration.

mod entitlements;
mod features;
mod health;

use actix_web::web;

use crate::middleware::feature_gate::FeatureGate;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/entitlements", web::get().to(entitlements::get_entitlements))
            .service(
                web::scope("/features/{feature}")
                    .route("/can-use", web::get().to(features::can_use))
                    .service(
                        web::resource("/consume")
                            .wrap(FeatureGate::from_path(state.licensing.clone()))
                            .route(web::post().to(features::consume)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};

    use licensing_core::LicensingService;
    use licensing_core::domain::PlanCatalog;
    use licensing_infra::{InMemoryRateLimitStore, InMemoryTierResolver};
    use licensing_shared::ErrorResponse;
    use licensing_shared::dto::{CanUseResponse, ConsumeResponse, EntitlementsResponse};

    use super::*;
    use crate::config::StoreBackend;

    async fn test_state() -> (AppState, Arc<InMemoryTierResolver>) {
        let resolver = Arc::new(InMemoryTierResolver::new("FREE"));
        resolver.set_tier("pro-user", "PRO").await;
        resolver.set_tier("corp", "ENTERPRISE").await;

        let licensing = LicensingService::new(
            Arc::new(PlanCatalog::standard().unwrap()),
            resolver.clone(),
            Arc::new(InMemoryRateLimitStore::new()),
        );
        (
            AppState::from_service(Arc::new(licensing), StoreBackend::Memory),
            resolver,
        )
    }

    macro_rules! app {
        ($state:expr) => {{
            let state = $state;
            test::init_service(
                App::new()
                    .app_data(web::Data::new(state.clone()))
                    .configure(|cfg| configure_routes(cfg, &state)),
            )
            .await
        }};
    }

    fn consume(profile: &str, feature: &str, amount: Option<u64>) -> test::TestRequest {
        let uri = match amount {
            Some(n) => format!("/api/features/{feature}/consume?amount={n}"),
            None => format!("/api/features/{feature}/consume"),
        };
        test::TestRequest::post()
            .uri(&uri)
            .insert_header(("X-Profile-Id", profile))
    }

    #[actix_rt::test]
    async fn test_health_reports_store() {
        let (state, _) = test_state().await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
    }

    #[actix_rt::test]
    async fn test_consume_until_quota_exceeded() {
        let (state, _) = test_state().await;
        let app = app!(state);

        for expected in [2, 1, 0] {
            let req = consume("p1", "resume_tailoring", None).to_request();
            let body: ConsumeResponse = test::call_and_read_body_json(&app, req).await;
            assert!(body.allowed);
            assert_eq!(body.remaining, expected);
            assert_eq!(body.feature, "resume_tailoring");
        }

        let res = test::call_service(&app, consume("p1", "resume_tailoring", None).to_request()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.headers().get("X-Quota-Remaining").unwrap(), "0");

        let problem: ErrorResponse = test::read_body_json(res).await;
        assert_eq!(problem.title, "Quota Exceeded");
        assert_eq!(problem.remaining, Some(0));
    }

    #[actix_rt::test]
    async fn test_unknown_feature_is_not_available() {
        let (state, _) = test_state().await;
        let app = app!(state);

        let res = test::call_service(&app, consume("p1", "hologram_calls", None).to_request()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let problem: ErrorResponse = test::read_body_json(res).await;
        assert_eq!(problem.title, "Feature Not Available");
    }

    #[actix_rt::test]
    async fn test_batch_amount_and_bad_amounts() {
        let (state, _) = test_state().await;
        let app = app!(state);

        let req = consume("pro-user", "hunter_job_searches", Some(40)).to_request();
        let body: ConsumeResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.remaining, 60);

        let res = test::call_service(&app, consume("pro-user", "hunter_job_searches", Some(61)).to_request()).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.headers().get("X-Quota-Remaining").unwrap(), "60");

        let res = test::call_service(&app, consume("pro-user", "hunter_job_searches", Some(0)).to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/features/hunter_job_searches/consume?amount=-2")
            .insert_header(("X-Profile-Id", "pro-user"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_unlimited_reports_minus_one() {
        let (state, _) = test_state().await;
        let app = app!(state);

        for _ in 0..50 {
            let req = consume("corp", "auto_apply", None).to_request();
            let body: ConsumeResponse = test::call_and_read_body_json(&app, req).await;
            assert_eq!((body.allowed, body.remaining), (true, -1));
        }
    }

    #[actix_rt::test]
    async fn test_can_use_does_not_consume() {
        let (state, _) = test_state().await;
        let app = app!(state);

        for _ in 0..10 {
            let req = test::TestRequest::get()
                .uri("/api/features/narrative_generation/can-use")
                .insert_header(("X-Profile-Id", "p1"))
                .to_request();
            let body: CanUseResponse = test::call_and_read_body_json(&app, req).await;
            assert!(body.allowed);
        }

        let req = consume("p1", "narrative_generation", None).to_request();
        let body: ConsumeResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.remaining, 1);
    }

    #[actix_rt::test]
    async fn test_entitlements_snapshot_and_upgrade() {
        let (state, resolver) = test_state().await;
        let app = app!(state);

        test::call_service(&app, consume("p1", "pdf_export", Some(2)).to_request()).await;

        let req = test::TestRequest::get()
            .uri("/api/entitlements")
            .insert_header(("X-Profile-Id", "p1"))
            .to_request();
        let body: EntitlementsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.tier, "FREE");
        assert_eq!(body.profile_id, "p1");
        let exports = &body.features["pdf_export"];
        assert_eq!((exports.limit, exports.used, exports.remaining), (5, 2, 3));
        assert_eq!(body.features["custom_themes"].period_key, "lifetime");
        assert!(body.features["custom_themes"].resets_at.is_none());

        resolver.set_tier("p1", "PRO").await;

        let req = test::TestRequest::get()
            .uri("/api/entitlements")
            .insert_header(("X-Profile-Id", "p1"))
            .to_request();
        let body: EntitlementsResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.tier, "PRO");
        assert_eq!(body.features["pdf_export"].limit, -1);
        assert_eq!(body.features["pdf_export"].remaining, -1);
    }

    #[actix_rt::test]
    async fn test_missing_profile_header_is_bad_request() {
        let (state, _) = test_state().await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/entitlements").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
