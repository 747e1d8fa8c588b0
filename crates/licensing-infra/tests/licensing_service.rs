//! Licensing service behavior over the in-memory store and resolver.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use futures::future::join_all;

use licensing_core::domain::{FeatureLimit, PlanCatalog, PlanDefinition, ResetPeriod, SubscriptionTier};
use licensing_core::ports::{CounterKey, ManualClock, RateLimitStore};
use licensing_core::{ConsumeOutcome, Denial, LicensingService};
use licensing_infra::{InMemoryRateLimitStore, InMemoryTierResolver};

struct Harness {
    service: Arc<LicensingService>,
    store: Arc<InMemoryRateLimitStore>,
    resolver: Arc<InMemoryTierResolver>,
    clock: Arc<ManualClock>,
}

fn harness_with(catalog: PlanCatalog) -> Harness {
    let store = Arc::new(InMemoryRateLimitStore::new());
    let resolver = Arc::new(InMemoryTierResolver::new("FREE"));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap(),
    ));
    let service = LicensingService::new(Arc::new(catalog), resolver.clone(), store.clone())
        .with_clock(clock.clone());

    Harness {
        service: Arc::new(service),
        store,
        resolver,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(PlanCatalog::standard().unwrap())
}

/// Every tier gets `batch_credits` with the given monthly limit.
fn batch_catalog(limit: i64) -> PlanCatalog {
    let credits = FeatureLimit::new(limit, ResetPeriod::Monthly).unwrap();
    PlanCatalog::new(
        SubscriptionTier::ALL
            .into_iter()
            .map(|tier| PlanDefinition::new(tier).with_feature("batch_credits", credits)),
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_consumers_get_exactly_the_quota() {
    let h = harness();

    let calls = (0..500).map(|_| {
        let service = h.service.clone();
        tokio::spawn(async move {
            service
                .check_and_consume("racer", "hunter_job_searches", 1)
                .await
        })
    });

    let outcomes: Vec<ConsumeOutcome> = join_all(calls)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let allowed = outcomes.iter().filter(|o| o.allowed).count();
    assert_eq!(allowed, 5);
    assert_eq!(outcomes.len() - allowed, 495);
    assert!(
        outcomes
            .iter()
            .filter(|o| !o.allowed)
            .all(|o| o.remaining == 0 && o.denial == Some(Denial::QuotaExceeded))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_batches_never_overshoot() {
    let h = harness_with(batch_catalog(100));

    let calls = (0..100).map(|_| {
        let service = h.service.clone();
        tokio::spawn(async move { service.check_and_consume("batcher", "batch_credits", 3).await })
    });

    let allowed = join_all(calls)
        .await
        .into_iter()
        .filter(|joined| joined.as_ref().unwrap().as_ref().unwrap().allowed)
        .count();

    assert_eq!(allowed, 33);
    let entitlements = h.service.get_entitlements("batcher").await.unwrap();
    assert_eq!(entitlements.feature("batch_credits").unwrap().used, 99);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn unlimited_feature_is_never_counted() {
    let h = harness();
    h.resolver.set_tier("big-co", "ENTERPRISE").await;

    let calls = (0..1000).map(|_| {
        let service = h.service.clone();
        tokio::spawn(async move { service.check_and_consume("big-co", "auto_apply", 1).await })
    });

    for joined in join_all(calls).await {
        let outcome = joined.unwrap().unwrap();
        assert!(outcome.allowed);
        assert_eq!(outcome.remaining, -1);
    }

    let key = CounterKey::new("big-co", "auto_apply", "2026-10");
    assert_eq!(h.store.get_count(&key).await.unwrap(), 0);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn can_use_never_changes_consumption() {
    let checked = harness();
    for _ in 0..25 {
        assert!(checked.service.can_use("p1", "resume_tailoring").await.unwrap());
    }
    let after_checks = checked
        .service
        .check_and_consume("p1", "resume_tailoring", 1)
        .await
        .unwrap();

    let fresh = harness();
    let direct = fresh
        .service
        .check_and_consume("p1", "resume_tailoring", 1)
        .await
        .unwrap();

    assert_eq!(after_checks, direct);
    assert_eq!(after_checks.remaining, 2);
}

#[tokio::test]
async fn can_use_turns_false_at_the_limit() {
    let h = harness();
    for _ in 0..3 {
        h.service
            .check_and_consume("p1", "resume_tailoring", 1)
            .await
            .unwrap();
    }
    assert!(!h.service.can_use("p1", "resume_tailoring").await.unwrap());
    assert!(h.service.can_use("p1", "hunter_job_searches").await.unwrap());
}

#[tokio::test]
async fn quota_resets_at_the_next_calendar_month() {
    let h = harness();
    h.clock.set(Utc.with_ymd_and_hms(2026, 10, 31, 23, 59, 0).unwrap());

    for _ in 0..5 {
        assert!(
            h.service
                .check_and_consume("p1", "hunter_job_searches", 1)
                .await
                .unwrap()
                .allowed
        );
    }
    assert!(
        !h.service
            .check_and_consume("p1", "hunter_job_searches", 1)
            .await
            .unwrap()
            .allowed
    );

    h.clock.advance(Duration::minutes(2));

    let outcome = h
        .service
        .check_and_consume("p1", "hunter_job_searches", 1)
        .await
        .unwrap();
    assert!(outcome.allowed);
    assert_eq!(outcome.remaining, 4);
}

#[tokio::test]
async fn daily_quota_resets_the_next_day() {
    let h = harness();

    for _ in 0..2 {
        assert!(
            h.service
                .check_and_consume("p1", "narrative_generation", 1)
                .await
                .unwrap()
                .allowed
        );
    }
    assert!(!h.service.can_use("p1", "narrative_generation").await.unwrap());

    h.clock.advance(Duration::days(1));
    assert!(h.service.can_use("p1", "narrative_generation").await.unwrap());
}

#[tokio::test]
async fn lifetime_quota_never_resets() {
    let h = harness();
    h.resolver.set_tier("p1", "PRO").await;

    let outcome = h.service.check_and_consume("p1", "custom_themes", 3).await.unwrap();
    assert!(outcome.allowed);
    assert_eq!(outcome.remaining, 0);

    h.clock.advance(Duration::days(400));
    assert!(!h.service.can_use("p1", "custom_themes").await.unwrap());
}

#[tokio::test]
async fn limit_is_inclusive() {
    let h = harness();

    for expected in [2, 1, 0] {
        let outcome = h
            .service
            .check_and_consume("p1", "resume_tailoring", 1)
            .await
            .unwrap();
        assert!(outcome.allowed);
        assert_eq!(outcome.remaining, expected);
    }

    let fourth = h
        .service
        .check_and_consume("p1", "resume_tailoring", 1)
        .await
        .unwrap();
    assert!(!fourth.allowed);
    assert_eq!(fourth.remaining, 0);
}

#[tokio::test]
async fn free_tier_hunter_searches_stop_after_five() {
    let h = harness();

    for _ in 0..5 {
        let outcome = h
            .service
            .check_and_consume("free-user", "hunter_job_searches", 1)
            .await
            .unwrap();
        assert!(outcome.allowed);
    }

    let sixth = h
        .service
        .check_and_consume("free-user", "hunter_job_searches", 1)
        .await
        .unwrap();
    assert_eq!((sixth.allowed, sixth.remaining), (false, 0));
}

#[tokio::test]
async fn enterprise_auto_apply_is_unlimited() {
    let h = harness();
    h.resolver.set_tier("corp", "ENTERPRISE").await;

    for _ in 0..1000 {
        let outcome = h
            .service
            .check_and_consume("corp", "auto_apply", 1)
            .await
            .unwrap();
        assert_eq!((outcome.allowed, outcome.remaining), (true, -1));
    }
}

#[tokio::test]
async fn rejected_batch_consumes_nothing() {
    let h = harness_with(batch_catalog(10));

    let first = h.service.check_and_consume("p1", "batch_credits", 7).await.unwrap();
    assert!(first.allowed);
    assert_eq!(first.remaining, 3);

    let second = h.service.check_and_consume("p1", "batch_credits", 5).await.unwrap();
    assert!(!second.allowed);
    assert_eq!(second.remaining, 3);

    let third = h.service.check_and_consume("p1", "batch_credits", 3).await.unwrap();
    assert!(third.allowed);
    assert_eq!(third.remaining, 0);
}

#[tokio::test]
async fn free_tier_lacks_auto_apply_quota() {
    let h = harness();

    let outcome = h.service.check_and_consume("p1", "auto_apply", 1).await.unwrap();
    assert!(!outcome.allowed);
    assert_eq!(outcome.denial, Some(Denial::QuotaExceeded));

    let unknown = h.service.check_and_consume("p1", "hologram_calls", 1).await.unwrap();
    assert_eq!(unknown.denial, Some(Denial::FeatureNotAvailable));
}

#[tokio::test]
async fn entitlements_snapshot_reflects_usage() {
    let h = harness();
    h.resolver.set_tier("p1", "PRO").await;

    h.service.check_and_consume("p1", "hunter_job_searches", 12).await.unwrap();
    h.service.check_and_consume("p1", "pdf_export", 4).await.unwrap();

    let entitlements = h.service.get_entitlements("p1").await.unwrap();
    assert_eq!(entitlements.tier, SubscriptionTier::Pro);
    assert_eq!(entitlements.features.len(), 7);

    let searches = entitlements.feature("hunter_job_searches").unwrap();
    assert_eq!((searches.value, searches.used, searches.remaining()), (100, 12, 88));
    assert_eq!(searches.period_key, "2026-10");

    let exports = entitlements.feature("pdf_export").unwrap();
    assert_eq!((exports.value, exports.used, exports.remaining()), (-1, 0, -1));

    // Reading the snapshot twice gives the same answer.
    assert_eq!(h.service.get_entitlements("p1").await.unwrap(), entitlements);
}
