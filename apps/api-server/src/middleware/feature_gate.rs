//! Feature gate middleware.
//!
//! Charges one request's worth of quota before the wrapped handler runs.
//! Denials short-circuit with a 403 problem response; failures to evaluate
//! the licensing decision short-circuit with a 500 and never reach the
//! handler.

use std::future::{Ready, ready};
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, HttpMessage, HttpResponse, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
    web,
};
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use tracing_actix_web::RequestId;

use licensing_core::{ConsumeOutcome, Denial, LicensingService};
use licensing_shared::ErrorResponse;

use super::error::AppError;
use super::profile::ProfileId;

/// Response header reporting the quota left after the request.
pub const QUOTA_REMAINING_HEADER: &str = "x-quota-remaining";

#[derive(Debug, Clone)]
enum FeatureSource {
    /// Taken from a matched path segment.
    PathParam(&'static str),
    Fixed(String),
}

#[derive(Debug, Deserialize)]
struct AmountQuery {
    amount: Option<u64>,
}

/// Feature gate middleware factory.
pub struct FeatureGate {
    licensing: Arc<LicensingService>,
    feature: FeatureSource,
}

impl FeatureGate {
    /// Gate on the feature named by the `{feature}` path segment.
    pub fn from_path(licensing: Arc<LicensingService>) -> Self {
        Self {
            licensing,
            feature: FeatureSource::PathParam("feature"),
        }
    }

    /// Gate every request on one fixed feature.
    pub fn for_feature(licensing: Arc<LicensingService>, feature_key: impl Into<String>) -> Self {
        Self {
            licensing,
            feature: FeatureSource::Fixed(feature_key.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for FeatureGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = FeatureGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(FeatureGateService {
            service: Rc::new(service),
            licensing: self.licensing.clone(),
            feature: self.feature.clone(),
        }))
    }
}

pub struct FeatureGateService<S> {
    service: Rc<S>,
    licensing: Arc<LicensingService>,
    feature: FeatureSource,
}

/// Everything the gate needs from the request before charging quota.
struct GateRequest {
    profile: ProfileId,
    feature: String,
    amount: u64,
}

impl GateRequest {
    fn parse(req: &ServiceRequest, source: &FeatureSource) -> Result<Self, AppError> {
        let feature = match source {
            FeatureSource::Fixed(key) => key.clone(),
            FeatureSource::PathParam(name) => req
                .match_info()
                .get(name)
                .map(str::to_owned)
                .ok_or_else(|| AppError::Internal(format!("route has no {{{name}}} segment")))?,
        };

        let query = web::Query::<AmountQuery>::from_query(req.query_string())
            .map_err(|e| AppError::BadRequest(format!("invalid amount: {e}")))?;

        Ok(Self {
            profile: ProfileId::from_headers(req.headers())?,
            feature,
            amount: query.amount.unwrap_or(1),
        })
    }
}

fn reject<B>(req: ServiceRequest, response: HttpResponse) -> ServiceResponse<EitherBody<B>> {
    req.into_response(response).map_into_right_body()
}

fn attach_request_id(problem: ErrorResponse, request_id: Option<&str>) -> ErrorResponse {
    match request_id {
        Some(id) => problem.with_request_id(id),
        None => problem,
    }
}

fn error_response(err: &AppError, request_id: Option<&str>) -> HttpResponse {
    HttpResponse::build(err.status_code()).json(attach_request_id(err.to_problem(), request_id))
}

fn denial_response(feature: &str, outcome: &ConsumeOutcome, request_id: Option<&str>) -> HttpResponse {
    let problem = match outcome.denial {
        Some(Denial::FeatureNotAvailable) => ErrorResponse::feature_not_available(feature),
        _ => ErrorResponse::quota_exceeded(feature, outcome.remaining),
    };

    HttpResponse::Forbidden()
        .insert_header((QUOTA_REMAINING_HEADER, outcome.remaining.to_string()))
        .json(attach_request_id(problem, request_id))
}

impl<S, B> Service<ServiceRequest> for FeatureGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let licensing = self.licensing.clone();
        let source = self.feature.clone();

        Box::pin(async move {
            let request_id = req.extensions().get::<RequestId>().map(|id| id.to_string());

            let gate = match GateRequest::parse(&req, &source) {
                Ok(gate) => gate,
                Err(err) => {
                    let response = error_response(&err, request_id.as_deref());
                    return Ok(reject(req, response));
                }
            };

            let result = licensing
                .check_and_consume(gate.profile.as_str(), &gate.feature, gate.amount)
                .await;

            match result {
                Ok(outcome) if outcome.allowed => {
                    tracing::debug!(
                        profile_id = %gate.profile.as_str(),
                        feature = %gate.feature,
                        amount = gate.amount,
                        remaining = outcome.remaining,
                        "Feature usage granted"
                    );

                    req.extensions_mut().insert(outcome);
                    let mut res = service.call(req).await?;
                    res.headers_mut().insert(
                        HeaderName::from_static(QUOTA_REMAINING_HEADER),
                        HeaderValue::from(outcome.remaining),
                    );
                    Ok(res.map_into_left_body())
                }
                Ok(outcome) => {
                    tracing::info!(
                        profile_id = %gate.profile.as_str(),
                        feature = %gate.feature,
                        amount = gate.amount,
                        denial = ?outcome.denial,
                        "Feature usage denied"
                    );
                    let response = denial_response(&gate.feature, &outcome, request_id.as_deref());
                    Ok(reject(req, response))
                }
                Err(err) => {
                    let response = error_response(&AppError::from(err), request_id.as_deref());
                    Ok(reject(req, response))
                }
            }
        })
    }
}
