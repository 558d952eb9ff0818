use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::confidence::{
    confidence_components, confidence_score, ConfidenceFactors, ConfidenceLevel,
};
use super::domain::ValuationId;
use super::intake::VehicleSubmission;
use super::providers::{RateLimitError, RateLimiter};
use super::repository::{RepositoryError, ValuationRepository};
use super::service::{ValuationService, ValuationServiceError};

/// Router builder exposing valuation and confidence endpoints.
pub fn valuation_router<R, L>(service: Arc<ValuationService<R, L>>) -> Router
where
    R: ValuationRepository + 'static,
    L: RateLimiter + 'static,
{
    Router::new()
        .route("/api/v1/valuations", post(create_handler::<R, L>))
        .route("/api/v1/valuations/confidence", post(confidence_handler))
        .route("/api/v1/valuations/:valuation_id", get(fetch_handler::<R, L>))
        .with_state(service)
}

/// First forwarded address, else an explicit client id, else a shared bucket.
pub(crate) fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| {
            headers
                .get("x-client-id")
                .and_then(|value| value.to_str().ok())
        })
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

pub(crate) async fn create_handler<R, L>(
    State(service): State<Arc<ValuationService<R, L>>>,
    headers: HeaderMap,
    Json(submission): Json<VehicleSubmission>,
) -> Response
where
    R: ValuationRepository + 'static,
    L: RateLimiter + 'static,
{
    let key = client_key(&headers);
    match service.appraise(&key, submission) {
        Ok(result) => (StatusCode::CREATED, Json(result)).into_response(),
        Err(ValuationServiceError::Validation(error)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(ValuationServiceError::RateLimited(RateLimitError::Exceeded { retry_after_secs })) => {
            let payload = json!({
                "error": "rate limit exceeded",
                "retry_after_secs": retry_after_secs,
            });
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(payload)).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            response
        }
        Err(ValuationServiceError::Repository(RepositoryError::Conflict)) => {
            let payload = json!({ "error": "valuation already exists" });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        Err(other) => {
            tracing::error!(error = %other, "valuation request failed");
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn fetch_handler<R, L>(
    State(service): State<Arc<ValuationService<R, L>>>,
    Path(valuation_id): Path<String>,
) -> Response
where
    R: ValuationRepository + 'static,
    L: RateLimiter + 'static,
{
    let id = ValuationId(valuation_id);
    match service.get(&id) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(ValuationServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "valuation not found",
                "valuation_id": id.0,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn confidence_handler(Json(factors): Json<ConfidenceFactors>) -> Response {
    let score = confidence_score(&factors);
    let level = ConfidenceLevel::from_score(score);
    let payload = json!({
        "score": score,
        "level": level,
        "label": level.label(),
        "components": confidence_components(&factors),
    });
    (StatusCode::OK, Json(payload)).into_response()
}
