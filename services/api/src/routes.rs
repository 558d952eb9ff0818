use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use vehicle_valuation::valuation::{
    valuation_router, RateLimiter, ValuationRepository, ValuationService,
};

pub(crate) fn with_valuation_routes<R, L>(service: Arc<ValuationService<R, L>>) -> axum::Router
where
    R: ValuationRepository + 'static,
    L: RateLimiter + 'static,
{
    valuation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    if ready {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "initializing" })),
        )
    }
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{FixedWindowRateLimiter, InMemoryValuationRepository};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;
    use vehicle_valuation::config::{RateLimitSettings, ValuationSettings};

    fn app(ready: bool) -> axum::Router {
        let service = Arc::new(ValuationService::new(
            Arc::new(InMemoryValuationRepository::default()),
            Arc::new(FixedWindowRateLimiter::new(RateLimitSettings {
                max_requests: 1,
                window_secs: 60,
            })),
            &ValuationSettings {
                reference_year: Some(2025),
                ..ValuationSettings::default()
            },
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_valuation_routes(service).layer(Extension(state))
    }

    async fn status_of(router: axum::Router, request: Request<Body>) -> StatusCode {
        router
            .oneshot(request)
            .await
            .expect("router responds")
            .status()
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let request = Request::get("/health")
            .body(Body::empty())
            .expect("request builds");
        assert_eq!(status_of(app(false), request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let request = || {
            Request::get("/ready")
                .body(Body::empty())
                .expect("request builds")
        };
        assert_eq!(
            status_of(app(false), request()).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(app(true), request()).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_render_as_prometheus_text() {
        let response = app(true)
            .oneshot(
                Request::get("/metrics")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&header::HeaderValue::from_static("text/plain; version=0.0.4"))
        );
    }

    #[tokio::test]
    async fn second_valuation_from_same_client_is_limited() {
        let router = app(true);
        let submit = || {
            Request::post("/api/v1/valuations")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-client-id", "dealer-7")
                .body(Body::from(
                    json!({
                        "make": "Honda",
                        "model": "Accord",
                        "year": 2018,
                        "mileage": 70000,
                        "zip": "60601"
                    })
                    .to_string(),
                ))
                .expect("request builds")
        };

        assert_eq!(
            status_of(router.clone(), submit()).await,
            StatusCode::CREATED
        );
        assert_eq!(
            status_of(router, submit()).await,
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
