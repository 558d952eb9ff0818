use crate::cli::ServeArgs;
use crate::infra::{AppState, FixedWindowRateLimiter, InMemoryValuationRepository};
use crate::routes::with_valuation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use vehicle_valuation::config::AppConfig;
use vehicle_valuation::error::AppError;
use vehicle_valuation::telemetry;
use vehicle_valuation::valuation::ValuationService;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryValuationRepository::default());
    let limiter = Arc::new(FixedWindowRateLimiter::new(config.rate_limit));
    let valuation_service = Arc::new(ValuationService::new(
        repository,
        limiter,
        &config.valuation,
    ));

    let app = with_valuation_routes(valuation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "vehicle valuation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
