use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryClaimStore};
use crate::routes::with_claim_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use claimdesk::config::AppConfig;
use claimdesk::error::AppError;
use claimdesk::telemetry;
use claimdesk::workflows::intake::IntakeService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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
        day_count: config.ledger.day_count,
    };

    let store = Arc::new(InMemoryClaimStore::default());
    let intake_service = Arc::new(IntakeService::new(store));

    let app = with_claim_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        day_count = ?config.ledger.day_count,
        "claim desk service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
