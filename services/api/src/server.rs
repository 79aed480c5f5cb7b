use crate::cli::ServeArgs;
use crate::infra::{build_backend, AppState};
use crate::routes::with_desk_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_desk::config::DeskConfig;
use credit_desk::desk::{DeskService, HealthMonitor};
use credit_desk::error::AppError;
use credit_desk::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut config: DeskConfig, mut args: ServeArgs) -> Result<(), AppError> {
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

    let backend = build_backend(&config.backend)?;
    let monitor = HealthMonitor::spawn(backend.clone(), config.backend.health_interval);
    let desk = Arc::new(
        DeskService::new(backend, config.backend.submit_timeout).with_health(monitor.subscribe()),
    );

    if let Err(err) = desk.load_schema().await {
        warn!(error = %err, "starting without a feature schema, reload via POST /api/v1/schema/reload");
    }

    let app = with_desk_routes(desk.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        backend = %config.backend.base_url,
        "credit decision desk ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    desk.cancel_submission();
    monitor.shutdown().await;
    info!("credit decision desk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
