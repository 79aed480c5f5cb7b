use credit_desk::config::BackendConfig;
use credit_desk::desk::HttpScoringBackend;
use credit_desk::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_backend(config: &BackendConfig) -> Result<Arc<HttpScoringBackend>, AppError> {
    let backend = HttpScoringBackend::new(config.base_url.clone())?
        .with_predict_timeout(config.submit_timeout);
    Ok(Arc::new(backend))
}

/// Parse a `field=value` override from the command line.
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((field.to_string(), value.trim().to_string()))
}
