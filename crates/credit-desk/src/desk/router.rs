use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::ScoringBackend;
use super::domain::FieldValue;
use super::error::DeskError;
use super::service::DeskService;

/// HTTP surface of the desk for a presentation layer.
pub fn desk_router<B>(service: Arc<DeskService<B>>) -> Router
where
    B: ScoringBackend + 'static,
{
    Router::new()
        .route("/api/v1/schema", get(schema_handler::<B>))
        .route("/api/v1/schema/reload", post(reload_schema_handler::<B>))
        .route("/api/v1/form", get(form_handler::<B>))
        .route("/api/v1/form/fields/:field", put(set_field_handler::<B>))
        .route("/api/v1/form/focus", post(focus_handler::<B>))
        .route("/api/v1/form/reset", post(reset_handler::<B>))
        .route("/api/v1/form/sample", post(sample_handler::<B>))
        .route("/api/v1/predictions", post(submit_handler::<B>))
        .route("/api/v1/predictions/latest", get(latest_handler::<B>))
        .route("/api/v1/performance", get(performance_handler::<B>))
        .route("/api/v1/backend-status", get(backend_status_handler::<B>))
        .with_state(service)
}

/// Status code a desk failure is reported with.
pub fn status_for(error: &DeskError) -> StatusCode {
    match error {
        DeskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DeskError::UnknownField(_) => StatusCode::NOT_FOUND,
        DeskError::AlreadyInProgress | DeskError::Cancelled => StatusCode::CONFLICT,
        DeskError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        DeskError::Unreachable(_)
        | DeskError::RemoteRejected { .. }
        | DeskError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        DeskError::SchemaUnavailable(_)
        | DeskError::SampleUnavailable(_)
        | DeskError::PerformanceUnavailable(_)
        | DeskError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub(crate) fn error_response(error: DeskError) -> Response {
    let mut payload = json!({
        "error": error.to_string(),
        "code": error.code(),
    });
    match &error {
        DeskError::Validation(failure) => {
            payload["missing"] = json!(failure.missing);
            payload["invalid"] = json!(failure.invalid);
        }
        DeskError::RemoteRejected {
            status: Some(status),
            ..
        } => {
            payload["upstream_status"] = json!(status);
        }
        _ => {}
    }
    (status_for(&error), Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(result: Result<T, DeskError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldUpdate {
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FocusRequest {
    #[serde(default)]
    field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SampleQuery {
    #[serde(default)]
    include_target: bool,
}

pub(crate) async fn schema_handler<B>(State(service): State<Arc<DeskService<B>>>) -> Response
where
    B: ScoringBackend + 'static,
{
    respond(service.schema().map(|schema| (*schema).clone()))
}

pub(crate) async fn reload_schema_handler<B>(
    State(service): State<Arc<DeskService<B>>>,
) -> Response
where
    B: ScoringBackend + 'static,
{
    match service.load_schema().await {
        Ok(_) => respond(service.form_view()),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn form_handler<B>(State(service): State<Arc<DeskService<B>>>) -> Response
where
    B: ScoringBackend + 'static,
{
    respond(service.form_view())
}

pub(crate) async fn set_field_handler<B>(
    State(service): State<Arc<DeskService<B>>>,
    Path(field): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Response
where
    B: ScoringBackend + 'static,
{
    let result = match update.value {
        None | Some(Value::Null) => service.set_field(&field, None),
        Some(Value::String(raw)) => service.set_field_input(&field, &raw),
        Some(other) => match FieldValue::from_json(&other) {
            Some(value) => service.set_field(&field, Some(value)),
            None => {
                let payload = json!({
                    "error": "value must be a number, a string or null",
                    "code": "invalid_value",
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response();
            }
        },
    };
    respond(result)
}

pub(crate) async fn focus_handler<B>(
    State(service): State<Arc<DeskService<B>>>,
    Json(request): Json<FocusRequest>,
) -> Response
where
    B: ScoringBackend + 'static,
{
    respond(service.focus(request.field.as_deref()))
}

pub(crate) async fn reset_handler<B>(State(service): State<Arc<DeskService<B>>>) -> Response
where
    B: ScoringBackend + 'static,
{
    respond(service.reset())
}

pub(crate) async fn sample_handler<B>(
    State(service): State<Arc<DeskService<B>>>,
    Query(query): Query<SampleQuery>,
) -> Response
where
    B: ScoringBackend + 'static,
{
    respond(service.load_sample(query.include_target).await)
}

pub(crate) async fn submit_handler<B>(State(service): State<Arc<DeskService<B>>>) -> Response
where
    B: ScoringBackend + 'static,
{
    respond(service.submit().await)
}

pub(crate) async fn latest_handler<B>(State(service): State<Arc<DeskService<B>>>) -> Response
where
    B: ScoringBackend + 'static,
{
    match service.latest() {
        Some(verdict) => (StatusCode::OK, Json(verdict)).into_response(),
        None => {
            let payload = json!({ "error": "no prediction yet" });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn performance_handler<B>(
    State(service): State<Arc<DeskService<B>>>,
) -> Response
where
    B: ScoringBackend + 'static,
{
    respond(service.performance().await)
}

pub(crate) async fn backend_status_handler<B>(
    State(service): State<Arc<DeskService<B>>>,
) -> Response
where
    B: ScoringBackend + 'static,
{
    let snapshot = service.backend_status().await;
    (StatusCode::OK, Json(snapshot)).into_response()
}
