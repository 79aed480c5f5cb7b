use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{json, Value};

use crate::desk::client::ScoringBackend;
use crate::desk::domain::{
    BackendHealth, CategoricalFeature, CreditApplication, Decision, FeatureSchema,
    ModelMetrics, ModelPerformanceResponse, PredictionResponse, RiskLevel, SampleRecord,
};
use crate::desk::error::TransportError;
use crate::desk::service::DeskService;

/// In-memory backend answering from scripted results and counting calls.
pub(super) struct ScriptedBackend {
    schema: Mutex<Result<FeatureSchema, TransportError>>,
    sample: Mutex<Result<SampleRecord, TransportError>>,
    prediction: Mutex<Result<PredictionResponse, TransportError>>,
    performance: Mutex<Result<ModelPerformanceResponse, TransportError>>,
    health: Mutex<Result<BackendHealth, TransportError>>,
    predict_delay: Mutex<Duration>,
    last_application: Mutex<Option<CreditApplication>>,
    pub(super) schema_calls: AtomicUsize,
    pub(super) predict_calls: AtomicUsize,
    pub(super) performance_calls: AtomicUsize,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            schema: Mutex::new(Ok(schema())),
            sample: Mutex::new(Ok(sample_record(Some("Riskli")))),
            prediction: Mutex::new(Ok(prediction(68, RiskLevel::High, Decision::Reject))),
            performance: Mutex::new(Ok(performance_response())),
            health: Mutex::new(Ok(BackendHealth {
                status: "healthy".to_string(),
                model_trained: Some(true),
            })),
            predict_delay: Mutex::new(Duration::ZERO),
            last_application: Mutex::new(None),
            schema_calls: AtomicUsize::new(0),
            predict_calls: AtomicUsize::new(0),
            performance_calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedBackend {
    pub(super) fn set_schema(&self, result: Result<FeatureSchema, TransportError>) {
        *self.schema.lock().expect("schema lock") = result;
    }

    pub(super) fn set_sample(&self, result: Result<SampleRecord, TransportError>) {
        *self.sample.lock().expect("sample lock") = result;
    }

    pub(super) fn set_prediction(&self, result: Result<PredictionResponse, TransportError>) {
        *self.prediction.lock().expect("prediction lock") = result;
    }

    pub(super) fn set_performance(&self, result: Result<ModelPerformanceResponse, TransportError>) {
        *self.performance.lock().expect("performance lock") = result;
    }

    pub(super) fn set_health(&self, result: Result<BackendHealth, TransportError>) {
        *self.health.lock().expect("health lock") = result;
    }

    pub(super) fn set_predict_delay(&self, delay: Duration) {
        *self.predict_delay.lock().expect("delay lock") = delay;
    }

    pub(super) fn last_application(&self) -> Option<CreditApplication> {
        self.last_application.lock().expect("application lock").clone()
    }

    pub(super) fn predict_count(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoringBackend for ScriptedBackend {
    async fn model_features(&self) -> Result<FeatureSchema, TransportError> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        self.schema.lock().expect("schema lock").clone()
    }

    async fn model_performance(&self) -> Result<ModelPerformanceResponse, TransportError> {
        self.performance_calls.fetch_add(1, Ordering::SeqCst);
        self.performance.lock().expect("performance lock").clone()
    }

    async fn sample_data(&self, include_target: bool) -> Result<SampleRecord, TransportError> {
        let mut record = self.sample.lock().expect("sample lock").clone()?;
        if !include_target {
            record.ground_truth = None;
        }
        Ok(record)
    }

    async fn predict(
        &self,
        application: &CreditApplication,
    ) -> Result<PredictionResponse, TransportError> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_application.lock().expect("application lock") = Some(application.clone());
        let delay = *self.predict_delay.lock().expect("delay lock");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.prediction.lock().expect("prediction lock").clone()
    }

    async fn health(&self) -> Result<BackendHealth, TransportError> {
        self.health.lock().expect("health lock").clone()
    }
}

pub(super) fn categorical(values: &[&str]) -> CategoricalFeature {
    CategoricalFeature {
        kind: "categorical".to_string(),
        allowed_values: values.iter().map(|value| value.to_string()).collect(),
    }
}

pub(super) fn schema() -> FeatureSchema {
    let mut categorical_features = BTreeMap::new();
    categorical_features.insert(
        "checking_status".to_string(),
        categorical(&["<0", "0<=X<200", ">=200", "no checking"]),
    );
    categorical_features.insert("housing".to_string(), categorical(&["own", "rent", "for free"]));
    categorical_features.insert("purpose".to_string(), categorical(&["radio/tv", "new car"]));

    FeatureSchema {
        numeric_features: vec![
            "duration".to_string(),
            "credit_amount".to_string(),
            "age".to_string(),
        ],
        categorical_features,
        all_features: vec![
            "duration".to_string(),
            "credit_amount".to_string(),
            "age".to_string(),
            "checking_status".to_string(),
            "housing".to_string(),
            "purpose".to_string(),
        ],
    }
}

/// A historical applicant; `label` adds the ground-truth keys.
pub(super) fn sample_record(label: Option<&str>) -> SampleRecord {
    let mut value = json!({
        "duration": 36,
        "credit_amount": 7200,
        "age": 52,
        "checking_status": "<0",
        "housing": "rent",
        "purpose": "new car"
    });
    if let Some(label) = label {
        let code = if label == "Riskli" { "bad" } else { "good" };
        value["actual_risk"] = json!(code);
        value["actual_risk_label"] = json!(label);
    }
    match value {
        Value::Object(map) => SampleRecord::from_map(map),
        _ => unreachable!("fixture is an object"),
    }
}

pub(super) fn prediction(score: u8, level: RiskLevel, decision: Decision) -> PredictionResponse {
    PredictionResponse {
        risk_score: score,
        risk_probability: f64::from(score) / 100.0,
        risk_level: level,
        decision,
        explanation: Some("scripted".to_string()),
    }
}

pub(super) fn performance_response() -> ModelPerformanceResponse {
    ModelPerformanceResponse {
        metrics: ModelMetrics {
            accuracy: 0.765,
            precision: 0.62,
            recall: 0.55,
            f1: 0.58,
        },
        confusion_matrix: vec![vec![120, 20], vec![27, 33]],
        dataset_info: "German Credit Dataset (1000 samples)".to_string(),
    }
}

pub(super) fn service_with(backend: &Arc<ScriptedBackend>) -> Arc<DeskService<ScriptedBackend>> {
    Arc::new(DeskService::new(backend.clone(), Duration::from_secs(30)))
}

pub(super) async fn ready_service(
    backend: &Arc<ScriptedBackend>,
) -> Arc<DeskService<ScriptedBackend>> {
    let service = service_with(backend);
    service.load_schema().await.expect("schema loads");
    service
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("json body")
}
