//! HTTP client for the remote scoring service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::domain::{
    BackendHealth, CreditApplication, FeatureSchema, ModelPerformanceResponse,
    PredictionResponse, SampleRecord,
};
use super::error::TransportError;

/// Transport default for calls that carry no bound of their own.
const DEFAULT_TRANSPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// The endpoints the desk consumes. Implemented over HTTP in production and by
/// scripted doubles in tests.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    async fn model_features(&self) -> Result<FeatureSchema, TransportError>;
    async fn model_performance(&self) -> Result<ModelPerformanceResponse, TransportError>;
    async fn sample_data(&self, include_target: bool) -> Result<SampleRecord, TransportError>;
    async fn predict(
        &self,
        application: &CreditApplication,
    ) -> Result<PredictionResponse, TransportError>;
    async fn health(&self) -> Result<BackendHealth, TransportError>;
}

/// reqwest-backed [`ScoringBackend`].
#[derive(Debug, Clone)]
pub struct HttpScoringBackend {
    client: reqwest::Client,
    base_url: String,
    predict_timeout: Duration,
}

impl HttpScoringBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, DEFAULT_TRANSPORT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Unreachable(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            predict_timeout: timeout,
        })
    }

    /// Bound `/predict` separately from the other endpoints, so a submission
    /// timeout longer than the transport default is honoured.
    pub fn with_predict_timeout(mut self, timeout: Duration) -> Self {
        self.predict_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn predict_timeout(&self) -> Duration {
        self.predict_timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let response = self.client.get(self.url(path)).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl ScoringBackend for HttpScoringBackend {
    async fn model_features(&self) -> Result<FeatureSchema, TransportError> {
        self.get_json("/model-features").await
    }

    async fn model_performance(&self) -> Result<ModelPerformanceResponse, TransportError> {
        self.get_json("/model-performance").await
    }

    async fn sample_data(&self, include_target: bool) -> Result<SampleRecord, TransportError> {
        let response = self
            .client
            .get(self.url("/sample-data"))
            .query(&[("include_target", include_target)])
            .send()
            .await?;
        let map: Map<String, Value> = decode(response).await?;
        Ok(SampleRecord::from_map(map))
    }

    async fn predict(
        &self,
        application: &CreditApplication,
    ) -> Result<PredictionResponse, TransportError> {
        let response = self
            .client
            .post(self.url("/predict"))
            .timeout(self.predict_timeout)
            .json(application)
            .send()
            .await?;
        let prediction: PredictionResponse = decode(response).await?;
        if let Some(violation) = prediction.contract_violation() {
            return Err(TransportError::Malformed(violation));
        }
        Ok(prediction)
    }

    async fn health(&self) -> Result<BackendHealth, TransportError> {
        self.get_json("/health").await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(TransportError::Rejected {
            status: status.as_u16(),
            detail: error_detail(status, &bytes),
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| TransportError::Malformed(format!("invalid JSON: {e}")))
}

/// Server-supplied message from an error body, or a generic fallback.
pub(crate) fn error_detail(status: StatusCode, body: &[u8]) -> String {
    let fallback = || {
        format!(
            "scoring service rejected the request (HTTP {})",
            status.as_u16()
        )
    };

    let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(body) else {
        return fallback();
    };

    match body.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => return detail.clone(),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return messages.join("; ");
            }
        }
        _ => {}
    }

    body.get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(fallback)
}
