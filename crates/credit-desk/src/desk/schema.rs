use std::sync::Arc;

use tracing::{info, warn};

use super::client::ScoringBackend;
use super::domain::FeatureSchema;
use super::error::DeskError;

/// Fetches the feature schema. Holds no cache; callers decide how long a
/// schema lives.
pub struct SchemaClient<B> {
    backend: Arc<B>,
}

impl<B> SchemaClient<B>
where
    B: ScoringBackend + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn fetch_schema(&self) -> Result<FeatureSchema, DeskError> {
        match self.backend.model_features().await {
            Ok(schema) => {
                let undeclared = schema.undeclared_features();
                if !undeclared.is_empty() {
                    warn!(?undeclared, "schema lists fields without a type");
                }
                info!(
                    numeric = schema.numeric_features.len(),
                    categorical = schema.categorical_features.len(),
                    "feature schema loaded"
                );
                Ok(schema)
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, "feature schema fetch failed");
                Err(DeskError::SchemaUnavailable(err.to_string()))
            }
        }
    }
}
