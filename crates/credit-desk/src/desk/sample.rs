use std::sync::Arc;

use tracing::{info, warn};

use super::client::ScoringBackend;
use super::domain::SampleRecord;
use super::error::DeskError;
use super::form::FormStateEngine;

/// Pulls a random historical application for pre-filling the form.
pub struct SampleDataLoader<B> {
    backend: Arc<B>,
}

impl<B> SampleDataLoader<B>
where
    B: ScoringBackend + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Fetch a sample. The record already has its label subset split off the
    /// submittable fields.
    pub async fn load_sample(&self, include_label: bool) -> Result<SampleRecord, DeskError> {
        let mut record = self.backend.sample_data(include_label).await.map_err(|err| {
            warn!(code = err.code(), error = %err, "sample fetch failed");
            DeskError::SampleUnavailable(err.to_string())
        })?;

        if !include_label {
            record.ground_truth = None;
        }

        info!(
            fields = record.fields.len(),
            labelled = record.ground_truth.is_some(),
            "sample record loaded"
        );
        Ok(record)
    }

    /// Fetch a sample and hand it to the form engine.
    pub async fn load_into(
        &self,
        engine: &mut FormStateEngine,
        include_label: bool,
    ) -> Result<(), DeskError> {
        let record = self.load_sample(include_label).await?;
        engine.apply_sample(record);
        Ok(())
    }
}
