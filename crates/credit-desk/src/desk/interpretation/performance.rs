use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::super::client::ScoringBackend;
use super::super::domain::{ModelMetrics, ModelPerformanceResponse};
use super::super::error::{DeskError, TransportError};

/// Named cells of the 2×2 confusion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionBreakdown {
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub true_positive: u64,
    pub total: u64,
}

impl ConfusionBreakdown {
    /// Rows are the actual class and columns the predicted class, both in
    /// [negative, positive] order.
    pub fn from_matrix(matrix: &[Vec<u64>]) -> Result<Self, String> {
        match matrix {
            [negative, positive] if negative.len() == 2 && positive.len() == 2 => {
                let breakdown = Self {
                    true_negative: negative[0],
                    false_positive: negative[1],
                    false_negative: positive[0],
                    true_positive: positive[1],
                    total: negative[0] + negative[1] + positive[0] + positive[1],
                };
                Ok(breakdown)
            }
            _ => Err(format!(
                "confusion matrix must be 2x2, got {} row(s)",
                matrix.len()
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub metrics: ModelMetrics,
    pub confusion: ConfusionBreakdown,
    pub dataset_info: String,
}

/// Loads the model's offline evaluation figures.
pub struct PerformanceClient<B> {
    backend: Arc<B>,
}

impl<B> PerformanceClient<B>
where
    B: ScoringBackend + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn fetch(&self) -> Result<PerformanceReport, DeskError> {
        let response = self.backend.model_performance().await.map_err(|err| {
            warn!(code = err.code(), error = %err, "performance fetch failed");
            match err {
                TransportError::Malformed(reason) => DeskError::MalformedResponse(reason),
                other => DeskError::PerformanceUnavailable(other.to_string()),
            }
        })?;

        let report = report_from(response)?;
        info!(
            accuracy = report.metrics.accuracy,
            samples = report.confusion.total,
            "model performance loaded"
        );
        Ok(report)
    }
}

fn report_from(response: ModelPerformanceResponse) -> Result<PerformanceReport, DeskError> {
    let ModelPerformanceResponse {
        metrics,
        confusion_matrix,
        dataset_info,
    } = response;
    let confusion =
        ConfusionBreakdown::from_matrix(&confusion_matrix).map_err(DeskError::MalformedResponse)?;

    Ok(PerformanceReport {
        metrics,
        confusion,
        dataset_info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_follow_actual_by_predicted_order() {
        let breakdown =
            ConfusionBreakdown::from_matrix(&[vec![120, 20], vec![35, 25]]).expect("2x2");
        assert_eq!(breakdown.true_negative, 120);
        assert_eq!(breakdown.false_positive, 20);
        assert_eq!(breakdown.false_negative, 35);
        assert_eq!(breakdown.true_positive, 25);
        assert_eq!(breakdown.total, 200);
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        assert!(ConfusionBreakdown::from_matrix(&[vec![1, 2, 3], vec![4, 5, 6]]).is_err());
        assert!(ConfusionBreakdown::from_matrix(&[vec![1, 2]]).is_err());
    }
}
