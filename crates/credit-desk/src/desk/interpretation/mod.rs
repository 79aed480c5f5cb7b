mod accuracy;
mod performance;
mod risk;

pub use accuracy::{AccuracyComparator, Outcome};
pub use performance::{ConfusionBreakdown, PerformanceClient, PerformanceReport};
pub use risk::{PresentationTier, RiskBand, RiskInterpreter, TierAlignment, LOW_TIER_MAX, MEDIUM_TIER_MAX};

use serde::Serialize;

use super::domain::{GroundTruth, PredictionResponse};

/// Everything the desk shows for one successful submission. The server's
/// prediction is kept unchanged; tier and alignment are cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub prediction: PredictionResponse,
    pub tier: PresentationTier,
    pub alignment: TierAlignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_label: Option<String>,
}

impl Verdict {
    pub fn interpret(prediction: PredictionResponse, ground_truth: Option<&GroundTruth>) -> Self {
        let tier = RiskInterpreter.classify(prediction.risk_score, prediction.risk_level);
        let alignment = RiskInterpreter.reconcile(&tier, prediction.decision);
        let actual_label = ground_truth
            .and_then(GroundTruth::resolved_label)
            .map(str::to_string);
        let outcome = AccuracyComparator.compare(actual_label.as_deref(), prediction.decision);

        Self {
            prediction,
            tier,
            alignment,
            outcome,
            actual_label,
        }
    }
}
