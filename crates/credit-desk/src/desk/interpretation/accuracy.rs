use serde::Serialize;

use super::super::domain::{Decision, RISKY_LABEL, SAFE_LABEL};

/// How a decision compares against a sample's known label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Correct,
    /// Risky applicant approved.
    DangerousMiss,
    /// Safe applicant rejected.
    FalseAlarm,
    Inconclusive,
}

impl Outcome {
    pub fn summary(&self) -> &'static str {
        match self {
            Outcome::Correct => "prediction matches the recorded outcome",
            Outcome::DangerousMiss => "dangerous miss: a risky applicant was approved",
            Outcome::FalseAlarm => "false alarm: a safe applicant was rejected",
            Outcome::Inconclusive => "inconclusive: referred for review",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyComparator;

impl AccuracyComparator {
    /// `None` when no label is tracked; nothing is compared then.
    pub fn compare(&self, actual_label: Option<&str>, decision: Decision) -> Option<Outcome> {
        let label = actual_label?;
        let outcome = match (label, decision) {
            (_, Decision::Review) => Outcome::Inconclusive,
            (RISKY_LABEL, Decision::Reject) | (SAFE_LABEL, Decision::Approve) => Outcome::Correct,
            (RISKY_LABEL, Decision::Approve) => Outcome::DangerousMiss,
            (SAFE_LABEL, Decision::Reject) => Outcome::FalseAlarm,
            _ => Outcome::Inconclusive,
        };
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_labels_are_inconclusive() {
        assert_eq!(
            AccuracyComparator.compare(Some("bad"), Decision::Reject),
            Some(Outcome::Inconclusive)
        );
    }

    #[test]
    fn no_label_means_no_comparison() {
        assert_eq!(AccuracyComparator.compare(None, Decision::Approve), None);
    }
}
