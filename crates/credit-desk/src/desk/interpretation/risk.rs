use serde::Serialize;

use super::super::domain::{Decision, RiskLevel};

/// Highest score still shown in the low band.
pub const LOW_TIER_MAX: u8 = 35;
/// Highest score still shown in the medium band.
pub const MEDIUM_TIER_MAX: u8 = 55;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Low => "Low / approve-leaning",
            RiskBand::Medium => "Medium / review-leaning",
            RiskBand::High => "High / reject-leaning",
        }
    }

    /// Decision this band visually leans towards.
    pub fn leaning(&self) -> Decision {
        match self {
            RiskBand::Low => Decision::Approve,
            RiskBand::Medium => Decision::Review,
            RiskBand::High => Decision::Reject,
        }
    }
}

/// Colour/label tier derived from the score. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationTier {
    pub band: RiskBand,
    pub score: u8,
    pub level: RiskLevel,
    pub label: &'static str,
    /// Whether the server's coarse level names the same band.
    pub level_agrees: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierAlignment {
    Consistent,
    Diverges,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RiskInterpreter;

impl RiskInterpreter {
    pub fn classify(&self, score: u8, level: RiskLevel) -> PresentationTier {
        let band = match score {
            0..=LOW_TIER_MAX => RiskBand::Low,
            s if s <= MEDIUM_TIER_MAX => RiskBand::Medium,
            _ => RiskBand::High,
        };
        let level_agrees = matches!(
            (band, level),
            (RiskBand::Low, RiskLevel::Low)
                | (RiskBand::Medium, RiskLevel::Medium)
                | (RiskBand::High, RiskLevel::High)
        );

        PresentationTier {
            band,
            score,
            level,
            label: band.label(),
            level_agrees,
        }
    }

    /// Compare the cosmetic band with the authoritative decision. Never feeds
    /// back into the decision.
    pub fn reconcile(&self, tier: &PresentationTier, decision: Decision) -> TierAlignment {
        if tier.band.leaning() == decision {
            TierAlignment::Consistent
        } else {
            TierAlignment::Diverges
        }
    }
}
