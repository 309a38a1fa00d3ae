use serde::{Deserialize, Serialize};

use super::super::domain::EventType;
use super::{ContributingFactor, FactorKind};

/// Lowest score classified as CAUTION.
pub const CAUTION_THRESHOLD: u8 = 50;
/// Lowest score classified as CRITICAL.
pub const CRITICAL_THRESHOLD: u8 = 80;
pub const MAX_SCORE: u8 = 100;

/// Alert tier shown to caregivers. The score bands behind each tier are product semantics
/// that downstream copy depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Safe,
    Caution,
    Critical,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Safe => "SAFE",
            RiskTier::Caution => "CAUTION",
            RiskTier::Critical => "CRITICAL",
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            RiskTier::Safe => "status safe",
            RiskTier::Caution => "abnormal behavior detected",
            RiskTier::Critical => "high risk detected",
        }
    }

    /// Whether a result at this tier should be routed to caregivers.
    pub fn requires_alert(&self) -> bool {
        !matches!(self, RiskTier::Safe)
    }
}

pub fn classify(score: u8) -> RiskTier {
    if score >= CRITICAL_THRESHOLD {
        RiskTier::Critical
    } else if score >= CAUTION_THRESHOLD {
        RiskTier::Caution
    } else {
        RiskTier::Safe
    }
}

/// Outcome of the discrete-event override path.
pub(crate) struct EventDecision {
    pub score: u8,
    pub tier: RiskTier,
    pub factors: Vec<ContributingFactor>,
}

/// Classify a discrete event without consulting the additive rules.
pub(crate) fn decide_event(
    event_type: EventType,
    description: &str,
    outside_fence: bool,
) -> EventDecision {
    let detail = if description.trim().is_empty() {
        event_type.label().to_string()
    } else {
        format!("{}: {}", event_type.label(), description.trim())
    };

    match event_type {
        EventType::FallDetected | EventType::SosButton => EventDecision {
            score: MAX_SCORE,
            tier: RiskTier::Critical,
            factors: vec![ContributingFactor::new(
                FactorKind::FallOrSosTrigger,
                MAX_SCORE,
                detail,
            )],
        },
        EventType::GeoExit if outside_fence => EventDecision {
            score: MAX_SCORE,
            tier: RiskTier::Critical,
            factors: vec![ContributingFactor::new(
                FactorKind::GeofenceExit,
                MAX_SCORE,
                format!("{detail} (outside safe radius)"),
            )],
        },
        EventType::GeoExit => EventDecision {
            score: CAUTION_THRESHOLD,
            tier: RiskTier::Caution,
            factors: vec![ContributingFactor::new(
                FactorKind::GeofenceExit,
                CAUTION_THRESHOLD,
                format!("{detail} (position still inside safe radius)"),
            )],
        },
        EventType::DoorOpen => EventDecision {
            score: super::rules::BASELINE_POINTS,
            tier: RiskTier::Safe,
            factors: vec![
                ContributingFactor::new(
                    FactorKind::Baseline,
                    super::rules::BASELINE_POINTS,
                    "baseline monitored",
                ),
                ContributingFactor::new(FactorKind::DoorOpen, 0, detail),
            ],
        },
    }
}
