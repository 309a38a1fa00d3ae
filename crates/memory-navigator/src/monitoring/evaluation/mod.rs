mod config;
mod policy;
mod rules;

pub use config::EvaluationConfig;
pub use policy::{classify, RiskTier, CAUTION_THRESHOLD, CRITICAL_THRESHOLD, MAX_SCORE};
pub use rules::ELEVATED_HEART_RATE_BPM;

use super::domain::{DiscreteEvent, SubjectProfile, TelemetrySample};
use policy::decide_event;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Stateless evaluator combining distance, scoring rules, and tier classification.
///
/// Holds only immutable deployment settings, so a single engine can be shared across
/// threads and called concurrently.
#[derive(Debug, Clone, Default)]
pub struct EvaluationEngine {
    config: EvaluationConfig,
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn distance_meters(&self, sample: &TelemetrySample, profile: &SubjectProfile) -> f64 {
        self.config
            .distance_model
            .distance_meters(sample.location(), profile.safe_center())
    }

    /// Score a sample without classifying it.
    pub fn compute_score(
        &self,
        sample: &TelemetrySample,
        profile: &SubjectProfile,
    ) -> (u8, Vec<ContributingFactor>) {
        let distance = self.distance_meters(sample, profile);
        let scored = rules::score_sample(sample, profile, distance);
        (scored.score, scored.factors)
    }

    pub fn evaluate(&self, sample: &TelemetrySample, profile: &SubjectProfile) -> RiskResult {
        let distance = self.distance_meters(sample, profile);
        let scored = rules::score_sample(sample, profile, distance);
        let tier = classify(scored.score);

        debug!(
            subject = %sample.subject_id(),
            score = scored.score,
            tier = tier.label(),
            distance_m = distance,
            breached = scored.geofence_breached,
            "telemetry evaluated"
        );

        RiskResult::new(scored.score, tier, distance, scored.factors)
    }

    /// Evaluate a discrete event. FALL_DETECTED and SOS_BUTTON bypass the scoring rules.
    pub fn evaluate_event(&self, event: &DiscreteEvent, profile: &SubjectProfile) -> RiskResult {
        let distance = self
            .config
            .distance_model
            .distance_meters(event.location, profile.safe_center());
        let outside_fence = distance > profile.safe_radius_meters();
        let decision = decide_event(event.event_type, &event.description, outside_fence);

        debug!(
            subject = %event.subject_id,
            event = event.event_type.label(),
            tier = decision.tier.label(),
            distance_m = distance,
            "event evaluated"
        );

        RiskResult::new(decision.score, decision.tier, distance, decision.factors)
    }
}

/// Named reason a score moved, rendered by presentation surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Baseline,
    GeofenceBreach,
    NightMotion,
    ElevatedHeartRate,
    FallOrSosTrigger,
    GeofenceExit,
    DoorOpen,
    DoorOpenBeforeBreach,
}

impl FactorKind {
    pub fn label(&self) -> &'static str {
        match self {
            FactorKind::Baseline => "baseline monitored",
            FactorKind::GeofenceBreach => "geofence breach",
            FactorKind::NightMotion => "night motion sensitivity",
            FactorKind::ElevatedHeartRate => "elevated heart rate",
            FactorKind::FallOrSosTrigger => "fall/SOS hard trigger",
            FactorKind::GeofenceExit => "geofence exit event",
            FactorKind::DoorOpen => "door open",
            FactorKind::DoorOpenBeforeBreach => "door opened before geofence breach",
        }
    }
}

/// Discrete contribution to a score, kept in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub factor: FactorKind,
    pub points_added: u8,
    pub note: String,
}

impl ContributingFactor {
    pub fn new(factor: FactorKind, points_added: u8, note: impl Into<String>) -> Self {
        Self {
            factor,
            points_added,
            note: note.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.factor.label()
    }
}

/// Evaluation output. Produced fresh per call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub score: u8,
    pub tier: RiskTier,
    pub status: String,
    pub distance_from_home_meters: f64,
    pub contributing_factors: Vec<ContributingFactor>,
}

impl RiskResult {
    fn new(
        score: u8,
        tier: RiskTier,
        distance_from_home_meters: f64,
        contributing_factors: Vec<ContributingFactor>,
    ) -> Self {
        Self {
            score,
            tier,
            status: tier.status().to_string(),
            distance_from_home_meters,
            contributing_factors,
        }
    }

    pub fn has_factor(&self, factor: FactorKind) -> bool {
        self.contributing_factors
            .iter()
            .any(|contribution| contribution.factor == factor)
    }

    pub fn summary(&self) -> String {
        let factors = self
            .contributing_factors
            .iter()
            .filter(|contribution| contribution.points_added > 0)
            .map(|contribution| format!("{} (+{})", contribution.name(), contribution.points_added))
            .collect::<Vec<_>>();
        if factors.is_empty() {
            format!("{} ({}): {}", self.tier.label(), self.score, self.status)
        } else {
            format!(
                "{} ({}): {} [{}]",
                self.tier.label(),
                self.score,
                self.status,
                factors.join(", ")
            )
        }
    }
}
