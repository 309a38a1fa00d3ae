//! Wearable telemetry risk evaluation and the ingestion wiring around it.
//!
//! `evaluation` is the pure engine: it never performs I/O or keeps state between calls.
//! `service` and `router` connect device payloads and caregiver profiles to that engine.

pub mod domain;
pub mod evaluation;
pub mod geo;
pub mod ingestion;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Coordinate, DiscreteEvent, EventType, NightWindow, SubjectId, SubjectProfile,
    TelemetrySample, ValidationError, VitalSigns,
};
pub use evaluation::{
    classify, ContributingFactor, EvaluationConfig, EvaluationEngine, FactorKind, RiskResult,
    RiskTier,
};
pub use geo::DistanceModel;
pub use ingestion::{EventPayload, TelemetryPayload};
pub use repository::{
    AlertError, AlertPublisher, AlertSource, ProfileRepository, RepositoryError, RiskAlert,
};
pub use router::monitoring_router;
pub use service::{MonitoringService, MonitoringServiceError, TelemetryAssessment};
