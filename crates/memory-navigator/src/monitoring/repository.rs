use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{EventType, SubjectId, SubjectProfile};
use super::evaluation::{RiskResult, RiskTier};

/// Storage abstraction for caregiver-managed profiles so the service can run in isolation.
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace, returning the previously stored profile.
    fn upsert(
        &self,
        subject_id: SubjectId,
        profile: SubjectProfile,
    ) -> Result<Option<SubjectProfile>, RepositoryError>;
    fn fetch(&self, subject_id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError>;
    fn remove(&self, subject_id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook for CAUTION/CRITICAL results (push, SMS, pager adapters).
pub trait AlertPublisher: Send + Sync {
    fn publish(&self, alert: RiskAlert) -> Result<(), AlertError>;
}

/// What produced the result behind an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "event_type")]
pub enum AlertSource {
    Telemetry,
    Event(EventType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub subject_id: SubjectId,
    pub observed_at: DateTime<Utc>,
    pub source: AlertSource,
    pub tier: RiskTier,
    pub score: u8,
    pub summary: String,
}

impl RiskAlert {
    pub fn from_result(
        subject_id: SubjectId,
        observed_at: DateTime<Utc>,
        source: AlertSource,
        result: &RiskResult,
    ) -> Self {
        Self {
            subject_id,
            observed_at,
            source,
            tier: result.tier,
            score: result.score,
            summary: result.summary(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport unavailable: {0}")]
    Transport(String),
}
