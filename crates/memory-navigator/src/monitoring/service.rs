use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::domain::{
    DiscreteEvent, EventType, SubjectId, SubjectProfile, TelemetrySample, ValidationError,
};
use super::evaluation::{
    ContributingFactor, EvaluationConfig, EvaluationEngine, FactorKind, RiskResult,
};
use super::ingestion::{EventPayload, TelemetryPayload};
use super::repository::{
    AlertError, AlertPublisher, AlertSource, ProfileRepository, RepositoryError, RiskAlert,
};

/// Per-subject bookkeeping kept between calls. The engine itself holds no state.
#[derive(Debug, Default, Clone)]
struct SubjectState {
    last_sample_at: Option<DateTime<Utc>>,
    door_open_pending: bool,
}

/// Service wiring ingestion payloads to the evaluation engine and alert routing.
pub struct MonitoringService<R, A> {
    profiles: Arc<R>,
    alerts: Arc<A>,
    engine: Arc<EvaluationEngine>,
    subjects: Mutex<HashMap<SubjectId, SubjectState>>,
}

/// Results for one telemetry batch, in record order.
#[derive(Debug, Clone)]
pub struct TelemetryAssessment {
    pub subject_id: SubjectId,
    pub results: Vec<RiskResult>,
    /// Indices into `results` whose alert could not be delivered.
    pub undelivered_alerts: Vec<usize>,
}

impl<R, A> MonitoringService<R, A>
where
    R: ProfileRepository + 'static,
    A: AlertPublisher + 'static,
{
    pub fn new(profiles: Arc<R>, alerts: Arc<A>, config: EvaluationConfig) -> Self {
        Self {
            profiles,
            alerts,
            engine: Arc::new(EvaluationEngine::new(config)),
            subjects: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    pub fn upsert_profile(
        &self,
        subject_id: SubjectId,
        profile: SubjectProfile,
    ) -> Result<SubjectProfile, MonitoringServiceError> {
        let previous = self.profiles.upsert(subject_id.clone(), profile.clone())?;
        info!(
            subject = %subject_id,
            radius_m = profile.safe_radius_meters(),
            night_mode = profile.night_mode_enabled(),
            replaced = previous.is_some(),
            "subject profile saved"
        );
        Ok(profile)
    }

    /// Snapshot of the current profile. Missing profiles are an error, never a default.
    pub fn profile(&self, subject_id: &SubjectId) -> Result<SubjectProfile, MonitoringServiceError> {
        self.profiles
            .fetch(subject_id)?
            .ok_or_else(|| MonitoringServiceError::ConfigurationMissing(subject_id.clone()))
    }

    pub fn remove_profile(
        &self,
        subject_id: &SubjectId,
    ) -> Result<SubjectProfile, MonitoringServiceError> {
        let removed = self
            .profiles
            .remove(subject_id)?
            .ok_or_else(|| MonitoringServiceError::ConfigurationMissing(subject_id.clone()))?;
        self.subjects_guard().remove(subject_id);
        info!(subject = %subject_id, "subject profile removed");
        Ok(removed)
    }

    /// Evaluate every record, then route alerts for the CAUTION/CRITICAL ones.
    ///
    /// A failed alert delivery does not abort the batch: the record index is reported in
    /// `undelivered_alerts` and the remaining alerts are still attempted.
    pub fn ingest_telemetry(
        &self,
        payload: TelemetryPayload,
    ) -> Result<TelemetryAssessment, MonitoringServiceError> {
        let (subject_id, samples) = payload.into_samples()?;
        let profile = self.profile(&subject_id)?;

        let results = samples
            .iter()
            .map(|sample| self.assess_sample(sample, &profile))
            .collect::<Vec<_>>();

        let mut undelivered_alerts = Vec::new();
        for (index, (sample, result)) in samples.iter().zip(&results).enumerate() {
            if !result.tier.requires_alert() {
                continue;
            }
            let alert = RiskAlert::from_result(
                subject_id.clone(),
                sample.timestamp_utc(),
                AlertSource::Telemetry,
                result,
            );
            if self.publish(alert, result).is_err() {
                undelivered_alerts.push(index);
            }
        }

        info!(
            subject = %subject_id,
            records = results.len(),
            alerts = results.iter().filter(|result| result.tier.requires_alert()).count(),
            undelivered = undelivered_alerts.len(),
            "telemetry batch evaluated"
        );

        Ok(TelemetryAssessment {
            subject_id,
            results,
            undelivered_alerts,
        })
    }

    pub fn ingest_event(
        &self,
        payload: EventPayload,
    ) -> Result<(DiscreteEvent, RiskResult), MonitoringServiceError> {
        let event = payload.into_event()?;
        let profile = self.profile(&event.subject_id)?;
        let result = self.engine.evaluate_event(&event, &profile);

        if event.event_type == EventType::DoorOpen {
            self.subjects_guard()
                .entry(event.subject_id.clone())
                .or_default()
                .door_open_pending = true;
        }

        if result.tier.requires_alert() {
            let alert = RiskAlert::from_result(
                event.subject_id.clone(),
                event.timestamp_utc,
                AlertSource::Event(event.event_type),
                &result,
            );
            self.publish(alert, &result)?;
        }

        Ok((event, result))
    }

    fn assess_sample(&self, sample: &TelemetrySample, profile: &SubjectProfile) -> RiskResult {
        let mut result = self.engine.evaluate(sample, profile);

        let door_open_pending = {
            let mut subjects = self.subjects_guard();
            let state = subjects.entry(sample.subject_id().clone()).or_default();
            if let Some(previous) = state.last_sample_at {
                if sample.timestamp_utc() < previous {
                    warn!(
                        subject = %sample.subject_id(),
                        %previous,
                        received = %sample.timestamp_utc(),
                        "telemetry sample arrived out of order"
                    );
                }
            }
            state.last_sample_at = Some(
                state
                    .last_sample_at
                    .map_or(sample.timestamp_utc(), |previous| {
                        previous.max(sample.timestamp_utc())
                    }),
            );
            std::mem::take(&mut state.door_open_pending)
        };

        if door_open_pending && result.has_factor(FactorKind::GeofenceBreach) {
            result.contributing_factors.push(ContributingFactor::new(
                FactorKind::DoorOpenBeforeBreach,
                0,
                "door opened before this geofence breach",
            ));
        }

        result
    }

    fn publish(&self, alert: RiskAlert, result: &RiskResult) -> Result<(), AlertError> {
        warn!(
            subject = %alert.subject_id,
            tier = result.tier.label(),
            score = result.score,
            distance_m = result.distance_from_home_meters,
            "risk alert raised"
        );
        let subject = alert.subject_id.clone();
        self.alerts.publish(alert).map_err(|err| {
            error!(subject = %subject, error = %err, "risk alert delivery failed");
            err
        })
    }

    fn subjects_guard(&self) -> std::sync::MutexGuard<'_, HashMap<SubjectId, SubjectState>> {
        self.subjects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Error raised by the monitoring service.
#[derive(Debug, thiserror::Error)]
pub enum MonitoringServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no subject profile configured for '{0}'")]
    ConfigurationMissing(SubjectId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Alert(#[from] AlertError),
}
