use chrono::{DateTime, Utc};
use memory_navigator::monitoring::{
    AlertError, AlertPublisher, ProfileRepository, RepositoryError, RiskAlert, SubjectId,
    SubjectProfile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileRepository {
    records: Arc<Mutex<HashMap<SubjectId, SubjectProfile>>>,
}

impl ProfileRepository for InMemoryProfileRepository {
    fn upsert(
        &self,
        subject_id: SubjectId,
        profile: SubjectProfile,
    ) -> Result<Option<SubjectProfile>, RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("profile mutex poisoned".to_string()))?;
        Ok(guard.insert(subject_id, profile))
    }

    fn fetch(&self, subject_id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("profile mutex poisoned".to_string()))?;
        Ok(guard.get(subject_id).cloned())
    }

    fn remove(&self, subject_id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("profile mutex poisoned".to_string()))?;
        Ok(guard.remove(subject_id))
    }
}

/// Keeps raised alerts in memory and logs them; stands in for push/SMS adapters.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAlertPublisher {
    events: Arc<Mutex<Vec<RiskAlert>>>,
}

impl AlertPublisher for InMemoryAlertPublisher {
    fn publish(&self, alert: RiskAlert) -> Result<(), AlertError> {
        info!(
            subject = %alert.subject_id,
            tier = alert.tier.label(),
            summary = %alert.summary,
            "alert queued for caregivers"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AlertError::Transport("alert mutex poisoned".to_string()))?;
        guard.push(alert);
        Ok(())
    }
}

#[cfg(test)]
impl InMemoryAlertPublisher {
    pub(crate) fn events(&self) -> Vec<RiskAlert> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
