use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::monitoring::domain::{
    Coordinate, SubjectId, SubjectProfile, TelemetrySample, VitalSigns,
};
use crate::monitoring::evaluation::{EvaluationConfig, EvaluationEngine};
use crate::monitoring::geo::offset_by_meters;
use crate::monitoring::repository::{
    AlertError, AlertPublisher, ProfileRepository, RepositoryError, RiskAlert,
};
use crate::monitoring::{monitoring_router, MonitoringService};

pub(super) const HOME_LAT: f64 = 25.0330;
pub(super) const HOME_LON: f64 = 121.5654;
pub(super) const DEVICE: &str = "WATCH-G001-998877";

pub(super) fn home() -> Coordinate {
    Coordinate::new(HOME_LAT, HOME_LON).expect("valid home")
}

pub(super) fn subject() -> SubjectId {
    SubjectId::new(DEVICE).expect("valid subject")
}

pub(super) fn profile(radius_meters: f64, night_mode: bool) -> SubjectProfile {
    SubjectProfile::new(home(), radius_meters, night_mode).expect("valid profile")
}

/// 14:00 UTC, outside the default night window.
pub(super) fn afternoon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 14, 0, 0).unwrap()
}

/// 23:30 UTC, inside the default night window.
pub(super) fn late_night() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 23, 30, 0).unwrap()
}

pub(super) fn sample_at(
    location: Coordinate,
    heart_rate: u16,
    timestamp: DateTime<Utc>,
) -> TelemetrySample {
    TelemetrySample::new(
        subject(),
        timestamp,
        location,
        VitalSigns::from_raw(i64::from(heart_rate), 120).expect("valid vitals"),
        80,
    )
    .expect("valid sample")
}

/// Sample placed `meters` due north of home.
pub(super) fn sample_north(meters: f64, heart_rate: u16) -> TelemetrySample {
    let location = offset_by_meters(home(), meters, 0.0).expect("valid offset");
    sample_at(location, heart_rate, afternoon())
}

pub(super) fn engine() -> EvaluationEngine {
    EvaluationEngine::new(EvaluationConfig::default())
}

pub(super) fn telemetry_body(north_meters: &[f64], heart_rate: i64) -> Value {
    let records = north_meters
        .iter()
        .enumerate()
        .map(|(index, meters)| {
            let location = offset_by_meters(home(), *meters, 0.0).expect("valid offset");
            json!({
                "timestamp": format!("2025-03-14T14:{:02}:00Z", index),
                "location": { "lat": location.latitude(), "lon": location.longitude(), "accuracy": 8.0 },
                "vitals": { "heart_rate": heart_rate, "steps": 120 },
                "battery_level": 76
            })
        })
        .collect::<Vec<_>>();

    json!({ "device_id": DEVICE, "records": records })
}

pub(super) fn event_body(event_type: &str, north_meters: f64) -> Value {
    let location = offset_by_meters(home(), north_meters, 0.0).expect("valid offset");
    json!({
        "device_id": DEVICE,
        "timestamp": "2025-03-14T14:05:00Z",
        "event_type": event_type,
        "details": { "lat": location.latitude(), "lon": location.longitude(), "description": "reported by wearable" }
    })
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    records: Arc<Mutex<HashMap<SubjectId, SubjectProfile>>>,
}

impl ProfileRepository for MemoryProfiles {
    fn upsert(
        &self,
        subject_id: SubjectId,
        profile: SubjectProfile,
    ) -> Result<Option<SubjectProfile>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.insert(subject_id, profile))
    }

    fn fetch(&self, subject_id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(subject_id).cloned())
    }

    fn remove(&self, subject_id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.remove(subject_id))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAlerts {
    events: Arc<Mutex<Vec<RiskAlert>>>,
}

impl MemoryAlerts {
    pub(super) fn events(&self) -> Vec<RiskAlert> {
        self.events.lock().expect("alert mutex poisoned").clone()
    }
}

impl AlertPublisher for MemoryAlerts {
    fn publish(&self, alert: RiskAlert) -> Result<(), AlertError> {
        let mut guard = self.events.lock().expect("alert mutex poisoned");
        guard.push(alert);
        Ok(())
    }
}

/// Publisher whose `fail_on`-th delivery (1-based) fails; every other delivery is kept.
pub(super) struct FlakyAlerts {
    fail_on: usize,
    attempts: Mutex<usize>,
    delivered: MemoryAlerts,
}

impl FlakyAlerts {
    pub(super) fn failing_on(fail_on: usize) -> Self {
        Self {
            fail_on,
            attempts: Mutex::new(0),
            delivered: MemoryAlerts::default(),
        }
    }

    pub(super) fn events(&self) -> Vec<RiskAlert> {
        self.delivered.events()
    }
}

impl AlertPublisher for FlakyAlerts {
    fn publish(&self, alert: RiskAlert) -> Result<(), AlertError> {
        let mut attempts = self.attempts.lock().expect("attempt mutex poisoned");
        *attempts += 1;
        if *attempts == self.fail_on {
            return Err(AlertError::Transport("gateway timeout".to_string()));
        }
        self.delivered.publish(alert)
    }
}

/// Flaky-alert service with the default 500 m profile saved for [`DEVICE`].
pub(super) fn flaky_service(
    fail_on: usize,
) -> (
    MonitoringService<MemoryProfiles, FlakyAlerts>,
    Arc<FlakyAlerts>,
) {
    let alerts = Arc::new(FlakyAlerts::failing_on(fail_on));
    let service = MonitoringService::new(
        Arc::new(MemoryProfiles::default()),
        alerts.clone(),
        EvaluationConfig::default(),
    );
    service
        .upsert_profile(subject(), profile(500.0, false))
        .expect("profile saved");
    (service, alerts)
}

pub(super) struct UnavailableProfiles;

impl ProfileRepository for UnavailableProfiles {
    fn upsert(
        &self,
        _subject_id: SubjectId,
        _profile: SubjectProfile,
    ) -> Result<Option<SubjectProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn fetch(&self, _subject_id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }

    fn remove(&self, _subject_id: &SubjectId) -> Result<Option<SubjectProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("maintenance".to_string()))
    }
}

pub(super) fn build_service() -> (
    MonitoringService<MemoryProfiles, MemoryAlerts>,
    Arc<MemoryProfiles>,
    Arc<MemoryAlerts>,
) {
    let profiles = Arc::new(MemoryProfiles::default());
    let alerts = Arc::new(MemoryAlerts::default());
    let service = MonitoringService::new(
        profiles.clone(),
        alerts.clone(),
        EvaluationConfig::default(),
    );
    (service, profiles, alerts)
}

/// Service with the default 500 m profile already saved for [`DEVICE`].
pub(super) fn configured_service() -> (
    MonitoringService<MemoryProfiles, MemoryAlerts>,
    Arc<MemoryAlerts>,
) {
    let (service, _, alerts) = build_service();
    service
        .upsert_profile(subject(), profile(500.0, false))
        .expect("profile saved");
    (service, alerts)
}

pub(super) fn router_with_service(
    service: MonitoringService<MemoryProfiles, MemoryAlerts>,
) -> axum::Router {
    monitoring_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
