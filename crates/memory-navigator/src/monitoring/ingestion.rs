//! Device-facing payloads accepted by the ingestion endpoints.
//!
//! Shapes follow the vendor contract (`device_id`, `records`, `battery_level`, ...). Numeric
//! readings are taken as signed integers so out-of-range values surface as validation errors
//! instead of opaque deserialization failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Coordinate, DiscreteEvent, EventType, SubjectId, TelemetrySample, ValidationError, VitalSigns,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub lat: f64,
    pub lon: f64,
    /// Reported horizontal accuracy in meters. Carried for audit only.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsReading {
    pub heart_rate: i64,
    pub steps: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub location: LocationFix,
    pub vitals: VitalsReading,
    pub battery_level: i64,
}

/// Batch of periodic records from one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    pub device_id: String,
    pub records: Vec<TelemetryRecord>,
}

impl TelemetryPayload {
    /// Validate every record, failing on the first malformed one.
    pub fn into_samples(self) -> Result<(SubjectId, Vec<TelemetrySample>), ValidationError> {
        let subject_id = SubjectId::new(self.device_id)?;
        let samples = self
            .records
            .into_iter()
            .map(|record| {
                let location = Coordinate::new(record.location.lat, record.location.lon)?;
                let vitals = VitalSigns::from_raw(record.vitals.heart_rate, record.vitals.steps)?;
                TelemetrySample::new(
                    subject_id.clone(),
                    record.timestamp,
                    location,
                    vitals,
                    record.battery_level,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((subject_id, samples))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub details: EventDetails,
}

impl EventPayload {
    pub fn into_event(self) -> Result<DiscreteEvent, ValidationError> {
        Ok(DiscreteEvent {
            subject_id: SubjectId::new(self.device_id)?,
            timestamp_utc: self.timestamp,
            event_type: self.event_type,
            location: Coordinate::new(self.details.lat, self.details.lon)?,
            description: self.details.description,
        })
    }
}
