use std::fmt;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a monitored subject. Devices report under the subject they are paired with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::BlankSubjectId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubjectId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubjectId> for String {
    fn from(value: SubjectId) -> Self {
        value.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateDocument")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Deserialize)]
struct CoordinateDocument {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<CoordinateDocument> for Coordinate {
    type Error = ValidationError;

    fn try_from(value: CoordinateDocument) -> Result<Self, Self::Error> {
        Self::new(value.latitude, value.longitude)
    }
}

/// Highest heart rate accepted from a device before the reading is treated as corrupt.
pub const MAX_HEART_RATE_BPM: i64 = 300;

/// Vital signs reported alongside a location fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VitalSignsDocument")]
pub struct VitalSigns {
    heart_rate_bpm: u16,
    steps_since_last_sample: u32,
}

impl VitalSigns {
    /// Validate raw device readings, which arrive as signed integers on the wire.
    pub fn from_raw(heart_rate_bpm: i64, steps: i64) -> Result<Self, ValidationError> {
        if !(0..=MAX_HEART_RATE_BPM).contains(&heart_rate_bpm) {
            return Err(ValidationError::HeartRate(heart_rate_bpm));
        }
        let steps_since_last_sample =
            u32::try_from(steps).map_err(|_| ValidationError::Steps(steps))?;
        Ok(Self {
            heart_rate_bpm: heart_rate_bpm as u16,
            steps_since_last_sample,
        })
    }

    pub fn heart_rate_bpm(&self) -> u16 {
        self.heart_rate_bpm
    }

    pub fn steps_since_last_sample(&self) -> u32 {
        self.steps_since_last_sample
    }
}

#[derive(Deserialize)]
struct VitalSignsDocument {
    heart_rate_bpm: i64,
    steps_since_last_sample: i64,
}

impl TryFrom<VitalSignsDocument> for VitalSigns {
    type Error = ValidationError;

    fn try_from(value: VitalSignsDocument) -> Result<Self, Self::Error> {
        Self::from_raw(value.heart_rate_bpm, value.steps_since_last_sample)
    }
}

/// One periodic telemetry observation. One sample is evaluated exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TelemetrySampleDocument")]
pub struct TelemetrySample {
    subject_id: SubjectId,
    timestamp_utc: DateTime<Utc>,
    location: Coordinate,
    vitals: VitalSigns,
    battery_level_percent: u8,
}

impl TelemetrySample {
    pub fn new(
        subject_id: SubjectId,
        timestamp_utc: DateTime<Utc>,
        location: Coordinate,
        vitals: VitalSigns,
        battery_level_percent: i64,
    ) -> Result<Self, ValidationError> {
        if !(0..=100).contains(&battery_level_percent) {
            return Err(ValidationError::BatteryLevel(battery_level_percent));
        }
        Ok(Self {
            subject_id,
            timestamp_utc,
            location,
            vitals,
            battery_level_percent: battery_level_percent as u8,
        })
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.timestamp_utc
    }

    pub fn location(&self) -> Coordinate {
        self.location
    }

    pub fn vitals(&self) -> VitalSigns {
        self.vitals
    }

    pub fn battery_level_percent(&self) -> u8 {
        self.battery_level_percent
    }
}

#[derive(Deserialize)]
struct TelemetrySampleDocument {
    subject_id: SubjectId,
    timestamp_utc: DateTime<Utc>,
    location: Coordinate,
    vitals: VitalSigns,
    battery_level_percent: i64,
}

impl TryFrom<TelemetrySampleDocument> for TelemetrySample {
    type Error = ValidationError;

    fn try_from(value: TelemetrySampleDocument) -> Result<Self, Self::Error> {
        Self::new(
            value.subject_id,
            value.timestamp_utc,
            value.location,
            value.vitals,
            value.battery_level_percent,
        )
    }
}

/// Discrete safety events raised by the wearable outside the periodic telemetry stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    FallDetected,
    SosButton,
    DoorOpen,
    GeoExit,
}

impl EventType {
    pub fn label(&self) -> &'static str {
        match self {
            EventType::FallDetected => "FALL_DETECTED",
            EventType::SosButton => "SOS_BUTTON",
            EventType::DoorOpen => "DOOR_OPEN",
            EventType::GeoExit => "GEO_EXIT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteEvent {
    pub subject_id: SubjectId,
    pub timestamp_utc: DateTime<Utc>,
    pub event_type: EventType,
    pub location: Coordinate,
    pub description: String,
}

/// Nightly sensitivity window `[start_hour, end_hour)` in the subject's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NightWindowDocument")]
pub struct NightWindow {
    start_hour: u8,
    end_hour: u8,
}

impl NightWindow {
    pub fn new(start_hour: u8, end_hour: u8) -> Result<Self, ValidationError> {
        if start_hour > 23 || end_hour > 23 || start_hour == end_hour {
            return Err(ValidationError::NightWindow {
                start_hour,
                end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn start_hour(&self) -> u8 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u8 {
        self.end_hour
    }

    /// Windows that cross midnight are the union `[start, 24) ∪ [0, end)`.
    pub fn contains(&self, hour: u32) -> bool {
        let start = u32::from(self.start_hour);
        let end = u32::from(self.end_hour);
        if start < end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            start_hour: 22,
            end_hour: 6,
        }
    }
}

#[derive(Deserialize)]
struct NightWindowDocument {
    start_hour: u8,
    end_hour: u8,
}

impl TryFrom<NightWindowDocument> for NightWindow {
    type Error = ValidationError;

    fn try_from(value: NightWindowDocument) -> Result<Self, Self::Error> {
        Self::new(value.start_hour, value.end_hour)
    }
}

/// Largest UTC offset in minutes (UTC+14:00 / UTC-12:00 rounded out).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Caregiver-owned geofence and sensitivity settings for one subject.
///
/// The engine only reads profiles. Callers that allow concurrent edits should clone the
/// profile before handing it to an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SubjectProfileDocument")]
pub struct SubjectProfile {
    safe_center: Coordinate,
    safe_radius_meters: f64,
    night_mode_enabled: bool,
    night_window: NightWindow,
    utc_offset_minutes: i32,
}

impl SubjectProfile {
    pub fn new(
        safe_center: Coordinate,
        safe_radius_meters: f64,
        night_mode_enabled: bool,
    ) -> Result<Self, ValidationError> {
        if !safe_radius_meters.is_finite() || safe_radius_meters <= 0.0 {
            return Err(ValidationError::SafeRadius(safe_radius_meters));
        }
        Ok(Self {
            safe_center,
            safe_radius_meters,
            night_mode_enabled,
            night_window: NightWindow::default(),
            utc_offset_minutes: 0,
        })
    }

    pub fn with_night_window(mut self, night_window: NightWindow) -> Self {
        self.night_window = night_window;
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Result<Self, ValidationError> {
        if minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ValidationError::UtcOffset(minutes));
        }
        self.utc_offset_minutes = minutes;
        Ok(self)
    }

    pub fn safe_center(&self) -> Coordinate {
        self.safe_center
    }

    pub fn safe_radius_meters(&self) -> f64 {
        self.safe_radius_meters
    }

    pub fn night_mode_enabled(&self) -> bool {
        self.night_mode_enabled
    }

    pub fn night_window(&self) -> NightWindow {
        self.night_window
    }

    pub fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }

    /// Hour of day (0-23) at `instant` in the subject's local time.
    pub fn local_hour(&self, instant: DateTime<Utc>) -> u32 {
        match FixedOffset::east_opt(self.utc_offset_minutes * 60) {
            Some(offset) => instant.with_timezone(&offset).hour(),
            None => instant.hour(),
        }
    }
}

#[derive(Deserialize)]
struct SubjectProfileDocument {
    safe_center: Coordinate,
    safe_radius_meters: f64,
    #[serde(default)]
    night_mode_enabled: bool,
    #[serde(default)]
    night_window: NightWindow,
    #[serde(default)]
    utc_offset_minutes: i32,
}

impl TryFrom<SubjectProfileDocument> for SubjectProfile {
    type Error = ValidationError;

    fn try_from(value: SubjectProfileDocument) -> Result<Self, Self::Error> {
        SubjectProfile::new(
            value.safe_center,
            value.safe_radius_meters,
            value.night_mode_enabled,
        )?
        .with_night_window(value.night_window)
        .with_utc_offset_minutes(value.utc_offset_minutes)
    }
}

/// Malformed input rejected before any score is computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("latitude {0} must be a finite value within [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} must be a finite value within [-180, 180]")]
    Longitude(f64),
    #[error("safe radius {0} must be a finite value greater than zero meters")]
    SafeRadius(f64),
    #[error("heart rate {0} bpm outside accepted range [0, 300]")]
    HeartRate(i64),
    #[error("step count {0} must be a non-negative 32-bit value")]
    Steps(i64),
    #[error("battery level {0}% outside [0, 100]")]
    BatteryLevel(i64),
    #[error("night window {start_hour}:00-{end_hour}:00 must use distinct hours within 0-23")]
    NightWindow { start_hour: u8, end_hour: u8 },
    #[error("utc offset {0} minutes exceeds +/-840")]
    UtcOffset(i32),
    #[error("subject id must not be blank")]
    BlankSubjectId,
}
