//! Scenario fixtures for tests and the command-line simulation harness.
//!
//! Nothing in `monitoring` depends on this module; randomness stays on the caller side so
//! evaluations remain deterministic.

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::monitoring::domain::{
    Coordinate, SubjectId, SubjectProfile, TelemetrySample, ValidationError, VitalSigns,
};
use crate::monitoring::geo::{offset_by_meters, METERS_PER_DEGREE};

/// Standard deviation of the at-home position jitter, in degrees.
const HOME_JITTER_DEGREES: f64 = 0.0001;
const WANDERING_RADIUS_FRACTION: f64 = 0.9;
const CRITICAL_RADIUS_FRACTION: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Near home with resting vitals.
    Normal,
    /// Close to the fence edge with a raised but normal heart rate.
    Wandering,
    /// Well outside the fence with a racing heart rate.
    Critical,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Normal, Scenario::Wandering, Scenario::Critical];

    pub fn label(&self) -> &'static str {
        match self {
            Scenario::Normal => "normal",
            Scenario::Wandering => "wandering",
            Scenario::Critical => "critical",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Scenario::Normal),
            "wandering" => Ok(Scenario::Wandering),
            "critical" => Ok(Scenario::Critical),
            other => Err(format!(
                "unknown scenario '{other}' (expected normal, wandering or critical)"
            )),
        }
    }
}

/// Seeded generator of scenario telemetry. The same seed yields the same samples.
pub struct ScenarioGenerator {
    rng: StdRng,
}

impl ScenarioGenerator {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn sample(
        &mut self,
        scenario: Scenario,
        subject_id: &SubjectId,
        profile: &SubjectProfile,
        timestamp_utc: DateTime<Utc>,
    ) -> Result<TelemetrySample, ValidationError> {
        let home = profile.safe_center();
        let radius = profile.safe_radius_meters();

        let (location, heart_rate, steps) = match scenario {
            Scenario::Normal => {
                let sigma = HOME_JITTER_DEGREES * METERS_PER_DEGREE;
                let north: f64 = StandardNormal.sample(&mut self.rng);
                let east: f64 = StandardNormal.sample(&mut self.rng);
                (
                    offset_by_meters(home, north * sigma, east * sigma)?,
                    self.rng.gen_range(60..75),
                    self.rng.gen_range(100..500),
                )
            }
            Scenario::Wandering => (
                north_east_of(profile, radius * WANDERING_RADIUS_FRACTION)?,
                self.rng.gen_range(80..100),
                self.rng.gen_range(2000..3000),
            ),
            Scenario::Critical => (
                north_east_of(profile, radius * CRITICAL_RADIUS_FRACTION)?,
                self.rng.gen_range(110..145),
                self.rng.gen_range(5000..6000),
            ),
        };

        let battery = self.rng.gen_range(20..=100);
        let vitals = VitalSigns::from_raw(heart_rate, steps)?;

        TelemetrySample::new(
            subject_id.clone(),
            timestamp_utc,
            location,
            vitals,
            battery,
        )
    }
}

fn north_east_of(
    profile: &SubjectProfile,
    distance_meters: f64,
) -> Result<Coordinate, ValidationError> {
    let leg = distance_meters * FRAC_1_SQRT_2;
    offset_by_meters(profile.safe_center(), leg, leg)
}
