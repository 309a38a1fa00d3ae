use super::super::domain::{SubjectProfile, TelemetrySample};
use super::policy::MAX_SCORE;
use super::{ContributingFactor, FactorKind};

pub(crate) const BASELINE_POINTS: u8 = 10;
pub(crate) const NIGHT_MOTION_POINTS: u8 = 20;
pub(crate) const ELEVATED_HEART_RATE_POINTS: u8 = 30;
/// Heart rates strictly above this value add the elevated heart rate penalty.
pub const ELEVATED_HEART_RATE_BPM: u16 = 100;

pub(crate) struct RuleScore {
    pub score: u8,
    pub factors: Vec<ContributingFactor>,
    pub geofence_breached: bool,
}

/// Apply the scoring rules in their fixed order.
///
/// A geofence breach forces the score to 100 and short-circuits every additive factor.
/// Points sit in a `u16` so the running total cannot wrap before the final clamp.
pub(crate) fn score_sample(
    sample: &TelemetrySample,
    profile: &SubjectProfile,
    distance_meters: f64,
) -> RuleScore {
    let mut factors = Vec::new();
    let mut total: u16 = 0;

    factors.push(ContributingFactor::new(
        FactorKind::Baseline,
        BASELINE_POINTS,
        "baseline monitored",
    ));
    total += u16::from(BASELINE_POINTS);

    // Strictly greater: a sample sitting exactly on the radius is inside the fence.
    if distance_meters > profile.safe_radius_meters() {
        let forced = u16::from(MAX_SCORE).saturating_sub(total) as u8;
        factors.push(ContributingFactor::new(
            FactorKind::GeofenceBreach,
            forced,
            format!(
                "{:.0} m from safe center exceeds {:.0} m radius",
                distance_meters,
                profile.safe_radius_meters()
            ),
        ));
        return RuleScore {
            score: MAX_SCORE,
            factors,
            geofence_breached: true,
        };
    }

    if profile.night_mode_enabled() {
        let hour = profile.local_hour(sample.timestamp_utc());
        let window = profile.night_window();
        if window.contains(hour) {
            factors.push(ContributingFactor::new(
                FactorKind::NightMotion,
                NIGHT_MOTION_POINTS,
                format!(
                    "activity at {:02}:00 inside night window {:02}:00-{:02}:00",
                    hour,
                    window.start_hour(),
                    window.end_hour()
                ),
            ));
            total += u16::from(NIGHT_MOTION_POINTS);
        }
    }

    let heart_rate = sample.vitals().heart_rate_bpm();
    if heart_rate > ELEVATED_HEART_RATE_BPM {
        factors.push(ContributingFactor::new(
            FactorKind::ElevatedHeartRate,
            ELEVATED_HEART_RATE_POINTS,
            format!("heart rate {heart_rate} bpm above {ELEVATED_HEART_RATE_BPM} bpm"),
        ));
        total += u16::from(ELEVATED_HEART_RATE_POINTS);
    }

    RuleScore {
        score: total.min(u16::from(MAX_SCORE)) as u8,
        factors,
        geofence_breached: false,
    }
}
