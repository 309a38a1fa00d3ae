use crate::infra::parse_timestamp;
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use memory_navigator::error::AppError;
use memory_navigator::monitoring::{
    Coordinate, DistanceModel, EvaluationConfig, EvaluationEngine, RiskTier, SubjectId,
    SubjectProfile, TelemetrySample, ValidationError, VitalSigns,
};
use memory_navigator::simulation::{Scenario, ScenarioGenerator};

const DEFAULT_DEVICE: &str = "WATCH-G001-998877";

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Latitude of the reported position
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lat: f64,
    /// Longitude of the reported position
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) lon: f64,
    #[arg(long, default_value_t = 25.0330, allow_hyphen_values = true)]
    pub(crate) home_lat: f64,
    #[arg(long, default_value_t = 121.5654, allow_hyphen_values = true)]
    pub(crate) home_lon: f64,
    /// Safe radius around home, in meters
    #[arg(long, default_value_t = 500.0)]
    pub(crate) radius: f64,
    #[arg(long, default_value_t = 72, allow_hyphen_values = true)]
    pub(crate) heart_rate: i64,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub(crate) steps: i64,
    #[arg(long, default_value_t = 80, allow_hyphen_values = true)]
    pub(crate) battery: i64,
    #[arg(long)]
    pub(crate) night_mode: bool,
    /// Sample time as RFC 3339 (defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) timestamp: Option<DateTime<Utc>>,
    /// Subject's offset from UTC in minutes, used for the night window
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub(crate) utc_offset: i32,
    /// Distance model: equirectangular or haversine
    #[arg(long, default_value = "equirectangular", value_parser = parse_distance_model)]
    pub(crate) distance_model: DistanceModel,
}

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    /// One of normal, wandering or critical
    #[arg(long, value_parser = parse_scenario)]
    pub(crate) scenario: Scenario,
    /// Seed for reproducible output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Number of samples to generate
    #[arg(long, default_value_t = 1)]
    pub(crate) count: u32,
    #[arg(long, default_value_t = 25.0330, allow_hyphen_values = true)]
    pub(crate) home_lat: f64,
    #[arg(long, default_value_t = 121.5654, allow_hyphen_values = true)]
    pub(crate) home_lon: f64,
    #[arg(long, default_value_t = 500.0)]
    pub(crate) radius: f64,
    #[arg(long)]
    pub(crate) night_mode: bool,
}

fn parse_scenario(raw: &str) -> Result<Scenario, String> {
    raw.parse()
}

fn parse_distance_model(raw: &str) -> Result<DistanceModel, String> {
    raw.parse()
}

fn build_profile(
    home_lat: f64,
    home_lon: f64,
    radius: f64,
    night_mode: bool,
) -> Result<SubjectProfile, ValidationError> {
    let home = Coordinate::new(home_lat, home_lon)?;
    SubjectProfile::new(home, radius, night_mode)
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let profile = build_profile(args.home_lat, args.home_lon, args.radius, args.night_mode)?
        .with_utc_offset_minutes(args.utc_offset)?;
    let sample = TelemetrySample::new(
        SubjectId::new(DEFAULT_DEVICE)?,
        args.timestamp.unwrap_or_else(Utc::now),
        Coordinate::new(args.lat, args.lon)?,
        VitalSigns::from_raw(args.heart_rate, args.steps)?,
        args.battery,
    )?;

    let engine = EvaluationEngine::new(EvaluationConfig {
        distance_model: args.distance_model,
    });
    let result = engine.evaluate(&sample, &profile);

    let rendered = serde_json::to_string_pretty(&result).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_simulation(args: SimulateArgs) -> Result<(), AppError> {
    let profile = build_profile(args.home_lat, args.home_lon, args.radius, args.night_mode)?;
    let subject = SubjectId::new(DEFAULT_DEVICE)?;
    let engine = EvaluationEngine::default();
    let mut generator = match args.seed {
        Some(seed) => ScenarioGenerator::seeded(seed),
        None => ScenarioGenerator::from_entropy(),
    };

    println!(
        "Simulating '{}' for {} around ({:.4}, {:.4}) with a {:.0} m fence",
        args.scenario,
        subject,
        profile.safe_center().latitude(),
        profile.safe_center().longitude(),
        profile.safe_radius_meters()
    );

    let started = Utc::now();
    let mut tally = [0u32; 3];
    for index in 0..args.count {
        let timestamp = started + Duration::minutes(i64::from(index));
        let sample = generator.sample(args.scenario, &subject, &profile, timestamp)?;
        let result = engine.evaluate(&sample, &profile);
        tally[tier_slot(result.tier)] += 1;

        let vitals = sample.vitals();
        println!(
            "[{}] {} | {:.1} m from home | {} bpm | {} steps | battery {}%",
            result.tier.label(),
            result.summary(),
            result.distance_from_home_meters,
            vitals.heart_rate_bpm(),
            vitals.steps_since_last_sample(),
            sample.battery_level_percent()
        );
    }

    println!(
        "\nTotals: {} SAFE | {} CAUTION | {} CRITICAL",
        tally[0], tally[1], tally[2]
    );
    Ok(())
}

fn tier_slot(tier: RiskTier) -> usize {
    match tier {
        RiskTier::Safe => 0,
        RiskTier::Caution => 1,
        RiskTier::Critical => 2,
    }
}
