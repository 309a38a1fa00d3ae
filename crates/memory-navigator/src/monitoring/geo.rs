//! Distance between two coordinates at geofence scale.
//!
//! The default model is a planar equirectangular approximation: the longitude delta is
//! scaled by the cosine of the mean latitude, both axes are converted with a flat
//! 111,000 m/° factor, and the Euclidean norm of the two offsets is returned. Below 2 km it
//! agrees with haversine to well under 1%, so either model can back a deployment as long as
//! only one is used.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::{Coordinate, ValidationError};

pub const METERS_PER_DEGREE: f64 = 111_000.0;
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceModel {
    #[default]
    Equirectangular,
    Haversine,
}

impl DistanceModel {
    pub fn distance_meters(&self, a: Coordinate, b: Coordinate) -> f64 {
        match self {
            DistanceModel::Equirectangular => equirectangular_meters(a, b),
            DistanceModel::Haversine => haversine_meters(a, b),
        }
    }
}

impl FromStr for DistanceModel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "equirectangular" | "planar" => Ok(Self::Equirectangular),
            "haversine" | "great_circle" => Ok(Self::Haversine),
            other => Err(format!("unknown distance model '{other}'")),
        }
    }
}

pub fn equirectangular_meters(a: Coordinate, b: Coordinate) -> f64 {
    let mean_latitude = ((a.latitude() + b.latitude()) / 2.0).to_radians();
    let delta_lat = b.latitude() - a.latitude();
    let delta_lon = wrap_longitude(b.longitude() - a.longitude()) * mean_latitude.cos();

    let north = delta_lat * METERS_PER_DEGREE;
    let east = delta_lon * METERS_PER_DEGREE;
    north.hypot(east)
}

pub fn haversine_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let dlat = lat2 - lat1;
    let dlon = wrap_longitude(b.longitude() - a.longitude()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `h` a hair past 1.0 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_METERS * c
}

/// Move `origin` by planar meter offsets, inverting the equirectangular projection.
///
/// Latitude saturates at the poles. Non-finite offsets are rejected.
pub fn offset_by_meters(
    origin: Coordinate,
    north_meters: f64,
    east_meters: f64,
) -> Result<Coordinate, ValidationError> {
    let latitude = (origin.latitude() + north_meters / METERS_PER_DEGREE).clamp(-90.0, 90.0);
    let mean_latitude = ((origin.latitude() + latitude) / 2.0).to_radians();
    let scale = mean_latitude.cos().max(1e-9);
    let longitude = wrap_longitude(origin.longitude() + east_meters / (METERS_PER_DEGREE * scale));

    Coordinate::new(latitude, longitude)
}

fn wrap_longitude(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && degrees > 0.0 {
        180.0
    } else {
        wrapped
    }
}
