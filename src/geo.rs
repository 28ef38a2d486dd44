//! Distance metrics over latitude/longitude pairs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// How "nearest" is measured by the facility index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Euclidean distance over raw `(lat, lon)` degrees. Only sensible for
    /// small extents away from the poles and the antimeridian.
    #[default]
    Planar,
    /// Great-circle distance on a spherical Earth.
    Geodesic,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Planar => write!(f, "planar"),
            DistanceMetric::Geodesic => write!(f, "geodesic"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planar" | "euclidean" => Ok(DistanceMetric::Planar),
            "geodesic" | "haversine" => Ok(DistanceMetric::Geodesic),
            other => Err(format!("unknown distance metric '{other}'")),
        }
    }
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// Point on the unit sphere for `(lat, lon)` in degrees.
///
/// Chord length between two such vectors grows monotonically with their
/// great-circle distance, so a Euclidean nearest-neighbor query over these
/// vectors is a geodesic nearest-neighbor query.
pub fn unit_vector(lat: f64, lon: f64) -> [f64; 3] {
    let (phi, lambda) = (lat.to_radians(), lon.to_radians());
    [phi.cos() * lambda.cos(), phi.cos() * lambda.sin(), phi.sin()]
}

/// Checks that a coordinate pair lies on the globe.
pub fn check_range(lat: f64, lon: f64) -> Result<(), String> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(format!("coordinates ({lat}, {lon}) must be finite"));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} is outside [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} is outside [-180, 180]"));
    }
    Ok(())
}
