//! # Complaint Location
//!
//! Every complaint carries a location. Coordinates or address missing at
//! intake are filled with fixed defaults (New Delhi city centre and a
//! placeholder address).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longitude used when the citizen supplies none.
pub const DEFAULT_LONGITUDE: f64 = 77.2090;
/// Latitude used when the citizen supplies none.
pub const DEFAULT_LATITUDE: f64 = 28.6139;
/// Address used when the citizen supplies none.
pub const DEFAULT_ADDRESS: &str = "Location not provided";

/// Mean Earth radius (IUGG) in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS84 point with a free-text address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    pub address: String,
}

impl Location {
    /// Build a location from optional intake values, applying defaults.
    ///
    /// Blank addresses count as missing.
    pub fn resolve(
        longitude: Option<f64>,
        latitude: Option<f64>,
        address: Option<String>,
    ) -> Result<Self, ValidationError> {
        let longitude = longitude.unwrap_or(DEFAULT_LONGITUDE);
        let latitude = latitude.unwrap_or(DEFAULT_LATITUDE);
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        let address = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
        Ok(Self {
            longitude,
            latitude,
            address,
        })
    }

    /// Great-circle (haversine) distance in kilometres to the given point.
    pub fn distance_km(&self, longitude: f64, latitude: f64) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            longitude: DEFAULT_LONGITUDE,
            latitude: DEFAULT_LATITUDE,
            address: DEFAULT_ADDRESS.to_string(),
        }
    }
}
