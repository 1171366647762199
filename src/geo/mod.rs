//! Geographic value types.
//!
//! # Responsibilities
//! - Validated search areas (center + radius)
//! - Great-circle distance (haversine)
//! - Canonical cache keys that absorb floating-point jitter

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Decimal places kept when canonicalizing coordinates for cache keys.
pub const KEY_PRECISION: i32 = 5;

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Reasons a search area is rejected at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidArea {
    #[error("radius_km must be a finite number greater than 0 (got {0})")]
    Radius(f64),

    #[error("latitude must be within [-90, 90] (got {0})")]
    Latitude(f64),

    #[error("longitude must be within [-180, 180] (got {0})")]
    Longitude(f64),
}

/// Wire shape of a search area before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchAreaRequest {
    pub center: Location,
    pub radius_km: f64,
}

/// A validated circular search area. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SearchAreaRequest")]
pub struct SearchArea {
    center: Location,
    radius_km: f64,
}

impl SearchArea {
    pub fn new(lat: f64, lon: f64, radius_km: f64) -> Result<Self, InvalidArea> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(InvalidArea::Radius(radius_km));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidArea::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InvalidArea::Longitude(lon));
        }
        Ok(Self {
            center: Location { lat, lon },
            radius_km,
        })
    }

    pub fn center(&self) -> Location {
        self.center
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Radius truncated to whole meters, as sent upstream.
    pub fn radius_m(&self) -> u64 {
        (self.radius_km * 1000.0) as u64
    }

    /// True if `point` lies within the radius by great-circle distance.
    pub fn contains(&self, point: Location) -> bool {
        haversine_km(self.center, point) <= self.radius_km
    }

    pub fn cache_key(&self) -> AreaKey {
        AreaKey::from(self)
    }
}

impl TryFrom<SearchAreaRequest> for SearchArea {
    type Error = InvalidArea;

    fn try_from(req: SearchAreaRequest) -> Result<Self, Self::Error> {
        Self::new(req.center.lat, req.center.lon, req.radius_km)
    }
}

/// Canonical cache key for a search area.
///
/// Coordinates are rounded to [`KEY_PRECISION`] decimal places and stored as
/// scaled integers; the radius is kept exactly (by bit pattern).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaKey {
    lat_scaled: i64,
    lon_scaled: i64,
    radius_bits: u64,
}

impl From<&SearchArea> for AreaKey {
    fn from(area: &SearchArea) -> Self {
        let scale = 10f64.powi(KEY_PRECISION);
        Self {
            lat_scaled: (area.center.lat * scale).round() as i64,
            lon_scaled: (area.center.lon * scale).round() as i64,
            radius_bits: area.radius_km.to_bits(),
        }
    }
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(a: Location, b: Location) -> f64 {
    let lat1 = a.lat.to_radians();
    let lon1 = a.lon.to_radians();
    let lat2 = b.lat.to_radians();
    let lon2 = b.lon.to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
