//! Geographic extent types and operations.

use serde::{Deserialize, Serialize};

/// An axis-aligned geographic rectangle in degrees (EPSG:4326).
///
/// Used both as a query filter (only documents inside the extent are
/// aggregated) and as a staleness signal (a viewport that has left the last
/// fetched extent forces a re-fetch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoExtent {
    /// Create an extent from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// The full world extent.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if this extent intersects another.
    pub fn intersects(&self, other: &GeoExtent) -> bool {
        self.min_lon < other.max_lon
            && self.max_lon > other.min_lon
            && self.min_lat < other.max_lat
            && self.max_lat > other.min_lat
    }

    /// Check if a point is contained within this extent.
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Check if another extent lies entirely inside this one.
    pub fn contains(&self, other: &GeoExtent) -> bool {
        other.min_lon >= self.min_lon
            && other.max_lon <= self.max_lon
            && other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
    }

    /// Expand the extent by a fraction of its own size on every side,
    /// clamped to world bounds.
    ///
    /// `factor` is per-side: 0.5 grows a 10-degree-wide extent to 20 degrees.
    pub fn expanded(&self, factor: f64) -> GeoExtent {
        let pad_lon = self.width() * factor;
        let pad_lat = self.height() * factor;

        GeoExtent {
            min_lon: (self.min_lon - pad_lon).max(-180.0),
            min_lat: (self.min_lat - pad_lat).max(-90.0),
            max_lon: (self.max_lon + pad_lon).min(180.0),
            max_lat: (self.max_lat + pad_lat).min(90.0),
        }
    }

    /// Center point as (lon, lat).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}
