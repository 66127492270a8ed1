//! GeoJSON-shaped geometry produced by the aggregation pipeline.
//!
//! One `Feature` per aggregation bucket, carrying the bucket's document count
//! and metric value. The `weight` property is filled in by the normalization
//! pass and is what density rendering maps to visual intensity.

use serde::{Deserialize, Serialize};

/// An ordered collection of features.
///
/// Order is insertion order from the backend response; it carries no meaning
/// but is preserved so downstream output is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A single aggregation bucket as renderable geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    pub geometry: Geometry,

    pub properties: GridCellProperties,
}

impl Feature {
    /// Create a point feature at (lon, lat).
    pub fn point(lon: f64, lat: f64, properties: GridCellProperties) -> Self {
        Self {
            type_: "Feature".to_string(),
            geometry: Geometry::point(lon, lat),
            properties,
        }
    }
}

/// Geometry of a feature. The aggregation pipeline only emits points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: [f64; 2],
    },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }
}

/// Properties of one grid-cell feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridCellProperties {
    /// Grid cell identifier from the bucket key.
    pub cell: String,

    /// Number of documents aggregated into this cell.
    pub doc_count: u64,

    /// Raw metric value of the bucket, unmodified.
    pub value: f64,

    /// Metric value scaled by the collection maximum, in [0, 1].
    /// Zero until the normalization pass runs.
    #[serde(default)]
    pub weight: f64,
}

impl GridCellProperties {
    pub fn new(cell: impl Into<String>, doc_count: u64, value: f64) -> Self {
        Self {
            cell: cell.into(),
            doc_count,
            value,
            weight: 0.0,
        }
    }
}
