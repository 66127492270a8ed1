//! Transformation of raw aggregation responses into point geometry.
//!
//! The nested bucket response is first tabified into flat rows, then each row
//! becomes one Point feature carrying the bucket's document count and metric
//! value. Response order is preserved and zero-document buckets are kept.

use map_common::{Feature, FeatureCollection, GridCellProperties};
use serde::{Deserialize, Serialize};

use crate::error::{LayerSyncError, Result};
use crate::query::{AggregationQuery, MetricSpec};

/// Raw backend response to an aggregation query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationResponse {
    pub aggregations: Aggregations,

    /// Backend-reported execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub took: Option<u64>,
}

impl AggregationResponse {
    /// Parse a response from its JSON form.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn bucket_count(&self) -> usize {
        self.aggregations.grid.buckets.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregations {
    pub grid: GridBuckets,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridBuckets {
    pub buckets: Vec<RawBucket>,
}

/// One grid-cell bucket as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBucket {
    /// Grid cell identifier (a geohash string).
    pub key: String,

    pub doc_count: u64,

    /// Document centroid, present when the query requested one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<CentroidAgg>,

    /// Metric sub-aggregation result, absent for plain count queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricAgg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidAgg {
    pub location: GeoLocation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

/// A metric value; null when the bucket had no documents with the field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricAgg {
    pub value: Option<f64>,
}

/// One tabified row per bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRow {
    pub cell: String,
    pub lon: f64,
    pub lat: f64,
    pub doc_count: u64,
    pub value: f64,
}

/// Flatten the nested bucket response into rows, in response order.
pub fn tabify(query: &AggregationQuery, response: &AggregationResponse) -> Result<Vec<BucketRow>> {
    response
        .aggregations
        .grid
        .buckets
        .iter()
        .map(|bucket| {
            let (lon, lat) = match (&bucket.centroid, query.grid.use_centroid) {
                (Some(centroid), true) => (centroid.location.lon, centroid.location.lat),
                _ => decode_cell_center(&bucket.key)?,
            };

            let value = match &query.metric {
                MetricSpec::Count => bucket.doc_count as f64,
                // A null metric (empty bucket) contributes zero weight.
                _ => bucket.metric.and_then(|m| m.value).unwrap_or(0.0),
            };

            Ok(BucketRow {
                cell: bucket.key.clone(),
                lon,
                lat,
                doc_count: bucket.doc_count,
                value,
            })
        })
        .collect()
}

/// Turn a raw response into a feature collection, one Point per bucket.
pub fn transform(
    query: &AggregationQuery,
    response: &AggregationResponse,
) -> Result<FeatureCollection> {
    let rows = tabify(query, response)?;

    let mut collection = FeatureCollection::new();
    for row in rows {
        collection.features.push(Feature::point(
            row.lon,
            row.lat,
            GridCellProperties::new(row.cell, row.doc_count, row.value),
        ));
    }

    Ok(collection)
}

const GEOHASH_BASE32: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Decode a geohash cell identifier to its center as (lon, lat).
///
/// Bisects the world rectangle five bits per character, alternating longitude
/// and latitude, starting with longitude.
pub fn decode_cell_center(cell: &str) -> Result<(f64, f64)> {
    if cell.is_empty() {
        return Err(LayerSyncError::malformed("empty grid cell identifier"));
    }

    let (mut lon_min, mut lon_max) = (-180.0_f64, 180.0_f64);
    let (mut lat_min, mut lat_max) = (-90.0_f64, 90.0_f64);
    let mut bisect_lon = true;

    for ch in cell.bytes() {
        let index = GEOHASH_BASE32
            .iter()
            .position(|&c| c == ch.to_ascii_lowercase())
            .ok_or_else(|| {
                LayerSyncError::malformed(format!("invalid grid cell identifier '{}'", cell))
            })?;

        for bit in (0..5).rev() {
            let high = (index >> bit) & 1 == 1;
            if bisect_lon {
                let mid = (lon_min + lon_max) / 2.0;
                if high {
                    lon_min = mid;
                } else {
                    lon_max = mid;
                }
            } else {
                let mid = (lat_min + lat_max) / 2.0;
                if high {
                    lat_min = mid;
                } else {
                    lat_max = mid;
                }
            }
            bisect_lon = !bisect_lon;
        }
    }

    Ok(((lon_min + lon_max) / 2.0, (lat_min + lat_max) / 2.0))
}
