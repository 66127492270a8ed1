//! Weight normalization for density rendering.

use map_common::FeatureCollection;
use serde::{Deserialize, Serialize};

/// Which bucket property drives rendering intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSource {
    /// Weight by document count.
    DocCount,
    /// Weight by the metric value.
    Metric,
}

impl WeightSource {
    fn value_of(&self, properties: &map_common::GridCellProperties) -> f64 {
        match self {
            WeightSource::DocCount => properties.doc_count as f64,
            WeightSource::Metric => properties.value,
        }
    }
}

/// Set every feature's `weight` to its source value divided by the collection
/// maximum.
///
/// The maximum has a floor of zero, and an all-zero (or empty) collection
/// yields weights of exactly 0.0 rather than dividing by zero. Scaling is
/// monotonic: a larger source value never gets a smaller weight.
pub fn normalize_weights(collection: &mut FeatureCollection, source: WeightSource) {
    let max = collection
        .features
        .iter()
        .map(|f| source.value_of(&f.properties))
        .fold(0.0_f64, f64::max);

    for feature in &mut collection.features {
        feature.properties.weight = if max > 0.0 {
            source.value_of(&feature.properties) / max
        } else {
            0.0
        };
    }
}
