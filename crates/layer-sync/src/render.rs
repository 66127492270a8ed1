//! Map-rendering and style collaborator contracts.

use map_common::{FeatureCollection, LayerId};

use crate::normalize::WeightSource;

/// The map-rendering collaborator.
///
/// Consumed, never implemented, by this crate (tests use recording doubles).
pub trait MapRenderer {
    /// Replace a layer's geometry source.
    fn set_layer_geometry(&mut self, layer: &LayerId, collection: &FeatureCollection);

    fn set_layer_visibility(&mut self, layer: &LayerId, visible: bool);

    fn set_layer_zoom_range(&mut self, layer: &LayerId, min: f64, max: f64);

    fn set_layer_paint_property(&mut self, layer: &LayerId, key: &str, value: serde_json::Value);
}

/// Style collaborator for density layers.
///
/// The precision refinement and the weight source both feed the pipeline as
/// explicit values; nothing downstream reads the style object directly.
pub trait LayerStyle {
    /// Small offset added to the zoom-derived grid precision.
    fn precision_refinement(&self) -> i8;

    /// Which bucket property drives rendering intensity.
    fn weight_source(&self) -> WeightSource;

    /// Paint properties to apply to the rendered layer, keyed by paint
    /// property name.
    fn paint_properties(&self) -> Vec<(String, serde_json::Value)>;
}

/// Stock heatmap style: intensity driven by the normalized weight property.
#[derive(Debug, Clone)]
pub struct HeatmapStyle {
    pub refinement: i8,
    pub source: WeightSource,
    /// Overall intensity multiplier.
    pub intensity: f64,
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self {
            refinement: 0,
            source: WeightSource::DocCount,
            intensity: 1.0,
        }
    }
}

impl LayerStyle for HeatmapStyle {
    fn precision_refinement(&self) -> i8 {
        self.refinement
    }

    fn weight_source(&self) -> WeightSource {
        self.source
    }

    fn paint_properties(&self) -> Vec<(String, serde_json::Value)> {
        vec![
            (
                "heatmap-weight".to_string(),
                serde_json::json!(["get", "weight"]),
            ),
            (
                "heatmap-intensity".to_string(),
                serde_json::json!(self.intensity),
            ),
        ]
    }
}
