//! Layer identity and the persisted layer descriptor.

use serde::{Deserialize, Serialize};

/// Unique identifier for a map layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of layer a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    /// Aggregated grid-cell density rendered as a heatmap.
    Density,
}

/// Zoom interval within which a layer is rendered and synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, zoom: f64) -> bool {
        zoom >= self.min && zoom <= self.max
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 24.0,
        }
    }
}

/// Reference to the backing data source of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceRef {
    /// Identifier of the data source in the schema service.
    pub data_source_id: String,

    /// Name of the geo-point field the grid aggregation buckets on.
    pub geo_field: String,
}

/// The durable description of a layer.
///
/// This is the only state that survives a restart; fetch metadata and cached
/// geometry are rebuilt from scratch by the first sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescriptor {
    pub id: LayerId,

    #[serde(rename = "type")]
    pub layer_type: LayerType,

    pub source: DataSourceRef,

    /// Name of the style this layer renders with.
    pub style: String,

    pub zoom_range: ZoomRange,

    pub visible: bool,
}

impl LayerDescriptor {
    /// A visible density layer over the given source, with default zoom range.
    pub fn density(
        id: impl Into<String>,
        data_source_id: impl Into<String>,
        geo_field: impl Into<String>,
    ) -> Self {
        Self {
            id: LayerId::new(id),
            layer_type: LayerType::Density,
            source: DataSourceRef {
                data_source_id: data_source_id.into(),
                geo_field: geo_field.into(),
            },
            style: "heatmap".to_string(),
            zoom_range: ZoomRange::default(),
            visible: true,
        }
    }
}
