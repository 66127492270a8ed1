//! Common types shared across the density-map workspace.

pub mod extent;
pub mod feature;
pub mod layer;
pub mod time;

pub use extent::GeoExtent;
pub use feature::{Feature, FeatureCollection, Geometry, GridCellProperties};
pub use layer::{LayerDescriptor, LayerId, LayerType, ZoomRange};
pub use time::{TimeExpr, TimeRange};
