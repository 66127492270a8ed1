//! Viewport-driven synchronization of geospatial aggregation layers.
//!
//! Each density layer renders grid-cell aggregation results from a search
//! backend. As the user pans, zooms, or changes the time range, the layer
//! decides whether a re-fetch is needed, builds and runs the aggregation
//! query, and converts the bucketed response into weight-normalized point
//! geometry for the map renderer:
//!
//! ```text
//! ViewportState
//!      │
//!      ▼
//! should_refetch ──(no)──► cached FeatureCollection reused
//!      │
//!    (yes)
//!      ▼
//! RequestLifecycle::begin ──► AggregationQueryBuilder ──► QueryExecutor
//!                                                             │
//!      stale token? discard ◄── token check ◄── response ◄────┘
//!      │
//!   (current)
//!      ▼
//! transform ──► normalize_weights ──► MapRenderer::set_layer_geometry
//! ```
//!
//! Pure computation (precision mapping, refresh decision, transform,
//! normalization) is synchronous; only schema lookups and query execution
//! suspend. A superseded fetch's in-flight call is never cancelled; its
//! result is discarded by token comparison when it lands.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod normalize;
pub mod precision;
pub mod query;
pub mod refresh;
pub mod render;
pub mod schema;
pub mod sync;
pub mod transform;

// Re-export commonly used types at crate root
pub use config::SyncConfig;
pub use error::{LayerSyncError, Result};
pub use lifecycle::{
    FetchAttempt, FetchOutcome, FetchToken, NoopInspector, RequestInspector, RequestLifecycle,
    RequestRecord, RequestStats,
};
pub use normalize::{normalize_weights, WeightSource};
pub use precision::{precision_for_zoom, MAX_PRECISION, MIN_PRECISION};
pub use query::{AggregationQuery, AggregationQueryBuilder, MetricSpec, QueryExecutor};
pub use refresh::{should_refetch, FetchMetadata, ViewportState};
pub use render::{HeatmapStyle, LayerStyle, MapRenderer};
pub use schema::{DataSource, FieldInfo, FieldType, SchemaProvider};
pub use sync::{DensityLayer, LayerSyncState, SkipReason, SyncContext, SyncOutcome};
pub use transform::{decode_cell_center, tabify, transform, AggregationResponse};
