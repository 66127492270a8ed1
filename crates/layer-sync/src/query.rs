//! Aggregation query construction.
//!
//! A query always carries exactly one metric aggregation and one grid bucket
//! aggregation. Multi-metric configurations are rejected at the builder
//! boundary; rendering one weight per cell is all the pipeline supports.

use async_trait::async_trait;
use map_common::{GeoExtent, TimeRange};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{LayerSyncError, Result};
use crate::schema::{DataSource, FieldType};
use crate::transform::AggregationResponse;

/// The metric computed per grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "agg")]
pub enum MetricSpec {
    /// Document count; needs no field.
    Count,
    Avg { field: String },
    Sum { field: String },
    Min { field: String },
    Max { field: String },
    Cardinality { field: String },
    TopHits { field: String, size: usize },
}

impl MetricSpec {
    /// The field this metric reads, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            MetricSpec::Count => None,
            MetricSpec::Avg { field }
            | MetricSpec::Sum { field }
            | MetricSpec::Min { field }
            | MetricSpec::Max { field }
            | MetricSpec::Cardinality { field }
            | MetricSpec::TopHits { field, .. } => Some(field),
        }
    }

    fn validate_against(&self, source: &DataSource) -> Result<()> {
        let Some(field_name) = self.field() else {
            return Ok(());
        };

        let info = source.field(field_name).ok_or_else(|| {
            LayerSyncError::not_found(format!(
                "metric field '{}' does not exist on '{}'",
                field_name, source.title
            ))
        })?;

        let ok = match self {
            MetricSpec::Avg { .. }
            | MetricSpec::Sum { .. }
            | MetricSpec::Min { .. }
            | MetricSpec::Max { .. } => info.field_type == FieldType::Number,
            MetricSpec::Cardinality { .. } => {
                matches!(info.field_type, FieldType::Number | FieldType::Keyword)
            }
            MetricSpec::Count | MetricSpec::TopHits { .. } => true,
        };

        if !ok {
            return Err(LayerSyncError::schema(format!(
                "metric field '{}' on '{}' has type {:?}, expected a numeric field",
                field_name, source.title, info.field_type
            )));
        }

        Ok(())
    }

    fn to_agg_body(&self) -> Option<serde_json::Value> {
        match self {
            MetricSpec::Count => None,
            MetricSpec::Avg { field } => Some(json!({ "avg": { "field": field } })),
            MetricSpec::Sum { field } => Some(json!({ "sum": { "field": field } })),
            MetricSpec::Min { field } => Some(json!({ "min": { "field": field } })),
            MetricSpec::Max { field } => Some(json!({ "max": { "field": field } })),
            MetricSpec::Cardinality { field } => {
                Some(json!({ "cardinality": { "field": field } }))
            }
            MetricSpec::TopHits { field, size } => Some(json!({
                "top_hits": { "size": size, "_source": { "includes": [field] } }
            })),
        }
    }
}

impl Default for MetricSpec {
    fn default() -> Self {
        Self::Count
    }
}

/// The grid bucket aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridBucketSpec {
    /// Geo-point field the grid buckets on.
    pub field: String,

    /// Grid precision; caller-controlled so it stays in lockstep with
    /// render-time weight scaling. Auto precision is never enabled.
    pub precision: u8,

    /// The extent filter is applied at the query level, so the aggregation
    /// itself must not additionally clip to a viewport collar.
    pub collar_filtered: bool,

    /// Place buckets at their document centroid instead of the cell center.
    pub use_centroid: bool,
}

/// Spatial filter over the fetched extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtentFilter {
    pub field: String,
    pub extent: GeoExtent,
}

/// Temporal filter over the active time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub field: String,
    pub range: TimeRange,
}

/// An immutable aggregation request: one metric, one grid bucket, and the two
/// mandatory ANDed filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationQuery {
    pub metric: MetricSpec,
    pub grid: GridBucketSpec,
    pub extent_filter: ExtentFilter,
    pub time_filter: TimeFilter,
}

impl AggregationQuery {
    /// Render the backend request body.
    pub fn to_request_body(&self) -> serde_json::Value {
        let extent = &self.extent_filter.extent;

        let mut grid_aggs = serde_json::Map::new();
        if self.grid.use_centroid {
            grid_aggs.insert(
                "centroid".to_string(),
                json!({ "geo_centroid": { "field": self.grid.field } }),
            );
        }
        if let Some(metric_body) = self.metric.to_agg_body() {
            grid_aggs.insert("metric".to_string(), metric_body);
        }

        let mut grid = json!({
            "geohash_grid": {
                "field": self.grid.field,
                "precision": self.grid.precision,
            }
        });
        if !grid_aggs.is_empty() {
            grid["aggs"] = serde_json::Value::Object(grid_aggs);
        }

        // Filter keys are field names, which json! cannot express directly.
        let mut geo_bounds = serde_json::Map::new();
        geo_bounds.insert(
            self.extent_filter.field.clone(),
            json!({
                "top_left": { "lat": extent.max_lat, "lon": extent.min_lon },
                "bottom_right": { "lat": extent.min_lat, "lon": extent.max_lon },
            }),
        );

        let mut time_bounds = serde_json::Map::new();
        time_bounds.insert(
            self.time_filter.field.clone(),
            json!({
                "gte": self.time_filter.range.from.to_query_value(),
                "lte": self.time_filter.range.to.to_query_value(),
            }),
        );

        json!({
            "size": 0,
            "query": {
                "bool": {
                    "filter": [
                        { "geo_bounding_box": geo_bounds },
                        { "range": time_bounds }
                    ]
                }
            },
            "aggs": { "grid": grid }
        })
    }
}

/// Builds an [`AggregationQuery`] validated against a data source's schema.
///
/// # Examples
///
/// ```rust
/// use layer_sync::query::{AggregationQueryBuilder, MetricSpec};
/// # use layer_sync::schema::{DataSource, FieldInfo, FieldType};
/// # use map_common::{GeoExtent, TimeRange};
/// # use std::collections::HashMap;
/// # let mut fields = HashMap::new();
/// # fields.insert("location".to_string(), FieldInfo::new(FieldType::GeoPoint, "Location"));
/// # fields.insert("bytes".to_string(), FieldInfo::new(FieldType::Number, "Bytes"));
/// # let source = DataSource {
/// #     id: "logs".into(), title: "Logs".into(), fields,
/// #     time_field: Some("timestamp".into()),
/// # };
/// let query = AggregationQueryBuilder::new(&source, "location", 4)
///     .metric(MetricSpec::Sum { field: "bytes".into() })?
///     .extent(GeoExtent::new(-10.0, -10.0, 10.0, 10.0))
///     .time_range(TimeRange::relative("now-15m", "now"))
///     .build()?;
///
/// assert_eq!(query.grid.precision, 4);
/// # Ok::<(), layer_sync::LayerSyncError>(())
/// ```
#[derive(Debug)]
pub struct AggregationQueryBuilder<'a> {
    source: &'a DataSource,
    geo_field: String,
    precision: u8,
    metric: Option<MetricSpec>,
    extent: Option<GeoExtent>,
    time_range: Option<TimeRange>,
}

impl<'a> AggregationQueryBuilder<'a> {
    pub fn new(source: &'a DataSource, geo_field: impl Into<String>, precision: u8) -> Self {
        Self {
            source,
            geo_field: geo_field.into(),
            precision,
            metric: None,
            extent: None,
            time_range: None,
        }
    }

    /// Set the metric aggregation.
    ///
    /// Only a single metric is supported; a second call is rejected rather
    /// than silently mis-rendering one of the two.
    pub fn metric(mut self, metric: MetricSpec) -> Result<Self> {
        if self.metric.is_some() {
            return Err(LayerSyncError::InvalidQuery(
                "only a single metric aggregation is supported".to_string(),
            ));
        }
        self.metric = Some(metric);
        Ok(self)
    }

    /// Set the spatial extent filter.
    pub fn extent(mut self, extent: GeoExtent) -> Self {
        self.extent = Some(extent);
        self
    }

    /// Set the time filter range.
    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Validate against the source schema and produce the query.
    pub fn build(self) -> Result<AggregationQuery> {
        let geo_info = self.source.field(&self.geo_field).ok_or_else(|| {
            LayerSyncError::schema(format!(
                "geo field '{}' does not exist on '{}'",
                self.geo_field, self.source.title
            ))
        })?;

        if geo_info.field_type != FieldType::GeoPoint {
            return Err(LayerSyncError::schema(format!(
                "field '{}' on '{}' has type {:?}, expected geo_point",
                self.geo_field, self.source.title, geo_info.field_type
            )));
        }

        let metric = self.metric.unwrap_or_default();
        metric.validate_against(self.source)?;

        let extent = self.extent.ok_or_else(|| {
            LayerSyncError::InvalidQuery("an extent filter is mandatory".to_string())
        })?;

        let time_range = self.time_range.ok_or_else(|| {
            LayerSyncError::InvalidQuery("a time filter is mandatory".to_string())
        })?;

        let time_field = self.source.time_field.clone().ok_or_else(|| {
            LayerSyncError::schema(format!(
                "data source '{}' has no time field configured",
                self.source.title
            ))
        })?;

        Ok(AggregationQuery {
            metric,
            grid: GridBucketSpec {
                field: self.geo_field.clone(),
                precision: self.precision,
                collar_filtered: false,
                use_centroid: true,
            },
            extent_filter: ExtentFilter {
                field: self.geo_field,
                extent,
            },
            time_filter: TimeFilter {
                field: time_field,
                range: time_range,
            },
        })
    }
}

/// Collaborator that executes an aggregation query against the backend.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &AggregationQuery) -> Result<AggregationResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldInfo;
    use std::collections::HashMap;

    fn source() -> DataSource {
        let mut fields = HashMap::new();
        fields.insert(
            "location".to_string(),
            FieldInfo::new(FieldType::GeoPoint, "Location"),
        );
        fields.insert(
            "bytes".to_string(),
            FieldInfo::new(FieldType::Number, "Bytes"),
        );
        fields.insert(
            "agent".to_string(),
            FieldInfo::new(FieldType::Keyword, "Agent"),
        );

        DataSource {
            id: "logs".to_string(),
            title: "Logs".to_string(),
            fields,
            time_field: Some("timestamp".to_string()),
        }
    }

    fn builder(src: &DataSource) -> AggregationQueryBuilder<'_> {
        AggregationQueryBuilder::new(src, "location", 4)
            .extent(GeoExtent::new(-10.0, -10.0, 10.0, 10.0))
            .time_range(TimeRange::relative("now-15m", "now"))
    }

    #[test]
    fn test_default_metric_is_count() {
        let src = source();
        let query = builder(&src).build().unwrap();
        assert_eq!(query.metric, MetricSpec::Count);
    }

    #[test]
    fn test_grid_bucket_settings() {
        let src = source();
        let query = builder(&src).build().unwrap();

        assert_eq!(query.grid.precision, 4);
        assert!(!query.grid.collar_filtered);
        assert!(query.grid.use_centroid);
    }

    #[test]
    fn test_second_metric_rejected() {
        let src = source();
        let result = AggregationQueryBuilder::new(&src, "location", 4)
            .metric(MetricSpec::Sum {
                field: "bytes".to_string(),
            })
            .unwrap()
            .metric(MetricSpec::Count);

        assert!(matches!(result, Err(LayerSyncError::InvalidQuery(_))));
    }

    #[test]
    fn test_missing_geo_field_is_schema_error() {
        let src = source();
        let result = AggregationQueryBuilder::new(&src, "nope", 4)
            .extent(GeoExtent::world())
            .time_range(TimeRange::relative("now-15m", "now"))
            .build();

        match result {
            Err(LayerSyncError::Schema(msg)) => assert!(msg.contains("nope")),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_geo_field_is_schema_error() {
        let src = source();
        let result = AggregationQueryBuilder::new(&src, "bytes", 4)
            .extent(GeoExtent::world())
            .time_range(TimeRange::relative("now-15m", "now"))
            .build();

        assert!(matches!(result, Err(LayerSyncError::Schema(_))));
    }

    #[test]
    fn test_metric_field_type_checked() {
        let src = source();
        let result = builder(&src)
            .metric(MetricSpec::Avg {
                field: "agent".to_string(),
            })
            .unwrap()
            .build();
        assert!(matches!(result, Err(LayerSyncError::Schema(_))));

        let query = builder(&src)
            .metric(MetricSpec::Cardinality {
                field: "agent".to_string(),
            })
            .unwrap()
            .build();
        assert!(query.is_ok());
    }

    #[test]
    fn test_missing_metric_field_is_not_found() {
        let src = source();
        let result = builder(&src)
            .metric(MetricSpec::Sum {
                field: "ghost".to_string(),
            })
            .unwrap()
            .build();

        assert!(matches!(result, Err(LayerSyncError::NotFound(_))));
    }

    #[test]
    fn test_filters_are_mandatory() {
        let src = source();

        let no_extent = AggregationQueryBuilder::new(&src, "location", 4)
            .time_range(TimeRange::relative("now-15m", "now"))
            .build();
        assert!(matches!(no_extent, Err(LayerSyncError::InvalidQuery(_))));

        let no_time = AggregationQueryBuilder::new(&src, "location", 4)
            .extent(GeoExtent::world())
            .build();
        assert!(matches!(no_time, Err(LayerSyncError::InvalidQuery(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let src = source();
        let query = builder(&src)
            .metric(MetricSpec::Sum {
                field: "bytes".to_string(),
            })
            .unwrap()
            .build()
            .unwrap();

        let body = query.to_request_body();

        assert_eq!(body["size"], 0);

        let filters = body["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters[0]["geo_bounding_box"]["location"]["top_left"]["lat"],
            10.0
        );
        assert_eq!(filters[1]["range"]["timestamp"]["gte"], "now-15m");

        let grid = &body["aggs"]["grid"];
        assert_eq!(grid["geohash_grid"]["field"], "location");
        assert_eq!(grid["geohash_grid"]["precision"], 4);
        assert_eq!(grid["aggs"]["centroid"]["geo_centroid"]["field"], "location");
        assert_eq!(grid["aggs"]["metric"]["sum"]["field"], "bytes");
    }

    #[test]
    fn test_count_metric_has_no_sub_aggregation() {
        let src = source();
        let query = builder(&src).build().unwrap();
        let body = query.to_request_body();

        assert!(body["aggs"]["grid"]["aggs"]["metric"].is_null());
        // Centroid placement is still requested.
        assert!(!body["aggs"]["grid"]["aggs"]["centroid"].is_null());
    }
}
