//! Per-layer render-sync orchestration.
//!
//! `DensityLayer::sync` is invoked on every render tick. It decides whether
//! the tick needs a fetch at all, runs the fetch pipeline (schema lookup →
//! query build → execution → transform → normalize), and pushes accepted
//! results to the map renderer. A failed or superseded fetch never disturbs
//! previously rendered geometry.

use std::sync::Arc;

use map_common::{FeatureCollection, GeoExtent, LayerDescriptor, LayerId};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::{LayerSyncError, Result};
use crate::lifecycle::{
    FetchAttempt, FetchOutcome, RequestInspector, RequestLifecycle, RequestStats,
};
use crate::normalize::normalize_weights;
use crate::precision::precision_for_zoom;
use crate::query::{AggregationQueryBuilder, MetricSpec, QueryExecutor};
use crate::refresh::{should_refetch, FetchMetadata, ViewportState};
use crate::render::{LayerStyle, MapRenderer};
use crate::schema::SchemaProvider;
use crate::transform::{transform, AggregationResponse};

/// Owned per-layer sync state.
///
/// Both fields are replaced wholesale when a fetch is accepted and are never
/// mutated in place, so the state machine is inspectable between ticks.
#[derive(Debug, Default)]
pub struct LayerSyncState {
    pub metadata: Option<FetchMetadata>,
    pub geometry: Option<FeatureCollection>,
}

/// Why a sync tick did not fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The layer is not visible.
    Hidden,
    /// The current zoom is outside the layer's configured range.
    OutOfZoomRange,
    /// The map has not produced an extent yet.
    ExtentUnavailable,
}

/// Result of one sync tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// New geometry was fetched, accepted, and handed to the renderer.
    Refreshed { buckets: usize },
    /// The cached geometry already covers the current state; nothing fetched.
    UpToDate,
    /// A guard condition suppressed the fetch.
    Skipped(SkipReason),
    /// The fetch finished after a newer one began; its result was discarded.
    Superseded,
}

/// The collaborators a sync tick runs against.
pub struct SyncContext<'a> {
    pub schema: &'a dyn SchemaProvider,
    pub executor: &'a dyn QueryExecutor,
    pub renderer: &'a mut dyn MapRenderer,
    pub style: &'a dyn LayerStyle,
}

/// A density layer bound to its sync state and request lifecycle.
pub struct DensityLayer {
    descriptor: LayerDescriptor,
    metric: MetricSpec,
    config: SyncConfig,
    lifecycle: RequestLifecycle,
    state: LayerSyncState,
}

impl DensityLayer {
    pub fn new(
        descriptor: LayerDescriptor,
        metric: MetricSpec,
        config: SyncConfig,
        inspector: Arc<dyn RequestInspector>,
    ) -> Self {
        let lifecycle = RequestLifecycle::new(descriptor.id.clone(), inspector);
        Self {
            descriptor,
            metric,
            config,
            lifecycle,
            state: LayerSyncState::default(),
        }
    }

    pub fn id(&self) -> &LayerId {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &LayerDescriptor {
        &self.descriptor
    }

    /// The geometry from the last accepted fetch, if any.
    pub fn cached_geometry(&self) -> Option<&FeatureCollection> {
        self.state.geometry.as_ref()
    }

    /// Metadata of the last accepted fetch, if any.
    pub fn fetch_metadata(&self) -> Option<&FetchMetadata> {
        self.state.metadata.as_ref()
    }

    /// Apply the layer's static rendering setup: visibility, zoom range, and
    /// style paint properties.
    pub fn install(&self, renderer: &mut dyn MapRenderer, style: &dyn LayerStyle) {
        renderer.set_layer_visibility(&self.descriptor.id, self.descriptor.visible);
        renderer.set_layer_zoom_range(
            &self.descriptor.id,
            self.descriptor.zoom_range.min,
            self.descriptor.zoom_range.max,
        );
        for (key, value) in style.paint_properties() {
            renderer.set_layer_paint_property(&self.descriptor.id, &key, value);
        }
    }

    /// Run one sync tick against the current viewport state.
    ///
    /// Errors are the caller's error channel; when `sync` returns an error the
    /// cached geometry and fetch metadata are exactly what they were before
    /// the tick.
    pub async fn sync(
        &mut self,
        view: &ViewportState,
        ctx: &mut SyncContext<'_>,
    ) -> Result<SyncOutcome> {
        if !self.descriptor.visible {
            return Ok(SyncOutcome::Skipped(SkipReason::Hidden));
        }

        if !self.descriptor.zoom_range.contains(view.zoom) {
            return Ok(SyncOutcome::Skipped(SkipReason::OutOfZoomRange));
        }

        let Some(visible_extent) = view.extent else {
            return Ok(SyncOutcome::Skipped(SkipReason::ExtentUnavailable));
        };

        let precision = precision_for_zoom(
            view.zoom,
            ctx.style.precision_refinement(),
            self.config.max_precision,
        );

        if !should_refetch(self.state.metadata.as_ref(), view, &visible_extent, precision) {
            debug!(layer = %self.descriptor.id, "viewport covered by previous fetch");
            return Ok(SyncOutcome::UpToDate);
        }

        let fetch_extent = visible_extent.expanded(self.config.extent_buffer);
        let label = format!("{} density aggregation", self.descriptor.id);
        let mut attempt = self.lifecycle.begin(&label);

        match self
            .run_fetch(view, fetch_extent, precision, &mut attempt, ctx)
            .await
        {
            Ok((response, collection)) => {
                let payload = serde_json::json!({ "buckets": response.bucket_count() });
                match self.lifecycle.complete(&mut attempt, &payload) {
                    FetchOutcome::Superseded => Ok(SyncOutcome::Superseded),
                    FetchOutcome::Accepted => {
                        let buckets = collection.len();
                        self.state.metadata =
                            Some(FetchMetadata::snapshot(view, precision, fetch_extent));
                        ctx.renderer.set_layer_geometry(&self.descriptor.id, &collection);
                        self.state.geometry = Some(collection);

                        info!(
                            layer = %self.descriptor.id,
                            buckets,
                            precision,
                            "layer geometry refreshed"
                        );
                        Ok(SyncOutcome::Refreshed { buckets })
                    }
                }
            }
            Err(err) => {
                warn!(
                    layer = %self.descriptor.id,
                    error = %err,
                    "fetch failed; previous geometry retained"
                );
                match self.lifecycle.fail(&mut attempt, &err.to_string()) {
                    FetchOutcome::Superseded => Ok(SyncOutcome::Superseded),
                    FetchOutcome::Accepted => Err(err),
                }
            }
        }
    }

    /// The fetch pipeline: schema lookup, query construction, execution, and
    /// the transform + normalization passes.
    ///
    /// Transform failures are not caught separately; a malformed response
    /// fails the whole fetch and is reported like any other error.
    async fn run_fetch(
        &self,
        view: &ViewportState,
        fetch_extent: GeoExtent,
        precision: u8,
        attempt: &mut FetchAttempt,
        ctx: &mut SyncContext<'_>,
    ) -> Result<(AggregationResponse, FeatureCollection)> {
        let source_id = &self.descriptor.source.data_source_id;
        let source = ctx
            .schema
            .data_source(source_id)
            .await
            .map_err(|err| self.stage_error("data source lookup", err))?;

        let query = AggregationQueryBuilder::new(
            &source,
            self.descriptor.source.geo_field.as_str(),
            precision,
        )
        .metric(self.metric.clone())?
        .extent(fetch_extent)
        .time_range(view.time_range.clone())
        .build()
        .map_err(|err| self.stage_error("query construction", err))?;

        attempt.record.record_body(&query.to_request_body());

        let response = ctx
            .executor
            .execute(&query)
            .await
            .map_err(|err| self.stage_error("query execution", err))?;

        attempt.record.record_stats(RequestStats {
            source: Some(source.title.clone()),
            buckets: Some(response.bucket_count()),
            took_ms: response.took,
        });

        let mut collection = transform(&query, &response)?;
        normalize_weights(&mut collection, ctx.style.weight_source());

        Ok((response, collection))
    }

    /// Wrap a collaborator failure with the stage it happened in, preserving
    /// the error variant.
    fn stage_error(&self, stage: &str, err: LayerSyncError) -> LayerSyncError {
        let message = format!("{} failed for layer '{}': {}", stage, self.descriptor.id, err);
        match err {
            LayerSyncError::NotFound(_) => LayerSyncError::NotFound(message),
            LayerSyncError::Schema(_) => LayerSyncError::Schema(message),
            LayerSyncError::InvalidQuery(_) => LayerSyncError::InvalidQuery(message),
            LayerSyncError::Backend(_) => LayerSyncError::Backend(message),
            LayerSyncError::MalformedResponse(_) => LayerSyncError::MalformedResponse(message),
            LayerSyncError::Config(_) => LayerSyncError::Config(message),
        }
    }
}
