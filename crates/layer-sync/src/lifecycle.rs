//! Fetch lifecycle management: one live request per layer, stale-response
//! protection, and reporting to the request-inspection sink.

use std::sync::Arc;

use map_common::LayerId;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifies one fetch attempt for a layer.
///
/// Tokens are minted from a per-layer monotonic sequence, so "is this the
/// latest attempt" is an integer comparison. A superseded attempt's network
/// call is not cancelled; its result is simply discarded when it lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchToken(u64);

/// Whether a finished fetch may mutate layer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The attempt is the latest; its result owns the layer state.
    Accepted,
    /// A newer attempt began while this one was in flight; discard the result.
    Superseded,
}

/// Response statistics attached to an inspection record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestStats {
    /// Human-readable title of the queried data source.
    pub source: Option<String>,
    /// Number of aggregation buckets returned.
    pub buckets: Option<usize>,
    /// Backend-reported execution time in milliseconds.
    pub took_ms: Option<u64>,
}

/// One request's entry in the inspection sink.
///
/// Purely observational; nothing here affects sync correctness.
pub trait RequestRecord: Send {
    /// Attach the request body that was sent to the backend.
    fn record_body(&mut self, body: &serde_json::Value);

    /// Attach response statistics.
    fn record_stats(&mut self, stats: RequestStats);

    /// Mark the request as succeeded.
    fn ok(&mut self, payload: &serde_json::Value);

    /// Mark the request as failed.
    fn error(&mut self, message: &str);
}

/// External request-inspection sink.
pub trait RequestInspector: Send + Sync {
    /// Discard any prior record for the layer.
    fn reset(&self, layer: &LayerId);

    /// Open a new labeled record for a request.
    fn start(&self, layer: &LayerId, label: &str, request_id: Uuid) -> Box<dyn RequestRecord>;
}

/// Inspector that records nothing.
pub struct NoopInspector;

struct NoopRecord;

impl RequestRecord for NoopRecord {
    fn record_body(&mut self, _body: &serde_json::Value) {}
    fn record_stats(&mut self, _stats: RequestStats) {}
    fn ok(&mut self, _payload: &serde_json::Value) {}
    fn error(&mut self, _message: &str) {}
}

impl RequestInspector for NoopInspector {
    fn reset(&self, _layer: &LayerId) {}

    fn start(&self, _layer: &LayerId, _label: &str, _request_id: Uuid) -> Box<dyn RequestRecord> {
        Box::new(NoopRecord)
    }
}

/// A single fetch attempt: its token plus the open inspection record.
///
/// The record travels with the attempt so that superseded fetches can still
/// report their outcome for observability.
pub struct FetchAttempt {
    pub token: FetchToken,
    pub request_id: Uuid,
    pub record: Box<dyn RequestRecord>,
}

/// Manages the fetch lifecycle for one layer.
pub struct RequestLifecycle {
    layer: LayerId,
    latest: u64,
    inspector: Arc<dyn RequestInspector>,
}

impl RequestLifecycle {
    pub fn new(layer: LayerId, inspector: Arc<dyn RequestInspector>) -> Self {
        Self {
            layer,
            latest: 0,
            inspector,
        }
    }

    /// Begin a new fetch attempt, superseding any attempt still in flight.
    ///
    /// Resets the layer's inspection record and opens a new labeled one.
    pub fn begin(&mut self, label: &str) -> FetchAttempt {
        self.latest += 1;
        let token = FetchToken(self.latest);
        let request_id = Uuid::new_v4();

        debug!(layer = %self.layer, seq = self.latest, %request_id, "fetch begin");

        self.inspector.reset(&self.layer);
        let record = self.inspector.start(&self.layer, label, request_id);

        FetchAttempt {
            token,
            request_id,
            record,
        }
    }

    /// Whether the token belongs to the most recently begun attempt.
    pub fn is_current(&self, token: FetchToken) -> bool {
        token.0 == self.latest
    }

    /// Report a successful response.
    ///
    /// Always marks the inspection record ok; returns `Superseded` when a
    /// newer attempt has begun, in which case the caller must not touch fetch
    /// metadata or cached geometry.
    pub fn complete(&self, attempt: &mut FetchAttempt, payload: &serde_json::Value) -> FetchOutcome {
        attempt.record.ok(payload);

        if self.is_current(attempt.token) {
            FetchOutcome::Accepted
        } else {
            warn!(layer = %self.layer, request_id = %attempt.request_id, "discarding superseded response");
            FetchOutcome::Superseded
        }
    }

    /// Report a failed fetch.
    ///
    /// Always marks the inspection record errored; the outcome tells the
    /// caller whether the failure belongs to the current attempt.
    pub fn fail(&self, attempt: &mut FetchAttempt, message: &str) -> FetchOutcome {
        attempt.record.error(message);

        if self.is_current(attempt.token) {
            FetchOutcome::Accepted
        } else {
            warn!(layer = %self.layer, request_id = %attempt.request_id, "superseded fetch failed: {message}");
            FetchOutcome::Superseded
        }
    }
}
