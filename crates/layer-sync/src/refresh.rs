//! Refresh decision logic: does the current viewport require a re-fetch?

use map_common::{GeoExtent, TimeRange};
use serde::{Deserialize, Serialize};

/// Map state supplied anew on every render tick.
///
/// The extent is absent until the map has completed its first render; in that
/// case the sync is skipped entirely rather than fetched with no filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    /// Current zoom level, >= 0.
    pub zoom: f64,

    /// Visible geographic rectangle, if the map has rendered.
    pub extent: Option<GeoExtent>,

    /// Current time-picker range.
    pub time_range: TimeRange,

    /// Monotonic tick of the last manual/interval refresh trigger, if any.
    pub refresh_tick: Option<i64>,
}

/// Snapshot of the parameters used for the last accepted fetch.
///
/// Replaced wholesale when a response is accepted, never mutated in place and
/// never written speculatively while a fetch is in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub precision: u8,
    pub time_range: TimeRange,
    pub refresh_tick: Option<i64>,

    /// The extent actually fetched (visible extent plus over-fetch buffer).
    pub extent: GeoExtent,
}

impl FetchMetadata {
    /// Snapshot the parameters of a fetch that is about to be issued.
    ///
    /// `fetched_extent` is the buffered extent handed to the query builder,
    /// not the raw visible extent, so later containment checks answer "is the
    /// viewport still inside what we fetched".
    pub fn snapshot(view: &ViewportState, precision: u8, fetched_extent: GeoExtent) -> Self {
        Self {
            precision,
            time_range: view.time_range.clone(),
            refresh_tick: view.refresh_tick,
            extent: fetched_extent,
        }
    }
}

/// Decide whether the current viewport state requires a new fetch.
///
/// Pure predicate over two snapshots; the caller has already established that
/// a visible extent exists. A re-fetch is needed when any of:
/// - there is no previous fetch,
/// - the computed precision changed,
/// - the time range changed,
/// - a refresh was triggered since the last fetch,
/// - the viewport left the previously fetched extent.
pub fn should_refetch(
    previous: Option<&FetchMetadata>,
    view: &ViewportState,
    visible_extent: &GeoExtent,
    precision: u8,
) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    if precision != previous.precision {
        return true;
    }

    if view.time_range != previous.time_range {
        return true;
    }

    if let Some(tick) = view.refresh_tick {
        if previous.refresh_tick != Some(tick) {
            return true;
        }
    }

    !previous.extent.contains(visible_extent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(extent: GeoExtent) -> ViewportState {
        ViewportState {
            zoom: 3.0,
            extent: Some(extent),
            time_range: TimeRange::relative("now-15m", "now"),
            refresh_tick: None,
        }
    }

    #[test]
    fn test_first_sync_always_fetches() {
        let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
        assert!(should_refetch(None, &view(extent), &extent, 2));
    }

    #[test]
    fn test_identical_state_does_not_refetch() {
        let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
        let current = view(extent);
        let metadata = FetchMetadata::snapshot(&current, 2, extent.expanded(0.5));

        assert!(!should_refetch(Some(&metadata), &current, &extent, 2));
    }

    #[test]
    fn test_precision_change_refetches() {
        let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
        let current = view(extent);
        let metadata = FetchMetadata::snapshot(&current, 2, extent.expanded(0.5));

        assert!(should_refetch(Some(&metadata), &current, &extent, 3));
    }

    #[test]
    fn test_time_range_change_refetches() {
        let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
        let current = view(extent);
        let metadata = FetchMetadata::snapshot(&current, 2, extent.expanded(0.5));

        let mut later = current.clone();
        later.time_range = TimeRange::relative("now-1h", "now");
        assert!(should_refetch(Some(&metadata), &later, &extent, 2));
    }

    #[test]
    fn test_refresh_tick_change_refetches() {
        let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
        let current = view(extent);
        let metadata = FetchMetadata::snapshot(&current, 2, extent.expanded(0.5));

        let mut ticked = current.clone();
        ticked.refresh_tick = Some(42);
        assert!(should_refetch(Some(&metadata), &ticked, &extent, 2));

        // Unchanged tick is not a trigger.
        let metadata = FetchMetadata::snapshot(&ticked, 2, extent.expanded(0.5));
        assert!(!should_refetch(Some(&metadata), &ticked, &extent, 2));
    }

    #[test]
    fn test_pan_within_buffer_does_not_refetch() {
        let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
        let current = view(extent);
        let metadata = FetchMetadata::snapshot(&current, 2, extent.expanded(0.5));

        // A small pan keeps the viewport inside the buffered fetch extent.
        let panned = GeoExtent::new(-8.0, -10.0, 12.0, 10.0);
        assert!(!should_refetch(Some(&metadata), &view(panned), &panned, 2));
    }

    #[test]
    fn test_pan_outside_fetched_extent_refetches() {
        let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
        let current = view(extent);
        let metadata = FetchMetadata::snapshot(&current, 2, extent.expanded(0.5));

        let panned = GeoExtent::new(15.0, -10.0, 35.0, 10.0);
        assert!(should_refetch(Some(&metadata), &view(panned), &panned, 2));
    }
}
