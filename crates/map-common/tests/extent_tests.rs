//! Tests for GeoExtent operations.

use map_common::GeoExtent;

// ============================================================================
// Geometry predicates
// ============================================================================

#[test]
fn test_extent_dimensions() {
    let extent = GeoExtent::new(-10.0, -5.0, 10.0, 5.0);
    assert_eq!(extent.width(), 20.0);
    assert_eq!(extent.height(), 10.0);
    assert_eq!(extent.center(), (0.0, 0.0));
}

#[test]
fn test_intersects() {
    let a = GeoExtent::new(0.0, 0.0, 10.0, 10.0);
    let b = GeoExtent::new(5.0, 5.0, 15.0, 15.0);
    let c = GeoExtent::new(20.0, 20.0, 30.0, 30.0);

    assert!(a.intersects(&b));
    assert!(b.intersects(&a));
    assert!(!a.intersects(&c));
}

#[test]
fn test_touching_edges_do_not_intersect() {
    let a = GeoExtent::new(0.0, 0.0, 10.0, 10.0);
    let b = GeoExtent::new(10.0, 0.0, 20.0, 10.0);
    assert!(!a.intersects(&b));
}

#[test]
fn test_contains_point() {
    let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
    assert!(extent.contains_point(0.0, 0.0));
    assert!(extent.contains_point(-10.0, 10.0));
    assert!(!extent.contains_point(10.1, 0.0));
}

#[test]
fn test_contains_is_inclusive_of_boundary() {
    let outer = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
    assert!(outer.contains(&outer));
    assert!(outer.contains(&GeoExtent::new(-10.0, -10.0, 0.0, 0.0)));
}

// ============================================================================
// Over-fetch buffering
// ============================================================================

#[test]
fn test_expanded_grows_symmetrically() {
    let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
    let buffered = extent.expanded(0.5);

    assert_eq!(buffered.min_lon, -20.0);
    assert_eq!(buffered.max_lon, 20.0);
    assert_eq!(buffered.min_lat, -20.0);
    assert_eq!(buffered.max_lat, 20.0);
    assert!(buffered.contains(&extent));
}

#[test]
fn test_expanded_zero_factor_is_identity() {
    let extent = GeoExtent::new(-10.0, -10.0, 10.0, 10.0);
    assert_eq!(extent.expanded(0.0), extent);
}

#[test]
fn test_expanded_never_leaves_world_bounds() {
    let buffered = GeoExtent::world().expanded(1.0);
    assert_eq!(buffered, GeoExtent::world());
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_extent_serde_roundtrip() {
    let extent = GeoExtent::new(-125.5, 24.75, -66.25, 50.125);
    let json = serde_json::to_string(&extent).unwrap();
    let back: GeoExtent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, extent);
}
