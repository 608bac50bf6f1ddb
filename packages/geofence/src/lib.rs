#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geofence containment evaluation.
//!
//! Pure geometric predicates with no side effects. Circles use the
//! haversine great-circle distance; polygons use a planar
//! point-in-polygon test over (longitude, latitude) coordinates via the
//! `geo` crate. The planar test is an approximation that holds for the
//! small-area rings users draw on a city-scale map; there is no geodesic
//! curvature correction.
//!
//! The evaluator assumes geometry that passed validation at
//! fence-creation time and asserts on malformed input instead of
//! returning a soft `false`.

pub mod convert;

use geo::{Contains, LineString, Point, Polygon};
use hazard_fence_geofence_models::{Fence, FenceGeometry, GeoPoint};

/// Mean Earth radius in meters, as used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters (haversine).
#[must_use]
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Whether `point` lies within `radius_meters` of `center`.
///
/// A zero radius contains only a point at distance exactly 0 (the
/// comparison is `<=`, so exact coincidence is inside).
///
/// # Panics
///
/// Panics if `radius_meters` is negative or not finite; validation
/// rejects such geometry at creation time.
#[must_use]
pub fn point_in_circle(point: GeoPoint, center: GeoPoint, radius_meters: f64) -> bool {
    assert!(
        radius_meters.is_finite() && radius_meters >= 0.0,
        "circle fence with invalid radius {radius_meters}"
    );
    haversine_distance_meters(point, center) <= radius_meters
}

/// Whether `point` lies inside the polygon described by `ring`.
///
/// The ring is auto-closed before testing if its last vertex differs
/// from its first. Planar small-area approximation; see the crate docs.
///
/// # Panics
///
/// Panics if `ring` has fewer than three vertices; validation rejects
/// such geometry at creation time.
#[must_use]
pub fn point_in_ring(point: GeoPoint, ring: &[GeoPoint]) -> bool {
    assert!(
        ring.len() >= 3,
        "polygon fence with {} vertices",
        ring.len()
    );

    let mut coords: Vec<(f64, f64)> = ring.iter().map(|p| (p.longitude, p.latitude)).collect();
    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }

    let polygon = Polygon::new(LineString::from(coords), Vec::new());
    polygon.contains(&Point::new(point.longitude, point.latitude))
}

/// Whether `point` lies inside `fence`.
///
/// Inactive fences never register containment: alerts fire only for
/// fences currently corroborated by an advisory, so an inactive fence is
/// `false` for every point regardless of geometry. This is a product
/// rule, not an optimization.
#[must_use]
pub fn point_in_fence(point: GeoPoint, fence: &Fence) -> bool {
    if !fence.is_active {
        return false;
    }

    match &fence.geometry {
        FenceGeometry::Circle {
            center,
            radius_meters,
        } => point_in_circle(point, *center, *radius_meters),
        FenceGeometry::Polygon { ring } => point_in_ring(point, ring),
    }
}
