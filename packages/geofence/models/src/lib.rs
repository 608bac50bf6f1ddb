#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geofence, trail, and alert event model types.
//!
//! These types are shared across the whole hazard-fence system: the
//! containment evaluator, the activator, the tracking sessions, and the
//! database/API layers. Geometry is validated at fence-creation time;
//! downstream consumers may assume a [`Fence`] always carries a valid
//! geometry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 coordinate pair. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a new point without validating the ranges.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checks that both coordinates are finite and within WGS84 ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] naming the offending coordinate.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeometryError::InvalidLatitude {
                value: self.latitude,
            });
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeometryError::InvalidLongitude {
                value: self.longitude,
            });
        }
        Ok(())
    }
}

/// Errors produced by geometry validation at fence-creation time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("invalid latitude {value}: expected a finite value in [-90, 90]")]
    InvalidLatitude {
        /// The offending latitude.
        value: f64,
    },

    /// Longitude outside `[-180, 180]` or not finite.
    #[error("invalid longitude {value}: expected a finite value in [-180, 180]")]
    InvalidLongitude {
        /// The offending longitude.
        value: f64,
    },

    /// Circle radius negative or not finite.
    #[error("invalid radius {value}: expected a finite value >= 0 meters")]
    InvalidRadius {
        /// The offending radius in meters.
        value: f64,
    },

    /// Polygon ring with fewer than three distinct vertices.
    #[error("polygon ring has {distinct} distinct vertices: expected at least 3")]
    RingTooSmall {
        /// Number of distinct vertices found.
        distinct: usize,
    },
}

/// The stored shape of a fence.
///
/// A tagged union so that adding a geometry kind is a compiler-checked
/// change everywhere the evaluator matches on it. The serialized tag is
/// `"type": "circle" | "polygon"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FenceGeometry {
    /// A circle around a center point.
    #[serde(rename_all = "camelCase")]
    Circle {
        /// Center of the circle.
        center: GeoPoint,
        /// Radius in meters. Always `>= 0` once validated.
        radius_meters: f64,
    },
    /// A simple polygon described by its exterior ring.
    ///
    /// The ring is stored as drawn; it is treated as implicitly closed
    /// (the evaluator closes it if the last vertex differs from the
    /// first).
    #[serde(rename_all = "camelCase")]
    Polygon {
        /// Ordered exterior ring vertices.
        ring: Vec<GeoPoint>,
    },
}

impl FenceGeometry {
    /// Validates the geometry per the fence-creation contract: finite
    /// in-range coordinates, non-negative finite radius, and at least
    /// three distinct polygon vertices.
    ///
    /// # Errors
    ///
    /// Returns the first [`GeometryError`] encountered.
    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Self::Circle {
                center,
                radius_meters,
            } => {
                center.validate()?;
                if !radius_meters.is_finite() || *radius_meters < 0.0 {
                    return Err(GeometryError::InvalidRadius {
                        value: *radius_meters,
                    });
                }
                Ok(())
            }
            Self::Polygon { ring } => {
                for point in ring {
                    point.validate()?;
                }
                let distinct = count_distinct_vertices(ring);
                if distinct < 3 {
                    return Err(GeometryError::RingTooSmall { distinct });
                }
                Ok(())
            }
        }
    }

    /// One representative point for this geometry: the circle center, or
    /// the first ring vertex. Used by the activator as the advisory
    /// lookup anchor.
    ///
    /// # Panics
    ///
    /// Panics on a polygon with an empty ring, which validation rejects
    /// at creation time.
    #[must_use]
    pub fn anchor(&self) -> GeoPoint {
        match self {
            Self::Circle { center, .. } => *center,
            Self::Polygon { ring } => {
                assert!(!ring.is_empty(), "polygon fence with empty ring");
                ring[0]
            }
        }
    }
}

/// Counts ring vertices, ignoring exact duplicates (including the closing
/// vertex when the ring is stored explicitly closed).
fn count_distinct_vertices(ring: &[GeoPoint]) -> usize {
    let mut distinct: Vec<GeoPoint> = Vec::with_capacity(ring.len());
    for point in ring {
        if !distinct.contains(point) {
            distinct.push(*point);
        }
    }
    distinct.len()
}

/// Fence categories, used for map styling and reporting.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FenceCategory {
    /// A designated evacuation or safe zone.
    SafeArea,
    /// A known hazard-prone area.
    HighRiskArea,
    /// Anything else the user has drawn.
    Other,
}

impl FenceCategory {
    /// Derives a category from a fence name, the way the map UI colors
    /// shapes: names containing "safe area" are safe zones, names
    /// containing "high risk area" are hazard zones, everything else is
    /// [`Self::Other`].
    #[must_use]
    pub fn from_fence_name(name: &str) -> Self {
        let lowered = name.to_lowercase();
        if lowered.contains("safe area") {
            Self::SafeArea
        } else if lowered.contains("high risk area") {
            Self::HighRiskArea
        } else {
            Self::Other
        }
    }

    /// The map fill/stroke color clients use for this category.
    #[must_use]
    pub const fn map_color(self) -> &'static str {
        match self {
            Self::SafeArea => "blue",
            Self::HighRiskArea => "red",
            Self::Other => "green",
        }
    }
}

/// A named geofence with its activation state.
///
/// Owned by the fence registry. `is_active` is mutated only by the
/// activator; everything else is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fence {
    /// Registry-assigned identifier.
    pub id: i64,
    /// User-supplied name ("Unnamed" when the user skipped naming).
    pub name: String,
    /// Category for styling/reporting.
    pub category: FenceCategory,
    /// The stored shape.
    pub geometry: FenceGeometry,
    /// Whether an advisory currently corroborates this fence.
    pub is_active: bool,
    /// When the fence was created.
    pub created_at: DateTime<Utc>,
}

impl Fence {
    /// Creates an inactive fence after validating its geometry.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the geometry is malformed; the fence
    /// is not created.
    pub fn new(
        id: i64,
        name: impl Into<String>,
        category: FenceCategory,
        geometry: FenceGeometry,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GeometryError> {
        geometry.validate()?;
        Ok(Self {
            id,
            name: name.into(),
            category,
            geometry,
            is_active: false,
            created_at,
        })
    }
}

/// One position sample from the client-side position source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    /// Reported latitude.
    pub latitude: f64,
    /// Reported longitude.
    pub longitude: f64,
    /// Reported accuracy radius in meters.
    pub accuracy_meters: f64,
}

impl PositionSample {
    /// The sample as a bare coordinate pair.
    #[must_use]
    pub const fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A recorded point on a user's trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailPoint {
    /// Where the user was.
    pub position: GeoPoint,
    /// When the sample was recorded (UTC).
    pub recorded_at: DateTime<Utc>,
    /// GPS accuracy radius in meters.
    pub accuracy_meters: f64,
}

/// The ordered path recorded during one tracking session, persisted as a
/// single record when the session stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trail {
    /// The tracked user.
    pub user_id: String,
    /// When tracking started.
    pub started_at: DateTime<Utc>,
    /// When tracking stopped.
    pub ended_at: DateTime<Utc>,
    /// The recorded points, in order.
    pub points: Vec<TrailPoint>,
}

/// An alert log entry, created exactly once per geofence-entry detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailEvent {
    /// The user who entered the fence.
    pub user_id: String,
    /// The fence that was entered.
    pub fence_id: i64,
    /// The fence name at detection time.
    pub fence_name: String,
    /// When the entry was detected (UTC).
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_ring() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 10.0),
            GeoPoint::new(10.0, 10.0),
            GeoPoint::new(10.0, 0.0),
        ]
    }

    #[test]
    fn valid_circle_passes_validation() {
        let geometry = FenceGeometry::Circle {
            center: GeoPoint::new(13.1, 123.7),
            radius_meters: 500.0,
        };
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn negative_radius_is_rejected() {
        let geometry = FenceGeometry::Circle {
            center: GeoPoint::new(13.1, 123.7),
            radius_meters: -1.0,
        };
        assert_eq!(
            geometry.validate(),
            Err(GeometryError::InvalidRadius { value: -1.0 })
        );
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let geometry = FenceGeometry::Circle {
            center: GeoPoint::new(91.0, 0.0),
            radius_meters: 10.0,
        };
        assert_eq!(
            geometry.validate(),
            Err(GeometryError::InvalidLatitude { value: 91.0 })
        );
    }

    #[test]
    fn ring_with_two_distinct_vertices_is_rejected() {
        // Three stored vertices, but the closing vertex repeats the first.
        let geometry = FenceGeometry::Polygon {
            ring: vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(0.0, 0.0),
            ],
        };
        assert_eq!(
            geometry.validate(),
            Err(GeometryError::RingTooSmall { distinct: 2 })
        );
    }

    #[test]
    fn closed_square_ring_is_valid() {
        let mut ring = square_ring();
        ring.push(ring[0]);
        let geometry = FenceGeometry::Polygon { ring };
        assert!(geometry.validate().is_ok());
    }

    #[test]
    fn anchor_is_circle_center_or_first_vertex() {
        let circle = FenceGeometry::Circle {
            center: GeoPoint::new(13.1, 123.7),
            radius_meters: 500.0,
        };
        assert_eq!(circle.anchor(), GeoPoint::new(13.1, 123.7));

        let polygon = FenceGeometry::Polygon { ring: square_ring() };
        assert_eq!(polygon.anchor(), GeoPoint::new(0.0, 0.0));
    }

    #[test]
    fn category_derived_from_name() {
        assert_eq!(
            FenceCategory::from_fence_name("Barangay Safe Area 2"),
            FenceCategory::SafeArea
        );
        assert_eq!(
            FenceCategory::from_fence_name("HIGH RISK AREA - riverbank"),
            FenceCategory::HighRiskArea
        );
        assert_eq!(
            FenceCategory::from_fence_name("Unnamed"),
            FenceCategory::Other
        );
    }

    #[test]
    fn fence_creation_rejects_malformed_geometry() {
        let result = Fence::new(
            1,
            "bad",
            FenceCategory::Other,
            FenceGeometry::Polygon {
                ring: vec![GeoPoint::new(0.0, 0.0)],
            },
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn geometry_serializes_with_type_tag() {
        let geometry = FenceGeometry::Circle {
            center: GeoPoint::new(13.1, 123.7),
            radius_meters: 500.0,
        };
        let value = serde_json::to_value(&geometry).unwrap();
        assert_eq!(value["type"], "circle");
        assert_eq!(value["radiusMeters"], 500.0);
    }
}
