//! Conversion between stored fence geometry and the GeoJSON features the
//! map client produces.
//!
//! The Leaflet draw plugin exports circles as a `Point` geometry with a
//! `radius` property (meters) on the enclosing feature, and polygons as a
//! `Polygon` whose first ring is the exterior. Only those two shapes are
//! accepted; everything else is rejected at creation time.

use geojson::{Feature, Geometry, Value};
use hazard_fence_geofence_models::{FenceGeometry, GeoPoint, GeometryError};

/// Errors converting a GeoJSON payload into a fence geometry.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The feature carried no geometry at all.
    #[error("feature has no geometry")]
    MissingGeometry,

    /// A geometry type this system does not store as a fence.
    #[error("unsupported geometry type: {kind}")]
    Unsupported {
        /// The GeoJSON type name that was rejected.
        kind: String,
    },

    /// A `Point` geometry without a `radius` property.
    #[error("circle fence requires a numeric 'radius' property in meters")]
    MissingRadius,

    /// A position with fewer than two coordinates.
    #[error("malformed position: expected [longitude, latitude]")]
    MalformedPosition,

    /// The converted geometry failed fence validation.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Converts a drawn GeoJSON feature into a validated [`FenceGeometry`],
/// reading the circle radius from the feature's `radius` property.
///
/// # Errors
///
/// Returns [`ConvertError`] if the feature has no geometry, the geometry
/// type is unsupported, a circle is missing its radius, or validation
/// fails.
pub fn geometry_from_feature(feature: &Feature) -> Result<FenceGeometry, ConvertError> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or(ConvertError::MissingGeometry)?;

    let radius_meters = feature
        .properties
        .as_ref()
        .and_then(|props| props.get("radius"))
        .and_then(serde_json::Value::as_f64);

    geometry_from_geojson(geometry, radius_meters)
}

/// Converts a bare GeoJSON geometry into a validated [`FenceGeometry`].
///
/// # Errors
///
/// Returns [`ConvertError`] on unsupported geometry types, a missing
/// circle radius, malformed positions, or validation failure.
pub fn geometry_from_geojson(
    geometry: &Geometry,
    radius_meters: Option<f64>,
) -> Result<FenceGeometry, ConvertError> {
    let converted = match &geometry.value {
        Value::Point(position) => {
            let center = position_to_point(position)?;
            let radius_meters = radius_meters.ok_or(ConvertError::MissingRadius)?;
            FenceGeometry::Circle {
                center,
                radius_meters,
            }
        }
        Value::Polygon(rings) => {
            let exterior = rings.first().ok_or(ConvertError::MalformedPosition)?;
            let ring = exterior
                .iter()
                .map(|position| position_to_point(position))
                .collect::<Result<Vec<_>, _>>()?;
            FenceGeometry::Polygon { ring }
        }
        other => {
            return Err(ConvertError::Unsupported {
                kind: other.type_name().to_string(),
            });
        }
    };

    converted.validate()?;
    Ok(converted)
}

/// Converts a stored geometry back to GeoJSON, returning the circle
/// radius separately so the caller can place it in feature properties.
#[must_use]
pub fn geometry_to_geojson(geometry: &FenceGeometry) -> (Geometry, Option<f64>) {
    match geometry {
        FenceGeometry::Circle {
            center,
            radius_meters,
        } => (
            Geometry::new(Value::Point(vec![center.longitude, center.latitude])),
            Some(*radius_meters),
        ),
        FenceGeometry::Polygon { ring } => {
            let mut positions: Vec<Vec<f64>> = ring
                .iter()
                .map(|p| vec![p.longitude, p.latitude])
                .collect();
            if positions.first() != positions.last() {
                positions.push(positions[0].clone());
            }
            (Geometry::new(Value::Polygon(vec![positions])), None)
        }
    }
}

fn position_to_point(position: &[f64]) -> Result<GeoPoint, ConvertError> {
    if position.len() < 2 {
        return Err(ConvertError::MalformedPosition);
    }
    // GeoJSON positions are [longitude, latitude].
    Ok(GeoPoint::new(position[1], position[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_from_json(value: serde_json::Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn converts_point_with_radius_to_circle() {
        let feature = feature_from_json(serde_json::json!({
            "type": "Feature",
            "properties": { "radius": 500.0, "name": "Legazpi" },
            "geometry": { "type": "Point", "coordinates": [123.7, 13.1] }
        }));

        let geometry = geometry_from_feature(&feature).unwrap();
        assert_eq!(
            geometry,
            FenceGeometry::Circle {
                center: GeoPoint::new(13.1, 123.7),
                radius_meters: 500.0,
            }
        );
    }

    #[test]
    fn point_without_radius_is_rejected() {
        let feature = feature_from_json(serde_json::json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Point", "coordinates": [123.7, 13.1] }
        }));

        assert!(matches!(
            geometry_from_feature(&feature),
            Err(ConvertError::MissingRadius)
        ));
    }

    #[test]
    fn converts_polygon_exterior_ring() {
        let feature = feature_from_json(serde_json::json!({
            "type": "Feature",
            "properties": { "name": "flood zone" },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
            }
        }));

        let geometry = geometry_from_feature(&feature).unwrap();
        let FenceGeometry::Polygon { ring } = geometry else {
            panic!("expected polygon");
        };
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], GeoPoint::new(0.0, 0.0));
        assert_eq!(ring[1], GeoPoint::new(0.0, 10.0));
    }

    #[test]
    fn line_strings_are_unsupported() {
        let feature = feature_from_json(serde_json::json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[0.0, 0.0], [1.0, 1.0]]
            }
        }));

        assert!(matches!(
            geometry_from_feature(&feature),
            Err(ConvertError::Unsupported { .. })
        ));
    }

    #[test]
    fn round_trips_a_circle_through_geojson() {
        let stored = FenceGeometry::Circle {
            center: GeoPoint::new(13.1, 123.7),
            radius_meters: 250.0,
        };
        let (geometry, radius) = geometry_to_geojson(&stored);
        let back = geometry_from_geojson(&geometry, radius).unwrap();
        assert_eq!(back, stored);
    }
}
