//! GeoJSON export serializer.
//!
//! Wraps a [`MultiPolygon`] in a `FeatureCollection` holding a single
//! `MultiPolygon` feature, following RFC 7946: rings are closed, the first
//! ring of each polygon is its exterior, exteriors wind counter-clockwise
//! and holes clockwise.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use geo::orient::Direction;
use geo::{CoordsIter, LineString, MultiPolygon, Orient};
use serde_json::{Map, Value, json};

use crate::ExportError;

/// Options for [`to_geojson`].
#[derive(Debug, Clone, Default)]
pub struct GeoJsonOptions {
    /// Properties attached to the feature. Serialized as `{}` when absent.
    pub properties: Option<Map<String, Value>>,

    /// Indent the output.
    pub pretty: bool,
}

/// Serialize `multi` as a GeoJSON `FeatureCollection`.
///
/// Rings are reoriented as needed, so input winding does not matter.
///
/// # Errors
///
/// Returns [`ExportError::NonFinite`] if any coordinate is NaN or
/// infinite, since JSON cannot represent it.
pub fn to_geojson(multi: &MultiPolygon<f64>, options: &GeoJsonOptions) -> Result<String, ExportError> {
    // Reorienting compares coordinates, which needs them all finite.
    if let Some(c) = multi
        .coords_iter()
        .find(|c| !(c.x.is_finite() && c.y.is_finite()))
    {
        return Err(ExportError::NonFinite { x: c.x, y: c.y });
    }

    let polygons: Vec<Vec<Value>> = multi
        .orient(Direction::Default)
        .0
        .iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(ring_coordinates)
                .collect()
        })
        .collect();

    let collection = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": polygons,
            },
            "properties": options.properties.clone().unwrap_or_default(),
        }],
    });

    let text = if options.pretty {
        serde_json::to_string_pretty(&collection)?
    } else {
        serde_json::to_string(&collection)?
    };
    Ok(text)
}

fn ring_coordinates(ring: &LineString<f64>) -> Value {
    ring.coords().map(|c| json!([c.x, c.y])).collect()
}
