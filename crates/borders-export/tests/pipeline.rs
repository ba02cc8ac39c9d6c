//! Integration test: trace an in-memory image and export it to every format.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use borders_core::polygon::mark_conflicting_siblings_unusable;
use borders_core::project::SlippyToLonLat;
use borders_core::{PointConverter, PolygonOptions, ProcessConfig, contours_to_multipolygon};
use borders_export::{GeoJsonOptions, RenderOptions, SvgMetadata};
use geo::Area;
use image::{Rgba, RgbaImage};

/// 24x16 image: a thick square ring with an island in its hole, and a
/// separate rectangle to the right.
fn sample_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(24, 16, |x, y| {
        let square = (2..=11).contains(&x) && (2..=11).contains(&y);
        let hole = (5..=8).contains(&x) && (5..=8).contains(&y);
        let island = (6..=7).contains(&x) && (6..=7).contains(&y);
        let rect = (15..=20).contains(&x) && (4..=9).contains(&y);
        if (square && !hole) || island || rect {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 255])
        }
    });
    borders_export::encode_png(&img).unwrap()
}

#[test]
fn image_to_every_export_format() {
    let mut result =
        borders_core::process(&sample_png(), &ProcessConfig::default()).expect("process");
    assert!(!result.padded);

    let summary = result.tree.summary();
    assert_eq!(summary.outer, 3);
    assert_eq!(summary.holes, 1);
    assert_eq!(summary.parent_collisions, 0);
    assert_eq!(summary.depth, 3);
    assert!(result.tree.check_conflict_symmetry().is_ok());
    assert_eq!(mark_conflicting_siblings_unusable(&mut result.tree), 0);

    // Polygons in pixel space.
    let multi = contours_to_multipolygon(&result.tree, &PolygonOptions::default()).unwrap();
    assert_eq!(multi.0.len(), 3);
    assert_eq!(multi.0[0].interiors().len(), 1);
    assert!((multi.unsigned_area() - 84.0).abs() < 1e-9);

    // GeoJSON.
    let text = borders_export::to_geojson(&multi, &GeoJsonOptions::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let polygons = value["features"][0]["geometry"]["coordinates"]
        .as_array()
        .unwrap();
    assert_eq!(polygons.len(), 3);

    // SVG: one path per border.
    let svg = borders_export::to_svg(
        &result.tree,
        result.dimensions,
        &SvgMetadata {
            title: Some("sample"),
            ..SvgMetadata::default()
        },
    );
    assert!(svg.contains("<svg"));
    assert!(svg.contains("</svg>"));
    assert_eq!(svg.matches("<path").count(), 4);

    // Rendered PNG.
    let rendered =
        borders_export::render_contours(&result.tree, result.dimensions, &RenderOptions::default());
    assert_eq!(rendered.image.dimensions(), (24, 16));
    assert_eq!(*rendered.image.get_pixel(2, 2), Rgba([255, 0, 0, 255]));
    assert_eq!(*rendered.image.get_pixel(15, 4), Rgba([255, 0, 0, 255]));
    let png = borders_export::encode_png(&rendered.image).unwrap();
    assert!(!png.is_empty());
}

#[test]
fn geographic_export_stays_in_range() {
    let result = borders_core::process(&sample_png(), &ProcessConfig::default()).unwrap();
    let converter = SlippyToLonLat::new(1_891_500.0, 1_285_000.0, 21).unwrap();
    let options = PolygonOptions {
        pixel_offset: -0.5,
        converter: Some(&converter as &dyn PointConverter),
        ..PolygonOptions::default()
    };
    let multi = contours_to_multipolygon(&result.tree, &options).unwrap();

    let text = borders_export::to_geojson(&multi, &GeoJsonOptions::default()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let exterior = value["features"][0]["geometry"]["coordinates"][0][0]
        .as_array()
        .unwrap();
    for point in exterior {
        let lon = point[0].as_f64().unwrap();
        let lat = point[1].as_f64().unwrap();
        assert!((144.6..144.8).contains(&lon), "{lon}");
        assert!((-37.7..-37.5).contains(&lat), "{lat}");
    }
}
