//! borders-export: Pure format serializers (sans-IO)
//!
//! Converts contour trees and the polygons assembled from them into
//! output formats: GeoJSON, SVG and rendered PNG images. Every function
//! returns bytes or strings; writing them anywhere is the caller's job.

pub mod geojson;
pub mod render;
pub mod svg;

pub use geojson::{GeoJsonOptions, to_geojson};
pub use render::{PALETTE, RenderOptions, Rendered, encode_png, render_contours};
pub use svg::{SvgMetadata, to_svg};

/// Errors raised by serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// PNG encoding failed.
    #[error("failed to encode PNG: {0}")]
    Png(#[from] image::ImageError),

    /// A coordinate could not be represented in the output format.
    #[error("coordinate ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
}
