//! borders-core: border following and contour trees for binary rasters (sans-IO).
//!
//! Turns a binary mask into the nesting hierarchy of its outer and hole
//! borders using Suzuki-Abe border following:
//! decode -> erode/dilate -> pixel grid -> raster scan with border walks ->
//! contour tree.
//!
//! The tree can then be assembled into polygons ([`polygon`]) and
//! reprojected into longitude/latitude ([`project`]).
//!
//! This crate has **no I/O dependencies**. It operates on in-memory byte
//! slices and returns structured data. File handling lives in the
//! `borders` binary and serializers in `borders-export`.

pub mod builder;
pub mod contour;
pub mod grid;
pub mod morph;
pub mod polygon;
pub mod project;
pub mod raster;
pub mod trace;
pub mod types;

pub use builder::{BuildError, ContourBuilder, find_contours};
pub use contour::{BorderKind, Contour, ContourTree, ROOT_ID, TreeSummary};
pub use grid::{GridError, PixelGrid};
pub use polygon::{PointConverter, PolygonError, PolygonOptions, contours_to_multipolygon};
pub use trace::{BorderTracer, Direction, TraceError};
pub use types::{
    ContourId, Coord, Dimensions, GrayImage, PaddingMode, ProcessConfig, ProcessError,
    ProcessResult,
};

/// Decode an image and trace every border in it.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration, and
/// produces a [`ProcessResult`] holding the contour tree and the source
/// dimensions. Coordinates in the tree are in source-image pixels even
/// when a padding ring was added.
///
/// # Steps
///
/// 1. Decode into a binary mask (black or transparent = background)
/// 2. Optional erosion, then optional dilation
/// 3. Build the pixel grid, padding per [`ProcessConfig::padding`]
/// 4. Raster scan and border following
///
/// # Errors
///
/// Returns [`ProcessError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`ProcessError::ImageDecode`] if the image format is unrecognized.
/// Returns [`ProcessError::InvalidConfig`] if `config` fails validation.
/// Returns [`ProcessError::Build`] if border following fails.
pub fn process(image_bytes: &[u8], config: &ProcessConfig) -> Result<ProcessResult, ProcessError> {
    let (mut grid, mask) = raster::grid_from_image(image_bytes, config)?;
    let padded = grid.is_padded();
    let tree = find_contours(&mut grid)?;

    Ok(ProcessResult {
        tree,
        dimensions: raster::dimensions_of(&mask),
        mask,
        padded,
    })
}
