//! Shared types for the border tracing engine and its collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builder::BuildError;
use crate::contour::ContourTree;
use crate::grid::GridError;

/// Re-export `GrayImage` so downstream crates can hand binary masks to
/// the engine without depending on `image` directly.
pub use image::GrayImage;

/// Identifier of a traced border.
///
/// Ids are assigned sequentially in scan order starting at 2. Id 1 is the
/// sentinel root of every [`ContourTree`](crate::ContourTree).
pub type ContourId = u32;

/// An integer pixel position in grid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Column (pixels from the left edge).
    pub x: i32,
    /// Row (pixels from the top edge).
    pub y: i32,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this coordinate moved by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Whether a one-pixel background ring is synthesized around the mask
/// before tracing.
///
/// The tracer never probes the outermost ring of the grid, so foreground
/// touching the raster edge is only traced correctly when padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingMode {
    /// Never pad. The caller guarantees the outer ring is background.
    Never,
    /// Always pad.
    Always,
    /// Pad only when a pixel on the outer ring is foreground.
    #[default]
    Auto,
}

/// Configuration for turning an encoded raster into a [`ContourTree`](crate::ContourTree).
///
/// Erosion runs before dilation, so a matching pair of radii acts as a
/// morphological opening that strips single-pixel noise and spikes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Erosion radius in pixels. Zero disables erosion.
    pub erode_radius: u32,

    /// Dilation radius in pixels. Zero disables dilation.
    pub dilate_radius: u32,

    /// Padding strategy applied when building the pixel grid.
    pub padding: PaddingMode,
}

impl ProcessConfig {
    /// Default erosion radius.
    pub const DEFAULT_ERODE_RADIUS: u32 = 0;
    /// Default dilation radius.
    pub const DEFAULT_DILATE_RADIUS: u32 = 0;
    /// Largest accepted erosion/dilation radius.
    pub const MAX_MORPH_RADIUS: u32 = 64;

    /// Check the configuration for values the pipeline cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::InvalidConfig`] if either morphology radius
    /// exceeds [`Self::MAX_MORPH_RADIUS`].
    pub fn validate(&self) -> Result<(), ProcessError> {
        for (name, radius) in [
            ("erode_radius", self.erode_radius),
            ("dilate_radius", self.dilate_radius),
        ] {
            if radius > Self::MAX_MORPH_RADIUS {
                return Err(ProcessError::InvalidConfig(format!(
                    "{name} must be at most {}, got {radius}",
                    Self::MAX_MORPH_RADIUS,
                )));
            }
        }
        Ok(())
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            erode_radius: Self::DEFAULT_ERODE_RADIUS,
            dilate_radius: Self::DEFAULT_DILATE_RADIUS,
            padding: PaddingMode::default(),
        }
    }
}

/// Output of [`process`](crate::process).
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Every border found in the mask, in source-image coordinates.
    pub tree: ContourTree,

    /// Source image dimensions.
    pub dimensions: Dimensions,

    /// The mask after erosion and dilation, as traced.
    pub mask: GrayImage,

    /// Whether a background ring was added before tracing.
    pub padded: bool,
}

/// Errors that can occur while turning an encoded raster into a tree.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Failed to encode a mask image.
    #[error("failed to encode image: {0}")]
    ImageEncode(#[source] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The decoded mask could not be turned into a pixel grid.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Border following failed.
    #[error(transparent)]
    Build(#[from] BuildError),
}
