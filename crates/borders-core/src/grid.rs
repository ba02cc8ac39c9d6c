//! The labeled pixel grid that border following runs over.
//!
//! Every cell holds a signed label:
//!
//! - `0`: background
//! - `1`: foreground not yet visited by any border walk
//! - `n` or `-n` with `n > 1`: pixel lies on border `n`. Negative labels
//!   mark pixels whose east neighbor faces background (or which sit on
//!   the last row); positive labels mark the remaining border pixels.
//!
//! The grid is mutated in place while tracing. Once a
//! [`ContourTree`](crate::ContourTree) has been built from it, the grid
//! holds the final border-label map and is not traced again.

use std::fmt;

use image::GrayImage;

use crate::types::{ContourId, Coord, Dimensions, PaddingMode};

/// Label of a background pixel.
pub const BACKGROUND: i32 = 0;

/// Label of a foreground pixel no border walk has visited yet.
pub const UNVISITED: i32 = 1;

/// Upper bound on the number of cells in a grid.
///
/// A single pixel can open at most two borders, so keeping the cell count
/// below half of `i32::MAX` guarantees every border id fits in a label.
pub const MAX_CELLS: u64 = 1_073_741_823;

/// Errors raised while constructing a [`PixelGrid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The supplied pixel data does not cover `width * height` cells.
    #[error("expected {expected} pixels for a {width}x{height} grid, got {actual}")]
    DataLength {
        width: u32,
        height: u32,
        expected: u64,
        actual: usize,
    },

    /// The grid (including any padding) has too many cells to label.
    #[error("a {width}x{height} grid exceeds the maximum of {max} cells", max = MAX_CELLS)]
    TooLarge { width: u64, height: u64 },
}

/// A width x height array of border labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: i32,
    height: i32,
    labels: Vec<i32>,
    padded: bool,
}

impl PixelGrid {
    /// Create an all-background grid without padding.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::TooLarge`] if the grid has more than
    /// [`MAX_CELLS`] cells.
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        let (w, h) = checked_dimensions(u64::from(width), u64::from(height))?;
        Ok(Self {
            width: w,
            height: h,
            labels: vec![BACKGROUND; cell_count(w, h)],
            padded: false,
        })
    }

    /// Build a grid from a row-major mask where any non-zero byte is
    /// foreground.
    ///
    /// When `pad` is true the mask is surrounded by a one-pixel background
    /// ring, so the grid is `(width + 2) x (height + 2)` and the mask's
    /// pixel `(x, y)` lands at `(x + 1, y + 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DataLength`] if `mask.len() != width * height`,
    /// or [`GridError::TooLarge`] if the (padded) grid is too large.
    pub fn from_mask(width: u32, height: u32, mask: &[u8], pad: bool) -> Result<Self, GridError> {
        let expected = u64::from(width) * u64::from(height);
        if u64::try_from(mask.len()).ok() != Some(expected) {
            return Err(GridError::DataLength {
                width,
                height,
                expected,
                actual: mask.len(),
            });
        }

        let ring = if pad { 2 } else { 0 };
        let (w, h) = checked_dimensions(u64::from(width) + ring, u64::from(height) + ring)?;
        let mut labels = vec![BACKGROUND; cell_count(w, h)];

        let src_width = width as usize;
        let dst_width = w.unsigned_abs() as usize;
        let shift = usize::from(pad);
        for (row, src) in mask.chunks_exact(src_width.max(1)).enumerate() {
            let start = (row + shift) * dst_width + shift;
            for (dst, &value) in labels[start..start + src.len()].iter_mut().zip(src) {
                *dst = if value == 0 { BACKGROUND } else { UNVISITED };
            }
        }

        Ok(Self {
            width: w,
            height: h,
            labels,
            padded: pad,
        })
    }

    /// Build a grid from a grayscale mask (non-zero = foreground),
    /// applying the requested padding strategy.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::TooLarge`] if the (padded) grid is too large.
    pub fn from_gray(image: &GrayImage, padding: PaddingMode) -> Result<Self, GridError> {
        let pad = match padding {
            PaddingMode::Never => false,
            PaddingMode::Always => true,
            PaddingMode::Auto => edge_has_foreground(image),
        };
        Self::from_mask(image.width(), image.height(), image.as_raw(), pad)
    }

    /// Build a grid from a mask, padding only when a pixel on the outer
    /// ring is foreground.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_mask`].
    pub fn from_mask_auto(width: u32, height: u32, mask: &[u8]) -> Result<Self, GridError> {
        let w = width as usize;
        let on_edge = ring_has_foreground(width, height, |x, y| {
            mask.get(y as usize * w + x as usize).is_some_and(|&v| v != 0)
        });
        Self::from_mask(width, height, mask, on_edge)
    }

    /// Build an unpadded grid from raw labels.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DataLength`] if `labels.len() != width * height`,
    /// or [`GridError::TooLarge`] if the grid is too large.
    pub fn from_labels(width: u32, height: u32, labels: Vec<i32>) -> Result<Self, GridError> {
        let expected = u64::from(width) * u64::from(height);
        if u64::try_from(labels.len()).ok() != Some(expected) {
            return Err(GridError::DataLength {
                width,
                height,
                expected,
                actual: labels.len(),
            });
        }
        let (w, h) = checked_dimensions(u64::from(width), u64::from(height))?;
        Ok(Self {
            width: w,
            height: h,
            labels,
            padded: false,
        })
    }

    /// Grid width in cells, including any padding.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width.unsigned_abs()
    }

    /// Grid height in cells, including any padding.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Grid dimensions, including any padding.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Width and height as signed coordinates.
    pub(crate) const fn extent(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Whether a background ring was synthesized around the source mask.
    #[must_use]
    pub const fn is_padded(&self) -> bool {
        self.padded
    }

    /// All labels in row-major order.
    #[must_use]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Whether `p` lies inside the grid.
    #[must_use]
    pub const fn contains(&self, p: Coord) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    /// Whether `p` lies inside the grid and off its outermost ring.
    #[must_use]
    pub const fn is_interior(&self, p: Coord) -> bool {
        p.x > 0 && p.y > 0 && p.x < self.width - 1 && p.y < self.height - 1
    }

    /// Whether `y` is the index of the grid's last row.
    #[must_use]
    pub const fn is_last_row(&self, y: i32) -> bool {
        y == self.height - 1
    }

    /// Flat index of `p`. `p` must lie inside the grid.
    #[inline]
    #[must_use]
    pub fn index_of(&self, p: Coord) -> usize {
        debug_assert!(self.contains(p), "{p} outside {}x{}", self.width, self.height);
        p.y.unsigned_abs() as usize * self.width.unsigned_abs() as usize + p.x.unsigned_abs() as usize
    }

    /// Label at `p`. `p` must lie inside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, p: Coord) -> i32 {
        self.labels[self.index_of(p)]
    }

    /// Label at `(x, y)`. The position must lie inside the grid.
    #[inline]
    #[must_use]
    pub fn get_xy(&self, x: i32, y: i32) -> i32 {
        self.get(Coord::new(x, y))
    }

    /// Label at flat index `idx`.
    #[inline]
    #[must_use]
    pub fn get_index(&self, idx: usize) -> i32 {
        self.labels[idx]
    }

    /// Set the label at `p`. `p` must lie inside the grid.
    #[inline]
    pub fn set(&mut self, p: Coord, label: i32) {
        let idx = self.index_of(p);
        self.labels[idx] = label;
    }

    /// Set the label at `(x, y)`. The position must lie inside the grid.
    #[inline]
    pub fn set_xy(&mut self, x: i32, y: i32, label: i32) {
        self.set(Coord::new(x, y), label);
    }

    /// Set the label at flat index `idx`.
    #[inline]
    pub fn set_index(&mut self, idx: usize, label: i32) {
        self.labels[idx] = label;
    }

    /// Render the grid as one line of space-separated labels per row.
    ///
    /// Meant for debugging small grids.
    #[must_use]
    pub fn to_text_rows(&self) -> Vec<String> {
        self.labels
            .chunks_exact(self.width.unsigned_abs().max(1) as usize)
            .map(|row| {
                row.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl fmt::Display for PixelGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_text_rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Positive label written for the interior pixels of border `id`.
#[must_use]
pub(crate) fn interior_label(id: ContourId) -> i32 {
    // Grids are capped at MAX_CELLS, so ids always fit.
    i32::try_from(id).unwrap_or(i32::MAX)
}

/// Negative label written for the edge-facing pixels of border `id`.
#[must_use]
pub(crate) fn edge_label(id: ContourId) -> i32 {
    -interior_label(id)
}

/// Whether any pixel on the outermost ring of `image` is foreground.
#[must_use]
pub fn edge_has_foreground(image: &GrayImage) -> bool {
    let (w, h) = image.dimensions();
    ring_has_foreground(w, h, |x, y| image.get_pixel(x, y).0[0] != 0)
}

/// Whether `is_foreground` holds for any cell on the outermost ring of a
/// `w x h` raster.
fn ring_has_foreground(w: u32, h: u32, is_foreground: impl Fn(u32, u32) -> bool) -> bool {
    if w == 0 || h == 0 {
        return false;
    }
    (0..w).any(|x| is_foreground(x, 0) || is_foreground(x, h - 1))
        || (0..h).any(|y| is_foreground(0, y) || is_foreground(w - 1, y))
}

fn checked_dimensions(width: u64, height: u64) -> Result<(i32, i32), GridError> {
    if width.saturating_mul(height) > MAX_CELLS {
        return Err(GridError::TooLarge { width, height });
    }
    let too_large = || GridError::TooLarge { width, height };
    Ok((
        i32::try_from(width).map_err(|_| too_large())?,
        i32::try_from(height).map_err(|_| too_large())?,
    ))
}

fn cell_count(width: i32, height: i32) -> usize {
    width.unsigned_abs() as usize * height.unsigned_abs() as usize
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_round_trip() {
        let mut grid = PixelGrid::new(5, 5).unwrap();
        grid.set_xy(0, 0, 1);
        assert_eq!(grid.get_xy(0, 0), 1);

        let p = Coord::new(1, 1);
        grid.set(p, 7);
        assert_eq!(grid.get(p), 7);
        assert_eq!(grid.get_index(grid.index_of(p)), 7);

        grid.set_index(24, -3);
        assert_eq!(grid.get_xy(4, 4), -3);
    }

    #[test]
    fn text_rows_match_labels() {
        #[rustfmt::skip]
        let mask = [
            1, 0, 0, 0, 0,
            0, 1, 0, 0, 0,
            0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
        ];
        let grid = PixelGrid::from_mask(5, 5, &mask, false).unwrap();
        assert_eq!(grid.labels().len(), 25);
        assert_eq!(
            grid.to_text_rows(),
            vec!["1 0 0 0 0", "0 1 0 0 0", "0 0 0 0 0", "0 0 0 0 0", "0 0 0 0 0"]
        );
        assert!(grid.to_string().starts_with("1 0 0 0 0\n0 1 0 0 0\n"));
    }

    #[test]
    fn equal_grids_compare_equal() {
        let a = PixelGrid::from_mask(3, 2, &[1, 0, 1, 0, 1, 0], false).unwrap();
        let b = PixelGrid::from_mask(3, 2, &[1, 0, 1, 0, 1, 0], false).unwrap();
        let c = PixelGrid::from_mask(3, 2, &[1, 0, 1, 0, 1, 1], false).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn nonzero_mask_values_become_unvisited() {
        let grid = PixelGrid::from_mask(2, 1, &[255, 0], false).unwrap();
        assert_eq!(grid.labels(), &[UNVISITED, BACKGROUND]);
    }

    #[test]
    fn padding_adds_background_ring() {
        let grid = PixelGrid::from_mask(2, 2, &[1, 1, 1, 1], true).unwrap();
        assert!(grid.is_padded());
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 4);
        assert_eq!(
            grid.to_text_rows(),
            vec!["0 0 0 0", "0 1 1 0", "0 1 1 0", "0 0 0 0"]
        );
    }

    #[test]
    fn auto_padding_only_when_edge_is_foreground() {
        let interior = [0, 0, 0, 0, 1, 0, 0, 0, 0];
        let grid = PixelGrid::from_mask_auto(3, 3, &interior).unwrap();
        assert!(!grid.is_padded());

        let touching = [0, 1, 0, 0, 1, 0, 0, 0, 0];
        let grid = PixelGrid::from_mask_auto(3, 3, &touching).unwrap();
        assert!(grid.is_padded());
        assert_eq!(grid.width(), 5);
    }

    #[test]
    fn auto_padding_agrees_between_mask_and_gray() {
        #[rustfmt::skip]
        let cases: [[u8; 12]; 4] = [
            [0, 0, 0, 0,  0, 1, 1, 0,  0, 0, 0, 0],
            [0, 0, 0, 0,  0, 1, 1, 1,  0, 0, 0, 0],
            [0, 0, 0, 0,  0, 0, 0, 0,  0, 9, 0, 0],
            [7, 0, 0, 0,  0, 0, 0, 0,  0, 0, 0, 0],
        ];
        for (i, mask) in cases.iter().enumerate() {
            let image = GrayImage::from_raw(4, 3, mask.to_vec()).unwrap();
            let from_mask = PixelGrid::from_mask_auto(4, 3, mask).unwrap();
            let from_gray = PixelGrid::from_gray(&image, PaddingMode::Auto).unwrap();
            assert_eq!(from_mask, from_gray, "case {i}");
            assert_eq!(from_mask.is_padded(), i > 0, "case {i}");
        }
    }

    #[test]
    fn auto_padding_with_short_data_is_rejected() {
        let err = PixelGrid::from_mask_auto(3, 3, &[0, 1]).unwrap_err();
        assert!(matches!(err, GridError::DataLength { actual: 2, .. }));
    }

    #[test]
    fn from_gray_respects_padding_mode() {
        let mut image = GrayImage::new(4, 4);
        image.put_pixel(0, 2, image::Luma([255]));

        assert!(!PixelGrid::from_gray(&image, PaddingMode::Never).unwrap().is_padded());
        assert!(PixelGrid::from_gray(&image, PaddingMode::Always).unwrap().is_padded());
        assert!(PixelGrid::from_gray(&image, PaddingMode::Auto).unwrap().is_padded());

        let blank = GrayImage::new(4, 4);
        assert!(!PixelGrid::from_gray(&blank, PaddingMode::Auto).unwrap().is_padded());
    }

    #[test]
    fn wrong_data_length_is_rejected() {
        let err = PixelGrid::from_mask(3, 3, &[1, 0], false).unwrap_err();
        assert!(matches!(
            err,
            GridError::DataLength {
                expected: 9,
                actual: 2,
                ..
            }
        ));
        assert!(PixelGrid::from_labels(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        assert!(matches!(
            PixelGrid::new(u32::MAX, 2),
            Err(GridError::TooLarge { .. })
        ));
    }

    #[test]
    fn interior_excludes_outer_ring() {
        let grid = PixelGrid::new(4, 3).unwrap();
        assert!(grid.is_interior(Coord::new(1, 1)));
        assert!(grid.is_interior(Coord::new(2, 1)));
        assert!(!grid.is_interior(Coord::new(0, 1)));
        assert!(!grid.is_interior(Coord::new(3, 1)));
        assert!(!grid.is_interior(Coord::new(1, 2)));
        assert!(grid.contains(Coord::new(3, 2)));
        assert!(!grid.contains(Coord::new(4, 0)));
        assert!(grid.is_last_row(2));
    }

    #[test]
    fn labels_for_border_ids() {
        assert_eq!(interior_label(5), 5);
        assert_eq!(edge_label(5), -5);
    }
}
