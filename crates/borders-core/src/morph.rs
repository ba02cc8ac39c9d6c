//! Binary erosion and dilation over square neighborhoods.
//!
//! Both operations take a binary mask whose pixels are `0` or `255`, as
//! produced by [`decode_mask`](crate::raster::decode_mask), and return a
//! new mask of the same form. Neighborhoods are `(2r + 1)` pixels on a
//! side and are clipped to the image bounds.

use image::GrayImage;
use imageproc::distance_transform::Norm;

/// Erode `mask` by `radius`.
///
/// The outermost one-pixel ring is always cleared, whatever the radius,
/// and counts as background for the pixels next to it. A remaining pixel
/// stays foreground only if every in-bounds pixel in its neighborhood is
/// foreground.
#[must_use]
pub fn erode(mask: &GrayImage, radius: u8) -> GrayImage {
    let mut out = mask.clone();
    clear_ring(&mut out);
    imageproc::morphology::erode_mut(&mut out, Norm::LInf, radius);
    out
}

/// Dilate `mask` by `radius`: every pixel within the neighborhood of a
/// foreground pixel becomes foreground.
#[must_use]
pub fn dilate(mask: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::dilate(mask, Norm::LInf, radius)
}

fn clear_ring(mask: &mut GrayImage) {
    let (w, h) = mask.dimensions();
    for (x, y, pixel) in mask.enumerate_pixels_mut() {
        if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
            pixel.0[0] = 0;
        }
    }
}
