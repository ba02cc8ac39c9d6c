//! Image decoding into binary masks.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces a
//! single-channel mask where `255` is foreground and `0` is background.
//! A pixel is background only when its colour, premultiplied by alpha, is
//! pure black, so fully transparent pixels are background too.

use image::{GrayImage, Luma};

use crate::grid::PixelGrid;
use crate::morph;
use crate::types::{Dimensions, PaddingMode, ProcessConfig, ProcessError};

/// Mask value written for foreground pixels.
pub const FOREGROUND: u8 = 255;

/// Decode raw image bytes into a binary mask.
///
/// # Errors
///
/// Returns [`ProcessError::EmptyInput`] if `bytes` is empty.
/// Returns [`ProcessError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_mask(bytes: &[u8]) -> Result<GrayImage, ProcessError> {
    if bytes.is_empty() {
        return Err(ProcessError::EmptyInput);
    }

    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    Ok(GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let lit = a != 0 && (r | g | b) != 0;
        Luma([if lit { FOREGROUND } else { 0 }])
    }))
}

/// Apply the configured erosion, then dilation, to `mask`.
///
/// # Errors
///
/// Returns [`ProcessError::InvalidConfig`] if the configuration fails
/// [`ProcessConfig::validate`].
pub fn apply_morphology(mask: GrayImage, config: &ProcessConfig) -> Result<GrayImage, ProcessError> {
    config.validate()?;

    let mut mask = mask;
    if config.erode_radius > 0 {
        mask = morph::erode(&mask, radius(config.erode_radius)?);
        log::debug!("eroded mask by {}", config.erode_radius);
    }
    if config.dilate_radius > 0 {
        mask = morph::dilate(&mask, radius(config.dilate_radius)?);
        log::debug!("dilated mask by {}", config.dilate_radius);
    }
    Ok(mask)
}

/// Decode `bytes`, apply morphology and build the pixel grid.
///
/// Returns the grid together with the post-morphology mask it was built
/// from.
///
/// # Errors
///
/// Any error from [`decode_mask`] or [`apply_morphology`], or
/// [`ProcessError::Grid`] if the mask is too large to label.
pub fn grid_from_image(
    bytes: &[u8],
    config: &ProcessConfig,
) -> Result<(PixelGrid, GrayImage), ProcessError> {
    let mask = apply_morphology(decode_mask(bytes)?, config)?;
    let grid = PixelGrid::from_gray(&mask, config.padding)?;

    if config.padding == PaddingMode::Auto && grid.is_padded() {
        log::info!("foreground touches the image edge, padding the grid");
    }
    Ok((grid, mask))
}

/// Encode a mask as a PNG, foreground white and background black.
///
/// # Errors
///
/// Returns [`ProcessError::ImageEncode`] if encoding fails.
pub fn mask_to_png(mask: &GrayImage) -> Result<Vec<u8>, ProcessError> {
    let binary = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([if mask.get_pixel(x, y).0[0] == 0 { 0 } else { FOREGROUND }])
    });
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        binary.as_raw(),
        binary.width(),
        binary.height(),
        image::ExtendedColorType::L8,
    )
    .map_err(ProcessError::ImageEncode)?;
    Ok(buf)
}

/// Dimensions of a mask.
#[must_use]
pub fn dimensions_of(mask: &GrayImage) -> Dimensions {
    Dimensions {
        width: mask.width(),
        height: mask.height(),
    }
}

fn radius(value: u32) -> Result<u8, ProcessError> {
    u8::try_from(value)
        .map_err(|_| ProcessError::InvalidConfig(format!("radius {value} does not fit in u8")))
}
