//! Web-Mercator tile math and pixel-to-longitude/latitude converters.
//!
//! Tile coordinates follow the slippy-map convention: at zoom `z` the world
//! is `2^z` tiles wide, `x` grows eastward from longitude -180 and `y`
//! grows southward from latitude +85.0511.

use std::f64::consts::PI;

use crate::polygon::PointConverter;

/// Equatorial radius used by Web-Mercator, in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Largest latitude Web-Mercator can represent.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Pixels along one side of a map tile.
pub const TILE_PIXELS: f64 = 256.0;

/// Deepest supported zoom level.
pub const MAX_ZOOM: u8 = 30;

/// Errors raised by projection helpers.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("latitude {0} is outside the Web-Mercator range of +/-{max}", max = MAX_LATITUDE)]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),

    #[error("zoom {0} exceeds the maximum of {max}", max = MAX_ZOOM)]
    ZoomOutOfRange(u8),
}

/// Number of tiles along one side of the world at `zoom`.
fn tiles_at(zoom: u8) -> Result<f64, ProjectionError> {
    if zoom > MAX_ZOOM {
        return Err(ProjectionError::ZoomOutOfRange(zoom));
    }
    Ok(f64::from(1_u32 << zoom))
}

/// Longitude and latitude in degrees of the top-left corner of tile
/// `(x, y)`. Fractional tile coordinates are allowed.
///
/// # Errors
///
/// Returns [`ProjectionError::ZoomOutOfRange`] if `zoom > MAX_ZOOM`.
pub fn slippy_to_lon_lat(x: f64, y: f64, zoom: u8) -> Result<(f64, f64), ProjectionError> {
    let n = tiles_at(zoom)?;
    Ok(tile_to_lon_lat(x, y, n))
}

fn tile_to_lon_lat(x: f64, y: f64, n: f64) -> (f64, f64) {
    let lon = x / n * 360.0 - 180.0;
    let lat = (PI - y / n * 2.0 * PI).sinh().atan().to_degrees();
    (lon, lat)
}

/// Fractional tile coordinates of a longitude/latitude.
///
/// # Errors
///
/// Returns an error if the zoom, longitude or latitude is out of range.
pub fn lon_lat_to_tile(lon: f64, lat: f64, zoom: u8) -> Result<(f64, f64), ProjectionError> {
    let n = tiles_at(zoom)?;
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ProjectionError::LongitudeOutOfRange(lon));
    }
    if !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&lat) {
        return Err(ProjectionError::LatitudeOutOfRange(lat));
    }
    let lat = lat.to_radians();
    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n;
    Ok((x, y))
}

/// The slippy tile containing a longitude/latitude.
///
/// # Errors
///
/// Same as [`lon_lat_to_tile`].
pub fn lon_lat_to_slippy(lon: f64, lat: f64, zoom: u8) -> Result<(u32, u32), ProjectionError> {
    let (x, y) = lon_lat_to_tile(lon, lat, zoom)?;
    let last = f64::from(1_u32 << zoom) - 1.0;
    // Both values lie in 0..2^30 after clamping, so the casts are exact.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let tile = (x.floor().clamp(0.0, last) as u32, y.floor().clamp(0.0, last) as u32);
    Ok(tile)
}

/// Width of one tile in metres at the equator.
///
/// # Errors
///
/// Returns [`ProjectionError::ZoomOutOfRange`] if `zoom > MAX_ZOOM`.
pub fn tile_size_in_metres(zoom: u8) -> Result<f64, ProjectionError> {
    Ok(2.0 * PI * EARTH_RADIUS / tiles_at(zoom)?)
}

/// Converts coordinates of an image whose pixels are slippy tiles.
///
/// Pixel `(x, y)` maps to the top-left corner of tile
/// `(x_offset + x, y_offset + y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlippyToLonLat {
    x_offset: f64,
    y_offset: f64,
    tiles: f64,
}

impl SlippyToLonLat {
    /// # Errors
    ///
    /// Returns [`ProjectionError::ZoomOutOfRange`] if `zoom > MAX_ZOOM`.
    pub fn new(x_offset: f64, y_offset: f64, zoom: u8) -> Result<Self, ProjectionError> {
        Ok(Self {
            x_offset,
            y_offset,
            tiles: tiles_at(zoom)?,
        })
    }
}

impl PointConverter for SlippyToLonLat {
    fn convert(&self, x: f64, y: f64) -> (f64, f64) {
        tile_to_lon_lat(self.x_offset + x, self.y_offset + y, self.tiles)
    }
}

/// Converts coordinates of a map image rendered at [`TILE_PIXELS`] pixels
/// per tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelToLonLat {
    /// World pixel coordinates of image pixel `(0, 0)`.
    origin_x: f64,
    origin_y: f64,
    tiles: f64,
}

impl PixelToLonLat {
    /// Converter for a `width x height` image centred on
    /// `(center_lon, center_lat)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the zoom or the centre is out of range.
    pub fn new(
        center_lon: f64,
        center_lat: f64,
        zoom: u8,
        width: u32,
        height: u32,
    ) -> Result<Self, ProjectionError> {
        let mut conv = Self::from_origin(center_lon, center_lat, zoom)?;
        conv.origin_x -= f64::from(width) / 2.0;
        conv.origin_y -= f64::from(height) / 2.0;
        Ok(conv)
    }

    /// Converter for an image whose top-left pixel sits at
    /// `(origin_lon, origin_lat)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the zoom or the origin is out of range.
    pub fn from_origin(origin_lon: f64, origin_lat: f64, zoom: u8) -> Result<Self, ProjectionError> {
        let (x, y) = lon_lat_to_tile(origin_lon, origin_lat, zoom)?;
        Ok(Self {
            origin_x: x * TILE_PIXELS,
            origin_y: y * TILE_PIXELS,
            tiles: tiles_at(zoom)?,
        })
    }
}

impl PointConverter for PixelToLonLat {
    fn convert(&self, x: f64, y: f64) -> (f64, f64) {
        tile_to_lon_lat(
            (self.origin_x + x) / TILE_PIXELS,
            (self.origin_y + y) / TILE_PIXELS,
            self.tiles,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DEG_TOLERANCE: f64 = 0.000_001;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < DEG_TOLERANCE && (a.1 - b.1).abs() < DEG_TOLERANCE
    }

    #[test]
    fn slippy_tile_corner() {
        let lon_lat = slippy_to_lon_lat(1_891_519.0, 1_285_047.0, 21).unwrap();
        assert!(close(lon_lat, (144.700_756_072, -37.569_480_700)), "{lon_lat:?}");
    }

    #[test]
    fn slippy_converter_applies_offset() {
        let conv = SlippyToLonLat::new(1_891_519.0, 1_285_047.0, 21).unwrap();
        assert!(close(conv.convert(0.0, 0.0), (144.700_756_072, -37.569_480_700)));
        let next = slippy_to_lon_lat(1_891_520.0, 1_285_049.0, 21).unwrap();
        assert!(close(conv.convert(1.0, 2.0), next));
    }

    #[test]
    fn lon_lat_to_containing_tile() {
        let tile = lon_lat_to_slippy(144.700_766_0, -37.569_491_0, 21).unwrap();
        assert_eq!(tile, (1_891_519, 1_285_047));
    }

    #[test]
    fn world_corners() {
        assert!(close(slippy_to_lon_lat(0.0, 0.0, 0).unwrap(), (-180.0, MAX_LATITUDE)));
        assert!(close(slippy_to_lon_lat(0.5, 0.5, 0).unwrap(), (0.0, 0.0)));
        assert_eq!(lon_lat_to_slippy(180.0, -MAX_LATITUDE, 3).unwrap(), (7, 7));
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        assert_eq!(
            lon_lat_to_tile(0.0, 86.0, 5),
            Err(ProjectionError::LatitudeOutOfRange(86.0))
        );
        assert_eq!(
            lon_lat_to_tile(181.0, 0.0, 5),
            Err(ProjectionError::LongitudeOutOfRange(181.0))
        );
        assert_eq!(
            slippy_to_lon_lat(0.0, 0.0, 31),
            Err(ProjectionError::ZoomOutOfRange(31))
        );
    }

    #[test]
    fn tile_size_halves_per_zoom() {
        let z0 = tile_size_in_metres(0).unwrap();
        assert!((z0 - 40_075_016.686).abs() < 0.01);
        assert!((tile_size_in_metres(1).unwrap() * 2.0 - z0).abs() < 1e-6);
    }

    #[test]
    fn pixel_converter_from_origin() {
        let origin = slippy_to_lon_lat(1_891_519.0, 1_285_047.0, 21).unwrap();
        let conv = PixelToLonLat::from_origin(origin.0, origin.1, 21).unwrap();
        assert!(close(conv.convert(0.0, 0.0), origin));
        let east = slippy_to_lon_lat(1_891_520.0, 1_285_047.0, 21).unwrap();
        assert!(close(conv.convert(TILE_PIXELS, 0.0), east));
    }

    #[test]
    fn pixel_converter_centres_image() {
        let conv = PixelToLonLat::new(10.0, 20.0, 12, 512, 256).unwrap();
        assert!(close(conv.convert(256.0, 128.0), (10.0, 20.0)));
        let (lon, lat) = conv.convert(0.0, 0.0);
        assert!(lon < 10.0 && lat > 20.0);
    }
}
