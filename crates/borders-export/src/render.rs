//! Raster rendering of contour trees.
//!
//! Paints every border pixel onto a black canvas, cycling through
//! [`PALETTE`] as the tree is walked. The colour restarts at the first
//! entry on every outer border, so each outer border is drawn in red and
//! its holes and islands step through the remaining colours.
//!
//! With [`RenderOptions::flipbook`] set, a snapshot of the canvas is kept
//! after each border is drawn, which shows the order borders were found.

use image::{Rgba, RgbaImage};

use borders_core::{BorderKind, Contour, ContourTree, Dimensions};

use crate::ExportError;

/// Border colours, in the order they are assigned.
pub const PALETTE: [[u8; 3]; 7] = [
    [255, 0, 0],
    [255, 106, 0],
    [255, 216, 0],
    [0, 255, 0],
    [127, 255, 197],
    [72, 0, 255],
    [255, 127, 182],
];

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Options for [`render_contours`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Borders with this many points or fewer are not drawn.
    pub min_points: usize,

    /// Keep a snapshot of the canvas after every drawn border.
    pub flipbook: bool,
}

/// Output of [`render_contours`].
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The finished canvas.
    pub image: RgbaImage,

    /// One snapshot per drawn border, in drawing order. Empty unless
    /// [`RenderOptions::flipbook`] was set.
    pub frames: Vec<RgbaImage>,
}

struct Canvas<'o> {
    image: RgbaImage,
    frames: Vec<RgbaImage>,
    options: &'o RenderOptions,
}

/// Draw every border of `tree` onto a `dimensions`-sized canvas.
///
/// Points outside the canvas are ignored.
#[must_use]
pub fn render_contours(
    tree: &ContourTree,
    dimensions: Dimensions,
    options: &RenderOptions,
) -> Rendered {
    let mut canvas = Canvas {
        image: RgbaImage::from_pixel(dimensions.width, dimensions.height, BACKGROUND),
        frames: Vec::new(),
        options,
    };
    draw(tree, tree.root(), 0, &mut canvas);

    log::debug!(
        "rendered {} borders onto {}x{} canvas",
        tree.len(),
        dimensions.width,
        dimensions.height
    );
    Rendered {
        image: canvas.image,
        frames: canvas.frames,
    }
}

fn draw(tree: &ContourTree, contour: &Contour, colour: usize, canvas: &mut Canvas<'_>) {
    let mut colour = if contour.kind() == BorderKind::Outer {
        0
    } else {
        colour
    };

    let points = contour.points();
    if !points.is_empty() && points.len() > canvas.options.min_points {
        let [r, g, b] = PALETTE[colour];
        let pixel = Rgba([r, g, b, 255]);
        for p in points {
            let (Ok(x), Ok(y)) = (u32::try_from(p.x), u32::try_from(p.y)) else {
                continue;
            };
            if x < canvas.image.width() && y < canvas.image.height() {
                canvas.image.put_pixel(x, y, pixel);
            }
        }
        colour = (colour + 1) % PALETTE.len();

        if canvas.options.flipbook {
            canvas.frames.push(canvas.image.clone());
        }
    }

    for child in tree.children(contour.id()) {
        colour = (colour + 1) % PALETTE.len();
        draw(tree, child, colour, canvas);
    }
}

/// Encode an RGBA image as PNG.
///
/// # Errors
///
/// Returns [`ExportError::Png`] if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}
