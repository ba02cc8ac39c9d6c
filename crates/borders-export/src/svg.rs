//! SVG export serializer.
//!
//! Converts a contour tree into an SVG string with one `<path>` element
//! per border, using the [`svg`] crate for document construction, XML
//! escaping, and path data formatting.
//!
//! Each border becomes a closed path (`M`, `L` ..., `z`) in pixel
//! coordinates, so the document's `viewBox` matches the source image.
//! Outer borders and holes are stroked in different colours, and every
//! path carries `data-id` and `data-parent` attributes linking it back to
//! the tree.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements for
//! accessibility and to help file managers identify exported files.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use borders_core::{BorderKind, Contour, ContourTree, Coord, Dimensions, ROOT_ID};

/// Stroke colour of outer borders.
const OUTER_STROKE: &str = "black";
/// Stroke colour of hole borders.
const HOLE_STROKE: &str = "red";

/// Metadata to embed in the SVG document.
///
/// All fields are optional.  When present, a `<title>` and/or `<desc>`
/// element is emitted immediately after the opening `<svg>` tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized processing configuration, emitted inside a
    /// `<metadata>` element so exported files carry the settings that
    /// produced them.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string for a closed border.
///
/// Returns an empty string for borders with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use borders_core::Coord;
/// use borders_export::svg::build_path_data;
///
/// let d = build_path_data(&[Coord::new(1, 2), Coord::new(3, 4)]);
/// assert!(d.starts_with("M1,2 L3,4"));
/// ```
#[must_use]
pub fn build_path_data(points: &[Coord]) -> String {
    let [first, rest @ ..] = points else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data.close()))
}

/// Serialize every border in `tree` into an SVG document string.
///
/// Borders are emitted in tree pre-order, so holes follow their outer
/// border. Borders with fewer than 2 points are skipped.
#[must_use]
pub fn to_svg(tree: &ContourTree, dimensions: Dimensions, metadata: &SvgMetadata<'_>) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    // Optional <title> element
    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    // Optional <desc> element
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    // Optional <metadata> element with the processing config
    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("borders:config");
        config_el.assign("xmlns:borders", "urn:borders:config");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    let mut emitted = 0_usize;
    for contour in tree.descendants(ROOT_ID) {
        let d = build_path_data(contour.points());
        if d.is_empty() {
            continue;
        }
        doc = doc.add(contour_path(contour, d));
        emitted += 1;
    }
    log::debug!("svg: {emitted} paths for {} borders", tree.len());

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

fn contour_path(contour: &Contour, d: String) -> Path {
    let (class, stroke) = match contour.kind() {
        BorderKind::Outer => ("outer", OUTER_STROKE),
        BorderKind::Hole => ("hole", HOLE_STROKE),
    };
    let mut path = Path::new()
        .set("d", d)
        .set("class", class)
        .set("fill", "none")
        .set("stroke", stroke)
        .set("stroke-width", 1)
        .set("data-id", contour.id())
        .set("data-parent", contour.parent().unwrap_or(ROOT_ID));
    if !contour.is_clean() {
        path = path.set("stroke-dasharray", "2 1");
    }
    path
}
