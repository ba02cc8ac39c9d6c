//! Assembling traced contours into polygons.
//!
//! Every outer border becomes a polygon exterior and its cleanly nested
//! holes become the interiors. Islands inside holes are reached by
//! recursing through clean children, so the result is a flat
//! [`MultiPolygon`] covering the whole tree.

use std::collections::HashSet;

use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon, Simplify};

use crate::contour::{BorderKind, Contour, ContourTree, ROOT_ID};
use crate::types::{ContourId, Coord};

/// Maps a point from pixel space into another coordinate system.
pub trait PointConverter {
    /// Convert pixel-space `(x, y)`.
    fn convert(&self, x: f64, y: f64) -> (f64, f64);
}

impl<F> PointConverter for F
where
    F: Fn(f64, f64) -> (f64, f64),
{
    fn convert(&self, x: f64, y: f64) -> (f64, f64) {
        self(x, y)
    }
}

/// Errors raised while assembling polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PolygonError {
    /// No outer border produced a ring with at least three points.
    #[error("the contour tree produced no polygons")]
    Empty,
}

/// Options for [`contours_to_multipolygon`].
#[derive(Clone, Copy, Default)]
pub struct PolygonOptions<'a> {
    /// Ramer-Douglas-Peucker tolerance, in output units. Applied after
    /// conversion. `None` keeps every point.
    pub simplify_tolerance: Option<f64>,

    /// Added to both pixel coordinates before conversion.
    pub pixel_offset: f64,

    /// Coordinate conversion applied to every point.
    pub converter: Option<&'a dyn PointConverter>,
}

impl std::fmt::Debug for PolygonOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonOptions")
            .field("simplify_tolerance", &self.simplify_tolerance)
            .field("pixel_offset", &self.pixel_offset)
            .field("converter", &self.converter.map(|_| ".."))
            .finish()
    }
}

/// Build a multipolygon from every outer border in `tree`.
///
/// # Errors
///
/// Returns [`PolygonError::Empty`] if no polygon survives.
pub fn contours_to_multipolygon(
    tree: &ContourTree,
    options: &PolygonOptions<'_>,
) -> Result<MultiPolygon<f64>, PolygonError> {
    let mut polygons = Vec::new();
    collect(tree, tree.root(), options, &mut polygons);

    let mut multi = MultiPolygon::new(polygons);
    if let Some(tolerance) = options.simplify_tolerance {
        multi = multi.simplify(tolerance);
        multi.0.retain(|p| p.exterior().0.len() >= 4);
    }

    if multi.0.is_empty() {
        return Err(PolygonError::Empty);
    }
    log::debug!("assembled {} polygons", multi.0.len());
    Ok(multi)
}

fn collect(
    tree: &ContourTree,
    contour: &Contour,
    options: &PolygonOptions<'_>,
    out: &mut Vec<Polygon<f64>>,
) {
    if contour.is_outer() {
        if let Some(exterior) = ring(contour.points(), options) {
            let interiors = tree
                .children(contour.id())
                .filter(|c| c.is_clean())
                .filter_map(|c| ring(c.points(), options))
                .collect();
            out.push(Polygon::new(exterior, interiors));
        } else {
            log::debug!("dropping degenerate outer border {}", contour.id());
        }
    }

    for child in tree.children(contour.id()).filter(|c| c.is_clean()) {
        collect(tree, child, options, out);
    }
}

/// A closed ring through `points`, or `None` if it has fewer than three
/// distinct points.
fn ring(points: &[Coord], options: &PolygonOptions<'_>) -> Option<LineString<f64>> {
    let distinct: HashSet<Coord> = points.iter().copied().collect();
    if distinct.len() < 3 {
        return None;
    }

    let coords: Vec<GeoCoord<f64>> = points
        .iter()
        .map(|p| {
            let x = f64::from(p.x) + options.pixel_offset;
            let y = f64::from(p.y) + options.pixel_offset;
            let (x, y) = options.converter.map_or((x, y), |c| c.convert(x, y));
            GeoCoord { x, y }
        })
        .collect();
    let mut ring = LineString::new(coords);
    ring.close();
    Some(ring)
}

/// Clear `usable` on every hole that conflicts with an earlier usable
/// sibling.
///
/// Siblings are visited in discovery order. A child already unusable, or
/// colliding with its parent, neither gets marked nor marks others.
/// Returns the number of contours marked.
pub fn mark_conflicting_siblings_unusable(tree: &mut ContourTree) -> usize {
    let parents: Vec<ContourId> = std::iter::once(ROOT_ID)
        .chain(tree.descendants(ROOT_ID).iter().map(|c| c.id()))
        .collect();

    let mut marked = 0;
    for parent in parents {
        let mut claimed: HashSet<ContourId> = HashSet::new();
        let children: Vec<ContourId> = tree.children(parent).map(Contour::id).collect();
        for id in children {
            let Some(child) = tree.get_mut(id) else {
                continue;
            };
            if !child.is_clean() {
                continue;
            }
            if child.kind() == BorderKind::Hole && claimed.contains(&id) {
                child.set_usable(false);
                marked += 1;
                log::debug!("marking hole {id} unusable, it conflicts with a sibling");
                continue;
            }
            claimed.extend(child.conflicts().iter().copied());
        }
    }
    marked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use geo::Area;

    use super::*;
    use crate::builder::find_contours;
    use crate::grid::PixelGrid;

    fn tree(width: u32, height: u32, rects: &[(u32, u32, u32, u32, u8)]) -> ContourTree {
        let mut data = vec![0_u8; (width * height) as usize];
        for &(x0, y0, x1, y1, value) in rects {
            for y in y0..=y1 {
                for x in x0..=x1 {
                    data[(y * width + x) as usize] = value;
                }
            }
        }
        let mut grid = PixelGrid::from_mask(width, height, &data, false).unwrap();
        find_contours(&mut grid).unwrap()
    }

    #[test]
    fn rectangle_becomes_single_polygon() {
        let t = tree(10, 10, &[(2, 2, 5, 4, 1)]);
        let mp = contours_to_multipolygon(&t, &PolygonOptions::default()).unwrap();
        assert_eq!(mp.0.len(), 1);
        assert!(mp.0[0].interiors().is_empty());
        assert!(mp.0[0].exterior().is_closed());
        assert!((mp.unsigned_area() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn clean_hole_becomes_interior() {
        let t = tree(12, 12, &[(1, 1, 8, 8, 1), (4, 4, 5, 5, 0)]);
        let mp = contours_to_multipolygon(&t, &PolygonOptions::default()).unwrap();
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
        assert!((mp.unsigned_area() - 42.0).abs() < 1e-9);
    }

    #[test]
    fn colliding_hole_is_skipped() {
        let t = tree(10, 10, &[(2, 2, 6, 6, 1), (3, 3, 5, 5, 0)]);
        let mp = contours_to_multipolygon(&t, &PolygonOptions::default()).unwrap();
        assert_eq!(mp.0.len(), 1);
        assert!(mp.0[0].interiors().is_empty());
    }

    #[test]
    fn island_inside_hole_is_separate_polygon() {
        let t = tree(
            16,
            12,
            &[(1, 1, 8, 8, 1), (3, 3, 6, 6, 0), (4, 4, 5, 5, 1), (10, 2, 13, 4, 1)],
        );
        let mp = contours_to_multipolygon(&t, &PolygonOptions::default()).unwrap();
        assert_eq!(mp.0.len(), 3);
        assert_eq!(mp.0[0].interiors().len(), 1);
    }

    #[test]
    fn unusable_hole_is_not_an_interior() {
        let mut t = tree(12, 12, &[(1, 1, 8, 8, 1), (4, 4, 5, 5, 0)]);
        t.get_mut(3).unwrap().set_usable(false);
        let mp = contours_to_multipolygon(&t, &PolygonOptions::default()).unwrap();
        assert!(mp.0[0].interiors().is_empty());
    }

    #[test]
    fn degenerate_contours_are_dropped() {
        let t = tree(8, 8, &[(2, 2, 2, 2, 1), (5, 2, 6, 2, 1)]);
        let result = contours_to_multipolygon(&t, &PolygonOptions::default());
        assert_eq!(result, Err(PolygonError::Empty));
    }

    #[test]
    fn converter_and_offset_apply_to_every_point() {
        let t = tree(10, 10, &[(2, 2, 5, 4, 1)]);
        let scale = |x: f64, y: f64| (x * 10.0, -y);
        let options = PolygonOptions {
            pixel_offset: -0.5,
            converter: Some(&scale as &dyn PointConverter),
            ..PolygonOptions::default()
        };
        let mp = contours_to_multipolygon(&t, &options).unwrap();
        let first = mp.0[0].exterior().0[0];
        assert!((first.x - 15.0).abs() < 1e-9);
        assert!((first.y + 1.5).abs() < 1e-9);
    }

    #[test]
    fn simplify_drops_collinear_points() {
        let t = tree(20, 20, &[(2, 2, 15, 12, 1)]);
        let options = PolygonOptions {
            simplify_tolerance: Some(0.5),
            ..PolygonOptions::default()
        };
        let mp = contours_to_multipolygon(&t, &options).unwrap();
        // Four corners plus the closing point.
        assert_eq!(mp.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn conflicting_sibling_hole_is_marked() {
        // Two holes separated by a one-pixel wall both walk over the wall.
        let mut t = tree(12, 8, &[(1, 1, 10, 6, 1), (3, 3, 4, 4, 0), (6, 3, 7, 4, 0)]);
        assert_eq!(t.get(2).unwrap().children(), &[3, 4]);
        assert!(t.get(3).unwrap().conflicts().contains(&4));

        assert_eq!(mark_conflicting_siblings_unusable(&mut t), 1);
        assert!(t.get(3).unwrap().usable());
        assert!(!t.get(4).unwrap().usable());

        let mp = contours_to_multipolygon(&t, &PolygonOptions::default()).unwrap();
        assert_eq!(mp.0[0].interiors().len(), 1);

        // A second pass finds nothing new.
        assert_eq!(mark_conflicting_siblings_unusable(&mut t), 0);
    }
}
