//! Raster scan that discovers every border and assembles the contour tree.
//!
//! [`ContourBuilder`] visits the grid row by row. At each pixel that opens
//! an outer or hole border it walks that border with a
//! [`BorderTracer`], resolves the new contour's parent from the last border
//! seen on the row, and records which borders collided during the walk.

use crate::contour::{BorderKind, ContourTree, ROOT_ID};
use crate::grid::{BACKGROUND, PixelGrid, UNVISITED};
use crate::trace::{BorderTracer, TraceError};
use crate::types::{ContourId, Coord};

/// Errors raised while building a [`ContourTree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Walking border `id` from `start` failed. No partial tree is kept.
    #[error("failed to trace border {id} starting at {start}")]
    Trace {
        id: ContourId,
        start: Coord,
        #[source]
        source: TraceError,
    },

    /// The grid carried a border label that no walk produced, so the
    /// parent of the next border cannot be resolved.
    #[error("label {id} at {at} does not belong to any traced border")]
    UnknownBorder { id: ContourId, at: Coord },
}

/// Builds a [`ContourTree`] from a [`PixelGrid`], consuming its labels.
#[derive(Debug)]
pub struct ContourBuilder<'g> {
    grid: &'g mut PixelGrid,
}

impl<'g> ContourBuilder<'g> {
    /// Create a builder over `grid`. The grid is relabeled by [`Self::build`].
    pub const fn new(grid: &'g mut PixelGrid) -> Self {
        Self { grid }
    }

    /// Scan the grid and trace every border.
    ///
    /// Points are reported in the caller's coordinate space: if the grid
    /// was padded, every coordinate is shifted back by `(-1, -1)`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Trace`] if any walk fails and
    /// [`BuildError::UnknownBorder`] if the grid holds a stray border label.
    pub fn build(mut self) -> Result<ContourTree, BuildError> {
        let (width, height) = self.grid.extent();
        let mut tree = ContourTree::new();
        let mut nbd: ContourId = ROOT_ID;

        for y in 0..height {
            let mut lnbd: ContourId = ROOT_ID;
            for x in 0..width {
                let p = Coord::new(x, y);
                let visited = self.grid.get(p);

                if visited == UNVISITED && (x == 0 || self.grid.get_xy(x - 1, y) == BACKGROUND) {
                    nbd += 1;
                    let candidate = tree
                        .get(lnbd)
                        .ok_or(BuildError::UnknownBorder { id: lnbd, at: p })?;
                    let parent = if candidate.is_outer() {
                        candidate.parent().unwrap_or(ROOT_ID)
                    } else {
                        candidate.id()
                    };
                    self.open(&mut tree, nbd, BorderKind::Outer, parent, p, p.offset(-1, 0))?;
                }

                // The outer walk above may have relabeled this pixel.
                let label = self.grid.get(p);
                if label >= UNVISITED
                    && (x == width - 1 || self.grid.get_xy(x + 1, y) == BACKGROUND)
                {
                    nbd += 1;
                    if label > UNVISITED {
                        lnbd = label.unsigned_abs();
                    }
                    let candidate = tree
                        .get(lnbd)
                        .ok_or(BuildError::UnknownBorder { id: lnbd, at: p })?;
                    let parent = if candidate.is_outer() {
                        candidate.id()
                    } else {
                        candidate.parent().unwrap_or(ROOT_ID)
                    };
                    self.open(&mut tree, nbd, BorderKind::Hole, parent, p, p.offset(1, 0))?;
                }

                if visited.unsigned_abs() > 1 {
                    lnbd = visited.unsigned_abs();
                }
            }
        }

        if self.grid.is_padded() {
            tree.translate(-1, -1);
        }

        let summary = tree.summary();
        log::info!(
            "traced {} borders ({} outer, {} holes, {} conflicting) on a {}x{} grid",
            summary.contours,
            summary.outer,
            summary.holes,
            summary.conflicting,
            width,
            height,
        );
        Ok(tree)
    }

    /// Walk border `id` from `start` and attach it under `parent`.
    fn open(
        &mut self,
        tree: &mut ContourTree,
        id: ContourId,
        kind: BorderKind,
        parent: ContourId,
        start: Coord,
        from: Coord,
    ) -> Result<(), BuildError> {
        let border = BorderTracer::new(self.grid)
            .trace(id, start, from)
            .map_err(|source| {
                log::warn!("walk of border {id} from {start} failed: {source}");
                BuildError::Trace { id, start, source }
            })?;

        let mut points = border.points;
        if points.is_empty() {
            points.push(start);
        }
        let parent_collision = border.collisions.contains(&parent);

        log::debug!(
            "border {id}: {kind:?} under {parent}, {} points, collisions {:?}",
            points.len(),
            border.collisions,
        );

        let pushed = tree.push(kind, parent, points, parent_collision);
        debug_assert_eq!(pushed, id, "border ids must stay sequential");

        for &a in &border.collisions {
            for &b in &border.collisions {
                if a != b {
                    tree.add_conflict(a, b);
                }
            }
        }
        Ok(())
    }
}

/// Trace every border of `grid` into a [`ContourTree`].
///
/// Shorthand for `ContourBuilder::new(grid).build()`.
///
/// # Errors
///
/// See [`ContourBuilder::build`].
pub fn find_contours(grid: &mut PixelGrid) -> Result<ContourTree, BuildError> {
    ContourBuilder::new(grid).build()
}
