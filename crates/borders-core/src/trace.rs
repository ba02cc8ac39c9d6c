//! Single-border walking over an 8-connected neighborhood.
//!
//! [`BorderTracer`] follows one border of the [`PixelGrid`] from a start
//! pixel, labeling the pixels it passes and recording which other borders
//! it ran into. It is invoked once per border by the
//! [`ContourBuilder`](crate::ContourBuilder) scan.

use std::collections::HashSet;

use crate::grid::{PixelGrid, UNVISITED, edge_label, interior_label};
use crate::types::{ContourId, Coord};

/// Errors raised while walking a border.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    /// Two pixels that should be 8-adjacent are not.
    ///
    /// This is an algorithmic invariant violation, never a transient
    /// condition.
    #[error("no direction leads from {from} to {to}")]
    DirectionUndefined { from: Coord, to: Coord },

    /// A border with more than one pixel starts on the grid's outer ring.
    ///
    /// Probes never return ring pixels, so such a walk can never come back
    /// to its start. The grid needs padding.
    #[error("border starting at {start} lies on the outer ring of an unpadded grid")]
    StartOnOuterRing { start: Coord },
}

/// One of the eight neighbor directions, indexed clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Direction(u8);

impl Direction {
    /// Unit vectors for each direction index.
    pub const DELTAS: [(i32, i32); 8] = [
        (0, -1),
        (1, -1),
        (1, 0),
        (1, 1),
        (0, 1),
        (-1, 1),
        (-1, 0),
        (-1, -1),
    ];

    pub const NORTH: Self = Self(0);
    pub const NORTH_EAST: Self = Self(1);
    pub const EAST: Self = Self(2);
    pub const SOUTH_EAST: Self = Self(3);
    pub const SOUTH: Self = Self(4);
    pub const SOUTH_WEST: Self = Self(5);
    pub const WEST: Self = Self(6);
    pub const NORTH_WEST: Self = Self(7);

    /// Direction with the given index, wrapped into `0..8`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_index(index: usize) -> Self {
        Self((index % 8) as u8)
    }

    /// Index of this direction in `0..8`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The next direction clockwise.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        Self((self.0 + 1) % 8)
    }

    /// The next direction counter-clockwise.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        Self((self.0 + 7) % 8)
    }

    /// Unit vector `(dx, dy)` of this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        Self::DELTAS[self.0 as usize]
    }

    /// The pixel one step from `p` in this direction.
    #[must_use]
    pub const fn step(self, p: Coord) -> Coord {
        let (dx, dy) = self.delta();
        p.offset(dx, dy)
    }

    /// Direction whose unit vector equals `to - from`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::DirectionUndefined`] if `to` is not one of the
    /// eight neighbors of `from`.
    pub fn between(from: Coord, to: Coord) -> Result<Self, TraceError> {
        let delta = (to.x - from.x, to.y - from.y);
        Self::DELTAS
            .iter()
            .position(|&d| d == delta)
            .map(Self::from_index)
            .ok_or(TraceError::DirectionUndefined { from, to })
    }
}

/// The outcome of walking one border.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Border {
    /// Boundary pixels in walk order. The cycle is implicitly closed: the
    /// last point neighbors the first, which is not repeated.
    pub points: Vec<Coord>,

    /// Ids of every border this walk touched, including its own id
    /// whenever anything was recorded. Empty when the walk only crossed
    /// unvisited pixels.
    pub collisions: HashSet<ContourId>,
}

/// Walks single borders of a grid, mutating its labels as it goes.
#[derive(Debug)]
pub struct BorderTracer<'g> {
    grid: &'g mut PixelGrid,
}

impl<'g> BorderTracer<'g> {
    /// Create a tracer over `grid`.
    pub const fn new(grid: &'g mut PixelGrid) -> Self {
        Self { grid }
    }

    /// The neighbor of `pixel` in direction `dir`, if it is off the grid's
    /// outer ring and not background.
    #[must_use]
    pub fn neighbor(&self, pixel: Coord, dir: Direction) -> Option<Coord> {
        let next = dir.step(pixel);
        (self.grid.is_interior(next) && self.grid.get(next) != 0).then_some(next)
    }

    /// Walk border `id` starting at `start`, entering from the neighbor
    /// `from` (a background pixel, or a pixel off the grid's interior).
    ///
    /// Pixels on the walk are labeled `-id` when the probe around them
    /// passed the east neighbor without finding foreground or when they
    /// sit on the last row, and `id` when they were still unvisited.
    /// Existing border labels are left alone but reported in
    /// [`Border::collisions`].
    ///
    /// An isolated pixel is labeled `-id` and returned as a one-point
    /// border.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::DirectionUndefined`] if two consecutive walk
    /// pixels turn out not to be adjacent, or if `from` is not a neighbor
    /// of `start`. Returns [`TraceError::StartOnOuterRing`] if `start` is on
    /// the outer ring and has a foreground neighbor. The walk is abandoned
    /// and the grid is left partially labeled.
    pub fn trace(&mut self, id: ContourId, start: Coord, from: Coord) -> Result<Border, TraceError> {
        let mut border = Border::default();

        // Search clockwise from the entry direction for the first
        // non-background neighbor.
        let entry = Direction::between(start, from)?;
        let mut dir = entry.clockwise();
        let mut seed = None;
        while dir != entry {
            if let Some(p) = self.neighbor(start, dir) {
                seed = Some(p);
                break;
            }
            dir = dir.clockwise();
        }

        let Some(p1) = seed else {
            self.grid.set(start, edge_label(id));
            border.points.push(start);
            return Ok(border);
        };
        if !self.grid.is_interior(start) {
            return Err(TraceError::StartOnOuterRing { start });
        }

        let mut trailing = p1;
        let mut current = start;
        loop {
            let back = Direction::between(current, trailing)?;
            let mut dir = back.counter_clockwise();
            let mut east_is_background = false;

            // The eighth probe lands on `trailing` again, so at least one
            // probe always succeeds.
            let mut next = trailing;
            for _ in 0..8 {
                if let Some(p) = self.neighbor(current, dir) {
                    next = p;
                    break;
                }
                if dir == Direction::EAST {
                    east_is_background = true;
                }
                dir = dir.counter_clockwise();
            }

            let label = self.grid.get(current);
            if label != 0 && label != UNVISITED {
                border.collisions.insert(label.unsigned_abs());
                border.collisions.insert(id);
            }

            border.points.push(current);
            if self.grid.is_last_row(current.y) || east_is_background {
                self.grid.set(current, edge_label(id));
            } else if label == UNVISITED {
                self.grid.set(current, interior_label(id));
            }

            if next == start && current == p1 {
                break;
            }

            trailing = current;
            current = next;
        }

        Ok(border)
    }
}
