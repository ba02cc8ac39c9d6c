//! The contour hierarchy produced by border following.
//!
//! Contours live in an arena indexed by id: the contour with id `n` sits at
//! index `n - 1`. Children are owned as id lists and the parent is a plain
//! id, so the tree holds no references into itself.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{ContourId, Coord};

/// Id of the sentinel root present in every [`ContourTree`].
pub const ROOT_ID: ContourId = 1;

/// Whether a border separates foreground from the surrounding background
/// or from a hole inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderKind {
    /// Border between a foreground component and the background around it.
    Outer,
    /// Border between a foreground component and a hole it encloses.
    Hole,
}

/// One traced border.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contour {
    id: ContourId,
    kind: BorderKind,
    parent: Option<ContourId>,
    points: Vec<Coord>,
    children: Vec<ContourId>,
    conflicts: HashSet<ContourId>,
    parent_collision: bool,
    usable: bool,
}

impl Contour {
    /// Sequential border id. The first traced border is 2.
    #[must_use]
    pub const fn id(&self) -> ContourId {
        self.id
    }

    /// Outer or hole.
    #[must_use]
    pub const fn kind(&self) -> BorderKind {
        self.kind
    }

    /// Whether this is an outer border.
    #[must_use]
    pub fn is_outer(&self) -> bool {
        self.kind == BorderKind::Outer
    }

    /// Id of the parent contour. `None` only for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<ContourId> {
        self.parent
    }

    /// Boundary pixels in walk order. The ring is implicitly closed.
    #[must_use]
    pub fn points(&self) -> &[Coord] {
        &self.points
    }

    /// Ids of the direct children, in discovery order.
    #[must_use]
    pub fn children(&self) -> &[ContourId] {
        &self.children
    }

    /// Ids of borders that shared pixels with this one during a walk.
    #[must_use]
    pub const fn conflicts(&self) -> &HashSet<ContourId> {
        &self.conflicts
    }

    /// Whether this contour's walk ran into its own parent.
    #[must_use]
    pub const fn parent_collision(&self) -> bool {
        self.parent_collision
    }

    /// Whether downstream consumers should use this contour.
    #[must_use]
    pub const fn usable(&self) -> bool {
        self.usable
    }

    /// Mark this contour usable or not.
    pub const fn set_usable(&mut self, usable: bool) {
        self.usable = usable;
    }

    /// Whether this contour is usable and cleanly nested in its parent.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.usable && !self.parent_collision
    }
}

/// Raised by [`ContourTree::check_conflict_symmetry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("contour {from} lists {to} as a conflict but not the other way around")]
pub struct ConflictAsymmetry {
    pub from: ContourId,
    pub to: ContourId,
}

/// Counts describing a [`ContourTree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSummary {
    /// Traced borders, excluding the root.
    pub contours: usize,
    pub outer: usize,
    pub holes: usize,
    /// Borders with a non-empty conflict set.
    pub conflicting: usize,
    pub parent_collisions: usize,
    pub unusable: usize,
    /// Total boundary pixels over all borders.
    pub points: usize,
    /// Deepest nesting level. Children of the root are at depth 1.
    pub depth: usize,
}

/// The sentinel root and every border discovered beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContourTree {
    contours: Vec<Contour>,
}

impl Default for ContourTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContourTree {
    /// A tree holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contours: vec![Contour {
                id: ROOT_ID,
                kind: BorderKind::Hole,
                parent: None,
                points: Vec::new(),
                children: Vec::new(),
                conflicts: HashSet::new(),
                parent_collision: false,
                usable: true,
            }],
        }
    }

    /// Number of traced borders, excluding the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contours.len() - 1
    }

    /// Whether no border was traced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sentinel root (id 1, kind [`BorderKind::Hole`], no points).
    #[must_use]
    pub fn root(&self) -> &Contour {
        &self.contours[0]
    }

    /// The contour with the given id.
    #[must_use]
    pub fn get(&self, id: ContourId) -> Option<&Contour> {
        self.contours.get(slot(id)?)
    }

    /// Mutable access to the contour with the given id.
    #[must_use]
    pub fn get_mut(&mut self, id: ContourId) -> Option<&mut Contour> {
        self.contours.get_mut(slot(id)?)
    }

    /// Traced borders in id order, excluding the root.
    pub fn iter(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter().skip(1)
    }

    /// Direct children of `id`. Empty for unknown ids.
    pub fn children(&self, id: ContourId) -> impl Iterator<Item = &Contour> {
        self.get(id)
            .map(Contour::children)
            .unwrap_or_default()
            .iter()
            .filter_map(|&child| self.get(child))
    }

    /// Every contour below `id` in pre-order (parents before their
    /// children, siblings in discovery order). `id` itself is excluded.
    #[must_use]
    pub fn descendants(&self, id: ContourId) -> Vec<&Contour> {
        let mut out = Vec::new();
        let mut stack: Vec<ContourId> = self
            .get(id)
            .map(|c| c.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(contour) = self.get(next) {
                out.push(contour);
                stack.extend(contour.children.iter().rev());
            }
        }
        out
    }

    /// The points of every border, concatenated in pre-order.
    #[must_use]
    pub fn all_points(&self) -> Vec<Coord> {
        self.descendants(ROOT_ID)
            .into_iter()
            .flat_map(|c| c.points.iter().copied())
            .collect()
    }

    /// Nesting depth of `id`: 0 for the root, 1 for its children.
    #[must_use]
    pub fn depth(&self, id: ContourId) -> Option<usize> {
        let mut contour = self.get(id)?;
        let mut depth = 0;
        while let Some(parent) = contour.parent {
            contour = self.get(parent)?;
            depth += 1;
        }
        Some(depth)
    }

    /// Aggregate counts over the tree.
    #[must_use]
    pub fn summary(&self) -> TreeSummary {
        let mut summary = TreeSummary {
            contours: self.len(),
            ..TreeSummary::default()
        };
        for contour in self.iter() {
            match contour.kind {
                BorderKind::Outer => summary.outer += 1,
                BorderKind::Hole => summary.holes += 1,
            }
            summary.conflicting += usize::from(!contour.conflicts.is_empty());
            summary.parent_collisions += usize::from(contour.parent_collision);
            summary.unusable += usize::from(!contour.usable);
            summary.points += contour.points.len();
            summary.depth = summary.depth.max(self.depth(contour.id).unwrap_or(0));
        }
        summary
    }

    /// Verify that every conflict is recorded on both contours.
    ///
    /// # Errors
    ///
    /// Returns the first one-sided pair found.
    pub fn check_conflict_symmetry(&self) -> Result<(), ConflictAsymmetry> {
        for contour in &self.contours {
            for &other in &contour.conflicts {
                let mirrored = self
                    .get(other)
                    .is_some_and(|o| o.conflicts.contains(&contour.id));
                if !mirrored {
                    return Err(ConflictAsymmetry {
                        from: contour.id,
                        to: other,
                    });
                }
            }
        }
        Ok(())
    }

    /// Append a new border under `parent` and return its id.
    ///
    /// `parent` must already be in the tree.
    pub(crate) fn push(
        &mut self,
        kind: BorderKind,
        parent: ContourId,
        points: Vec<Coord>,
        parent_collision: bool,
    ) -> ContourId {
        let id = ContourId::try_from(self.contours.len() + 1).unwrap_or(ContourId::MAX);
        self.contours.push(Contour {
            id,
            kind,
            parent: Some(parent),
            points,
            children: Vec::new(),
            conflicts: HashSet::new(),
            parent_collision,
            usable: true,
        });
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Record `b` in the conflict set of `a`.
    pub(crate) fn add_conflict(&mut self, a: ContourId, b: ContourId) {
        if let Some(contour) = self.get_mut(a) {
            contour.conflicts.insert(b);
        }
    }

    /// Move every point in the tree by `(dx, dy)`.
    pub(crate) fn translate(&mut self, dx: i32, dy: i32) {
        for contour in &mut self.contours {
            for p in &mut contour.points {
                *p = p.offset(dx, dy);
            }
        }
    }
}

fn slot(id: ContourId) -> Option<usize> {
    usize::try_from(id).ok()?.checked_sub(1)
}
