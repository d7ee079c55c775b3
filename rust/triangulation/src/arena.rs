// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loop storage for one triangulation call.
//!
//! The [`PolygonArena`] owns the outer boundary and every hole as parallel
//! arrays of working-plane points and original 3D positions. Everything else
//! in the pipeline (bridges, faces, diagonals) refers to points through a
//! [`VertexRef`], an `(owner, index)` pair, so no coordinates are copied and no
//! loop aliases another.
//!
//! On construction the arena normalizes its input: coordinates are shifted so
//! the boundary centroid sits at the origin, collinear and duplicate vertices
//! are dropped, the boundary is made counter-clockwise and every hole
//! clockwise.

use std::fmt;

use nalgebra::{Point2, Point3, Vector2};

use crate::error::{Error, Result};
use crate::plane::PlaneProjection;
use crate::predicates::{centroid, signed_area, Predicates};

/// Identifies a loop: the outer boundary or one of the holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LoopId {
    Boundary,
    Hole(usize),
}

impl LoopId {
    /// Builds a loop id from an owner number: `-1` is the boundary, `n >= 0`
    /// is hole `n`.
    pub fn from_owner(owner: isize) -> Option<Self> {
        match owner {
            -1 => Some(LoopId::Boundary),
            n if n >= 0 => Some(LoopId::Hole(n as usize)),
            _ => None,
        }
    }

    /// Owner number of this loop (`-1` for the boundary).
    pub fn owner(self) -> isize {
        match self {
            LoopId::Boundary => -1,
            LoopId::Hole(i) => i as isize,
        }
    }

    /// Dense index: 0 for the boundary, `i + 1` for hole `i`.
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            LoopId::Boundary => 0,
            LoopId::Hole(i) => i + 1,
        }
    }

    #[inline]
    pub fn from_slot(slot: usize) -> Self {
        if slot == 0 {
            LoopId::Boundary
        } else {
            LoopId::Hole(slot - 1)
        }
    }

    #[inline]
    pub fn is_boundary(self) -> bool {
        self == LoopId::Boundary
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopId::Boundary => write!(f, "boundary"),
            LoopId::Hole(i) => write!(f, "hole {i}"),
        }
    }
}

/// A point identified by the loop that owns it and its position in that loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexRef {
    pub owner: LoopId,
    pub index: usize,
}

impl VertexRef {
    #[inline]
    pub fn new(owner: LoopId, index: usize) -> Self {
        Self { owner, index }
    }
}

/// One loop: working-plane points and the 3D positions they came from.
#[derive(Debug, Clone, Default)]
pub struct PolygonLoop {
    pub points: Vec<Point2<f64>>,
    pub positions: Vec<Point3<f64>>,
    /// Position of a hole in the caller's hole list. Holes dropped during
    /// cleanup shift the arena's numbering but not this index.
    pub input_index: Option<usize>,
}

impl PolygonLoop {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn reverse(&mut self) {
        self.points.reverse();
        self.positions.reverse();
    }

    /// Drops every vertex that is collinear with, or coincides with, its
    /// current neighbours. Repeats until nothing changes; the remaining
    /// vertices keep their order.
    fn remove_degenerate_vertices(&mut self, predicates: &Predicates) -> usize {
        let mut removed = 0;
        loop {
            let mut changed = false;
            let mut i = 0;
            while i < self.points.len() && self.points.len() >= 3 {
                let n = self.points.len();
                let prev = (i + n - 1) % n;
                let next = (i + 1) % n;
                if predicates.is_collinear(&self.points[prev], &self.points[i], &self.points[next]) {
                    self.points.remove(i);
                    self.positions.remove(i);
                    removed += 1;
                    changed = true;
                } else {
                    i += 1;
                }
            }
            if !changed || self.points.len() < 3 {
                break;
            }
        }
        removed
    }
}

/// Owner of the boundary and hole loops for one triangulation call.
#[derive(Debug, Clone)]
pub struct PolygonArena {
    /// Slot 0 is the boundary, slot `i + 1` is hole `i`.
    loops: Vec<PolygonLoop>,
    /// The caller's boundary turned clockwise on the working plane.
    boundary_reversed: bool,
    /// Shift subtracted from the projected coordinates.
    origin: Vector2<f64>,
}

impl PolygonArena {
    /// Projects, validates and normalizes a boundary and its holes.
    pub fn build(
        boundary: &[Point3<f64>],
        holes: &[Vec<Point3<f64>>],
        projection: PlaneProjection,
        predicates: &Predicates,
    ) -> Result<Self> {
        if boundary.len() < 3 {
            return Err(Error::TooFewPoints {
                loop_id: LoopId::Boundary,
                count: boundary.len(),
            });
        }
        for (i, hole) in holes.iter().enumerate() {
            if hole.len() < 3 {
                return Err(Error::TooFewPoints {
                    loop_id: LoopId::Hole(i),
                    count: hole.len(),
                });
            }
        }
        let all_finite = boundary
            .iter()
            .chain(holes.iter().flatten())
            .all(|p| p.coords.iter().all(|c| c.is_finite()));
        if !all_finite {
            return Err(Error::NonFinite);
        }

        let boundary_2d = projection.project_all(boundary);
        let origin = centroid(&boundary_2d).coords;
        let make_loop = |points: &[Point3<f64>]| PolygonLoop {
            points: points.iter().map(|p| projection.project(p) - origin).collect(),
            positions: points.to_vec(),
            input_index: None,
        };

        let mut outer = make_loop(boundary);
        let dropped = outer.remove_degenerate_vertices(predicates);
        if dropped > 0 {
            tracing::debug!(dropped, "Removed degenerate boundary vertices");
        }
        if outer.len() < 3 {
            return Err(Error::DegenerateBoundary);
        }

        let mut boundary_area = signed_area(&outer.points);
        if boundary_area.abs() <= predicates.area_tolerance() {
            return Err(Error::DegenerateBoundary);
        }
        let boundary_reversed = boundary_area < 0.0;
        if boundary_reversed {
            outer.reverse();
            boundary_area = -boundary_area;
        }

        let mut loops = Vec::with_capacity(holes.len() + 1);
        loops.push(outer);

        let mut hole_area = 0.0;
        for (i, hole) in holes.iter().enumerate() {
            let mut inner = make_loop(hole);
            inner.input_index = Some(i);
            inner.remove_degenerate_vertices(predicates);
            if inner.len() < 3 {
                tracing::warn!(hole = i, "Dropping hole that collapses after cleanup");
                continue;
            }
            let area = signed_area(&inner.points);
            if area.abs() <= predicates.area_tolerance() {
                tracing::warn!(hole = i, "Dropping hole with no area");
                continue;
            }
            if area > 0.0 {
                inner.reverse();
            }
            if area.abs() >= boundary_area {
                return Err(Error::EmptyRegion {
                    boundary_area,
                    hole_area: area.abs(),
                });
            }
            hole_area += area.abs();
            loops.push(inner);
        }

        let remaining = boundary_area - hole_area;
        if remaining <= predicates.min_region_area(boundary_area) {
            return Err(Error::EmptyRegion {
                boundary_area,
                hole_area,
            });
        }

        Ok(Self {
            loops,
            boundary_reversed,
            origin,
        })
    }

    /// Builds an arena from loops that already live in the XY plane.
    pub fn from_2d(
        boundary: &[Point2<f64>],
        holes: &[Vec<Point2<f64>>],
        predicates: &Predicates,
    ) -> Result<Self> {
        let lift = |points: &[Point2<f64>]| -> Vec<Point3<f64>> {
            points.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect()
        };
        let holes_3d: Vec<Vec<Point3<f64>>> = holes.iter().map(|h| lift(h)).collect();
        Self::build(&lift(boundary), &holes_3d, PlaneProjection::XY, predicates)
    }

    #[inline]
    pub fn hole_count(&self) -> usize {
        self.loops.len() - 1
    }

    /// Whether the caller's boundary was clockwise and had to be reversed.
    #[inline]
    pub fn boundary_reversed(&self) -> bool {
        self.boundary_reversed
    }

    /// Shift subtracted from projected coordinates.
    #[inline]
    pub fn origin(&self) -> Vector2<f64> {
        self.origin
    }

    #[inline]
    pub fn get(&self, id: LoopId) -> &PolygonLoop {
        &self.loops[id.slot()]
    }

    /// The caller's index of a hole; `None` for the boundary.
    #[inline]
    pub fn input_hole(&self, id: LoopId) -> Option<usize> {
        self.loops[id.slot()].input_index
    }

    #[inline]
    pub fn points(&self, id: LoopId) -> &[Point2<f64>] {
        &self.loops[id.slot()].points
    }

    #[inline]
    pub fn boundary(&self) -> &[Point2<f64>] {
        &self.loops[0].points
    }

    /// Ids of the boundary followed by every hole.
    pub fn loop_ids(&self) -> impl Iterator<Item = LoopId> {
        (0..self.loops.len()).map(LoopId::from_slot)
    }

    /// Ids of the holes only.
    pub fn hole_ids(&self) -> impl Iterator<Item = LoopId> {
        (0..self.hole_count()).map(LoopId::Hole)
    }

    /// Every vertex of every loop, boundary first.
    pub fn vertices(&self) -> impl Iterator<Item = VertexRef> + '_ {
        self.loop_ids()
            .flat_map(move |id| (0..self.get(id).len()).map(move |i| VertexRef::new(id, i)))
    }

    /// Total number of vertices over all loops.
    pub fn vertex_count(&self) -> usize {
        self.loops.iter().map(PolygonLoop::len).sum()
    }

    #[inline]
    pub fn point(&self, v: VertexRef) -> Point2<f64> {
        self.loops[v.owner.slot()].points[v.index]
    }

    #[inline]
    pub fn position(&self, v: VertexRef) -> Point3<f64> {
        self.loops[v.owner.slot()].positions[v.index]
    }

    #[inline]
    pub fn next(&self, v: VertexRef) -> VertexRef {
        let n = self.get(v.owner).len();
        VertexRef::new(v.owner, (v.index + 1) % n)
    }

    #[inline]
    pub fn prev(&self, v: VertexRef) -> VertexRef {
        let n = self.get(v.owner).len();
        VertexRef::new(v.owner, (v.index + n - 1) % n)
    }

    /// Average of a loop's vertices.
    pub fn loop_centroid(&self, id: LoopId) -> Point2<f64> {
        centroid(self.points(id))
    }

    /// Signed area of a loop in its normalized orientation.
    pub fn loop_area(&self, id: LoopId) -> f64 {
        signed_area(self.points(id))
    }

    /// Boundary area minus the area of all holes.
    pub fn region_area(&self) -> f64 {
        self.loop_ids().map(|id| self.loop_area(id)).sum()
    }
}
