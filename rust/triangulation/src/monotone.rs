// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Splitting simple polygons into pieces monotone along the sweep axis.
//!
//! Vertices are ordered by `(y, x)`, ties broken by index. A reflex vertex
//! whose neighbours both come earlier in that order is a merge vertex and is
//! joined to the first later vertex it has an admissible diagonal to; a reflex
//! vertex whose neighbours both come later is a split vertex and looks
//! backwards instead. The diagonals of one round are applied to the piece,
//! then every resulting piece is classified again. Pieces are kept on an
//! explicit worklist, so pathological input cannot exhaust the stack.

use std::cmp::Ordering;

use nalgebra::Point2;
use rustc_hash::FxHashSet;

use crate::config::TriangulationConfig;
use crate::predicates::{cyclic_range, orient, Predicates};

/// Role of a vertex in the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexClass {
    /// Needs no diagonal.
    Regular,
    /// Reflex, both neighbours earlier in sweep order.
    Merge,
    /// Reflex, both neighbours later in sweep order.
    Split,
}

/// Sweep order of a polygon's vertices: by `y`, then `x`, then index.
pub fn sweep_order(points: &[Point2<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| compare_sweep(points, a, b));
    order
}

#[inline]
pub(crate) fn compare_sweep(points: &[Point2<f64>], a: usize, b: usize) -> Ordering {
    let (pa, pb) = (&points[a], &points[b]);
    pa.y.total_cmp(&pb.y)
        .then(pa.x.total_cmp(&pb.x))
        .then(a.cmp(&b))
}

/// Decomposes counter-clockwise simple polygons into monotone pieces.
#[derive(Debug, Clone, Copy)]
pub struct MonotoneDecomposer {
    predicates: Predicates,
}

impl MonotoneDecomposer {
    pub fn new(config: &TriangulationConfig) -> Self {
        Self {
            predicates: Predicates::new(config),
        }
    }

    /// Classifies every vertex of a counter-clockwise polygon.
    pub fn classify(&self, points: &[Point2<f64>]) -> Vec<VertexClass> {
        let n = points.len();
        if n < 4 {
            return vec![VertexClass::Regular; n];
        }

        let order = sweep_order(points);
        let mut rank = vec![0usize; n];
        for (r, &i) in order.iter().enumerate() {
            rank[i] = r;
        }

        (0..n)
            .map(|i| {
                let prev = (i + n - 1) % n;
                let next = (i + 1) % n;
                let turn = orient(&points[prev], &points[i], &points[next]);
                if turn >= -self.predicates.area_tolerance() {
                    return VertexClass::Regular;
                }
                if rank[prev] < rank[i] && rank[next] < rank[i] {
                    VertexClass::Merge
                } else if rank[prev] > rank[i] && rank[next] > rank[i] {
                    VertexClass::Split
                } else {
                    VertexClass::Regular
                }
            })
            .collect()
    }

    /// Diagonals resolving every merge and split vertex that has an
    /// admissible partner, each pair reported once with the smaller index
    /// first.
    pub fn find_diagonals(&self, points: &[Point2<f64>]) -> Vec<(usize, usize)> {
        let classes = self.classify(points);
        if classes.iter().all(|&c| c == VertexClass::Regular) {
            return Vec::new();
        }

        let order = sweep_order(points);
        let mut seen = FxHashSet::default();
        let mut diagonals = Vec::new();
        for (pos, &i) in order.iter().enumerate() {
            let partner = match classes[i] {
                VertexClass::Regular => continue,
                VertexClass::Merge => order[pos + 1..]
                    .iter()
                    .copied()
                    .find(|&j| self.diagonal_fits(points, i, j)),
                VertexClass::Split => order[..pos]
                    .iter()
                    .rev()
                    .copied()
                    .find(|&j| self.diagonal_fits(points, i, j)),
            };
            match partner {
                Some(j) => {
                    let key = (i.min(j), i.max(j));
                    if seen.insert(key) {
                        diagonals.push(key);
                    }
                }
                None => {
                    tracing::debug!(vertex = i, class = ?classes[i], "No admissible diagonal");
                }
            }
        }
        diagonals
    }

    fn diagonal_fits(&self, points: &[Point2<f64>], i: usize, j: usize) -> bool {
        self.predicates.diagonal_is_admissible(points, i, j)
            && !self
                .predicates
                .line_nearly_overlaps_polygon_edge(&points[i], &points[j], points)
    }

    /// Splits a counter-clockwise polygon into monotone pieces, each given as
    /// indices into `points` in polygon order.
    ///
    /// A polygon that needs no diagonal comes back as a single piece. Pieces
    /// whose merge or split vertices have no admissible diagonal are returned
    /// as they are.
    pub fn decompose(&self, points: &[Point2<f64>]) -> Vec<Vec<usize>> {
        let mut work: Vec<Vec<usize>> = vec![(0..points.len()).collect()];
        let mut leaves = Vec::new();

        while let Some(piece) = work.pop() {
            let local: Vec<Point2<f64>> = piece.iter().map(|&i| points[i]).collect();
            let diagonals = self.find_diagonals(&local);
            if diagonals.is_empty() {
                leaves.push(piece);
                continue;
            }

            let parts = self.apply_diagonals(&local, &diagonals);
            if parts.len() == 1 {
                leaves.push(piece);
                continue;
            }
            work.extend(
                parts
                    .into_iter()
                    .map(|part| part.into_iter().map(|k| piece[k]).collect()),
            );
        }

        tracing::trace!(pieces = leaves.len(), "Monotone decomposition");
        leaves
    }

    /// Cuts a polygon along `diagonals` in turn. Each diagonal is checked
    /// again inside the part that holds both its ends; diagonals that no
    /// longer fit are skipped.
    fn apply_diagonals(&self, points: &[Point2<f64>], diagonals: &[(usize, usize)]) -> Vec<Vec<usize>> {
        let mut parts: Vec<Vec<usize>> = vec![(0..points.len()).collect()];

        for &(a, b) in diagonals {
            let Some(slot) = parts.iter().position(|p| p.contains(&a) && p.contains(&b)) else {
                continue;
            };
            let part = &parts[slot];
            let (Some(ia), Some(ib)) = (
                part.iter().position(|&k| k == a),
                part.iter().position(|&k| k == b),
            ) else {
                continue;
            };
            let part_points: Vec<Point2<f64>> = part.iter().map(|&k| points[k]).collect();
            if !self.predicates.diagonal_is_admissible(&part_points, ia, ib) {
                continue;
            }

            let part = parts.swap_remove(slot);
            let n = part.len();
            let first: Vec<usize> = cyclic_range(ia, ib, n).map(|k| part[k]).collect();
            let second: Vec<usize> = cyclic_range(ib, ia, n).map(|k| part[k]).collect();
            parts.push(first);
            parts.push(second);
        }
        parts
    }
}

/// Whether a counter-clockwise polygon is monotone along the sweep axis:
/// walking from its lowest to its highest vertex, both chains only climb.
pub fn is_monotone(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    if n < 4 {
        return n == 3;
    }
    let order = sweep_order(points);
    let (bottom, top) = (order[0], order[n - 1]);

    let climbs = |step: fn(usize, usize) -> usize| {
        let mut i = bottom;
        while i != top {
            let j = step(i, n);
            if compare_sweep(points, i, j) != Ordering::Less {
                return false;
            }
            i = j;
        }
        true
    };
    climbs(|i, n| (i + 1) % n) && climbs(|i, n| (i + n - 1) % n)
}
