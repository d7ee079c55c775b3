// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stack-based triangulation of monotone pieces.
//!
//! The classic sweep: walk the vertices in sweep order, keep a stack of
//! vertices still waiting for triangles, fan across the stack when the walk
//! switches chains and cut off convex corners while it stays on one chain.
//! The output is checked (triangle count, total area, every triangle inside
//! the piece); pieces that fail are handed to earcut, and pieces earcut
//! cannot handle either are dropped.

use nalgebra::Point2;

use crate::config::TriangulationConfig;
use crate::monotone::sweep_order;
use crate::predicates::{orient, signed_area, Predicates};

/// Triangulates counter-clockwise monotone polygons.
#[derive(Debug, Clone, Copy)]
pub struct MonotoneTriangulator {
    predicates: Predicates,
    area_match: f64,
    earcut_fallback: bool,
}

impl MonotoneTriangulator {
    pub fn new(config: &TriangulationConfig) -> Self {
        Self {
            predicates: Predicates::new(config),
            area_match: config.area_match_tolerance,
            earcut_fallback: config.earcut_fallback,
        }
    }

    /// Triangles of a counter-clockwise piece as local index triples, each
    /// counter-clockwise. Empty when the piece could not be triangulated.
    pub fn triangulate(&self, points: &[Point2<f64>]) -> Vec<[usize; 3]> {
        if points.len() < 3 {
            return Vec::new();
        }
        if points.len() == 3 {
            return vec![self.normalize([0, 1, 2], points)];
        }

        let triangles = self.sweep(points);
        if self.is_valid(points, &triangles) {
            return triangles;
        }

        if self.earcut_fallback {
            tracing::warn!(
                vertices = points.len(),
                "Sweep output failed validation, falling back to earcut"
            );
            if let Some(triangles) = self.earcut(points) {
                if self.is_valid(points, &triangles) {
                    return triangles;
                }
            }
        }

        tracing::warn!(vertices = points.len(), "Skipping piece that could not be triangulated");
        Vec::new()
    }

    /// The raw sweep, without validation.
    pub fn sweep(&self, points: &[Point2<f64>]) -> Vec<[usize; 3]> {
        let n = points.len();
        let order = sweep_order(points);
        let (bottom, top) = (order[0], order[n - 1]);

        // Walking forward from the bottom on a counter-clockwise loop climbs
        // the right-hand chain.
        let mut on_right = vec![false; n];
        let mut i = bottom;
        while i != top {
            on_right[i] = true;
            i = (i + 1) % n;
        }

        let eps = self.predicates.area_tolerance();
        let mut triangles = Vec::with_capacity(n - 2);
        let mut stack: Vec<usize> = vec![order[0], order[1]];

        for &current in &order[2..n - 1] {
            let Some(&last) = stack.last() else {
                break;
            };

            if on_right[current] != on_right[last] {
                // Other chain: fan across the whole stack.
                for pair in stack.windows(2) {
                    triangles.push(self.normalize([current, pair[0], pair[1]], points));
                }
                stack.clear();
                stack.push(last);
                stack.push(current);
                continue;
            }

            // Same chain: cut off corners that are convex towards the inside.
            let mut popped = last;
            stack.pop();
            while let Some(&below) = stack.last() {
                let turn = orient(&points[below], &points[popped], &points[current]);
                let convex = if on_right[current] { turn > eps } else { turn < -eps };
                if !convex {
                    break;
                }
                triangles.push(self.normalize([current, popped, below], points));
                popped = below;
                stack.pop();
            }
            stack.push(popped);
            stack.push(current);
        }

        for pair in stack.windows(2) {
            triangles.push(self.normalize([top, pair[0], pair[1]], points));
        }
        triangles
    }

    /// Ear-clipping fallback through `earcutr`.
    pub fn earcut(&self, points: &[Point2<f64>]) -> Option<Vec<[usize; 3]>> {
        let flat: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
        let indices = match earcutr::earcut(&flat, &[], 2) {
            Ok(indices) => indices,
            Err(e) => {
                tracing::debug!(error = ?e, "earcut failed");
                return None;
            }
        };
        Some(
            indices
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|&i| i < points.len()))
                .map(|tri| self.normalize([tri[0], tri[1], tri[2]], points))
                .collect(),
        )
    }

    /// Checks a triangulation of a piece: at most `n - 2` triangles (earcut
    /// skips collinear corners), none clockwise, areas summing to the piece
    /// area and every triangle centroid inside the piece.
    pub fn is_valid(&self, points: &[Point2<f64>], triangles: &[[usize; 3]]) -> bool {
        if triangles.is_empty() || triangles.len() + 2 > points.len() {
            return false;
        }

        let expected = signed_area(points);
        let mut total = 0.0;
        for &[a, b, c] in triangles {
            let (pa, pb, pc) = (&points[a], &points[b], &points[c]);
            let doubled = orient(pa, pb, pc);
            if doubled < 0.0 {
                return false;
            }
            let centroid = Point2::from((pa.coords + pb.coords + pc.coords) / 3.0);
            if doubled > self.predicates.area_tolerance()
                && !self.predicates.point_in_polygon(points, &centroid)
            {
                return false;
            }
            total += doubled * 0.5;
        }

        (total - expected).abs() <= self.area_match * expected.abs().max(f64::MIN_POSITIVE)
    }

    /// Swaps the trailing two indices of a clockwise triangle.
    #[inline]
    fn normalize(&self, [a, b, c]: [usize; 3], points: &[Point2<f64>]) -> [usize; 3] {
        if orient(&points[a], &points[b], &points[c]) < 0.0 {
            [a, c, b]
        } else {
            [a, b, c]
        }
    }
}
