// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Splitting a bridged region into hole-free polygons.
//!
//! Every loop edge becomes a directed half-edge running with the region on its
//! left: boundary edges counter-clockwise, hole edges clockwise. Each bridge
//! contributes one half-edge in each direction. Faces are traced by leaving
//! every vertex along the outgoing half-edge that makes the smallest clockwise
//! turn from the incoming edge, so each half-edge belongs to exactly one face.
//!
//! Faces with positive area are the simple polygons. A bridged hole appears in
//! its face slit open along the bridge, so bridge endpoints occur twice in the
//! vertex list (the polygon is weakly simple). Faces with no area that use
//! bridges mean those bridges add nothing; they are dropped and the faces are
//! traced again.

use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::arena::{LoopId, PolygonArena, VertexRef};
use crate::bridge::Bridge;
use crate::config::TriangulationConfig;
use crate::error::{Error, Result};
use crate::predicates::{signed_area, Predicates};

/// A hole-free polygon traced from the bridged region, counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePolygon {
    pub vertices: Vec<VertexRef>,
    pub area: f64,
}

impl SimplePolygon {
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Working-plane coordinates of the polygon's corners.
    pub fn points(&self, arena: &PolygonArena) -> Vec<Point2<f64>> {
        self.vertices.iter().map(|&v| arena.point(v)).collect()
    }
}

/// A directed edge leaving a vertex; `bridge` is set for bridge half-edges.
#[derive(Debug, Clone, Copy)]
struct HalfEdge {
    from: VertexRef,
    to: VertexRef,
    bridge: Option<usize>,
}

type Outgoing = FxHashMap<VertexRef, SmallVec<[HalfEdge; 3]>>;

/// A closed walk over half-edges.
#[derive(Debug)]
struct Cycle {
    vertices: Vec<VertexRef>,
    bridges: SmallVec<[usize; 4]>,
    area: f64,
}

/// Traces the simple polygons of a bridged region.
pub struct SimplePolygonDecomposer<'a> {
    arena: &'a PolygonArena,
    predicates: Predicates,
}

impl<'a> SimplePolygonDecomposer<'a> {
    pub fn new(arena: &'a PolygonArena, config: &TriangulationConfig) -> Self {
        Self {
            arena,
            predicates: Predicates::new(config),
        }
    }

    /// Splits the region into simple polygons along `bridges`.
    pub fn decompose(&self, bridges: &[Bridge]) -> Result<Vec<SimplePolygon>> {
        let mut removed: FxHashSet<usize> = FxHashSet::default();

        // Every round removes at least one bridge or stops.
        let cycles = loop {
            let cycles = self.trace(bridges, &removed);
            let mut peeled = false;
            for cycle in &cycles {
                if cycle.area > self.predicates.area_tolerance() {
                    continue;
                }
                for &id in &cycle.bridges {
                    peeled |= removed.insert(id);
                }
            }
            if !peeled {
                break cycles;
            }
            tracing::debug!(removed = removed.len(), "Dropped bridges bounding empty faces");
        };

        let mut polygons = Vec::new();
        for cycle in cycles {
            if cycle.area > self.predicates.area_tolerance() {
                polygons.push(SimplePolygon {
                    vertices: cycle.vertices,
                    area: cycle.area,
                });
            } else if cycle.bridges.is_empty() {
                let input = cycle
                    .vertices
                    .first()
                    .and_then(|v| self.arena.input_hole(v.owner));
                if let Some(hole) = input {
                    tracing::warn!(hole, "Hole is not bridged; its area stays covered");
                }
            }
        }

        if polygons.is_empty() {
            return Err(Error::Decomposition(
                "no face with positive area could be traced".to_string(),
            ));
        }
        tracing::debug!(
            faces = polygons.len(),
            bridges = bridges.len() - removed.len(),
            "Traced simple polygons"
        );
        Ok(polygons)
    }

    // =========================================================================
    // Face tracing
    // =========================================================================

    /// Loop half-edges followed by the half-edges of every bridge not in
    /// `removed`, keyed by their start vertex.
    fn half_edges(&self, bridges: &[Bridge], removed: &FxHashSet<usize>) -> (Vec<HalfEdge>, Outgoing) {
        let arena = self.arena;
        let mut all = Vec::with_capacity(arena.vertex_count() + 2 * bridges.len());
        for v in arena.vertices() {
            all.push(HalfEdge {
                from: v,
                to: arena.next(v),
                bridge: None,
            });
        }
        for (id, bridge) in bridges.iter().enumerate() {
            if removed.contains(&id) {
                continue;
            }
            for (from, to) in [(bridge.a, bridge.b), (bridge.b, bridge.a)] {
                all.push(HalfEdge {
                    from,
                    to,
                    bridge: Some(id),
                });
            }
        }

        let mut outgoing: Outgoing = FxHashMap::default();
        for edge in &all {
            outgoing.entry(edge.from).or_default().push(*edge);
        }
        (all, outgoing)
    }

    fn trace(&self, bridges: &[Bridge], removed: &FxHashSet<usize>) -> Vec<Cycle> {
        let (all, outgoing) = self.half_edges(bridges, removed);
        let max_steps = all.len() + 1;
        let mut visited: FxHashSet<(VertexRef, VertexRef)> = FxHashSet::default();
        let mut cycles = Vec::new();

        for &start in &all {
            if !visited.insert((start.from, start.to)) {
                continue;
            }

            let mut vertices = Vec::new();
            let mut cycle_bridges: SmallVec<[usize; 4]> = SmallVec::new();
            let mut current = start;
            let mut closed = false;
            for _ in 0..max_steps {
                vertices.push(current.from);
                if let Some(id) = current.bridge {
                    cycle_bridges.push(id);
                }
                let Some(next) = self.next_half_edge(&outgoing, &current) else {
                    break;
                };
                if next.from == start.from && next.to == start.to {
                    closed = true;
                    break;
                }
                if !visited.insert((next.from, next.to)) {
                    break;
                }
                current = next;
            }

            if !closed {
                tracing::warn!(
                    start = ?start.from,
                    steps = vertices.len(),
                    "Face walk did not close; skipping it"
                );
                continue;
            }

            let points: Vec<Point2<f64>> = vertices.iter().map(|&v| self.arena.point(v)).collect();
            cycles.push(Cycle {
                area: signed_area(&points),
                vertices,
                bridges: cycle_bridges,
            });
        }
        cycles
    }

    /// The half-edge leaving `edge.to` with the smallest clockwise turn from
    /// the direction back along `edge`. Going straight back counts as a full
    /// turn, so it is only taken at a dead end.
    fn next_half_edge(&self, outgoing: &Outgoing, edge: &HalfEdge) -> Option<HalfEdge> {
        let arena = self.arena;
        let at = arena.point(edge.to);
        let back = arena.point(edge.from) - at;

        outgoing
            .get(&edge.to)?
            .iter()
            .map(|candidate| {
                let angle = if candidate.to == edge.from {
                    TAU
                } else {
                    clockwise_angle(&back, &(arena.point(candidate.to) - at))
                };
                (angle, *candidate)
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate)
    }
}

/// Clockwise angle in `[0, 2π)` that turns `from` onto `to`.
fn clockwise_angle(from: &Vector2<f64>, to: &Vector2<f64>) -> f64 {
    let counter_clockwise = from.perp(to).atan2(from.dot(to));
    (-counter_clockwise).rem_euclid(TAU)
}

/// Loops whose vertices appear in at least one traced polygon.
pub fn covered_loops(polygons: &[SimplePolygon]) -> FxHashSet<LoopId> {
    polygons
        .iter()
        .flat_map(|polygon| polygon.vertices.iter().map(|v| v.owner))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeBuilder;
    use approx::assert_relative_eq;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2<f64>> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2<f64>> {
        pts(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
    }

    fn arena(boundary: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> PolygonArena {
        PolygonArena::from_2d(&boundary, &holes, &Predicates::default()).unwrap()
    }

    #[test]
    fn boundary_alone_is_one_polygon() {
        let config = TriangulationConfig::default();
        let arena = arena(square(0.0, 0.0, 10.0, 10.0), vec![]);
        let polygons = SimplePolygonDecomposer::new(&arena, &config).decompose(&[]).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].len(), 4);
        assert_relative_eq!(polygons[0].area, 100.0, epsilon = 1e-9);
    }

    #[test]
    fn single_bridge_slits_hole_open() {
        let config = TriangulationConfig::default();
        let arena = arena(square(0.0, 0.0, 10.0, 10.0), vec![square(4.0, 4.0, 6.0, 6.0)]);

        // Hole corner (4, 4) is index 3 after the hole is turned clockwise
        let corner = VertexRef::new(LoopId::Hole(0), 3);
        let origin = VertexRef::new(LoopId::Boundary, 0);
        assert_eq!(arena.point(corner), Point2::new(-1.0, -1.0));
        let bridges = [Bridge::new(origin, corner)];

        let polygons = SimplePolygonDecomposer::new(&arena, &config)
            .decompose(&bridges)
            .unwrap();
        assert_eq!(polygons.len(), 1);
        // Four boundary corners, four hole corners, both bridge ends twice
        assert_eq!(polygons[0].len(), 10);
        assert_relative_eq!(polygons[0].area, 96.0, epsilon = 1e-9);
    }

    #[test]
    fn built_bridges_split_region() {
        let config = TriangulationConfig::default();
        let arena = arena(square(0.0, 0.0, 10.0, 10.0), vec![square(4.0, 4.0, 6.0, 6.0)]);
        let set = BridgeBuilder::new(&arena, &config).build();

        let polygons = SimplePolygonDecomposer::new(&arena, &config)
            .decompose(&set.bridges)
            .unwrap();
        let total: f64 = polygons.iter().map(|p| p.area).sum();
        assert_relative_eq!(total, 96.0, epsilon = 1e-9);
        assert!(polygons.iter().all(|p| p.area > 0.0));
        assert!(covered_loops(&polygons).contains(&LoopId::Hole(0)));
    }

    #[test]
    fn two_holes_are_covered() {
        let config = TriangulationConfig::default();
        let arena = arena(
            square(0.0, 0.0, 12.0, 6.0),
            vec![square(2.0, 2.0, 4.0, 4.0), square(8.0, 2.0, 10.0, 4.0)],
        );
        let set = BridgeBuilder::new(&arena, &config).build();
        let polygons = SimplePolygonDecomposer::new(&arena, &config)
            .decompose(&set.bridges)
            .unwrap();

        let total: f64 = polygons.iter().map(|p| p.area).sum();
        assert_relative_eq!(total, 72.0 - 8.0, epsilon = 1e-9);
        let covered = covered_loops(&polygons);
        assert!(covered.contains(&LoopId::Hole(0)));
        assert!(covered.contains(&LoopId::Hole(1)));
    }

    #[test]
    fn unbridged_hole_leaves_boundary_face() {
        let config = TriangulationConfig::default();
        let arena = arena(square(0.0, 0.0, 10.0, 10.0), vec![square(4.0, 4.0, 6.0, 6.0)]);
        let polygons = SimplePolygonDecomposer::new(&arena, &config).decompose(&[]).unwrap();
        assert_eq!(polygons.len(), 1);
        assert_relative_eq!(polygons[0].area, 100.0, epsilon = 1e-9);
        assert!(!covered_loops(&polygons).contains(&LoopId::Hole(0)));
    }

    #[test]
    fn clockwise_angles() {
        let east = Vector2::new(1.0, 0.0);
        let south = Vector2::new(0.0, -1.0);
        let north = Vector2::new(0.0, 1.0);
        assert_relative_eq!(clockwise_angle(&east, &south), TAU / 4.0, epsilon = 1e-12);
        assert_relative_eq!(clockwise_angle(&east, &north), 3.0 * TAU / 4.0, epsilon = 1e-12);
        assert_relative_eq!(clockwise_angle(&east, &east), 0.0, epsilon = 1e-12);
    }
}
