// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridges linking every hole into the boundary.
//!
//! A bridge is a synthetic edge between a hole vertex and a vertex on the
//! boundary or on another hole. Once every hole is reachable from the boundary
//! through bridges, the region can be traced as a set of hole-free polygons.
//!
//! Candidates come from sweeping the vertices under several framings of the
//! same input: as given, with the in-plane axes swapped, and rotated by the
//! configured angles. Axis-aligned edges produce sweep ties in one framing that
//! another framing does not have, so the framings together find bridges a
//! single sweep misses. The candidate lists are interleaved round-robin, then
//! inserted one by one while a [`HoleConnectivityGraph`] tracks which loops
//! they connect. A final pass reconnects holes the main pass left stranded.

use nalgebra::Point2;
use rustc_hash::FxHashSet;

use crate::arena::{LoopId, PolygonArena, VertexRef};
use crate::config::TriangulationConfig;
use crate::graph::HoleConnectivityGraph;
use crate::predicates::Predicates;

/// An unordered pair of vertices joined by a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bridge {
    pub a: VertexRef,
    pub b: VertexRef,
}

impl Bridge {
    /// Creates a bridge; the pair is stored in a canonical order so that a
    /// bridge and its reverse compare equal.
    pub fn new(a: VertexRef, b: VertexRef) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    /// Loops owning the two ends.
    #[inline]
    pub fn loops(&self) -> (LoopId, LoopId) {
        (self.a.owner, self.b.owner)
    }

    /// The end that is not on `id`, if exactly one end is.
    pub fn other_loop(&self, id: LoopId) -> Option<LoopId> {
        match (self.a.owner == id, self.b.owner == id) {
            (true, false) => Some(self.b.owner),
            (false, true) => Some(self.a.owner),
            _ => None,
        }
    }
}

/// One way of looking at the input while sweeping for bridges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Framing {
    /// The working plane as given.
    Identity,
    /// The two in-plane axes swapped.
    SwappedAxes,
    /// Rotated in-plane about the boundary centroid (degrees).
    Rotated(f64),
}

impl Framing {
    /// The framings enabled by a configuration, identity first.
    pub fn from_config(config: &TriangulationConfig) -> Vec<Framing> {
        let mut framings = vec![Framing::Identity];
        if config.swap_axes {
            framings.push(Framing::SwappedAxes);
        }
        framings.extend(config.framing_angles.iter().map(|&deg| Framing::Rotated(deg)));
        framings
    }

    /// Coordinates of `p` in this framing: (sweep axis, secondary axis).
    pub fn apply(&self, p: &Point2<f64>, center: &Point2<f64>) -> (f64, f64) {
        match *self {
            Framing::Identity => (p.x, p.y),
            Framing::SwappedAxes => (p.y, p.x),
            Framing::Rotated(deg) => {
                let (sin, cos) = deg.to_radians().sin_cos();
                let d = p - center;
                (cos * d.x - sin * d.y, sin * d.x + cos * d.y)
            }
        }
    }
}

/// Sweep direction along the framing's first axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    /// Bridges from a hole's leftmost vertices, searching leftwards.
    LeftToRight,
    /// Bridges from a hole's rightmost vertices, searching rightwards.
    RightToLeft,
}

/// The accepted bridges and the graph of loops they connect.
#[derive(Debug, Clone)]
pub struct BridgeSet {
    pub bridges: Vec<Bridge>,
    pub graph: HoleConnectivityGraph,
}

impl BridgeSet {
    /// Whether every hole is reachable from the boundary.
    pub fn is_connected(&self) -> bool {
        self.graph.is_connected()
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}

/// Bridges accepted so far, with slot ids shared with the graph.
struct AcceptedBridges {
    slots: Vec<Option<Bridge>>,
    graph: HoleConnectivityGraph,
}

impl AcceptedBridges {
    fn new(hole_count: usize) -> Self {
        Self {
            slots: Vec::new(),
            graph: HoleConnectivityGraph::new(hole_count),
        }
    }

    fn live(&self) -> impl Iterator<Item = (usize, &Bridge)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_ref().map(|b| (id, b)))
    }

    fn contains(&self, bridge: &Bridge) -> bool {
        self.live().any(|(_, b)| b == bridge)
    }

    fn accept(&mut self, bridge: Bridge) {
        let id = self.slots.len();
        self.slots.push(Some(bridge));
        self.graph.add_bridge(id, bridge);
    }

    fn evict(&mut self, id: usize) {
        if let Some(slot) = self.slots.get_mut(id) {
            if slot.take().is_some() {
                self.graph.remove_bridge(id);
            }
        }
    }

    fn into_set(self) -> BridgeSet {
        BridgeSet {
            bridges: self.slots.into_iter().flatten().collect(),
            graph: self.graph,
        }
    }
}

/// Computes a non-crossing bridge set connecting every hole to the boundary.
pub struct BridgeBuilder<'a> {
    arena: &'a PolygonArena,
    config: &'a TriangulationConfig,
    predicates: Predicates,
}

impl<'a> BridgeBuilder<'a> {
    pub fn new(arena: &'a PolygonArena, config: &'a TriangulationConfig) -> Self {
        Self {
            arena,
            config,
            predicates: Predicates::new(config),
        }
    }

    /// Runs the full bridge search.
    pub fn build(&self) -> BridgeSet {
        let mut accepted = AcceptedBridges::new(self.arena.hole_count());
        if self.arena.hole_count() == 0 {
            return accepted.into_set();
        }

        let candidates = self.candidates();
        let mut rejected = 0usize;
        for candidate in candidates.iter().copied() {
            if !self.try_insert(&mut accepted, candidate) {
                rejected += 1;
            }
        }
        tracing::debug!(
            candidates = candidates.len(),
            rejected,
            accepted = accepted.graph.edge_count(),
            "Bridge candidates inserted"
        );

        self.repair(&mut accepted);

        let set = accepted.into_set();
        if !set.is_connected() {
            let unreachable: Vec<usize> = set
                .graph
                .unreachable_holes()
                .into_iter()
                .filter_map(|id| self.arena.input_hole(id))
                .collect();
            tracing::warn!(?unreachable, "Some holes could not be bridged to the boundary");
        }
        set
    }

    /// Candidate bridges from every framing, interleaved round-robin, with
    /// duplicates and near-overlapping lines removed.
    pub fn candidates(&self) -> Vec<Bridge> {
        let per_framing: Vec<Vec<Bridge>> = Framing::from_config(self.config)
            .into_iter()
            .map(|framing| self.framing_candidates(framing))
            .collect();

        let longest = per_framing.iter().map(Vec::len).max().unwrap_or(0);
        let mut seen = FxHashSet::default();
        let mut merged = Vec::new();
        for round in 0..longest {
            for list in &per_framing {
                if let Some(&bridge) = list.get(round) {
                    if seen.insert(bridge) && !self.nearly_overlaps_loop_edge(&bridge) {
                        merged.push(bridge);
                    }
                }
            }
        }
        merged
    }

    /// Candidates found by the two sweeps of one framing.
    pub fn framing_candidates(&self, framing: Framing) -> Vec<Bridge> {
        let arena = self.arena;
        let center = arena.loop_centroid(LoopId::Boundary);

        // Sweep coordinate of every vertex, indexed [loop slot][vertex index].
        let framed: Vec<Vec<(f64, f64)>> = arena
            .loop_ids()
            .map(|id| {
                arena
                    .points(id)
                    .iter()
                    .map(|p| framing.apply(p, &center))
                    .collect()
            })
            .collect();
        let key = |v: VertexRef| framed[v.owner.slot()][v.index];

        let mut order: Vec<VertexRef> = arena.vertices().collect();
        order.sort_by(|&a, &b| {
            let (ka, kb) = (key(a), key(b));
            ka.0.total_cmp(&kb.0).then(ka.1.total_cmp(&kb.1)).then(a.cmp(&b))
        });

        let mut found = Vec::new();
        for sweep in [Sweep::LeftToRight, Sweep::RightToLeft] {
            for (pos, &v) in order.iter().enumerate() {
                if v.owner.is_boundary() {
                    continue;
                }
                let here = key(v).0;
                let before = key(arena.prev(v)).0;
                let after = key(arena.next(v)).0;
                let extremal = match sweep {
                    Sweep::LeftToRight => before >= here && after >= here,
                    Sweep::RightToLeft => before <= here && after <= here,
                };
                if !extremal {
                    continue;
                }
                if let Some(target) = self.nearest_admissible(&order, pos, sweep) {
                    found.push(Bridge::new(v, target));
                }
            }
        }
        found
    }

    /// Scans away from `order[pos]` in the sweep direction for the first
    /// vertex on another loop that the vertex can be bridged to.
    fn nearest_admissible(&self, order: &[VertexRef], pos: usize, sweep: Sweep) -> Option<VertexRef> {
        let v = order[pos];
        let admissible = |w: VertexRef| w.owner != v.owner && self.bridge_is_valid(v, w);
        match sweep {
            Sweep::LeftToRight => order[..pos].iter().rev().copied().find(|&w| admissible(w)),
            Sweep::RightToLeft => order[pos + 1..].iter().copied().find(|&w| admissible(w)),
        }
    }

    /// Geometric validity of a bridge between `a` and `b`, ignoring other
    /// bridges.
    ///
    /// The ends must be on different loops and apart; the segment may not
    /// cross any loop edge or pass through any vertex; its midpoint must lie
    /// inside the boundary and outside every hole, and neither end may sit
    /// inside a hole other than its own.
    pub fn bridge_is_valid(&self, a: VertexRef, b: VertexRef) -> bool {
        if a.owner == b.owner {
            return false;
        }
        let p = &self.predicates;
        let arena = self.arena;
        let (pa, pb) = (arena.point(a), arena.point(b));
        if p.coincident(&pa, &pb) {
            return false;
        }

        for id in arena.loop_ids() {
            let points = arena.points(id);
            let n = points.len();
            for i in 0..n {
                let j = (i + 1) % n;
                let (u, w) = (&points[i], &points[j]);

                if !p.coincident(u, &pa) && !p.coincident(u, &pb) && p.point_on_segment_interior(u, &pa, &pb) {
                    return false;
                }

                let (vu, vw) = (VertexRef::new(id, i), VertexRef::new(id, j));
                if vu == a || vu == b || vw == a || vw == b {
                    continue;
                }
                if p.segments_intersect(&pa, &pb, u, w, true) {
                    return false;
                }
            }
        }

        let midpoint = nalgebra::center(&pa, &pb);
        if !p.point_in_polygon(arena.boundary(), &midpoint) {
            return false;
        }
        for hole in arena.hole_ids() {
            let points = arena.points(hole);
            if p.point_in_polygon(points, &midpoint) {
                return false;
            }
            for end in [a, b] {
                if end.owner != hole && p.point_in_polygon(points, &arena.point(end)) {
                    return false;
                }
            }
        }
        true
    }

    /// Whether a bridge runs along an edge of the boundary or a hole.
    pub fn nearly_overlaps_loop_edge(&self, bridge: &Bridge) -> bool {
        let (pa, pb) = (self.arena.point(bridge.a), self.arena.point(bridge.b));
        self.arena
            .loop_ids()
            .any(|id| self.predicates.line_nearly_overlaps_polygon_edge(&pa, &pb, self.arena.points(id)))
    }

    /// Whether two bridges cross, run along each other, or one ends on the
    /// other's interior. Bridges that only share an end do not cross.
    pub fn bridges_cross(&self, first: &Bridge, second: &Bridge) -> bool {
        let p = &self.predicates;
        let arena = self.arena;
        let (a0, a1) = (arena.point(first.a), arena.point(first.b));
        let (b0, b1) = (arena.point(second.a), arena.point(second.b));

        if p.segments_nearly_overlap(&a0, &a1, &b0, &b1) {
            return true;
        }
        if p.point_on_segment_interior(&b0, &a0, &a1)
            || p.point_on_segment_interior(&b1, &a0, &a1)
            || p.point_on_segment_interior(&a0, &b0, &b1)
            || p.point_on_segment_interior(&a1, &b0, &b1)
        {
            return true;
        }
        p.segments_intersect(&a0, &a1, &b0, &b1, true)
    }

    /// Inserts `candidate` if it fits among the accepted bridges.
    ///
    /// A bridge crossing nothing is accepted. A bridge crossing exactly one
    /// accepted bridge replaces it when the candidate connects an unused loop
    /// and the crossed bridge can go without stranding its loops: either one
    /// of its loops is used three or more times and the other at least twice,
    /// or it shares a loop with the candidate and its other loop is used at
    /// least twice. Duplicates and bridges crossing two or more accepted
    /// bridges are rejected.
    fn try_insert(&self, accepted: &mut AcceptedBridges, candidate: Bridge) -> bool {
        if accepted.contains(&candidate) {
            return false;
        }

        let crossed: Vec<usize> = accepted
            .live()
            .filter(|(_, existing)| self.bridges_cross(&candidate, existing))
            .map(|(id, _)| id)
            .take(2)
            .collect();

        match crossed.as_slice() {
            [] => {
                accepted.accept(candidate);
                true
            }
            [id] => {
                let Some(existing) = accepted.slots[*id] else {
                    return false;
                };
                if self.may_evict(&accepted.graph, &candidate, &existing) {
                    tracing::trace!(?existing, ?candidate, "Evicting crossed bridge");
                    accepted.evict(*id);
                    accepted.accept(candidate);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn may_evict(&self, graph: &HoleConnectivityGraph, candidate: &Bridge, existing: &Bridge) -> bool {
        let (c1, c2) = candidate.loops();
        if graph.use_count(c1) > 0 && graph.use_count(c2) > 0 {
            return false;
        }

        let (e1, e2) = existing.loops();
        let (u1, u2) = (graph.use_count(e1), graph.use_count(e2));
        let well_used = u1.max(u2) >= 3 && u1.min(u2) >= 2;

        let shared_reused = [c1, c2]
            .into_iter()
            .filter_map(|shared| existing.other_loop(shared))
            .any(|other| graph.use_count(other) >= 2);

        well_used || shared_reused
    }

    // =========================================================================
    // Repair pass
    // =========================================================================

    /// Adds bridges for holes the main pass left unreachable, for holes that
    /// hang off a single other hole, and a second bridge for holes attached
    /// by one bridge only.
    fn repair(&self, accepted: &mut AcceptedBridges) {
        // Unused or unreachable holes first: nothing else matters until every
        // hole is connected.
        loop {
            let stranded = accepted.graph.unreachable_holes();
            if stranded.is_empty() {
                break;
            }
            let mut progress = false;
            for hole in stranded {
                if accepted.graph.is_reachable(hole) {
                    continue;
                }
                let reachable: Vec<LoopId> = self
                    .arena
                    .loop_ids()
                    .filter(|&id| accepted.graph.is_reachable(id))
                    .collect();
                let nearest = self.nearest_loops(hole, &reachable, 2);
                let bridge = self
                    .synthesize(accepted, hole, &nearest)
                    .or_else(|| self.synthesize(accepted, hole, &reachable));
                if let Some(bridge) = bridge {
                    tracing::debug!(
                        %hole,
                        input = ?self.arena.input_hole(hole),
                        ?bridge,
                        "Reconnected stranded hole"
                    );
                    accepted.accept(bridge);
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }

        let cutoff = self.config.path_cutoff;
        for hole in self.arena.hole_ids() {
            let Some(via) = accepted.graph.bottleneck(hole, cutoff) else {
                continue;
            };
            let neighbors: Vec<LoopId> = accepted
                .graph
                .neighbors(via)
                .into_iter()
                .filter(|&id| id != hole)
                .collect();
            let others: Vec<LoopId> = self
                .arena
                .loop_ids()
                .filter(|&id| id != hole && id != via)
                .collect();
            let nearest = self.nearest_loops(hole, &others, 2);
            let bridge = self
                .synthesize(accepted, hole, &neighbors)
                .or_else(|| self.synthesize(accepted, hole, &nearest));
            if let Some(bridge) = bridge {
                tracing::debug!(%hole, %via, ?bridge, "Bypassed bottleneck hole");
                accepted.accept(bridge);
            }
        }

        for hole in self.arena.hole_ids() {
            if accepted.graph.use_count(hole) != 1 {
                continue;
            }
            let others: Vec<LoopId> = self.arena.loop_ids().filter(|&id| id != hole).collect();
            let nearest = self.nearest_loops(hole, &others, 3);
            if let Some(bridge) = self.synthesize(accepted, hole, &nearest) {
                tracing::debug!(
                    %hole,
                    input = ?self.arena.input_hole(hole),
                    ?bridge,
                    "Added second bridge to singly linked hole"
                );
                accepted.accept(bridge);
            }
        }
    }

    /// Up to `count` loops from `candidates`, nearest to `hole` first. The
    /// boundary is always kept when present.
    fn nearest_loops(&self, hole: LoopId, candidates: &[LoopId], count: usize) -> Vec<LoopId> {
        let center = self.arena.loop_centroid(hole);
        let mut holes: Vec<(f64, LoopId)> = candidates
            .iter()
            .filter(|&&id| id != hole && !id.is_boundary())
            .map(|&id| ((self.arena.loop_centroid(id) - center).norm(), id))
            .collect();
        holes.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut nearest: Vec<LoopId> = candidates
            .iter()
            .copied()
            .filter(|id| id.is_boundary())
            .collect();
        nearest.extend(holes.into_iter().take(count).map(|(_, id)| id));
        nearest
    }

    /// Tries every vertex pair between `hole` and the `targets`, shortest
    /// first, and returns the first that is valid and crosses no accepted
    /// bridge.
    fn synthesize(&self, accepted: &AcceptedBridges, hole: LoopId, targets: &[LoopId]) -> Option<Bridge> {
        let arena = self.arena;
        let mut pairs: Vec<(f64, Bridge)> = Vec::new();
        for i in 0..arena.get(hole).len() {
            let v = VertexRef::new(hole, i);
            let pv = arena.point(v);
            for &target in targets.iter().filter(|&&t| t != hole) {
                for j in 0..arena.get(target).len() {
                    let w = VertexRef::new(target, j);
                    pairs.push(((arena.point(w) - pv).norm_squared(), Bridge::new(v, w)));
                }
            }
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        pairs.into_iter().map(|(_, bridge)| bridge).find(|bridge| {
            !accepted.contains(bridge)
                && self.bridge_is_valid(bridge.a, bridge.b)
                && !self.nearly_overlaps_loop_edge(bridge)
                && accepted.live().all(|(_, existing)| !self.bridges_cross(bridge, existing))
        })
    }
}
