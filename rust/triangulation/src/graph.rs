// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connectivity graph between the boundary and the holes.
//!
//! - **Nodes** = loops (the boundary and every hole)
//! - **Edges** = accepted bridges, keyed by the bridge id handed out by the
//!   bridge builder so they can be removed again when a bridge is evicted
//!
//! Every query takes `&self` and returns owned results, so reachability is
//! always computed from the graph as it stands between two mutations.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::arena::LoopId;
use crate::bridge::Bridge;

/// Upper bound on partial paths expanded by [`HoleConnectivityGraph::paths_to_boundary`].
const MAX_PATH_EXPANSIONS: usize = 4096;

/// Graph over `{boundary, hole 0, .., hole n-1}` whose edges are bridges.
#[derive(Debug, Clone)]
pub struct HoleConnectivityGraph {
    /// Adjacency list: loop slot → list of (neighbor slot, bridge id).
    adjacency: Vec<SmallVec<[(usize, usize); 4]>>,
    /// Bridge id → the connecting line it was created from.
    links: FxHashMap<usize, Bridge>,
}

impl HoleConnectivityGraph {
    /// Creates a graph with a boundary node and `hole_count` hole nodes and no
    /// edges.
    pub fn new(hole_count: usize) -> Self {
        Self {
            adjacency: vec![SmallVec::new(); hole_count + 1],
            links: FxHashMap::default(),
        }
    }

    // =========================================================================
    // Graph mutation
    // =========================================================================

    /// Records bridge `id`. Bridges whose ends sit on the same loop are not
    /// connections and are ignored.
    pub fn add_bridge(&mut self, id: usize, bridge: Bridge) {
        let (a, b) = bridge.loops();
        if a == b || self.links.contains_key(&id) {
            return;
        }
        let (sa, sb) = (a.slot(), b.slot());
        self.adjacency[sa].push((sb, id));
        self.adjacency[sb].push((sa, id));
        self.links.insert(id, bridge);
    }

    /// Removes bridge `id` from both of its end nodes.
    pub fn remove_bridge(&mut self, id: usize) -> Option<Bridge> {
        let bridge = self.links.remove(&id)?;
        let (a, b) = bridge.loops();
        for slot in [a.slot(), b.slot()] {
            self.adjacency[slot].retain(|&mut (_, edge)| edge != id);
        }
        Some(bridge)
    }

    // =========================================================================
    // Graph accessors
    // =========================================================================

    /// Number of nodes (boundary included).
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of bridges currently in the graph.
    pub fn edge_count(&self) -> usize {
        self.links.len()
    }

    /// How many bridges touch a loop.
    pub fn use_count(&self, id: LoopId) -> usize {
        self.adjacency.get(id.slot()).map_or(0, |adj| adj.len())
    }

    /// Distinct loops linked to `id` by at least one bridge.
    pub fn neighbors(&self, id: LoopId) -> Vec<LoopId> {
        let mut seen = FxHashSet::default();
        self.adjacency[id.slot()]
            .iter()
            .filter(|&&(slot, _)| seen.insert(slot))
            .map(|&(slot, _)| LoopId::from_slot(slot))
            .collect()
    }

    /// Loops that no bridge touches.
    pub fn unused_loops(&self) -> Vec<LoopId> {
        (0..self.node_count())
            .filter(|&slot| self.adjacency[slot].is_empty())
            .map(LoopId::from_slot)
            .collect()
    }

    /// Whether `id` can be reached from the boundary.
    pub fn is_reachable(&self, id: LoopId) -> bool {
        self.reachable_from_boundary()[id.slot()]
    }

    /// Holes with no path to the boundary.
    pub fn unreachable_holes(&self) -> Vec<LoopId> {
        self.reachable_from_boundary()
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, &reachable)| !reachable)
            .map(|(slot, _)| LoopId::from_slot(slot))
            .collect()
    }

    /// Checks if every hole is connected to the boundary.
    pub fn is_connected(&self) -> bool {
        self.reachable_from_boundary().iter().all(|&r| r)
    }

    /// Whether the hole's only connection is a single bridge straight to the
    /// boundary.
    pub fn has_single_boundary_link(&self, hole: LoopId) -> bool {
        let adj = &self.adjacency[hole.slot()];
        adj.len() == 1 && adj[0].0 == LoopId::Boundary.slot()
    }

    // =========================================================================
    // Path queries
    // =========================================================================

    /// Breadth-first enumeration of simple paths from `from` to the boundary.
    ///
    /// Stops once the boundary has been reached `cutoff` times. Each returned
    /// path starts at `from` and ends at the boundary.
    pub fn paths_to_boundary(&self, from: LoopId, cutoff: usize) -> Vec<Vec<LoopId>> {
        let target = LoopId::Boundary.slot();
        let mut found: Vec<Vec<LoopId>> = Vec::new();
        if from.is_boundary() || cutoff == 0 {
            return found;
        }

        let mut queue: VecDeque<Vec<usize>> = VecDeque::new();
        queue.push_back(vec![from.slot()]);
        let mut expansions = 0;

        while let Some(path) = queue.pop_front() {
            expansions += 1;
            if expansions > MAX_PATH_EXPANSIONS {
                break;
            }
            let Some(&last) = path.last() else {
                continue;
            };
            for &(neighbor, _) in &self.adjacency[last] {
                if path.contains(&neighbor) {
                    continue;
                }
                let mut extended = path.clone();
                extended.push(neighbor);
                if neighbor == target {
                    found.push(extended.into_iter().map(LoopId::from_slot).collect());
                    if found.len() >= cutoff {
                        return found;
                    }
                } else {
                    queue.push_back(extended);
                }
            }
        }

        found
    }

    /// A hole that every enumerated path from `hole` to the boundary passes
    /// through, i.e. the one loop `hole` hangs off.
    ///
    /// Returns `None` when the hole is unreachable, linked straight to the
    /// boundary by a single bridge, or has an independent route.
    pub fn bottleneck(&self, hole: LoopId, cutoff: usize) -> Option<LoopId> {
        if hole.is_boundary() || self.has_single_boundary_link(hole) {
            return None;
        }
        let paths = self.paths_to_boundary(hole, cutoff);
        let (first, rest) = paths.split_first()?;

        // Intermediate loops shared by every path, in order along the first.
        let shared = first[1..first.len() - 1]
            .iter()
            .copied()
            .find(|via| rest.iter().all(|path| path.contains(via)))?;

        // The enumeration stops at the cutoff; confirm that removing the
        // candidate really cuts the hole off.
        if self.reachable_without(hole, shared) {
            None
        } else {
            Some(shared)
        }
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// BFS reachability from the boundary.
    fn reachable_from_boundary(&self) -> Vec<bool> {
        self.bfs_reachable(LoopId::Boundary.slot(), None)
    }

    /// Whether `hole` reaches the boundary when `removed` is taken out.
    fn reachable_without(&self, hole: LoopId, removed: LoopId) -> bool {
        self.bfs_reachable(LoopId::Boundary.slot(), Some(removed.slot()))[hole.slot()]
    }

    fn bfs_reachable(&self, source: usize, blocked: Option<usize>) -> Vec<bool> {
        let n = self.node_count();
        let mut seen = vec![false; n];
        let mut queue = VecDeque::new();

        seen[source] = true;
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            for &(neighbor, _) in &self.adjacency[node] {
                if Some(neighbor) == blocked || seen[neighbor] {
                    continue;
                }
                seen[neighbor] = true;
                queue.push_back(neighbor);
            }
        }

        seen
    }
}
