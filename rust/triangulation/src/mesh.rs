// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh output and assembly of per-piece triangles.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::arena::{PolygonArena, VertexRef};

/// Triangle mesh produced by a triangulation call.
///
/// Positions are the caller's original 3D points. Both buffers are empty when
/// triangulation failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub positions: Vec<Point3<f64>>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(triangle_count * 3),
        }
    }

    /// Add a vertex and return its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        self.positions.push(position);
        (self.positions.len() - 1) as u32
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.extend_from_slice(&[i0, i1, i2]);
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Corner positions of every triangle
    pub fn triangle_positions(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.triangles().map(move |[a, b, c]| {
            [
                self.positions[a as usize],
                self.positions[b as usize],
                self.positions[c as usize],
            ]
        })
    }

    /// Total (unsigned) area of all triangles
    pub fn area(&self) -> f64 {
        self.triangle_positions()
            .map(|[a, b, c]| (b - a).cross(&(c - a)).norm() * 0.5)
            .sum()
    }

    /// Positions flattened to `[x, y, z, ...]` in f32 for GPU upload
    pub fn flat_positions(&self) -> Vec<f32> {
        self.positions
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect()
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }
        let vertex_offset = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Flip the orientation of every triangle
    pub fn reverse_winding(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }
}

/// Collects triangles named by vertex references into one [`Mesh`].
///
/// Each vertex reference is emitted once, so the two copies of a bridge end
/// share a position. Triangles arrive counter-clockwise in the working plane
/// and are flipped when exactly one of `boundary_reversed` and the caller's
/// reverse flag is set, matching the caller's boundary winding by default.
pub struct MeshCombiner<'a> {
    arena: &'a PolygonArena,
    mesh: Mesh,
    lookup: FxHashMap<VertexRef, u32>,
    flip: bool,
    degenerate: usize,
}

impl<'a> MeshCombiner<'a> {
    pub fn new(arena: &'a PolygonArena, reverse_winding: bool) -> Self {
        Self {
            arena,
            mesh: Mesh::with_capacity(arena.vertex_count(), arena.vertex_count()),
            lookup: FxHashMap::default(),
            flip: arena.boundary_reversed() != reverse_winding,
            degenerate: 0,
        }
    }

    fn index_of(&mut self, v: VertexRef) -> u32 {
        if let Some(&index) = self.lookup.get(&v) {
            return index;
        }
        let index = self.mesh.add_vertex(self.arena.position(v));
        self.lookup.insert(v, index);
        index
    }

    /// Adds one counter-clockwise triangle. Triangles naming the same vertex
    /// twice are dropped.
    pub fn add_triangle(&mut self, [a, b, c]: [VertexRef; 3]) {
        if a == b || b == c || a == c {
            self.degenerate += 1;
            return;
        }
        let (i0, i1, i2) = (self.index_of(a), self.index_of(b), self.index_of(c));
        if self.flip {
            self.mesh.add_triangle(i0, i2, i1);
        } else {
            self.mesh.add_triangle(i0, i1, i2);
        }
    }

    /// Adds the triangles of one piece, given as local indices into
    /// `vertices`.
    pub fn add_piece(&mut self, vertices: &[VertexRef], triangles: &[[usize; 3]]) {
        for &[a, b, c] in triangles {
            self.add_triangle([vertices[a], vertices[b], vertices[c]]);
        }
    }

    pub fn finish(self) -> Mesh {
        if self.degenerate > 0 {
            tracing::debug!(dropped = self.degenerate, "Dropped triangles with repeated corners");
        }
        self.mesh
    }
}
