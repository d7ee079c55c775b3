// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangulation entry points.
//!
//! [`Triangulator`] runs the whole pipeline for one face: projection and
//! cleanup, bridging, face tracing, monotone decomposition and the sweep.
//! Convex faces without holes skip straight to a fan. Failures never reach
//! the caller of [`Triangulator::triangulate`]: they are logged and turned
//! into an empty mesh so that rendering and export can carry on with the
//! remaining faces.

use nalgebra::{Point2, Point3};

use crate::arena::{LoopId, PolygonArena, VertexRef};
use crate::bridge::BridgeBuilder;
use crate::config::TriangulationConfig;
use crate::decompose::SimplePolygonDecomposer;
use crate::error::{Error, Result};
use crate::mesh::{Mesh, MeshCombiner};
use crate::monotone::MonotoneDecomposer;
use crate::plane::PlaneProjection;
use crate::predicates::Predicates;
use crate::sweep::MonotoneTriangulator;

/// One planar face: its outer boundary, its holes and the winding flag.
#[derive(Debug, Clone, Default)]
pub struct FaceLoops {
    pub boundary: Vec<Point3<f64>>,
    pub holes: Vec<Vec<Point3<f64>>>,
    pub reverse_winding: bool,
}

impl FaceLoops {
    pub fn new(boundary: Vec<Point3<f64>>, holes: Vec<Vec<Point3<f64>>>) -> Self {
        Self {
            boundary,
            holes,
            reverse_winding: false,
        }
    }

    /// Same face with the emitted triangles flipped.
    pub fn reversed(mut self) -> Self {
        self.reverse_winding = !self.reverse_winding;
        self
    }
}

/// Triangulates planar polygons with holes.
#[derive(Debug, Clone, Default)]
pub struct Triangulator {
    config: TriangulationConfig,
}

impl Triangulator {
    pub fn new(config: TriangulationConfig) -> Self {
        Self { config }
    }

    /// Triangulator configured from `TRIANGULATION_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(TriangulationConfig::from_env())
    }

    #[inline]
    pub fn config(&self) -> &TriangulationConfig {
        &self.config
    }

    /// Triangulates one face, returning an empty mesh on any failure.
    ///
    /// Triangles share the winding of `boundary`; `reverse_winding` flips
    /// them.
    pub fn triangulate(
        &self,
        boundary: &[Point3<f64>],
        holes: &[Vec<Point3<f64>>],
        reverse_winding: bool,
    ) -> Mesh {
        match self.try_triangulate(boundary, holes, reverse_winding) {
            Ok(mesh) => mesh,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    boundary_points = boundary.len(),
                    holes = holes.len(),
                    "Triangulation failed, emitting empty mesh"
                );
                Mesh::new()
            }
        }
    }

    /// Triangulates one face and reports why it failed.
    pub fn try_triangulate(
        &self,
        boundary: &[Point3<f64>],
        holes: &[Vec<Point3<f64>>],
        reverse_winding: bool,
    ) -> Result<Mesh> {
        let projection = PlaneProjection::from_boundary(boundary, self.config.normal_tolerance);
        let predicates = Predicates::new(&self.config);
        let arena = PolygonArena::build(boundary, holes, projection, &predicates)?;
        self.triangulate_arena(&arena, reverse_winding)
    }

    /// Triangulates loops that already live in the XY plane. Positions in the
    /// mesh have `z = 0`.
    pub fn triangulate_2d(
        &self,
        boundary: &[Point2<f64>],
        holes: &[Vec<Point2<f64>>],
        reverse_winding: bool,
    ) -> Mesh {
        let predicates = Predicates::new(&self.config);
        let result = PolygonArena::from_2d(boundary, holes, &predicates)
            .and_then(|arena| self.triangulate_arena(&arena, reverse_winding));
        match result {
            Ok(mesh) => mesh,
            Err(e) => {
                tracing::warn!(error = %e, "Triangulation failed, emitting empty mesh");
                Mesh::new()
            }
        }
    }

    /// Triangulates independent faces, one mesh per face in input order.
    pub fn triangulate_faces(&self, faces: &[FaceLoops]) -> Vec<Mesh> {
        // On native: faces are independent, triangulate them in parallel
        // On WASM: sequential iteration (no threads available)
        #[cfg(not(target_arch = "wasm32"))]
        let meshes: Vec<Mesh> = {
            use rayon::prelude::*;
            faces
                .par_iter()
                .map(|face| self.triangulate(&face.boundary, &face.holes, face.reverse_winding))
                .collect()
        };

        #[cfg(target_arch = "wasm32")]
        let meshes: Vec<Mesh> = faces
            .iter()
            .map(|face| self.triangulate(&face.boundary, &face.holes, face.reverse_winding))
            .collect();

        meshes
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    fn triangulate_arena(&self, arena: &PolygonArena, reverse_winding: bool) -> Result<Mesh> {
        let predicates = Predicates::new(&self.config);
        if self.config.convex_fast_path
            && arena.hole_count() == 0
            && predicates.is_convex(arena.boundary())
        {
            return Ok(self.fan(arena, reverse_winding));
        }

        let bridges = BridgeBuilder::new(arena, &self.config).build();
        let polygons = SimplePolygonDecomposer::new(arena, &self.config).decompose(&bridges.bridges)?;

        let decomposer = MonotoneDecomposer::new(&self.config);
        let triangulator = MonotoneTriangulator::new(&self.config);
        let mut combiner = MeshCombiner::new(arena, reverse_winding);
        let mut pieces = 0usize;
        let mut skipped = 0usize;

        for polygon in &polygons {
            let points = polygon.points(arena);
            for piece in decomposer.decompose(&points) {
                pieces += 1;
                let piece_points: Vec<Point2<f64>> = piece.iter().map(|&i| points[i]).collect();
                let triangles = triangulator.triangulate(&piece_points);
                if triangles.is_empty() {
                    skipped += 1;
                    continue;
                }
                let vertices: Vec<VertexRef> = piece.iter().map(|&i| polygon.vertices[i]).collect();
                combiner.add_piece(&vertices, &triangles);
            }
        }

        let mesh = combiner.finish();
        tracing::debug!(
            holes = arena.hole_count(),
            bridges = bridges.len(),
            polygons = polygons.len(),
            pieces,
            skipped,
            triangles = mesh.triangle_count(),
            "Triangulated face"
        );
        if mesh.is_empty() {
            return Err(Error::Decomposition(format!(
                "none of {pieces} monotone pieces could be triangulated"
            )));
        }
        Ok(mesh)
    }

    /// Fan from the first vertex of a convex boundary.
    fn fan(&self, arena: &PolygonArena, reverse_winding: bool) -> Mesh {
        let n = arena.boundary().len();
        let mut combiner = MeshCombiner::new(arena, reverse_winding);
        let v = |i| VertexRef::new(LoopId::Boundary, i);
        for i in 1..n - 1 {
            combiner.add_triangle([v(0), v(i), v(i + 1)]);
        }
        combiner.finish()
    }
}

/// Triangulates a face with the default configuration.
pub fn triangulate_polygon_with_holes(
    boundary: &[Point3<f64>],
    holes: &[Vec<Point3<f64>>],
    reverse_winding: bool,
) -> Mesh {
    Triangulator::default().triangulate(boundary, holes, reverse_winding)
}
