// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Lite Triangulation
//!
//! Triangulation of planar polygons with holes, such as IFC face bounds with
//! openings.
//!
//! The pipeline for one face:
//!
//! 1. Project the loops onto their dominant plane, shift them next to the
//!    origin, drop collinear and duplicate vertices and normalize winding
//!    ([`arena`]).
//! 2. Link every hole into the boundary with non-crossing bridges found by
//!    sweeping the vertices under several framings ([`bridge`], [`graph`]).
//! 3. Trace the bridged region into hole-free polygons ([`decompose`]).
//! 4. Split those into monotone pieces ([`monotone`]) and triangulate each
//!    piece with a stack sweep ([`sweep`]).
//! 5. Collect all triangles into one [`Mesh`] that keeps the caller's 3D
//!    positions ([`mesh`]).
//!
//! Convex faces without holes are fanned directly. Tolerances live in
//! [`TriangulationConfig`].
//!
//! ```
//! use ifc_lite_triangulation::{triangulate_polygon_with_holes, Point3};
//!
//! let square = |min: f64, max: f64| {
//!     vec![
//!         Point3::new(min, min, 0.0),
//!         Point3::new(max, min, 0.0),
//!         Point3::new(max, max, 0.0),
//!         Point3::new(min, max, 0.0),
//!     ]
//! };
//! let mesh = triangulate_polygon_with_holes(&square(0.0, 10.0), &[square(4.0, 6.0)], false);
//! assert!((mesh.area() - 96.0).abs() < 1e-9);
//! ```

pub mod arena;
pub mod bridge;
pub mod config;
pub mod decompose;
pub mod error;
pub mod graph;
pub mod mesh;
pub mod monotone;
pub mod plane;
pub mod predicates;
pub mod sweep;
pub mod triangulator;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use arena::{LoopId, PolygonArena, VertexRef};
pub use bridge::{Bridge, BridgeBuilder, BridgeSet, Framing};
pub use config::TriangulationConfig;
pub use decompose::{SimplePolygon, SimplePolygonDecomposer};
pub use error::{Error, Result};
pub use graph::HoleConnectivityGraph;
pub use mesh::{Mesh, MeshCombiner};
pub use monotone::{MonotoneDecomposer, VertexClass};
pub use plane::PlaneProjection;
pub use predicates::Predicates;
pub use sweep::MonotoneTriangulator;
pub use triangulator::{triangulate_polygon_with_holes, FaceLoops, Triangulator};
