// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Projection of planar 3D loops onto their working plane.
//!
//! The engine only ever looks at two coordinates. Callers align the input to a
//! plane beforehand; this module picks the two axes spanning that plane by
//! dropping the component the polygon normal is dominated by.

use nalgebra::{Point2, Point3, Vector3};

/// Calculates the normal of a polygon using Newell's method.
///
/// Falls back to +Z for degenerate input and whenever the unnormalized
/// normal (twice the loop's area) is not longer than `tolerance`.
pub fn newell_normal(points: &[Point3<f64>], tolerance: f64) -> Vector3<f64> {
    let n = points.len();
    if n < 3 {
        return Vector3::z();
    }

    let mut normal = Vector3::<f64>::zeros();
    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];

        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    let len = normal.norm();
    if len > tolerance {
        normal / len
    } else {
        Vector3::z()
    }
}

/// Axis-aligned projection onto the dominant plane of a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneProjection {
    u: usize,
    v: usize,
}

impl PlaneProjection {
    /// Projection onto the XY plane.
    pub const XY: Self = Self { u: 0, v: 1 };

    /// Picks the projection plane from the boundary's normal. See
    /// [`newell_normal`] for `tolerance`.
    pub fn from_boundary(points: &[Point3<f64>], tolerance: f64) -> Self {
        let normal = newell_normal(points, tolerance);
        let abs_n = Vector3::new(normal.x.abs(), normal.y.abs(), normal.z.abs());

        if abs_n.z >= abs_n.x && abs_n.z >= abs_n.y {
            Self { u: 0, v: 1 }
        } else if abs_n.y >= abs_n.x {
            Self { u: 0, v: 2 }
        } else {
            Self { u: 1, v: 2 }
        }
    }

    /// Indices of the two retained axes.
    #[inline]
    pub fn axes(&self) -> (usize, usize) {
        (self.u, self.v)
    }

    #[inline]
    pub fn project(&self, point: &Point3<f64>) -> Point2<f64> {
        Point2::new(point[self.u], point[self.v])
    }

    pub fn project_all(&self, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        points.iter().map(|p| self.project(p)).collect()
    }
}
