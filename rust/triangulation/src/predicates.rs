// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance-based geometric predicates on the working plane.
//!
//! All tests run on 2D points: the caller has already projected its loops onto
//! the plane they live in. Signed areas follow the usual mathematical
//! convention (counter-clockwise is positive).
//!
//! None of these predicates are exact. Closeness is decided with the
//! tolerances carried by [`Predicates`], which are copied from a
//! [`TriangulationConfig`].

use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};

use crate::config::TriangulationConfig;

/// Twice the signed area of triangle `(a, b, c)`. Positive when the triangle
/// turns counter-clockwise.
#[inline]
pub fn orient(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b - a).perp(&(c - a))
}

/// Signed area of a closed loop (shoelace formula).
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let p = &points[i];
        let q = &points[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

/// Signed area of the loop visiting `points` in the order given by `order`.
pub fn signed_area_indexed(points: &[Point2<f64>], order: &[usize]) -> f64 {
    let n = order.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let p = &points[order[i]];
        let q = &points[order[(i + 1) % n]];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

/// Average of the loop's vertices.
pub fn centroid(points: &[Point2<f64>]) -> Point2<f64> {
    if points.is_empty() {
        return Point2::origin();
    }
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords);
    Point2::from(sum / points.len() as f64)
}

/// Projects `p` onto segment `a`–`b`.
///
/// Returns the clamped segment parameter and the closest point.
pub fn project_on_segment(
    p: &Point2<f64>,
    a: &Point2<f64>,
    b: &Point2<f64>,
) -> (f64, Point2<f64>) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (0.0, *a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (t, a + ab * t)
}

/// Euclidean distance from `p` to segment `a`–`b`.
#[inline]
pub fn distance_to_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let (_, closest) = project_on_segment(p, a, b);
    (p - closest).norm()
}

/// Tolerances used by the predicates, copied out of a configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predicates {
    linear: f64,
    area: f64,
    collinear: f64,
    overlap: f64,
    region: f64,
    winding: f64,
}

impl Default for Predicates {
    fn default() -> Self {
        Self::new(&TriangulationConfig::default())
    }
}

impl Predicates {
    pub fn new(config: &TriangulationConfig) -> Self {
        Self {
            linear: config.linear_tolerance,
            area: config.area_tolerance,
            collinear: config.collinear_tolerance,
            overlap: config.overlap_distance(),
            region: config.region_tolerance,
            winding: config.winding_tolerance,
        }
    }

    #[inline]
    pub fn linear_tolerance(&self) -> f64 {
        self.linear
    }

    #[inline]
    pub fn area_tolerance(&self) -> f64 {
        self.area
    }

    /// Smallest area a region of `boundary_area` may keep once its holes are
    /// subtracted.
    #[inline]
    pub fn min_region_area(&self, boundary_area: f64) -> f64 {
        self.area.max(boundary_area * self.region)
    }

    /// Whether two points coincide within the linear tolerance.
    #[inline]
    pub fn coincident(&self, a: &Point2<f64>, b: &Point2<f64>) -> bool {
        (a - b).norm() <= self.linear
    }

    /// Whether `b` is collinear with its neighbours `a` and `c`, or
    /// coincides with one of them.
    pub fn is_collinear(&self, a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> bool {
        let ab = b - a;
        let bc = c - b;
        let (len_ab, len_bc) = (ab.norm(), bc.norm());
        if len_ab <= self.linear || len_bc <= self.linear {
            return true;
        }
        ab.perp(&bc).abs() <= self.collinear * len_ab * len_bc
    }

    /// Ray-crossing point-in-polygon test.
    ///
    /// A point that coincides with a loop vertex counts as inside.
    pub fn point_in_polygon(&self, polygon: &[Point2<f64>], p: &Point2<f64>) -> bool {
        if polygon.iter().any(|v| self.coincident(v, p)) {
            return true;
        }

        let n = polygon.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let (pi, pj) = (&polygon[i], &polygon[j]);
            if (pi.y > p.y) != (pj.y > p.y) {
                let x = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
                if p.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Segment–segment intersection from the closest approach of the two
    /// supporting lines.
    ///
    /// With `exclude_endpoints` both line parameters must lie strictly inside
    /// `(0, 1)` (shrunk by the tolerance), so segments that merely touch at an
    /// end do not intersect. Otherwise the range is `[0, 1]` widened by the
    /// tolerance. Parallel segments never intersect here; overlapping
    /// collinear segments are the job of [`Self::segments_nearly_overlap`].
    pub fn segments_intersect(
        &self,
        a0: &Point2<f64>,
        a1: &Point2<f64>,
        b0: &Point2<f64>,
        b1: &Point2<f64>,
        exclude_endpoints: bool,
    ) -> bool {
        let d1 = a1 - a0;
        let d2 = b1 - b0;
        let r = a0 - b0;

        let a = d1.dot(&d1);
        let e = d2.dot(&d2);
        if a <= self.linear * self.linear || e <= self.linear * self.linear {
            return false;
        }

        let b = d1.dot(&d2);
        let c = d1.dot(&r);
        let f = d2.dot(&r);
        let denom = a * e - b * b;
        if denom.abs() <= f64::EPSILON * a * e {
            return false;
        }

        let s = (b * f - c * e) / denom;
        let t = (a * f - b * c) / denom;

        let margin_s = self.linear / a.sqrt();
        let margin_t = self.linear / e.sqrt();
        let in_range = |param: f64, margin: f64| {
            if exclude_endpoints {
                param > margin && param < 1.0 - margin
            } else {
                param >= -margin && param <= 1.0 + margin
            }
        };
        if !in_range(s, margin_s) || !in_range(t, margin_t) {
            return false;
        }

        let p = a0 + d1 * s;
        let q = b0 + d2 * t;
        (p - q).norm() <= self.linear.max(f64::EPSILON * (a + e).sqrt())
    }

    /// Whether `p` lies on the open segment `a`–`b` (not at either end).
    pub fn point_on_segment_interior(
        &self,
        p: &Point2<f64>,
        a: &Point2<f64>,
        b: &Point2<f64>,
    ) -> bool {
        if self.coincident(p, a) || self.coincident(p, b) {
            return false;
        }
        let (t, closest) = project_on_segment(p, a, b);
        t > 0.0 && t < 1.0 && (p - closest).norm() <= self.linear
    }

    /// Whether segment `p0`–`p1` runs along segment `a`–`b`: their parameter
    /// ranges overlap by more than the tolerance and both ends of the
    /// overlapping part stay within the overlap distance of `a`–`b`.
    pub fn segments_nearly_overlap(
        &self,
        p0: &Point2<f64>,
        p1: &Point2<f64>,
        a: &Point2<f64>,
        b: &Point2<f64>,
    ) -> bool {
        let d = p1 - p0;
        let e = b - a;
        let (len_d, len_e) = (d.norm(), e.norm());
        if len_d <= self.overlap || len_e <= self.overlap {
            return false;
        }

        let dir = d / len_d;
        let ta = (a - p0).dot(&dir);
        let tb = (b - p0).dot(&dir);
        let lo = ta.min(tb).max(0.0);
        let hi = ta.max(tb).min(len_d);
        if hi - lo <= self.overlap {
            return false;
        }

        let edge_dir = e / len_e;
        let off_line = |t: f64| ((p0 + dir * t) - a).perp(&edge_dir).abs();
        off_line(lo) <= self.overlap && off_line(hi) <= self.overlap
    }

    /// Whether segment `p0`–`p1` nearly overlaps any edge of a closed loop.
    pub fn line_nearly_overlaps_polygon_edge(
        &self,
        p0: &Point2<f64>,
        p1: &Point2<f64>,
        polygon: &[Point2<f64>],
    ) -> bool {
        let n = polygon.len();
        (0..n).any(|i| self.segments_nearly_overlap(p0, p1, &polygon[i], &polygon[(i + 1) % n]))
    }

    /// Whether the diagonal between vertices `i` and `j` can split `polygon`.
    ///
    /// The diagonal must join non-adjacent, non-coincident vertices, cross no
    /// edge that does not touch `i` or `j`, pass through no other vertex, keep
    /// its midpoint inside the polygon, and split the polygon into two chains
    /// whose signed areas are non-degenerate and share a sign.
    pub fn diagonal_is_admissible(&self, polygon: &[Point2<f64>], i: usize, j: usize) -> bool {
        let n = polygon.len();
        if n < 4 || i >= n || j >= n || i == j {
            return false;
        }
        if (i + 1) % n == j || (j + 1) % n == i {
            return false;
        }

        let (pi, pj) = (&polygon[i], &polygon[j]);
        if self.coincident(pi, pj) {
            return false;
        }

        for k in 0..n {
            let k1 = (k + 1) % n;
            let (a, b) = (&polygon[k], &polygon[k1]);

            // Vertices sitting on the diagonal, except copies of its own ends.
            if k != i
                && k != j
                && !self.coincident(a, pi)
                && !self.coincident(a, pj)
                && self.point_on_segment_interior(a, pi, pj)
            {
                return false;
            }

            if k == i || k == j || k1 == i || k1 == j {
                continue;
            }
            if self.segments_intersect(pi, pj, a, b, true) {
                return false;
            }
        }

        let midpoint = nalgebra::center(pi, pj);
        if !self.point_in_polygon(polygon, &midpoint) {
            return false;
        }

        let first: Vec<usize> = cyclic_range(i, j, n).collect();
        let second: Vec<usize> = cyclic_range(j, i, n).collect();
        let area_first = signed_area_indexed(polygon, &first);
        let area_second = signed_area_indexed(polygon, &second);

        area_first.abs() > self.area
            && area_second.abs() > self.area
            && area_first.signum() == area_second.signum()
    }

    /// Convexity test: every turn has the same sign and the loop winds once.
    pub fn is_convex(&self, points: &[Point2<f64>]) -> bool {
        let n = points.len();
        if n < 3 {
            return false;
        }

        let mut sign = 0i8;
        let mut turning = 0.0;
        for i in 0..n {
            let p0 = &points[i];
            let p1 = &points[(i + 1) % n];
            let p2 = &points[(i + 2) % n];
            let e1 = p1 - p0;
            let e2 = p2 - p1;

            let cross = e1.perp(&e2);
            if cross.abs() > self.collinear * e1.norm() * e2.norm() {
                let current_sign = if cross > 0.0 { 1i8 } else { -1i8 };
                if sign == 0 {
                    sign = current_sign;
                } else if sign != current_sign {
                    return false;
                }
            }
            turning += cross.atan2(e1.dot(&e2));
        }

        sign != 0 && (turning.abs() - TAU).abs() < self.winding
    }
}

/// Indices from `from` to `to` inclusive, walking forward around a loop of
/// length `n`.
pub(crate) fn cyclic_range(from: usize, to: usize, n: usize) -> impl Iterator<Item = usize> {
    let len = (to + n - from) % n + 1;
    (0..len).map(move |k| (from + k) % n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2<f64>> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn l_shape() -> Vec<Point2<f64>> {
        pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0)])
    }

    #[test]
    fn signed_area_of_square() {
        let square = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert_eq!(signed_area(&square), 100.0);

        let mut reversed = square.clone();
        reversed.reverse();
        assert_eq!(signed_area(&reversed), -100.0);
    }

    #[test]
    fn indexed_area_matches_plain_area() {
        let shape = l_shape();
        let order: Vec<usize> = (0..shape.len()).collect();
        assert_eq!(signed_area_indexed(&shape, &order), signed_area(&shape));
        assert_eq!(signed_area(&shape), 3.0);
    }

    #[test]
    fn point_in_polygon_basic() {
        let p = Predicates::default();
        let shape = l_shape();
        assert!(p.point_in_polygon(&shape, &Point2::new(0.5, 1.5)));
        assert!(!p.point_in_polygon(&shape, &Point2::new(1.5, 1.5)));
        // Vertices count as inside
        assert!(p.point_in_polygon(&shape, &Point2::new(1.0, 1.0)));
    }

    #[test]
    fn strict_and_inclusive_intersection() {
        let p = Predicates::default();
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(2.0, 2.0);
        let b0 = Point2::new(0.0, 2.0);
        let b1 = Point2::new(2.0, 0.0);
        assert!(p.segments_intersect(&a0, &a1, &b0, &b1, true));

        // Touching at an end point
        let c0 = Point2::new(2.0, 2.0);
        let c1 = Point2::new(3.0, 0.0);
        assert!(!p.segments_intersect(&a0, &a1, &c0, &c1, true));
        assert!(p.segments_intersect(&a0, &a1, &c0, &c1, false));

        // Disjoint
        let d0 = Point2::new(3.0, 3.0);
        let d1 = Point2::new(4.0, 1.0);
        assert!(!p.segments_intersect(&a0, &a1, &d0, &d1, false));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let p = Predicates::default();
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(2.0, 0.0);
        let b0 = Point2::new(1.0, 0.0);
        let b1 = Point2::new(3.0, 0.0);
        assert!(!p.segments_intersect(&a0, &a1, &b0, &b1, false));
        assert!(p.segments_nearly_overlap(&a0, &a1, &b0, &b1));
    }

    #[test]
    fn near_overlap_requires_shared_range() {
        let p = Predicates::default();
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(1.0, 0.0);
        // Same line, disjoint ranges
        assert!(!p.segments_nearly_overlap(
            &a0,
            &a1,
            &Point2::new(2.0, 0.0),
            &Point2::new(3.0, 0.0)
        ));
        // Parallel but far apart
        assert!(!p.segments_nearly_overlap(
            &a0,
            &a1,
            &Point2::new(0.0, 0.5),
            &Point2::new(1.0, 0.5)
        ));
        // Crossing lines
        assert!(!p.segments_nearly_overlap(
            &a0,
            &a1,
            &Point2::new(0.5, -1.0),
            &Point2::new(0.5, 1.0)
        ));
    }

    #[test]
    fn projection_on_segment() {
        let (t, closest) = project_on_segment(
            &Point2::new(1.0, 1.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
        );
        assert_eq!(t, 0.5);
        assert_eq!(closest, Point2::new(1.0, 0.0));
        assert_eq!(
            distance_to_segment(&Point2::new(3.0, 0.0), &Point2::new(0.0, 0.0), &Point2::new(2.0, 0.0)),
            1.0
        );
    }

    #[test]
    fn diagonal_admissibility_in_l_shape() {
        let p = Predicates::default();
        let shape = l_shape();
        // Adjacent vertices are never diagonals
        assert!(!p.diagonal_is_admissible(&shape, 0, 1));
        assert!(!p.diagonal_is_admissible(&shape, 5, 0));
        // Interior diagonal from the reflex corner
        assert!(p.diagonal_is_admissible(&shape, 3, 0));
        assert!(p.diagonal_is_admissible(&shape, 3, 1));
        // Diagonal through the notch lies outside
        assert!(!p.diagonal_is_admissible(&shape, 2, 4));
    }

    #[test]
    fn diagonal_through_vertex_is_rejected() {
        let p = Predicates::default();
        // Vertex 2 sits exactly on the diagonal between vertices 0 and 3
        let shape = pts(&[(0.0, 0.0), (4.0, 0.0), (2.0, 2.0), (4.0, 4.0), (0.0, 4.0), (2.0, 2.0001)]);
        assert!(!p.diagonal_is_admissible(&shape, 0, 3));
    }

    #[test]
    fn convexity() {
        let p = Predicates::default();
        let square = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(p.is_convex(&square));
        assert!(!p.is_convex(&l_shape()));

        // Pentagram: every turn has the same sign but the loop winds twice
        let star: Vec<Point2<f64>> = (0..5)
            .map(|k| {
                let angle = (k * 2) as f64 * TAU / 5.0;
                Point2::new(angle.cos(), angle.sin())
            })
            .collect();
        assert!(!p.is_convex(&star));

        // A winding tolerance above a full turn lets the double loop through
        let lax = Predicates::new(&TriangulationConfig {
            winding_tolerance: 7.0,
            ..Default::default()
        });
        assert!(lax.is_convex(&star));
    }

    #[test]
    fn region_floor_scales_with_boundary() {
        let p = Predicates::default();
        assert_eq!(p.min_region_area(1.0), 1e-9);
        assert_eq!(p.min_region_area(1e-6), 1e-12);
    }

    #[test]
    fn collinear_detection() {
        let p = Predicates::default();
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        assert!(p.is_collinear(&a, &b, &Point2::new(2.0, 0.0)));
        assert!(p.is_collinear(&a, &b, &Point2::new(0.0, 0.0)));
        assert!(p.is_collinear(&a, &a, &b));
        assert!(!p.is_collinear(&a, &b, &Point2::new(1.0, 1.0)));
    }

    #[test]
    fn cyclic_ranges_wrap() {
        assert_eq!(cyclic_range(4, 1, 6).collect::<Vec<_>>(), vec![4, 5, 0, 1]);
        assert_eq!(cyclic_range(1, 4, 6).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }
}
