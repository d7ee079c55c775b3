// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end checks of the triangulation pipeline: area conservation,
//! winding, holes staying empty and degenerate input.

use approx::assert_relative_eq;
use ifc_lite_triangulation::{
    triangulate_polygon_with_holes, BridgeBuilder, FaceLoops, Mesh, Point2, Point3, PolygonArena,
    Predicates, TriangulationConfig, Triangulator,
};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point3<f64>> {
    vec![
        Point3::new(x0, y0, 0.0),
        Point3::new(x1, y0, 0.0),
        Point3::new(x1, y1, 0.0),
        Point3::new(x0, y1, 0.0),
    ]
}

fn rect_2d(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2<f64>> {
    rect(x0, y0, x1, y1).iter().map(|p| Point2::new(p.x, p.y)).collect()
}

/// Signed XY areas of every triangle.
fn signed_areas(mesh: &Mesh) -> Vec<f64> {
    mesh.triangle_positions()
        .map(|[a, b, c]| ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)) * 0.5)
        .collect()
}

fn centroids(mesh: &Mesh) -> Vec<Point3<f64>> {
    mesh.triangle_positions()
        .map(|[a, b, c]| Point3::from((a.coords + b.coords + c.coords) / 3.0))
        .collect()
}

fn strictly_inside_rect(p: &Point3<f64>, x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
    p.x > x0 && p.x < x1 && p.y > y0 && p.y < y1
}

#[test]
fn convex_polygons_fan_into_n_minus_two_triangles() {
    for n in 3..=12 {
        let boundary: Vec<Point3<f64>> = (0..n)
            .map(|k| {
                let angle = k as f64 * std::f64::consts::TAU / n as f64;
                Point3::new(5.0 * angle.cos(), 5.0 * angle.sin(), 1.5)
            })
            .collect();
        let expected = 0.5 * n as f64 * 25.0 * (std::f64::consts::TAU / n as f64).sin();

        let mesh = triangulate_polygon_with_holes(&boundary, &[], false);
        assert_eq!(mesh.triangle_count(), n - 2, "n = {n}");
        assert_relative_eq!(signed_areas(&mesh).iter().sum::<f64>(), expected, max_relative = 1e-9);
    }
}

#[test]
fn square_with_centered_hole() {
    let mesh = triangulate_polygon_with_holes(
        &rect(0.0, 0.0, 10.0, 10.0),
        &[rect(4.0, 4.0, 6.0, 6.0)],
        false,
    );

    assert!(!mesh.is_empty());
    assert_eq!(mesh.vertex_count(), 8);
    assert_relative_eq!(signed_areas(&mesh).iter().sum::<f64>(), 96.0, epsilon = 1e-9);
    for c in centroids(&mesh) {
        assert!(!strictly_inside_rect(&c, 4.0, 4.0, 6.0, 6.0), "triangle centroid {c} in hole");
    }
}

#[test]
fn l_shape_without_holes() {
    let boundary = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 2.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
    ];
    let mesh = triangulate_polygon_with_holes(&boundary, &[], false);
    assert_eq!(mesh.triangle_count(), 4);
    assert_eq!(mesh.vertex_count(), 6);
    assert_relative_eq!(mesh.area(), 3.0, epsilon = 1e-12);
}

#[test]
fn several_holes_conserve_area() {
    let holes = vec![
        rect(1.0, 1.0, 3.0, 3.0),
        rect(5.0, 1.0, 7.0, 4.0),
        rect(9.0, 2.0, 11.0, 8.0),
        rect(2.0, 6.0, 6.0, 8.0),
    ];
    let mesh = triangulate_polygon_with_holes(&rect(0.0, 0.0, 12.0, 10.0), &holes, false);

    let expected = 120.0 - 4.0 - 6.0 - 12.0 - 8.0;
    assert_relative_eq!(signed_areas(&mesh).iter().sum::<f64>(), expected, epsilon = 1e-9);
    for c in centroids(&mesh) {
        assert!(!strictly_inside_rect(&c, 1.0, 1.0, 3.0, 3.0));
        assert!(!strictly_inside_rect(&c, 5.0, 1.0, 7.0, 4.0));
        assert!(!strictly_inside_rect(&c, 9.0, 2.0, 11.0, 8.0));
        assert!(!strictly_inside_rect(&c, 2.0, 6.0, 6.0, 8.0));
    }
}

#[test]
fn winding_follows_boundary_and_flag() {
    let boundary = rect(0.0, 0.0, 10.0, 10.0);
    let holes = [rect(4.0, 4.0, 6.0, 6.0)];

    let ccw = triangulate_polygon_with_holes(&boundary, &holes, false);
    assert!(signed_areas(&ccw).iter().all(|&a| a >= 0.0));

    let flipped = triangulate_polygon_with_holes(&boundary, &holes, true);
    assert!(signed_areas(&flipped).iter().all(|&a| a <= 0.0));
    assert_eq!(flipped.triangle_count(), ccw.triangle_count());

    let mut clockwise = boundary.clone();
    clockwise.reverse();
    let cw = triangulate_polygon_with_holes(&clockwise, &holes, false);
    assert!(signed_areas(&cw).iter().all(|&a| a <= 0.0));
    assert_relative_eq!(cw.area(), 96.0, epsilon = 1e-9);
}

#[test]
fn hole_winding_does_not_matter() {
    let boundary = rect(0.0, 0.0, 10.0, 10.0);
    let mut hole = rect(2.0, 3.0, 7.0, 6.0);
    let a = triangulate_polygon_with_holes(&boundary, &[hole.clone()], false);
    hole.reverse();
    let b = triangulate_polygon_with_holes(&boundary, &[hole], false);
    assert_relative_eq!(a.area(), 85.0, epsilon = 1e-9);
    assert_relative_eq!(b.area(), 85.0, epsilon = 1e-9);
}

/// Every ordering of `0..n`.
fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for rest in permutations(n - 1) {
        for slot in 0..=rest.len() {
            let mut order = rest.clone();
            order.insert(slot, n - 1);
            out.push(order);
        }
    }
    out
}

#[test]
fn hole_order_does_not_change_triangulation_size() {
    let boundary = rect(0.0, 0.0, 20.0, 10.0);
    let holes = vec![
        rect(2.0, 2.0, 5.0, 5.0),
        rect(8.0, 3.0, 12.0, 7.0),
        rect(15.0, 1.0, 18.0, 8.0),
    ];
    let expected = 200.0 - 9.0 - 16.0 - 21.0;

    let reference = triangulate_polygon_with_holes(&boundary, &holes, false);
    assert_relative_eq!(reference.area(), expected, epsilon = 1e-9);
    for order in permutations(holes.len()) {
        let permuted: Vec<Vec<Point3<f64>>> = order.iter().map(|&i| holes[i].clone()).collect();
        let mesh = triangulate_polygon_with_holes(&boundary, &permuted, false);
        assert_eq!(mesh.triangle_count(), reference.triangle_count(), "order {order:?}");
        assert_relative_eq!(mesh.area(), expected, epsilon = 1e-9);
    }
}

#[test]
fn touching_hole_order_does_not_change_triangulation_size() {
    // Three holes chained corner to corner
    let boundary = rect(0.0, 0.0, 10.0, 10.0);
    let holes = vec![
        rect(1.0, 1.0, 3.0, 3.0),
        rect(3.0, 3.0, 6.0, 6.0),
        rect(6.0, 6.0, 9.0, 9.0),
    ];
    let expected = 100.0 - 4.0 - 9.0 - 9.0;

    let reference = triangulate_polygon_with_holes(&boundary, &holes, false);
    assert_relative_eq!(reference.area(), expected, epsilon = 1e-9);
    for order in permutations(holes.len()) {
        let permuted: Vec<Vec<Point3<f64>>> = order.iter().map(|&i| holes[i].clone()).collect();
        let mesh = triangulate_polygon_with_holes(&boundary, &permuted, false);
        assert_eq!(mesh.triangle_count(), reference.triangle_count(), "order {order:?}");
        assert_relative_eq!(mesh.area(), expected, epsilon = 1e-9);
    }
}

#[test]
fn degenerate_input_gives_empty_mesh() {
    let two_points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
    assert!(triangulate_polygon_with_holes(&two_points, &[], false).is_empty());

    let boundary = rect(0.0, 0.0, 10.0, 10.0);
    let mesh = triangulate_polygon_with_holes(&boundary, &[boundary.clone()], false);
    assert!(mesh.is_empty());
    assert!(mesh.positions.is_empty() && mesh.indices.is_empty());

    let collinear = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
    ];
    assert!(triangulate_polygon_with_holes(&collinear, &[], false).is_empty());

    let mut nan = rect(0.0, 0.0, 1.0, 1.0);
    nan[2].x = f64::NAN;
    assert!(triangulate_polygon_with_holes(&nan, &[], false).is_empty());

    let short_hole = vec![Point3::new(1.0, 1.0, 0.0), Point3::new(2.0, 1.0, 0.0)];
    assert!(triangulate_polygon_with_holes(&boundary, &[short_hole], false).is_empty());
}

#[test]
fn collinear_points_are_cleaned() {
    let boundary = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(5.0, 0.0, 0.0),
        Point3::new(10.0, 0.0, 0.0),
        Point3::new(10.0, 10.0, 0.0),
        Point3::new(10.0, 10.0, 0.0),
        Point3::new(0.0, 10.0, 0.0),
    ];
    let mesh = triangulate_polygon_with_holes(&boundary, &[], false);
    assert_eq!(mesh.triangle_count(), 2);
    assert_eq!(mesh.vertex_count(), 4);
}

#[test]
fn touching_holes_are_bridged() {
    let boundary = rect_2d(0.0, 0.0, 10.0, 10.0);
    let holes = vec![rect_2d(2.0, 2.0, 5.0, 5.0), rect_2d(5.0, 5.0, 8.0, 8.0)];

    let config = TriangulationConfig::default();
    let arena = PolygonArena::from_2d(&boundary, &holes, &Predicates::new(&config)).unwrap();
    let bridges = BridgeBuilder::new(&arena, &config).build();
    assert!(bridges.is_connected());

    let mesh = Triangulator::new(config).triangulate_2d(&boundary, &holes, false);
    assert!(!mesh.is_empty());
    assert_relative_eq!(mesh.area(), 82.0, epsilon = 1e-9);
    for c in centroids(&mesh) {
        assert!(!strictly_inside_rect(&c, 2.0, 2.0, 5.0, 5.0));
        assert!(!strictly_inside_rect(&c, 5.0, 5.0, 8.0, 8.0));
    }
}

#[test]
fn holes_touching_the_boundary() {
    let boundary = rect(0.0, 0.0, 10.0, 10.0);

    // Hole sharing the boundary's corner vertex
    let corner = triangulate_polygon_with_holes(&boundary, &[rect(0.0, 0.0, 3.0, 3.0)], false);
    assert_relative_eq!(corner.area(), 91.0, epsilon = 1e-9);
    for c in centroids(&corner) {
        assert!(!strictly_inside_rect(&c, 0.0, 0.0, 3.0, 3.0));
    }

    // Hole lying along part of the bottom edge
    let edge = triangulate_polygon_with_holes(&boundary, &[rect(2.0, 0.0, 5.0, 2.0)], false);
    assert_relative_eq!(edge.area(), 94.0, epsilon = 1e-9);
    for c in centroids(&edge) {
        assert!(!strictly_inside_rect(&c, 2.0, 0.0, 5.0, 2.0));
    }

    // Two diamonds chained upwards from a point on the bottom edge
    let diamond = |cx: f64, cy: f64| {
        vec![
            Point3::new(cx, cy - 2.0, 0.0),
            Point3::new(cx + 2.0, cy, 0.0),
            Point3::new(cx, cy + 2.0, 0.0),
            Point3::new(cx - 2.0, cy, 0.0),
        ]
    };
    let holes = vec![diamond(5.0, 2.0), diamond(5.0, 6.0)];
    let chained = triangulate_polygon_with_holes(&boundary, &holes, false);
    assert_relative_eq!(chained.area(), 84.0, epsilon = 1e-9);
    for c in centroids(&chained) {
        for cy in [2.0, 6.0] {
            assert!((c.x - 5.0).abs() + (c.y - cy).abs() >= 2.0 - 1e-9, "centroid {c} in diamond");
        }
    }

    let mut swapped = holes.clone();
    swapped.reverse();
    let reordered = triangulate_polygon_with_holes(&boundary, &swapped, false);
    assert_eq!(reordered.triangle_count(), chained.triangle_count());
}

#[test]
fn wall_face_in_xz_plane() {
    // Wall face at y = 2 with a window opening
    let boundary = vec![
        Point3::new(0.0, 2.0, 0.0),
        Point3::new(4.0, 2.0, 0.0),
        Point3::new(4.0, 2.0, 3.0),
        Point3::new(0.0, 2.0, 3.0),
    ];
    let window = vec![
        Point3::new(1.0, 2.0, 1.0),
        Point3::new(2.0, 2.0, 1.0),
        Point3::new(2.0, 2.0, 2.0),
        Point3::new(1.0, 2.0, 2.0),
    ];
    let mesh = triangulate_polygon_with_holes(&boundary, &[window], false);
    assert!(!mesh.is_empty());
    assert_relative_eq!(mesh.area(), 11.0, epsilon = 1e-9);
    assert!(mesh.positions.iter().all(|p| p.y == 2.0));
}

#[test]
fn far_from_origin_keeps_precision() {
    let (x, y) = (2_600_000.0, 1_200_000.0);
    let mesh = triangulate_polygon_with_holes(
        &rect(x, y, x + 10.0, y + 10.0),
        &[rect(x + 4.0, y + 4.0, x + 6.0, y + 6.0)],
        false,
    );
    assert_relative_eq!(mesh.area(), 96.0, epsilon = 1e-6);
    // Positions are the caller's own coordinates
    assert!(mesh.positions.iter().all(|p| p.x >= x && p.y >= y));
}

#[test]
fn batch_matches_single_calls() {
    let triangulator = Triangulator::default();
    let faces = vec![
        FaceLoops::new(rect(0.0, 0.0, 10.0, 10.0), vec![rect(4.0, 4.0, 6.0, 6.0)]),
        FaceLoops::new(rect(0.0, 0.0, 1.0, 1.0), vec![]).reversed(),
        FaceLoops::new(vec![Point3::new(0.0, 0.0, 0.0)], vec![]),
    ];

    let meshes = triangulator.triangulate_faces(&faces);
    assert_eq!(meshes.len(), 3);
    for (face, mesh) in faces.iter().zip(&meshes) {
        let single = triangulator.triangulate(&face.boundary, &face.holes, face.reverse_winding);
        assert_eq!(&single, mesh);
    }
    assert!(meshes[2].is_empty());
}

#[test]
fn config_from_json() {
    let config = TriangulationConfig::from_json(
        r#"{ "linear_tolerance": 1e-7, "framing_angles": [15.0], "convex_fast_path": false }"#,
    )
    .unwrap();
    assert_eq!(config.framing_angles, vec![15.0]);
    assert_eq!(config.path_cutoff, 3);

    let round_trip = TriangulationConfig::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(round_trip, config);

    let mesh = Triangulator::new(config).triangulate(
        &rect(0.0, 0.0, 10.0, 10.0),
        &[rect(4.0, 4.0, 6.0, 6.0)],
        false,
    );
    assert_relative_eq!(mesh.area(), 96.0, epsilon = 1e-9);

    assert!(TriangulationConfig::from_json(r#"{ "area_tolerance": -1.0 }"#).is_err());
}
