// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Intersection and containment on two half-overlapping unit cubes

use meshcut::geometry::predicates::ray_triangle;
use meshcut::{CsgError, CutDriver, Primitive, Surface, Transform};
use nalgebra::{Point3, Vector3};

fn cuboid(min: [f64; 3], max: [f64; 3]) -> Result<Surface, CsgError> {
    let mesh = Primitive::cuboid(Point3::from(min), Point3::from(max)).to_mesh();
    Surface::import(&mesh, Transform::identity())
}

fn sorted(mut points: Vec<Point3<f64>>) -> Vec<Point3<f64>> {
    points.sort_by(|a, b| {
        a.x.total_cmp(&b.x)
            .then(a.y.total_cmp(&b.y))
            .then(a.z.total_cmp(&b.z))
    });
    points
}

#[test]
fn test_half_overlapping_cubes_meet_in_one_loop() -> Result<(), CsgError> {
    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    let b = cuboid([0.5, 0.5, 0.5], [1.5, 1.5, 1.5])?;

    let context = a.intersect_with(&b);
    println!("{} hits on {} vertices", context.records().len(), context.len());
    assert_eq!(context.len(), 6);

    let driver = CutDriver::new(&a, &b)?;
    assert_eq!(driver.loops().len(), 1);

    let edge_loop = &driver.loops()[0];
    assert_eq!(edge_loop.len(), 6);
    assert!(edge_loop.is_closed());
    // Two boxes meet in a staircase, not a flat square
    assert!(!edge_loop.is_planar(1e-3));

    let new_vertices = driver.new_vertices();
    assert_eq!(new_vertices.len(), 6);
    assert!(new_vertices.iter().all(|v| v.is_from_intersection()));

    Ok(())
}

#[test]
fn test_containment_in_overlapping_cube() -> Result<(), CsgError> {
    let b = cuboid([0.5, 0.5, 0.5], [1.5, 1.5, 1.5])?;

    assert!(Surface::contained_by(&Point3::new(0.75, 0.75, 0.75), &b, 1e-4));
    assert!(!Surface::contained_by(&Point3::new(0.1, 0.1, 0.1), &b, 1e-4));
    Ok(())
}

#[test]
fn test_intersection_is_symmetric() -> Result<(), CsgError> {
    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    let b = cuboid([0.5, 0.5, 0.5], [1.5, 1.5, 1.5])?;

    let forward = sorted(a.intersect_with(&b).points());
    let backward = sorted(b.intersect_with(&a).points());

    assert_eq!(forward.len(), backward.len());
    for (p, q) in forward.iter().zip(&backward) {
        assert!((p - q).norm() < 1e-9, "{} != {}", p, q);
    }
    Ok(())
}

#[test]
fn test_loops_walk_back_to_start() -> Result<(), CsgError> {
    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    let b = cuboid([0.31, -0.5, 0.27], [0.72, 1.5, 0.66])?;
    let driver = CutDriver::new(&a, &b)?;

    // The bar passes clean through, leaving one loop on each side
    assert_eq!(driver.loops().len(), 2);
    let mut total = 0;
    for edge_loop in driver.loops() {
        assert!(edge_loop.is_closed());
        total += edge_loop.len();
    }
    assert_eq!(total, driver.context().len());

    for vertex in driver.context().vertices() {
        assert!(vertex.is_used_in_loop());
        assert!(vertex.loop_index().is_some());
    }
    Ok(())
}

#[test]
fn test_ray_against_single_triangle() {
    let triangle = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let down = Vector3::new(0.0, 0.0, -1.0);

    let hit = ray_triangle(&Point3::new(0.25, 0.25, 5.0), &down, &triangle).unwrap();
    assert!((hit - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-12);

    assert!(ray_triangle(&Point3::new(2.0, 2.0, 5.0), &down, &triangle).is_none());
}
