// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations on welded surfaces

use anyhow::Result;
use approx::assert_relative_eq;
use meshcut::{boolean, BooleanOp, Mesh, Operand, Primitive, Surface, Transform};
use nalgebra::{Matrix4, Point3};

fn cuboid(min: [f64; 3], max: [f64; 3]) -> Result<Surface> {
    let mesh = Primitive::cuboid(Point3::from(min), Point3::from(max)).to_mesh();
    Ok(Surface::import(&mesh, Transform::identity())?)
}

fn volume(mesh: &Mesh) -> f64 {
    mesh.triangles()
        .map(|[a, b, c]| {
            let (a, b, c) = (&mesh.positions[a], &mesh.positions[b], &mesh.positions[c]);
            a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
        })
        .sum()
}

fn surface_volume(surface: &Surface) -> Result<f64> {
    Ok(volume(&surface.to_mesh(&Matrix4::identity())?))
}

/// Union, intersection and difference, checked for closure and volume
fn check_all(a: &Surface, b: &Surface, overlap: f64) -> Result<()> {
    let (volume_a, volume_b) = (surface_volume(a)?, surface_volume(b)?);

    let union = a.boolean(b, BooleanOp::Union)?;
    let intersection = a.boolean(b, BooleanOp::Intersection)?;
    let difference = a.boolean(b, BooleanOp::Difference)?;

    println!(
        "union {} / intersection {} / difference {} triangles",
        union.triangle_count(),
        intersection.triangle_count(),
        difference.triangle_count()
    );

    for result in [&union, &intersection, &difference] {
        assert!(result.is_closed());
    }

    let union_volume = surface_volume(&union)?;
    let intersection_volume = surface_volume(&intersection)?;
    assert_relative_eq!(intersection_volume, overlap, epsilon = 1e-6);
    assert_relative_eq!(union_volume, volume_a + volume_b - overlap, epsilon = 1e-6);
    assert_relative_eq!(surface_volume(&difference)?, volume_a - overlap, epsilon = 1e-6);
    assert_relative_eq!(union_volume + intersection_volume, volume_a + volume_b, epsilon = 1e-6);

    Ok(())
}

#[test]
fn test_half_overlapping_cubes() -> Result<()> {
    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    let b = cuboid([0.5, 0.5, 0.5], [1.5, 1.5, 1.5])?;
    check_all(&a, &b, 0.125)?;

    // Operand order only matters for the difference
    check_all(&b, &a, 0.125)
}

#[test]
fn test_offset_cubes() -> Result<()> {
    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    let b = cuboid([0.53, 0.37, 0.29], [1.53, 1.37, 1.29])?;
    check_all(&a, &b, 0.47 * 0.63 * 0.71)
}

#[test]
fn test_bar_drilled_through_cube() -> Result<()> {
    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    let bar = cuboid([0.31, -0.5, 0.27], [0.72, 1.5, 0.66])?;
    check_all(&a, &bar, 0.41 * 0.39)?;

    let drilled = boolean(&a, &bar, BooleanOp::Difference)?;
    let mesh = drilled.to_mesh(&Matrix4::identity())?;
    assert!(!drilled.contains(&Point3::new(0.5, 0.5, 0.5), 1e-4));
    assert!(drilled.contains(&Point3::new(0.1, 0.5, 0.1), 1e-4));
    assert_eq!(mesh.normals.len(), mesh.triangle_count());
    Ok(())
}

#[test]
fn test_sphere_against_box() -> Result<()> {
    let sphere = Surface::import(&Primitive::sphere(1.0, 12).to_mesh(), Transform::identity())?;
    let block = cuboid([0.13, 0.21, 0.17], [1.6, 1.5, 1.4])?;
    assert_relative_eq!(surface_volume(&sphere)?, 3.931851652578, epsilon = 1e-9);

    check_all(&sphere, &block, 0.189593510674)
}

#[test]
fn test_sphere_uvs_follow_the_cut() -> Result<()> {
    let sphere = Surface::import(&Primitive::sphere(1.0, 12).to_mesh(), Transform::identity())?;
    let block = cuboid([0.13, 0.21, 0.17], [1.6, 1.5, 1.4])?;
    assert!(sphere.to_mesh(&Matrix4::identity())?.has_uvs());

    // Hits along sphere edges interpolate the edge's UVs; box edges carry none
    let context = sphere.intersect_with(&block);
    for record in context.records() {
        let uv = context.vertex(record.vertex).uv;
        match record.edge_owner {
            Operand::First => assert!(uv.is_some()),
            Operand::Second => {}
        }
    }

    // A union keeps box pieces, so not every output vertex has a UV
    let union = sphere.boolean(&block, BooleanOp::Union)?;
    assert!(!union.to_mesh(&Matrix4::identity())?.has_uvs());
    Ok(())
}

#[test]
fn test_disjoint_and_nested() -> Result<()> {
    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    let far = cuboid([2.0, 0.0, 0.0], [3.0, 1.0, 1.0])?;
    let inner = cuboid([0.2, 0.3, 0.4], [0.5, 0.6, 0.7])?;

    let union = a.boolean(&far, BooleanOp::Union)?;
    assert_eq!(union.triangle_count(), 24);
    assert!(a.boolean(&far, BooleanOp::Intersection)?.is_empty());

    check_all(&a, &inner, 0.027)?;
    let hollow = a.boolean(&inner, BooleanOp::Difference)?;
    assert!(!hollow.contains(&Point3::new(0.35, 0.45, 0.55), 1e-4));
    assert!(hollow.contains(&Point3::new(0.8, 0.8, 0.8), 1e-4));
    Ok(())
}

#[test]
fn test_result_serializes_to_json() -> Result<()> {
    let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0])?;
    let b = cuboid([0.5, 0.5, 0.5], [1.5, 1.5, 1.5])?;
    let mesh = a.boolean(&b, BooleanOp::Union)?.to_mesh(&Matrix4::identity())?;

    let json = mesh.to_json()?;
    let restored = Mesh::from_json(&json)?;
    assert_eq!(restored.triangle_count(), mesh.triangle_count());
    assert_eq!(restored.indices, mesh.indices);
    Ok(())
}
