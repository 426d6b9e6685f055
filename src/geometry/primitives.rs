// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Raw primitive meshes, shaped like the unwelded data a host engine hands over

use super::Mesh;
use nalgebra::{Point3, Vector2, Vector3};
use std::f64::consts::PI;

/// Geometric primitives
pub enum Primitive {
    Cube { size: Vector3<f64>, center: bool },
    Cuboid { min: Point3<f64>, max: Point3<f64> },
    Sphere { r: f64, fn_: u32 },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: bool) -> Self {
        Self::Cube { size, center }
    }

    pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self::Cuboid { min, max }
    }

    pub fn sphere(r: f64, fn_: u32) -> Self {
        let segments = if fn_ > 2 { fn_ } else { 32 };
        Self::Sphere { r, fn_: segments }
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Cube { size, center } => {
                let min = if *center {
                    Point3::from(-size / 2.0)
                } else {
                    Point3::origin()
                };
                generate_cuboid_mesh(min, min + size)
            }
            Self::Cuboid { min, max } => generate_cuboid_mesh(*min, *max),
            Self::Sphere { r, fn_ } => generate_sphere_mesh(*r, *fn_),
        }
    }
}

/// Twelve triangles with three private vertices each, like a flat-shaded export
fn generate_cuboid_mesh(min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let mut mesh = Mesh::new();

    let positions = [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let faces: [[usize; 3]; 12] = [
        // Front (z+)
        [4, 5, 6],
        [4, 6, 7],
        // Back (z-)
        [1, 0, 3],
        [1, 3, 2],
        // Right (x+)
        [5, 1, 2],
        [5, 2, 6],
        // Left (x-)
        [0, 4, 7],
        [0, 7, 3],
        // Top (y+)
        [7, 6, 2],
        [7, 2, 3],
        // Bottom (y-)
        [0, 1, 5],
        [0, 5, 4],
    ];

    for indices in faces {
        let v0 = mesh.add_vertex(positions[indices[0]]);
        let v1 = mesh.add_vertex(positions[indices[1]]);
        let v2 = mesh.add_vertex(positions[indices[2]]);
        mesh.add_triangle([v0, v1, v2]);
    }

    mesh
}

/// UV sphere with duplicated seam and pole vertices
fn generate_sphere_mesh(radius: f64, segments: u32) -> Mesh {
    let mut mesh = Mesh::new();
    let stacks = segments as usize;
    let slices = segments as usize;
    let mut uvs = Vec::with_capacity((stacks + 1) * (slices + 1));

    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let y = radius * phi.cos();
        let r = radius * phi.sin();

        for j in 0..=slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            mesh.add_vertex(Point3::new(r * theta.cos(), y, r * theta.sin()));
            uvs.push(Vector2::new(j as f64 / slices as f64, i as f64 / stacks as f64));
        }
    }

    // Wound so normals point away from the center
    for i in 0..stacks {
        for j in 0..slices {
            let first = i * (slices + 1) + j;
            let second = first + slices + 1;

            mesh.add_triangle([first, first + 1, second]);
            mesh.add_triangle([second, first + 1, second + 1]);
        }
    }

    mesh.with_uvs(uvs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::triangle_cross;

    #[test]
    fn test_cube_generation() {
        let mesh = Primitive::cube(Vector3::new(10.0, 10.0, 10.0), false).to_mesh();
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.triangle_count(), 12);
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(10.0, 10.0, 10.0));
    }

    #[test]
    fn test_cube_normals_point_outward() {
        let mesh = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), true).to_mesh();
        for [a, b, c] in mesh.triangles() {
            let (pa, pb, pc) = (mesh.positions[a], mesh.positions[b], mesh.positions[c]);
            let center = (pa.coords + pb.coords + pc.coords) / 3.0;
            assert!(triangle_cross(&pa, &pb, &pc).dot(&center) > 0.0);
        }
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let mesh = Primitive::sphere(1.0, 8).to_mesh();
        assert_eq!(mesh.uvs.len(), mesh.vertex_count());
        for [a, b, c] in mesh.triangles() {
            let (pa, pb, pc) = (mesh.positions[a], mesh.positions[b], mesh.positions[c]);
            let cross = triangle_cross(&pa, &pb, &pc);
            if cross.norm() < 1e-12 {
                continue; // collapsed at the poles
            }
            let center = (pa.coords + pb.coords + pc.coords) / 3.0;
            assert!(cross.dot(&center) > 0.0);
        }
    }
}
