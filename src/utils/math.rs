// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point2, Point3, Vector2, Vector3};

/// Unnormalized normal of a triangle (length is twice the area)
pub fn triangle_cross(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    (p1 - p0).cross(&(p2 - p0))
}

/// Calculate the unit normal of a triangle, or `None` if it has no area
pub fn calculate_triangle_normal(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> Option<Vector3<f64>> {
    triangle_cross(p0, p1, p2).try_normalize(f64::EPSILON)
}

/// Area of a triangle
pub fn triangle_area(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    triangle_cross(p0, p1, p2).norm() * 0.5
}

/// Centroid of a triangle
pub fn centroid(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Point3<f64> {
    Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
}

/// Linear interpolation between two texture coordinates
pub fn lerp_uv(a: &Vector2<f64>, b: &Vector2<f64>, t: f64) -> Vector2<f64> {
    a + (b - a) * t
}

/// Drops the dominant axis of a plane normal so points on that plane can be
/// handled in 2D without collapsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    axis: usize,
}

impl Projection {
    pub fn from_normal(normal: &Vector3<f64>) -> Self {
        let abs_normal = normal.map(|x| x.abs());
        let axis = if abs_normal.x > abs_normal.y && abs_normal.x > abs_normal.z {
            0 // Project to YZ plane
        } else if abs_normal.y > abs_normal.z {
            1 // Project to XZ plane
        } else {
            2 // Project to XY plane
        };
        Self { axis }
    }

    pub fn project(&self, p: &Point3<f64>) -> Point2<f64> {
        match self.axis {
            0 => Point2::new(p.y, p.z),
            1 => Point2::new(p.x, p.z),
            _ => Point2::new(p.x, p.y),
        }
    }
}

/// Twice the signed area of the 2D triangle (a, b, c); positive when counter-clockwise
pub fn orient_2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b - a).perp(&(c - a))
}

/// Twice the signed area of a closed 2D polygon
pub fn signed_area_2d(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}
