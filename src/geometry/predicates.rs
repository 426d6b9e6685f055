// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric predicates for cutting: segment/ray against triangles and
//! coplanar ray/segment tests.
//!
//! Every predicate is pure. Near-parallel or zero-length inputs yield `None`
//! instead of a NaN point, so bulk scans can simply skip them.

use nalgebra::{Point3, Vector3};

/// Relative threshold under which a direction is treated as parallel to a plane
const PARALLEL_EPS: f64 = 1e-12;

/// Barycentric slack used by the unbounded ray test
const RAY_BARYCENTRIC_EPS: f64 = 1e-9;

/// Relative slack for the point-on-triangle sign test
const ON_TRIANGLE_EPS: f64 = 1e-9;

/// A segment/triangle hit with its parameter along the segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    pub point: Point3<f64>,
    /// Position along the segment, 0 at the start and 1 at the end
    pub t: f64,
}

/// Möller–Trumbore solve of `origin + t * direction` against a triangle.
/// Returns `(t, u, v)` or `None` when the direction is parallel to the plane.
fn solve_ray_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    triangle: &[Point3<f64>; 3],
) -> Option<(f64, f64, f64)> {
    let edge1 = triangle[1] - triangle[0];
    let edge2 = triangle[2] - triangle[0];
    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);

    let scale = direction.norm() * edge1.cross(&edge2).norm();
    if scale <= f64::MIN_POSITIVE || a.abs() <= PARALLEL_EPS * scale {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - triangle[0];
    let u = f * s.dot(&h);
    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    let t = f * edge2.dot(&q);

    if t.is_finite() && u.is_finite() && v.is_finite() {
        Some((t, u, v))
    } else {
        None
    }
}

fn within_barycentric(u: f64, v: f64, slack: f64) -> bool {
    u >= -slack && v >= -slack && u + v <= 1.0 + slack
}

/// Intersection of the segment `p0 -> p1` with a triangle, with its parameter.
///
/// `epsilon` widens the barycentric domain so hits exactly on a triangle edge
/// are not lost between two neighbouring triangles.
pub fn segment_triangle_hit(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    triangle: &[Point3<f64>; 3],
    epsilon: f64,
) -> Option<SegmentHit> {
    let direction = p1 - p0;
    let (t, u, v) = solve_ray_triangle(p0, &direction, triangle)?;

    if !(0.0..=1.0).contains(&t) || !within_barycentric(u, v, epsilon) {
        return None;
    }

    Some(SegmentHit {
        point: p0 + direction * t,
        t,
    })
}

/// Intersection point of the segment `p0 -> p1` with a triangle
pub fn segment_triangle(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    triangle: &[Point3<f64>; 3],
    epsilon: f64,
) -> Option<Point3<f64>> {
    segment_triangle_hit(p0, p1, triangle, epsilon).map(|hit| hit.point)
}

/// Intersection of an unbounded ray with a triangle (hits at or ahead of the origin)
pub fn ray_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    triangle: &[Point3<f64>; 3],
) -> Option<Point3<f64>> {
    let (t, u, v) = solve_ray_triangle(origin, direction, triangle)?;

    if t < 0.0 || !within_barycentric(u, v, RAY_BARYCENTRIC_EPS) {
        return None;
    }

    Some(origin + direction * t)
}

/// Intersection of the line through `origin` along `direction` with segment `a -> b`,
/// all four assumed coplanar.
///
/// The hit may lie behind the origin; callers filter on direction. Hits at `b`
/// are excluded so a vertex shared by two consecutive segments counts once.
pub fn ray_segment_on_plane(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> Option<Point3<f64>> {
    let segment = b - a;
    let n = direction.cross(&segment);
    let denom = n.norm_squared();

    let scale = direction.norm_squared() * segment.norm_squared();
    if scale <= f64::MIN_POSITIVE || denom <= PARALLEL_EPS * scale {
        return None;
    }

    let w = a - origin;
    let t = w.cross(direction).dot(&n) / denom;

    if !(0.0..1.0).contains(&t) {
        return None;
    }

    Some(a + segment * t)
}

/// Whether a point already on the triangle's plane lies within its bounds.
///
/// Checks that the point is on the inner side of all three edges with respect
/// to `normal`.
pub fn point_on_triangle(
    point: &Point3<f64>,
    normal: &Vector3<f64>,
    triangle: &[Point3<f64>; 3],
) -> bool {
    (0..3).all(|i| {
        let a = &triangle[i];
        let b = &triangle[(i + 1) % 3];
        let edge = b - a;
        let side = edge.cross(&(point - a)).dot(normal);
        side >= -ON_TRIANGLE_EPS * edge.norm() * normal.norm()
    })
}
