// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ear-clipping triangulation of simple 2D polygons.
//!
//! Used to re-triangulate the pieces of a triangle split along a cut. Input
//! polygons may repeat a position (keyhole bridges to interior loops do), so
//! points coincident with an ear's corners never block that ear. Cut chains
//! are often nearly straight: nearly flat corners are never ears, and points
//! within a relative tolerance of an ear's edge block it, so no sliver is
//! left for the last triangle.

use crate::utils::math::{orient_2d, signed_area_2d};
use nalgebra::Point2;

/// Relative turn below which a corner counts as flat
const FLAT_EPS: f64 = 1e-9;

/// Per-vertex state of the clipping pass
#[derive(Clone, Default)]
struct VertexInfo {
    /// Not clipped yet
    is_active: bool,
    is_ear: bool,
    /// Cosine of the corner angle; the pointiest ear is clipped first
    pointiness: f64,
    prev: usize,
    next: usize,
}

/// Containment in the counter-clockwise triangle (a, b, c), counting points
/// within `tolerance` of an edge as inside
fn in_triangle(
    p: &Point2<f64>,
    [a, b, c]: [&Point2<f64>; 3],
    [ab, bc, ca]: [f64; 3],
    tolerance: f64,
) -> bool {
    orient_2d(a, b, p) >= -tolerance * ab
        && orient_2d(b, c, p) >= -tolerance * bc
        && orient_2d(c, a, p) >= -tolerance * ca
}

fn update_vertex(idx: usize, info: &[VertexInfo], points: &[Point2<f64>]) -> (bool, f64) {
    let VertexInfo { prev, next, .. } = info[idx];
    let (a, b, c) = (&points[prev], &points[idx], &points[next]);

    let pointiness = match ((a - b).try_normalize(0.0), (c - b).try_normalize(0.0)) {
        (Some(u), Some(v)) => u.dot(&v),
        _ => return (false, f64::NEG_INFINITY),
    };
    let lengths = [(b - a).norm(), (c - b).norm(), (a - c).norm()];
    if pointiness.is_nan() || !(orient_2d(a, b, c) > FLAT_EPS * lengths[0] * lengths[1]) {
        return (false, pointiness);
    }
    let tolerance = FLAT_EPS * lengths[0].max(lengths[1]).max(lengths[2]);

    let blocked = info.iter().enumerate().any(|(i, other)| {
        if !other.is_active || i == prev || i == idx || i == next {
            return false;
        }
        let p = &points[i];
        if p == a || p == b || p == c {
            return false;
        }
        in_triangle(p, [a, b, c], lengths, tolerance)
    });

    (!blocked, pointiness)
}

fn clip_ears(points: &[Point2<f64>]) -> Option<Vec<[usize; 3]>> {
    let n = points.len();
    let mut info = vec![VertexInfo::default(); n];
    for (i, vertex) in info.iter_mut().enumerate() {
        vertex.is_active = true;
        vertex.prev = if i == 0 { n - 1 } else { i - 1 };
        vertex.next = if i == n - 1 { 0 } else { i + 1 };
    }
    for i in 0..n {
        let (is_ear, pointiness) = update_vertex(i, &info, points);
        info[i].is_ear = is_ear;
        info[i].pointiness = pointiness;
    }

    let mut triangles = Vec::with_capacity(n - 2);
    for _ in 0..n - 3 {
        let (ear, _) = info
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active && v.is_ear)
            .max_by(|(_, a), (_, b)| a.pointiness.total_cmp(&b.pointiness))?;

        info[ear].is_active = false;
        let VertexInfo { prev, next, .. } = info[ear];
        triangles.push([prev, ear, next]);

        info[prev].next = next;
        info[next].prev = prev;

        for idx in [prev, next] {
            let (is_ear, pointiness) = update_vertex(idx, &info, points);
            info[idx].is_ear = is_ear;
            info[idx].pointiness = pointiness;
        }
    }

    let (last, vertex) = info.iter().enumerate().find(|(_, v)| v.is_active)?;
    triangles.push([vertex.prev, last, vertex.next]);
    Some(triangles)
}

/// Triangulate a simple polygon given in either winding.
///
/// Output triangles index into `points` and keep the polygon's winding.
/// Returns `None` for fewer than three points, zero area, or when no ear can
/// be found (self-intersecting input).
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Option<Vec<[usize; 3]>> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    if n == 3 {
        return Some(vec![[0, 1, 2]]);
    }

    let area = signed_area_2d(points);
    if !area.is_finite() || area == 0.0 {
        return None;
    }
    if area > 0.0 {
        return clip_ears(points);
    }

    let reversed: Vec<Point2<f64>> = points.iter().rev().copied().collect();
    let triangles = clip_ears(&reversed)?;
    Some(
        triangles
            .into_iter()
            .map(|[a, b, c]| [n - 1 - a, n - 1 - c, n - 1 - b])
            .collect(),
    )
}
