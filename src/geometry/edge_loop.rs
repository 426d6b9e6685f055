// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed cut boundaries

use super::intersection::CutVertexId;
use super::predicates::ray_segment_on_plane;
use super::Surface;
use nalgebra::{Point3, Vector3};

/// Hit merge distance used by [`lies_within_loop`]
pub const LOOP_MERGE_EPSILON: f64 = 1e-4;

/// Cyclic sequence of intersection vertices; the last connects to the first
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLoop {
    vertices: Vec<CutVertexId>,
    points: Vec<Point3<f64>>,
}

impl EdgeLoop {
    pub(crate) fn new(vertices: Vec<CutVertexId>, points: Vec<Point3<f64>>) -> Self {
        debug_assert_eq!(vertices.len(), points.len());
        Self { vertices, points }
    }

    /// Loop over bare positions, without cut vertex ids
    pub fn from_points(points: Vec<Point3<f64>>) -> Self {
        Self {
            vertices: Vec::new(),
            points,
        }
    }

    pub fn vertices(&self) -> &[CutVertexId] {
        &self.vertices
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive point pairs, including the closing one
    pub fn segments(&self) -> impl Iterator<Item = (Point3<f64>, Point3<f64>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// At least three entries, consecutive entries distinct, and no entry
    /// visited twice before returning to the start
    pub fn is_closed(&self) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        if !self.vertices.is_empty() {
            let mut seen = self.vertices.clone();
            seen.sort();
            seen.dedup();
            return seen.len() == n;
        }
        self.segments().all(|(a, b)| a != b)
    }

    /// Best-fit plane (Newell's method) through the loop's centroid
    pub fn plane(&self) -> Option<(Point3<f64>, Vector3<f64>)> {
        if self.points.len() < 3 {
            return None;
        }
        let mut normal = Vector3::zeros();
        for (a, b) in self.segments() {
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        let normal = normal.try_normalize(f64::EPSILON)?;
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some((Point3::from(sum / self.points.len() as f64), normal))
    }

    /// Whether every point is within `tolerance` of the best-fit plane
    pub fn is_planar(&self, tolerance: f64) -> bool {
        match self.plane() {
            Some((origin, normal)) => self
                .points
                .iter()
                .all(|p| (p - origin).dot(&normal).abs() <= tolerance),
            None => false,
        }
    }

    /// Ray-parity test of a point on the loop's plane.
    ///
    /// Casts along the loop's first edge, keeps hits strictly ahead of
    /// `point`, merges hits closer than `merge_epsilon` and reports an odd
    /// count. The result is unspecified when `point` is off the plane.
    pub fn surrounds(&self, point: &Point3<f64>, merge_epsilon: f64) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        let direction = self.points[1] - self.points[0];
        if direction.norm_squared() <= f64::MIN_POSITIVE {
            return false;
        }

        let mut hits: Vec<Point3<f64>> = Vec::new();
        for (a, b) in self.segments() {
            let Some(hit) = ray_segment_on_plane(point, &direction, &a, &b) else {
                continue;
            };
            if (hit - point).dot(&direction) <= 0.0 {
                continue;
            }
            if !hits.iter().any(|h| (h - hit).norm() < merge_epsilon) {
                hits.push(hit);
            }
        }

        hits.len() % 2 == 1
    }
}

/// Whether a coplanar `point` lies inside `edge_loop`
pub fn lies_within_loop(point: &Point3<f64>, edge_loop: &EdgeLoop) -> bool {
    edge_loop.surrounds(point, LOOP_MERGE_EPSILON)
}

impl Surface {
    /// [`lies_within_loop`] with this surface's loop merge distance
    pub fn lies_within_loop(&self, point: &Point3<f64>, edge_loop: &EdgeLoop) -> bool {
        edge_loop.surrounds(point, self.config().loop_merge_epsilon)
    }
}
