// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Raw triangle mesh exchanged with the host application.
//!
//! Input meshes carry positions, optional UVs and a flat index list. Meshes
//! produced by [`Surface::to_mesh`](super::Surface::to_mesh) also carry one
//! normal per triangle.

use super::BoundingBox;
use crate::utils::math::calculate_triangle_normal;
use nalgebra::{Matrix4, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Flat, index-based triangle mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Point3<f64>>,
    /// Either empty or one entry per position
    #[serde(default)]
    pub uvs: Vec<Vector2<f64>>,
    /// Three entries per triangle
    pub indices: Vec<usize>,
    /// One entry per triangle; empty on input meshes
    #[serde(default)]
    pub normals: Vec<Vector3<f64>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(positions: Vec<Point3<f64>>, indices: Vec<usize>) -> Self {
        Self {
            positions,
            uvs: Vec::new(),
            indices,
            normals: Vec::new(),
        }
    }

    pub fn with_uvs(mut self, uvs: Vec<Vector2<f64>>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        let index = self.positions.len();
        self.positions.push(position);
        index
    }

    pub fn add_triangle(&mut self, indices: [usize; 3]) {
        self.indices.extend_from_slice(&indices);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }

    /// Corner indices of triangle `i`
    pub fn triangle(&self, i: usize) -> [usize; 3] {
        [self.indices[3 * i], self.indices[3 * i + 1], self.indices[3 * i + 2]]
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Transform all positions by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        for position in &mut self.positions {
            *position = matrix.transform_point(position);
        }
        if !self.normals.is_empty() {
            self.recompute_normals();
        }
    }

    /// Recompute one normal per triangle from the winding order
    pub fn recompute_normals(&mut self) {
        self.normals = self
            .triangles()
            .map(|[a, b, c]| {
                calculate_triangle_normal(&self.positions[a], &self.positions[b], &self.positions[c])
                    .unwrap_or_else(Vector3::zeros)
            })
            .collect();
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.positions)
    }

    /// Serialize for handoff to a renderer
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
