// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Welded, adjacency-aware triangle surface.
//!
//! A [`Surface`] owns arenas of vertices, edges and triangles. Removed
//! vertices and triangles leave a tombstone so ids stay stable; edges are
//! never patched incrementally and are rebuilt from the live triangle set by
//! [`Surface::build_edges`].

use super::predicates::{point_on_triangle, ray_triangle, segment_triangle};
use super::topology::{Edge, EdgeId, Triangle, TriangleId, Vertex, VertexId, VertexKey};
use super::{BoundingBox, Mesh, SpatialHash, Transform};
use crate::config::CsgConfig;
use crate::error::{CsgError, Result};
use crate::utils::math::{calculate_triangle_normal, centroid, triangle_area};
use ahash::AHashMap;
use log::{debug, warn};
use nalgebra::{Matrix4, Point3, Vector3};
use std::ops::Index;

/// Triangulated surface with its local <-> world transform
#[derive(Debug, Clone, Default)]
pub struct Surface {
    vertices: Vec<Option<Vertex>>,
    triangles: Vec<Option<Triangle>>,
    edges: Vec<Edge>,
    key_index: AHashMap<VertexKey, VertexId>,
    transform: Transform,
    config: CsgConfig,
}

impl Surface {
    /// Empty surface
    pub fn new(transform: Transform, config: CsgConfig) -> Self {
        Self {
            transform,
            config,
            ..Self::default()
        }
    }

    /// Import raw mesh data using the default tolerances
    pub fn import(mesh: &Mesh, transform: Transform) -> Result<Self> {
        Self::import_with_config(mesh, transform, CsgConfig::default())
    }

    /// Import raw mesh data: validate, weld coincident positions, build
    /// triangles from the re-indexed index list, then derive edges.
    ///
    /// Triangles whose corners weld together are dropped.
    pub fn import_with_config(mesh: &Mesh, transform: Transform, config: CsgConfig) -> Result<Self> {
        validate_mesh(mesh)?;

        let mut surface = Self::new(transform, config);
        let mut weld = SpatialHash::new(config.weld_tolerance);
        let mut remap = Vec::with_capacity(mesh.positions.len());

        for (i, position) in mesh.positions.iter().enumerate() {
            let uv = mesh.uvs.get(i).copied();
            let (id, _) = weld.find_or_insert_with(*position, || {
                surface.push_vertex(Vertex::new(*position, uv))
            });
            remap.push(id);
        }

        let mut collapsed = 0;
        for [a, b, c] in mesh.triangles() {
            let ids = [remap[a], remap[b], remap[c]];
            if ids[0] == ids[1] || ids[1] == ids[2] || ids[0] == ids[2] {
                collapsed += 1;
                continue;
            }
            surface.insert_triangle(ids);
        }

        surface.build_edges();

        debug!(
            "Imported surface: {} positions welded to {} vertices, {} triangles ({} collapsed), {} edges",
            mesh.positions.len(),
            surface.vertex_count(),
            surface.triangle_count(),
            collapsed,
            surface.edge_count()
        );

        Ok(surface)
    }

    pub fn config(&self) -> &CsgConfig {
        &self.config
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    fn push_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.key_index.insert(vertex.key, id);
        self.vertices.push(Some(vertex));
        id
    }

    fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Create a triangle over existing vertices and register the back-references
    fn insert_triangle(&mut self, vertices: [VertexId; 3]) -> TriangleId {
        let [a, b, c] = vertices.map(|v| self[v].position);
        let normal = calculate_triangle_normal(&a, &b, &c).unwrap_or_else(Vector3::zeros);
        let id = TriangleId(self.triangles.len());

        for v in vertices {
            if let Some(vertex) = self.vertex_mut(v) {
                vertex.triangles.push(id);
            }
        }
        self.triangles.push(Some(Triangle::new(vertices, normal)));
        id
    }

    /// Id of `vertex` in this surface, adding a copy when its key is unknown
    fn intern_vertex(&mut self, vertex: Vertex) -> VertexId {
        match self.key_index.get(&vertex.key) {
            Some(&id) => id,
            None => self.push_vertex(vertex.detached()),
        }
    }

    /// Rebuild the edge arena and every triangle's edge list from scratch.
    ///
    /// Two triangles sharing a vertex pair share the same edge.
    pub fn build_edges(&mut self) {
        let Self {
            triangles, edges, ..
        } = self;
        edges.clear();

        let mut lookup: AHashMap<(VertexId, VertexId), EdgeId> = AHashMap::new();
        for (index, slot) in triangles.iter_mut().enumerate() {
            let Some(triangle) = slot else {
                continue;
            };
            let id = TriangleId(index);
            triangle.edges.clear();

            for i in 0..3 {
                let a = triangle.vertices[i];
                let b = triangle.vertices[(i + 1) % 3];
                let edge_id = *lookup.entry(Edge::key(a, b)).or_insert_with(|| {
                    edges.push(Edge::new(a, b));
                    EdgeId(edges.len() - 1)
                });
                edges[edge_id.0].triangles.push(id);
                triangle.edges.push(edge_id);
            }
        }

        let non_manifold = edges.iter().filter(|e| e.triangles.len() > 2).count();
        if non_manifold > 0 {
            warn!("Surface has {} non-manifold edges", non_manifold);
        }
    }

    /// Live vertices with their ids
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (VertexId(i), v)))
    }

    /// Live triangles with their ids
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|t| (TriangleId(i), t)))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeId(i), e))
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().flatten().count()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.iter().flatten().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    pub fn get_vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_triangle(&self, id: TriangleId) -> Option<&Triangle> {
        self.triangles.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0)
    }

    /// Corner positions of a triangle in winding order
    pub fn triangle_points(&self, id: TriangleId) -> [Point3<f64>; 3] {
        self[id].vertices.map(|v| self[v].position)
    }

    pub fn edge_points(&self, id: EdgeId) -> [Point3<f64>; 2] {
        self[id].vertices.map(|v| self[v].position)
    }

    pub fn triangle_area(&self, id: TriangleId) -> f64 {
        let [a, b, c] = self.triangle_points(id);
        triangle_area(&a, &b, &c)
    }

    pub fn triangle_centroid(&self, id: TriangleId) -> Point3<f64> {
        let [a, b, c] = self.triangle_points(id);
        centroid(&a, &b, &c)
    }

    /// Append a triangle. Corners whose key is already present are reused,
    /// others are copied in. Edges are not rebuilt.
    pub fn add_triangle(&mut self, corners: [Vertex; 3]) -> TriangleId {
        let ids = corners.map(|v| self.intern_vertex(v));
        self.insert_triangle(ids)
    }

    /// Append several triangles; see [`Surface::add_triangle`]
    pub fn add_triangles(&mut self, triangles: impl IntoIterator<Item = [Vertex; 3]>) -> Vec<TriangleId> {
        triangles
            .into_iter()
            .map(|corners| self.add_triangle(corners))
            .collect()
    }

    /// Corners of a triangle as detached vertex copies, ready for
    /// [`Surface::add_triangle`] on another surface
    pub fn triangle_corners(&self, id: TriangleId) -> [Vertex; 3] {
        self[id].vertices.map(|v| self[v].detached())
    }

    /// Remove a triangle and its back-references. Its vertices stay; edges
    /// left without triangles are dropped by the next [`Surface::build_edges`].
    pub fn remove_triangle(&mut self, id: TriangleId) -> Option<Triangle> {
        let triangle = self.triangles.get_mut(id.0)?.take()?;
        for v in triangle.vertices {
            if let Some(vertex) = self.vertex_mut(v) {
                vertex.triangles.retain(|&t| t != id);
            }
        }
        for e in &triangle.edges {
            if let Some(edge) = self.edges.get_mut(e.0) {
                edge.triangles.retain(|&t| t != id);
            }
        }
        Some(triangle)
    }

    /// Remove a vertex with every triangle that uses it, then rebuild edges.
    /// The hole is left open. Returns the number of triangles removed.
    pub fn remove_vertex(&mut self, id: VertexId) -> usize {
        let Some(vertex) = self.vertices.get_mut(id.0).and_then(Option::take) else {
            return 0;
        };
        self.key_index.remove(&vertex.key);

        let removed = vertex
            .triangles
            .iter()
            .filter(|&&t| self.remove_triangle(t).is_some())
            .count();
        self.build_edges();
        removed
    }

    /// New surface holding the triangles of both inputs.
    ///
    /// Vertices are shared only when they carry the same key; positions are
    /// not re-welded. Takes `a`'s transform and configuration.
    pub fn combine(a: &Surface, b: &Surface) -> Surface {
        let mut result = Surface::new(a.transform, a.config);
        for surface in [a, b] {
            for (id, _) in surface.triangles() {
                result.add_triangle(surface.triangle_corners(id));
            }
        }
        result.build_edges();
        result
    }

    /// Reverse every triangle's winding and normal
    pub fn flip_normals(&mut self) {
        for triangle in self.triangles.iter_mut().flatten() {
            triangle.flip();
        }
    }

    /// Recompute every cached normal from the current positions
    pub fn recalculate_normals(&mut self) {
        let Self {
            vertices, triangles, ..
        } = self;
        for triangle in triangles.iter_mut().flatten() {
            let [a, b, c] = triangle.vertices.map(|v| {
                vertices[v.0]
                    .as_ref()
                    .map(|vertex| vertex.position)
                    .unwrap_or_else(Point3::origin)
            });
            triangle.normal = calculate_triangle_normal(&a, &b, &c).unwrap_or_else(Vector3::zeros);
        }
    }

    /// Transform every vertex position in place and refresh normals
    pub fn apply_transformation(&mut self, matrix: &Matrix4<f64>) {
        for vertex in self.vertices.iter_mut().flatten() {
            vertex.position = matrix.transform_point(&vertex.position);
        }
        self.recalculate_normals();
    }

    /// Move positions from local into world space. The stored transform is
    /// kept, so [`Surface::convert_to_local`] undoes this.
    pub fn convert_to_world(&mut self) {
        let matrix = self.transform.local_to_world;
        self.apply_transformation(&matrix);
    }

    pub fn convert_to_local(&mut self) {
        let matrix = self.transform.world_to_local;
        self.apply_transformation(&matrix);
    }

    /// Re-express positions given in `from`'s local space in `to`'s local space
    pub fn convert_coordinates(&mut self, from: &Transform, to: &Transform) {
        self.apply_transformation(&Transform::between(from, to));
    }

    /// Whether some triangle uses both vertices
    pub fn shares_triangle(&self, a: VertexId, b: VertexId) -> bool {
        self.get_vertex(a)
            .map(|vertex| vertex.triangles.iter().any(|&t| self[t].contains(b)))
            .unwrap_or(false)
    }

    /// Whether a point on a triangle's plane lies within the triangle
    pub fn lies_within_triangle(&self, point: &Point3<f64>, triangle: TriangleId) -> bool {
        point_on_triangle(point, &self[triangle].normal, &self.triangle_points(triangle))
    }

    /// Whether every edge is shared by exactly two triangles
    pub fn is_closed(&self) -> bool {
        !self.edges.is_empty() && self.edges.iter().all(Edge::is_manifold)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices().map(|(_, v)| &v.position))
    }

    /// Double ray-parity containment test against this closed surface.
    ///
    /// Casts a ray up and a ray down along the configured axis, merges hits
    /// closer than `epsilon`, and reports containment when the hits above and
    /// the hits below are both odd in number. Open or self-intersecting
    /// surfaces give unspecified results.
    pub fn contains(&self, point: &Point3<f64>, epsilon: f64) -> bool {
        let axis = self.config.up_axis;
        let up = axis.direction();
        let down = -up;

        let mut hits: Vec<Point3<f64>> = Vec::new();
        for (id, _) in self.triangles() {
            let corners = self.triangle_points(id);
            for direction in [&up, &down] {
                if let Some(hit) = ray_triangle(point, direction, &corners) {
                    if !hits.iter().any(|h| (h - hit).norm() < epsilon) {
                        hits.push(hit);
                    }
                }
            }
        }

        let above = hits
            .iter()
            .filter(|h| axis.height(&(*h - point)) > 0.0)
            .count();
        let below = hits.len() - above;

        above % 2 == 1 && below % 2 == 1
    }

    /// Whether `point` lies inside the closed surface `other`
    pub fn contained_by(point: &Point3<f64>, other: &Surface, epsilon: f64) -> bool {
        other.contains(point, epsilon)
    }

    /// Quick overlap check against `other`.
    ///
    /// With `use_edge_face`, any edge of this surface crossing a triangle of
    /// `other` counts first. Falls back to any vertex of this surface lying
    /// inside `other`.
    pub fn intersects(&self, other: &Surface, epsilon: f64, use_edge_face: bool) -> bool {
        if !self
            .bounding_box()
            .loosened(epsilon)
            .intersects(&other.bounding_box())
        {
            return false;
        }

        if use_edge_face {
            for (edge, _) in self.edges() {
                let [p0, p1] = self.edge_points(edge);
                for (triangle, _) in other.triangles() {
                    let corners = other.triangle_points(triangle);
                    if segment_triangle(&p0, &p1, &corners, epsilon).is_some() {
                        return true;
                    }
                }
            }
        }

        self.vertices()
            .any(|(_, vertex)| other.contains(&vertex.position, epsilon))
    }

    /// Serialize the live triangles, transforming positions by `world_to_local`.
    ///
    /// Vertices are re-indexed densely in first-use order. UVs are emitted only
    /// when every emitted vertex has one. Fails on a triangle whose area after
    /// the transform is below the configured degenerate area.
    pub fn to_mesh(&self, world_to_local: &Matrix4<f64>) -> Result<Mesh> {
        let mut mesh = Mesh::new();
        let mut uvs = Vec::new();
        let mut remap: Vec<Option<usize>> = vec![None; self.vertices.len()];

        for (id, triangle) in self.triangles() {
            let mut corners = [0usize; 3];
            for (corner, v) in corners.iter_mut().zip(triangle.vertices) {
                *corner = match remap[v.0] {
                    Some(index) => index,
                    None => {
                        let vertex = &self[v];
                        let index = mesh.add_vertex(world_to_local.transform_point(&vertex.position));
                        uvs.push(vertex.uv);
                        remap[v.0] = Some(index);
                        index
                    }
                };
            }

            let [a, b, c] = corners.map(|i| mesh.positions[i]);
            let area = triangle_area(&a, &b, &c);
            if !(area >= self.config.degenerate_area) {
                return Err(CsgError::DegenerateGeometry {
                    triangle: id.0,
                    area,
                    stage: "to_mesh",
                });
            }

            mesh.add_triangle(corners);
            mesh.normals
                .push(calculate_triangle_normal(&a, &b, &c).unwrap_or_else(Vector3::zeros));
        }

        if let Some(uvs) = uvs.into_iter().collect::<Option<Vec<_>>>() {
            if !uvs.is_empty() {
                mesh.uvs = uvs;
            }
        }

        debug!(
            "Serialized surface: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        Ok(mesh)
    }
}

fn validate_mesh(mesh: &Mesh) -> Result<()> {
    if mesh.indices.len() % 3 != 0 {
        return Err(CsgError::malformed(format!(
            "index count {} is not a multiple of 3",
            mesh.indices.len()
        )));
    }

    if !mesh.uvs.is_empty() && mesh.uvs.len() != mesh.positions.len() {
        return Err(CsgError::malformed(format!(
            "{} uvs for {} positions",
            mesh.uvs.len(),
            mesh.positions.len()
        )));
    }

    if let Some(i) = mesh
        .positions
        .iter()
        .position(|p| !p.coords.iter().all(|c| c.is_finite()))
    {
        return Err(CsgError::malformed(format!("position {} is not finite", i)));
    }

    if let Some(&index) = mesh.indices.iter().find(|&&i| i >= mesh.positions.len()) {
        return Err(CsgError::malformed(format!(
            "index {} out of range for {} positions",
            index,
            mesh.positions.len()
        )));
    }

    Ok(())
}

impl Index<VertexId> for Surface {
    type Output = Vertex;

    fn index(&self, id: VertexId) -> &Vertex {
        self.get_vertex(id)
            .unwrap_or_else(|| panic!("vertex {} is not part of this surface", id.0))
    }
}

impl Index<TriangleId> for Surface {
    type Output = Triangle;

    fn index(&self, id: TriangleId) -> &Triangle {
        self.get_triangle(id)
            .unwrap_or_else(|| panic!("triangle {} is not part of this surface", id.0))
    }
}

impl Index<EdgeId> for Surface {
    type Output = Edge;

    fn index(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }
}
