// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology primitives of a triangulated surface.
//!
//! Vertices, edges and triangles live in arenas owned by a
//! [`Surface`](super::Surface) and refer to each other by id. Back-references
//! (vertex -> triangles, triangle -> edges, edge -> triangles) are plain id
//! lists, so the adjacency graph has no ownership cycles.

use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VERTEX_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-wide identity of a vertex.
///
/// Survives copying a vertex between surfaces, so two surfaces that received
/// the same vertex (for example an intersection point) share it again when
/// combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexKey(u64);

impl VertexKey {
    pub fn fresh() -> Self {
        Self(NEXT_VERTEX_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) usize);

        impl $name {
            pub fn index(&self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Index of a vertex in its surface's arena
    VertexId
);
arena_id!(
    /// Index of an edge in its surface's arena
    EdgeId
);
arena_id!(
    /// Index of a triangle in its surface's arena
    TriangleId
);

/// A surface vertex
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub(crate) key: VertexKey,
    /// Location in the surface's working space
    pub position: Point3<f64>,
    /// Texture coordinate, when the source mesh had one
    pub uv: Option<Vector2<f64>>,
    pub(crate) triangles: Vec<TriangleId>,
    pub(crate) from_intersection: bool,
}

impl Vertex {
    pub fn new(position: Point3<f64>, uv: Option<Vector2<f64>>) -> Self {
        Self {
            key: VertexKey::fresh(),
            position,
            uv,
            triangles: Vec::new(),
            from_intersection: false,
        }
    }

    pub(crate) fn from_intersection(key: VertexKey, position: Point3<f64>, uv: Option<Vector2<f64>>) -> Self {
        Self {
            key,
            position,
            uv,
            triangles: Vec::new(),
            from_intersection: true,
        }
    }

    pub fn key(&self) -> VertexKey {
        self.key
    }

    /// Triangles of the owning surface that use this vertex
    pub fn triangles(&self) -> &[TriangleId] {
        &self.triangles
    }

    /// Whether this vertex was created at an intersection point
    pub fn is_from_intersection(&self) -> bool {
        self.from_intersection
    }

    /// Copy of this vertex with the same identity and no back-references
    pub fn detached(&self) -> Self {
        Self {
            triangles: Vec::new(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.4}, {:.4}, {:.4})",
            self.position.x, self.position.y, self.position.z
        )
    }
}

/// An unordered vertex pair and the triangles that share it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub(crate) vertices: [VertexId; 2],
    pub(crate) triangles: Vec<TriangleId>,
}

impl Edge {
    pub(crate) fn new(a: VertexId, b: VertexId) -> Self {
        Self {
            vertices: [a, b],
            triangles: Vec::new(),
        }
    }

    pub fn vertices(&self) -> [VertexId; 2] {
        self.vertices
    }

    pub fn triangles(&self) -> &[TriangleId] {
        &self.triangles
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Bordered by exactly one triangle
    pub fn is_boundary(&self) -> bool {
        self.triangles.len() == 1
    }

    /// Bordered by exactly two triangles
    pub fn is_manifold(&self) -> bool {
        self.triangles.len() == 2
    }

    /// Canonical (smaller, larger) key for the vertex pair
    pub(crate) fn key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// Three vertices in winding order; the winding defines the outward normal
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub(crate) vertices: [VertexId; 3],
    /// Edge `i` joins corner `i` and corner `(i + 1) % 3`, once edges are built
    pub(crate) edges: Vec<EdgeId>,
    pub(crate) normal: Vector3<f64>,
}

impl Triangle {
    pub(crate) fn new(vertices: [VertexId; 3], normal: Vector3<f64>) -> Self {
        Self {
            vertices,
            edges: Vec::with_capacity(3),
            normal,
        }
    }

    pub fn vertices(&self) -> [VertexId; 3] {
        self.vertices
    }

    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Cached unit normal; zero for a triangle without area
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Reverse the winding order and the cached normal
    pub(crate) fn flip(&mut self) {
        self.vertices.swap(1, 2);
        // Corner pairs become (0,2), (2,1), (1,0): the old edges in reverse
        self.edges.reverse();
        self.normal = -self.normal;
    }
}
