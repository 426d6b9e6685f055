// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Cross-surface intersection records.
//!
//! [`Surface::intersect_with`] tests every edge of each surface against every
//! triangle of the other and collects the hits in a fresh [`CutContext`]. The
//! context is the only place cut state lives: loop membership and the
//! per-edge / per-triangle record lists are dropped with it, so no metadata
//! leaks between unrelated cut operations.

use super::predicates::segment_triangle_hit;
use super::topology::{EdgeId, TriangleId, Vertex, VertexKey};
use super::{BoundingBox, SpatialHash, Surface};
use crate::utils::math::lerp_uv;
use ahash::AHashMap;
use log::debug;
use nalgebra::{Point3, Vector2};

/// Which input of a two-surface operation an edge or triangle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operand {
    First,
    Second,
}

impl Operand {
    pub fn other(self) -> Self {
        match self {
            Operand::First => Operand::Second,
            Operand::Second => Operand::First,
        }
    }
}

/// Index of a vertex in a [`CutContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CutVertexId(pub(crate) usize);

impl CutVertexId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A vertex materialized at an intersection point
#[derive(Debug, Clone, PartialEq)]
pub struct CutVertex {
    key: VertexKey,
    pub position: Point3<f64>,
    /// Interpolated along the source edge when both edge ends carry a UV
    pub uv: Option<Vector2<f64>>,
    pub(crate) used_in_loop: bool,
    pub(crate) loop_index: Option<usize>,
}

impl CutVertex {
    fn new(position: Point3<f64>, uv: Option<Vector2<f64>>) -> Self {
        Self {
            key: VertexKey::fresh(),
            position,
            uv,
            used_in_loop: false,
            loop_index: None,
        }
    }

    pub fn key(&self) -> VertexKey {
        self.key
    }

    /// Whether loop extraction already placed this vertex
    pub fn is_used_in_loop(&self) -> bool {
        self.used_in_loop
    }

    /// Index of the loop this vertex belongs to
    pub fn loop_index(&self) -> Option<usize> {
        self.loop_index
    }

    /// Surface vertex sharing this vertex's identity
    pub fn to_vertex(&self) -> Vertex {
        Vertex::from_intersection(self.key, self.position, self.uv)
    }
}

/// One edge-versus-triangle hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub vertex: CutVertexId,
    /// Surface owning `edge`; the other operand owns `triangle`
    pub edge_owner: Operand,
    pub edge: EdgeId,
    pub triangle: TriangleId,
    /// Position along the edge, from its first to its second vertex
    pub t: f64,
}

/// Everything one intersection pass produced
#[derive(Debug, Clone)]
pub struct CutContext {
    vertices: Vec<CutVertex>,
    weld: SpatialHash<CutVertexId>,
    records: Vec<Intersection>,
    /// Records per edge, ordered by `t`
    edge_records: AHashMap<(Operand, EdgeId), Vec<usize>>,
    /// Records per pierced triangle, keyed by the triangle's owner
    triangle_records: AHashMap<(Operand, TriangleId), Vec<usize>>,
}

impl CutContext {
    pub fn new(weld_tolerance: f64) -> Self {
        Self {
            vertices: Vec::new(),
            weld: SpatialHash::new(weld_tolerance),
            records: Vec::new(),
            edge_records: AHashMap::new(),
            triangle_records: AHashMap::new(),
        }
    }

    pub fn vertices(&self) -> &[CutVertex] {
        &self.vertices
    }

    pub fn vertex(&self, id: CutVertexId) -> &CutVertex {
        &self.vertices[id.0]
    }

    pub(crate) fn vertex_mut(&mut self, id: CutVertexId) -> &mut CutVertex {
        &mut self.vertices[id.0]
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = CutVertexId> {
        (0..self.vertices.len()).map(CutVertexId)
    }

    /// Positions of every distinct intersection vertex
    pub fn points(&self) -> Vec<Point3<f64>> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    pub fn records(&self) -> &[Intersection] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Records on an edge of `owner`, ordered along the edge
    pub fn edge_records(&self, owner: Operand, edge: EdgeId) -> impl Iterator<Item = &Intersection> {
        self.edge_records
            .get(&(owner, edge))
            .into_iter()
            .flatten()
            .map(|&i| &self.records[i])
    }

    /// Distinct vertices on an edge of `owner`, ordered along the edge
    pub fn edge_vertices(&self, owner: Operand, edge: EdgeId) -> Vec<CutVertexId> {
        let mut vertices: Vec<CutVertexId> = Vec::new();
        for record in self.edge_records(owner, edge) {
            if !vertices.contains(&record.vertex) {
                vertices.push(record.vertex);
            }
        }
        vertices
    }

    /// Records whose foreign edge pierced a triangle of `owner`
    pub fn triangle_records(
        &self,
        owner: Operand,
        triangle: TriangleId,
    ) -> impl Iterator<Item = &Intersection> {
        self.triangle_records
            .get(&(owner, triangle))
            .into_iter()
            .flatten()
            .map(|&i| &self.records[i])
    }

    /// Store a hit, welding it onto an existing vertex within tolerance
    pub(crate) fn record(
        &mut self,
        position: Point3<f64>,
        uv: Option<Vector2<f64>>,
        edge_owner: Operand,
        edge: EdgeId,
        triangle: TriangleId,
        t: f64,
    ) -> CutVertexId {
        let Self {
            vertices, weld, ..
        } = self;
        let (vertex, _) = weld.find_or_insert_with(position, || {
            vertices.push(CutVertex::new(position, uv));
            CutVertexId(vertices.len() - 1)
        });

        let index = self.records.len();
        self.records.push(Intersection {
            vertex,
            edge_owner,
            edge,
            triangle,
            t,
        });

        let along_edge = self.edge_records.entry((edge_owner, edge)).or_default();
        let records = &self.records;
        let at = along_edge.partition_point(|&i| records[i].t <= t);
        along_edge.insert(at, index);

        self.triangle_records
            .entry((edge_owner.other(), triangle))
            .or_default()
            .push(index);

        vertex
    }

    /// Test every edge of `edges_of` (owned by `owner`) against every
    /// triangle of `triangles_of`
    fn collect(
        &mut self,
        owner: Operand,
        edges_of: &Surface,
        triangles_of: &Surface,
        epsilon: f64,
        margin: f64,
    ) {

        let targets: Vec<_> = triangles_of
            .triangles()
            .map(|(id, _)| {
                let corners = triangles_of.triangle_points(id);
                (id, corners, BoundingBox::from_points(&corners))
            })
            .collect();

        for (edge_id, edge) in edges_of.edges() {
            let [a, b] = edge.vertices().map(|v| &edges_of[v]);
            let bounds = BoundingBox::from_points([&a.position, &b.position]).loosened(margin);

            for (triangle_id, corners, triangle_bounds) in &targets {
                if !bounds.intersects(triangle_bounds) {
                    continue;
                }
                let Some(hit) = segment_triangle_hit(&a.position, &b.position, corners, epsilon)
                else {
                    continue;
                };
                let uv = match (a.uv, b.uv) {
                    (Some(ua), Some(ub)) => Some(lerp_uv(&ua, &ub, hit.t)),
                    _ => None,
                };
                self.record(hit.point, uv, owner, edge_id, *triangle_id, hit.t);
            }
        }
    }
}

impl Surface {
    /// Intersect this surface with `other`, in both directions.
    ///
    /// Both surfaces must be expressed in the same coordinate space. Every
    /// hit becomes a record in the returned context; hits closer than the
    /// smaller of the two weld tolerances share one vertex. Both directions
    /// use the smaller intersection epsilon, so swapping the operands finds
    /// the same vertices.
    pub fn intersect_with(&self, other: &Surface) -> CutContext {
        let weld_tolerance = self.config().weld_tolerance.min(other.config().weld_tolerance);
        let epsilon = self
            .config()
            .intersection_epsilon
            .min(other.config().intersection_epsilon);
        let mut context = CutContext::new(weld_tolerance);

        if self
            .bounding_box()
            .loosened(weld_tolerance)
            .intersects(&other.bounding_box())
        {
            context.collect(Operand::First, self, other, epsilon, weld_tolerance);
            context.collect(Operand::Second, other, self, epsilon, weld_tolerance);
        }

        debug!(
            "Intersection pass: {} hits welded to {} vertices",
            context.records.len(),
            context.vertices.len()
        );

        context
    }
}
