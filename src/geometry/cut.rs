// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean/cut driver.
//!
//! Turns the records of one intersection pass into cut segments (one per
//! pair of crossing triangles), closes them into [`EdgeLoop`]s, splits every
//! crossed triangle along its segments and sorts the pieces into inside and
//! outside by ray parity against the other surface.
//!
//! A crossed triangle is split as a polygon: its corners plus the cut
//! vertices on its edges, in winding order. Each chain of segments running
//! from one boundary cut vertex to another divides one polygon in two. A
//! closed ring of segments inside the triangle is bridged to the surrounding
//! polygon and also kept as a polygon of its own. The polygons are then
//! ear-clipped in the triangle's dominant projection plane.

use super::edge_loop::EdgeLoop;
use super::intersection::{CutContext, CutVertexId, Operand};
use super::topology::{TriangleId, Vertex, VertexId};
use super::triangulate::triangulate_polygon;
use super::Surface;
use crate::error::{CsgError, Result};
use crate::utils::math::{centroid, orient_2d, signed_area_2d, triangle_area, Projection};
use ahash::{AHashMap, AHashSet};
use log::debug;
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl BooleanOp {
    /// Whether the pieces of `operand` inside the other surface are kept
    fn keeps_inside(self, operand: Operand) -> bool {
        match (self, operand) {
            (BooleanOp::Union, _) => false,
            (BooleanOp::Intersection, _) => true,
            (BooleanOp::Difference, Operand::First) => false,
            (BooleanOp::Difference, Operand::Second) => true,
        }
    }
}

/// Piece of the intersection curve shared by one triangle of each surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutSegment {
    pub a: CutVertexId,
    pub b: CutVertexId,
    pub first_triangle: TriangleId,
    pub second_triangle: TriangleId,
}

impl CutSegment {
    /// Triangle of `operand` this segment lies on
    pub fn triangle(&self, operand: Operand) -> TriangleId {
        match operand {
            Operand::First => self.first_triangle,
            Operand::Second => self.second_triangle,
        }
    }
}

/// Corner of a fragment triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentVertex {
    /// Vertex of the surface being split
    Original(VertexId),
    /// Vertex created by the intersection pass
    Cut(CutVertexId),
}

/// One side of a split triangle, already triangulated
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub operand: Operand,
    /// Triangle this fragment was cut from
    pub source: TriangleId,
    /// Same winding as the source triangle
    pub triangles: Vec<[FragmentVertex; 3]>,
    /// Whether the fragment lies inside the other surface
    pub inside: bool,
}

type Polygon = Vec<FragmentVertex>;

/// Cut state of two surfaces expressed in the same space
#[derive(Debug)]
pub struct CutDriver<'a> {
    first: &'a Surface,
    second: &'a Surface,
    context: CutContext,
    segments: Vec<CutSegment>,
    loops: Vec<EdgeLoop>,
}

impl<'a> CutDriver<'a> {
    /// Intersect both surfaces and close the intersection curve into loops.
    ///
    /// Fails with [`CsgError::CutTopology`] when an intersection vertex does
    /// not sit on exactly one closed loop.
    pub fn new(first: &'a Surface, second: &'a Surface) -> Result<Self> {
        let mut context = first.intersect_with(second);
        let segments = collect_segments(first, second, &context);
        let loops = extract_loops(&mut context, &segments)?;

        debug!(
            "Cut: {} intersection vertices, {} segments, {} loops",
            context.len(),
            segments.len(),
            loops.len()
        );

        Ok(Self {
            first,
            second,
            context,
            segments,
            loops,
        })
    }

    pub fn context(&self) -> &CutContext {
        &self.context
    }

    pub fn segments(&self) -> &[CutSegment] {
        &self.segments
    }

    pub fn loops(&self) -> &[EdgeLoop] {
        &self.loops
    }

    /// Vertices created at the intersection points
    pub fn new_vertices(&self) -> Vec<Vertex> {
        self.context.vertices().iter().map(|v| v.to_vertex()).collect()
    }

    fn surface(&self, operand: Operand) -> &'a Surface {
        match operand {
            Operand::First => self.first,
            Operand::Second => self.second,
        }
    }

    fn position(&self, operand: Operand, vertex: FragmentVertex) -> Point3<f64> {
        match vertex {
            FragmentVertex::Original(id) => self.surface(operand)[id].position,
            FragmentVertex::Cut(id) => self.context.vertex(id).position,
        }
    }

    fn to_vertex(&self, operand: Operand, vertex: FragmentVertex) -> Vertex {
        match vertex {
            FragmentVertex::Original(id) => self.surface(operand)[id].detached(),
            FragmentVertex::Cut(id) => self.context.vertex(id).to_vertex(),
        }
    }

    /// Split every triangle of `operand` along the cut and classify the pieces
    pub fn split(&self, operand: Operand) -> Result<Vec<Fragment>> {
        let surface = self.surface(operand);

        let mut on_triangle: AHashMap<TriangleId, Vec<(CutVertexId, CutVertexId)>> =
            AHashMap::new();
        for segment in &self.segments {
            let list = on_triangle.entry(segment.triangle(operand)).or_default();
            let (a, b) = (segment.a, segment.b);
            if a != b && !list.iter().any(|&s| s == (a, b) || s == (b, a)) {
                list.push((a, b));
            }
        }

        let mut fragments = Vec::new();
        for (id, _) in surface.triangles() {
            let segments = on_triangle.get(&id).map(Vec::as_slice).unwrap_or(&[]);
            let polygons = self.split_triangle(operand, id, segments)?;
            let was_split = polygons.len() > 1
                || polygons
                    .iter()
                    .flatten()
                    .any(|v| matches!(v, FragmentVertex::Cut(_)));
            for polygon in polygons {
                fragments.push(self.fragment(operand, id, &polygon, was_split)?);
            }
        }

        debug!(
            "Split {:?} surface: {} triangles into {} fragments",
            operand,
            surface.triangle_count(),
            fragments.len()
        );

        Ok(fragments)
    }

    /// Polygons covering triangle `id` after cutting along `segments`
    fn split_triangle(
        &self,
        operand: Operand,
        id: TriangleId,
        segments: &[(CutVertexId, CutVertexId)],
    ) -> Result<Vec<Polygon>> {
        let surface = self.surface(operand);
        let triangle = &surface[id];

        let mut boundary: Polygon = Vec::new();
        let mut on_boundary: AHashSet<CutVertexId> = AHashSet::new();
        for (i, &corner) in triangle.vertices().iter().enumerate() {
            boundary.push(FragmentVertex::Original(corner));
            let Some(&edge) = triangle.edges().get(i) else {
                continue;
            };
            let mut along = self.context.edge_vertices(operand, edge);
            if surface[edge].vertices()[0] != corner {
                along.reverse();
            }
            for cut in along {
                if on_boundary.insert(cut) {
                    boundary.push(FragmentVertex::Cut(cut));
                }
            }
        }

        if segments.is_empty() {
            return Ok(vec![boundary]);
        }

        let mut adjacency: AHashMap<CutVertexId, Vec<(CutVertexId, usize)>> = AHashMap::new();
        for (index, &(a, b)) in segments.iter().enumerate() {
            adjacency.entry(a).or_default().push((b, index));
            adjacency.entry(b).or_default().push((a, index));
        }
        let mut used = vec![false; segments.len()];
        let next_unused = |vertex: CutVertexId, used: &[bool]| {
            adjacency
                .get(&vertex)
                .and_then(|links| links.iter().find(|(_, s)| !used[*s]))
                .copied()
        };

        // Chains run between two boundary cut vertices
        let mut chains: Vec<Vec<CutVertexId>> = Vec::new();
        for vertex in &boundary {
            let FragmentVertex::Cut(start) = *vertex else {
                continue;
            };
            while let Some((mut current, segment)) = next_unused(start, &used) {
                used[segment] = true;
                let mut chain = vec![start, current];
                while !on_boundary.contains(&current) {
                    let (next, segment) = next_unused(current, &used).ok_or_else(|| {
                        self.topology_error("cut chain ends inside a triangle", current)
                    })?;
                    used[segment] = true;
                    chain.push(next);
                    current = next;
                }
                if current == start {
                    return Err(self.topology_error("cut chain leaves a triangle where it entered", start));
                }
                chains.push(chain);
            }
        }

        // Whatever is left forms rings inside the triangle
        let mut rings: Vec<Vec<CutVertexId>> = Vec::new();
        for index in 0..segments.len() {
            if used[index] {
                continue;
            }
            used[index] = true;
            let (start, mut current) = segments[index];
            let mut ring = vec![start];
            while current != start {
                ring.push(current);
                let (next, segment) = next_unused(current, &used)
                    .ok_or_else(|| self.topology_error("open cut inside a triangle", current))?;
                used[segment] = true;
                current = next;
            }
            rings.push(ring);
        }

        let mut polygons = vec![boundary];
        for chain in &chains {
            let entry = FragmentVertex::Cut(chain[0]);
            let exit = FragmentVertex::Cut(chain[chain.len() - 1]);
            let interior = &chain[1..chain.len() - 1];

            let (p, i, j) = polygons
                .iter()
                .enumerate()
                .find_map(|(p, polygon)| {
                    let i = polygon.iter().position(|v| *v == entry)?;
                    let j = polygon.iter().position(|v| *v == exit)?;
                    Some((p, i, j))
                })
                .ok_or_else(|| self.topology_error("cut chains cross inside a triangle", chain[0]))?;

            let polygon = polygons.swap_remove(p);
            let mut first = cyclic_range(&polygon, i, j);
            first.extend(interior.iter().rev().map(|&c| FragmentVertex::Cut(c)));
            let mut second = cyclic_range(&polygon, j, i);
            second.extend(interior.iter().map(|&c| FragmentVertex::Cut(c)));

            polygons.extend([first, second].into_iter().filter(|part| part.len() >= 3));
        }

        if !rings.is_empty() {
            let projection = Projection::from_normal(&triangle.normal());
            let project = |v: &FragmentVertex| projection.project(&self.position(operand, *v));

            for ring in rings {
                let probe = projection.project(&self.context.vertex(ring[0]).position);
                let p = polygons
                    .iter()
                    .position(|polygon| {
                        let outline: Vec<Point2<f64>> = polygon.iter().map(&project).collect();
                        point_in_polygon(&probe, &outline)
                    })
                    .ok_or_else(|| self.topology_error("cut ring lies outside its triangle", ring[0]))?;

                let outer = polygons.swap_remove(p);
                let outer_points: Vec<Point2<f64>> = outer.iter().map(&project).collect();

                // The ring keeps the outer winding; the hole runs against it
                let mut inner: Polygon = ring.iter().map(|&c| FragmentVertex::Cut(c)).collect();
                let mut inner_points: Vec<Point2<f64>> = inner.iter().map(&project).collect();
                if signed_area_2d(&inner_points).signum() != signed_area_2d(&outer_points).signum() {
                    inner.reverse();
                    inner_points.reverse();
                }
                let hole: Polygon = inner.iter().rev().copied().collect();
                let hole_points: Vec<Point2<f64>> = inner_points.iter().rev().copied().collect();

                polygons.push(bridge(&outer, &outer_points, &hole, &hole_points));
                polygons.push(inner);
            }
        }

        Ok(polygons)
    }

    /// Triangulate one polygon of a split triangle and classify it
    fn fragment(
        &self,
        operand: Operand,
        source: TriangleId,
        polygon: &[FragmentVertex],
        was_split: bool,
    ) -> Result<Fragment> {
        let surface = self.surface(operand);
        let other = self.surface(operand.other());

        let positions: Vec<Point3<f64>> = polygon
            .iter()
            .map(|v| self.position(operand, *v))
            .collect();
        let projection = Projection::from_normal(&surface[source].normal());
        let projected: Vec<Point2<f64>> = positions.iter().map(|p| projection.project(p)).collect();

        let indices = triangulate_polygon(&projected).ok_or_else(|| {
            CsgError::cut_topology(
                format!(
                    "{}-gon cut from triangle {} could not be triangulated",
                    polygon.len(),
                    source.index()
                ),
                &positions[0],
            )
        })?;

        let mut triangles = Vec::with_capacity(indices.len());
        let mut probe = (f64::NEG_INFINITY, positions[0]);
        for [a, b, c] in indices {
            let (pa, pb, pc) = (&positions[a], &positions[b], &positions[c]);
            let area = triangle_area(pa, pb, pc);
            if was_split && !(area >= surface.config().degenerate_area) {
                return Err(CsgError::DegenerateGeometry {
                    triangle: source.index(),
                    area,
                    stage: "cut split",
                });
            }
            if area > probe.0 {
                probe = (area, centroid(pa, pb, pc));
            }
            triangles.push([polygon[a], polygon[b], polygon[c]]);
        }

        Ok(Fragment {
            operand,
            source,
            triangles,
            inside: other.contains(&probe.1, surface.config().containment_epsilon),
        })
    }

    /// Pieces of `operand` inside and outside the other surface, as
    /// `(inside, outside)`
    pub fn partition(&self, operand: Operand) -> Result<(Surface, Surface)> {
        let surface = self.surface(operand);
        let mut inside = Surface::new(*surface.transform(), *surface.config());
        let mut outside = Surface::new(*surface.transform(), *surface.config());

        for fragment in self.split(operand)? {
            let target = if fragment.inside {
                &mut inside
            } else {
                &mut outside
            };
            for &corners in &fragment.triangles {
                target.add_triangle(corners.map(|v| self.to_vertex(operand, v)));
            }
        }

        inside.build_edges();
        outside.build_edges();
        Ok((inside, outside))
    }

    /// Combine the kept pieces of both surfaces into a new welded surface.
    ///
    /// Pieces of the second surface kept by a difference are flipped so they
    /// face out of the result.
    pub fn boolean(&self, op: BooleanOp) -> Result<Surface> {
        let mut result = Surface::new(*self.first.transform(), *self.first.config());

        for operand in [Operand::First, Operand::Second] {
            let keep_inside = op.keeps_inside(operand);
            let flip = op == BooleanOp::Difference && operand == Operand::Second;

            for fragment in self.split(operand)? {
                if fragment.inside != keep_inside {
                    continue;
                }
                for [a, b, c] in fragment.triangles {
                    let corners = if flip { [a, c, b] } else { [a, b, c] };
                    result.add_triangle(corners.map(|v| self.to_vertex(operand, v)));
                }
            }
        }

        result.build_edges();

        debug!(
            "{:?}: {} vertices, {} triangles",
            op,
            result.vertex_count(),
            result.triangle_count()
        );

        Ok(result)
    }

    fn topology_error(&self, reason: &str, at: CutVertexId) -> CsgError {
        CsgError::cut_topology(reason, &self.context.vertex(at).position)
    }
}

impl Surface {
    /// Boolean combination with `other`, which must share this surface's space
    pub fn boolean(&self, other: &Surface, op: BooleanOp) -> Result<Surface> {
        CutDriver::new(self, other)?.boolean(op)
    }
}

/// Boolean combination of two surfaces
pub fn boolean(a: &Surface, b: &Surface, op: BooleanOp) -> Result<Surface> {
    a.boolean(b, op)
}

/// One segment per pair of crossing triangles.
///
/// A hit of an edge on triangle `t` lies on every triangle around that edge,
/// so it is filed under each (edge triangle, `t`) pair. Two distinct points
/// in a pair bound its segment; collinear extra points are chained in order.
fn collect_segments(first: &Surface, second: &Surface, context: &CutContext) -> Vec<CutSegment> {
    let mut pairs: BTreeMap<(TriangleId, TriangleId), Vec<CutVertexId>> = BTreeMap::new();

    for record in context.records() {
        let owner = match record.edge_owner {
            Operand::First => first,
            Operand::Second => second,
        };
        let Some(edge) = owner.get_edge(record.edge) else {
            continue;
        };
        for &triangle in edge.triangles() {
            let key = match record.edge_owner {
                Operand::First => (triangle, record.triangle),
                Operand::Second => (record.triangle, triangle),
            };
            let vertices = pairs.entry(key).or_default();
            if !vertices.contains(&record.vertex) {
                vertices.push(record.vertex);
            }
        }
    }

    let mut segments = Vec::new();
    for ((first_triangle, second_triangle), mut vertices) in pairs {
        if vertices.len() < 2 {
            continue;
        }
        if vertices.len() > 2 {
            sort_along_line(context, &mut vertices);
        }
        segments.extend(vertices.windows(2).map(|pair| CutSegment {
            a: pair[0],
            b: pair[1],
            first_triangle,
            second_triangle,
        }));
    }
    segments
}

/// Order roughly collinear vertices along the line through the farthest pair
fn sort_along_line(context: &CutContext, vertices: &mut [CutVertexId]) {
    let position = |id: &CutVertexId| context.vertex(*id).position;
    let mut span = (0.0, 0, 0);
    for i in 0..vertices.len() {
        for j in i + 1..vertices.len() {
            let d = (position(&vertices[i]) - position(&vertices[j])).norm_squared();
            if d > span.0 {
                span = (d, i, j);
            }
        }
    }
    let origin = position(&vertices[span.1]);
    let direction = position(&vertices[span.2]) - origin;
    vertices.sort_by(|a, b| {
        let ta = (position(a) - origin).dot(&direction);
        let tb = (position(b) - origin).dot(&direction);
        ta.total_cmp(&tb)
    });
}

/// Walk the segment graph into closed loops, marking every vertex with the
/// loop it belongs to
fn extract_loops(context: &mut CutContext, segments: &[CutSegment]) -> Result<Vec<EdgeLoop>> {
    let mut adjacency: BTreeMap<CutVertexId, Vec<CutVertexId>> = BTreeMap::new();
    let mut seen: BTreeSet<(CutVertexId, CutVertexId)> = BTreeSet::new();
    for segment in segments {
        let (a, b) = (segment.a, segment.b);
        if a == b || !seen.insert((a.min(b), a.max(b))) {
            continue;
        }
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    }

    let mut links = Vec::with_capacity(context.len());
    for id in context.vertex_ids() {
        match adjacency.get(&id).map(Vec::as_slice) {
            Some(&[a, b]) => links.push([a, b]),
            other => {
                let degree = other.map_or(0, <[CutVertexId]>::len);
                return Err(CsgError::cut_topology(
                    format!("intersection vertex has {} cut segments, expected 2", degree),
                    &context.vertex(id).position,
                ));
            }
        }
    }

    let mut loops = Vec::new();
    for start in context.vertex_ids().collect::<Vec<_>>() {
        if context.vertex(start).used_in_loop {
            continue;
        }
        let index = loops.len();
        let mut vertices = Vec::new();
        let mut previous = links[start.0][1];
        let mut current = start;

        loop {
            let vertex = context.vertex_mut(current);
            if vertex.used_in_loop {
                let position = vertex.position;
                return Err(CsgError::cut_topology(
                    "intersection vertex reached by two loops",
                    &position,
                ));
            }
            vertex.used_in_loop = true;
            vertex.loop_index = Some(index);
            vertices.push(current);

            let [a, b] = links[current.0];
            let next = if a == previous { b } else { a };
            previous = current;
            current = next;
            if current == start {
                break;
            }
        }

        let points = vertices.iter().map(|&v| context.vertex(v).position).collect();
        loops.push(EdgeLoop::new(vertices, points));
    }

    Ok(loops)
}

/// `polygon[from..=to]`, wrapping around the end
fn cyclic_range(polygon: &[FragmentVertex], from: usize, to: usize) -> Polygon {
    let n = polygon.len();
    let count = (to + n - from) % n + 1;
    (0..count).map(|k| polygon[(from + k) % n]).collect()
}

/// Even-odd containment of a 2D point in a closed outline
fn point_in_polygon(point: &Point2<f64>, outline: &[Point2<f64>]) -> bool {
    let n = outline.len();
    let mut inside = false;
    for i in 0..n {
        let a = &outline[i];
        let b = &outline[(i + 1) % n];
        if (a.y > point.y) != (b.y > point.y) {
            let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if point.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Whether segments p1-p2 and q1-q2 cross at a single interior point
fn segments_cross(p1: &Point2<f64>, p2: &Point2<f64>, q1: &Point2<f64>, q2: &Point2<f64>) -> bool {
    let d1 = orient_2d(q1, q2, p1);
    let d2 = orient_2d(q1, q2, p2);
    let d3 = orient_2d(p1, p2, q1);
    let d4 = orient_2d(p1, p2, q2);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Join a hole (wound against `outer`) to `outer` through the shortest
/// bridge that crosses no edge of either outline
fn bridge(
    outer: &[FragmentVertex],
    outer_points: &[Point2<f64>],
    hole: &[FragmentVertex],
    hole_points: &[Point2<f64>],
) -> Polygon {
    let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
    for (o, po) in outer_points.iter().enumerate() {
        for (h, ph) in hole_points.iter().enumerate() {
            candidates.push(((po - ph).norm_squared(), o, h));
        }
    }
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let crosses = |outline: &[Point2<f64>], a: &Point2<f64>, b: &Point2<f64>| {
        let n = outline.len();
        (0..n).any(|i| segments_cross(a, b, &outline[i], &outline[(i + 1) % n]))
    };
    let (_, o, h) = candidates
        .iter()
        .copied()
        .find(|&(_, o, h)| {
            let (a, b) = (&outer_points[o], &hole_points[h]);
            !crosses(outer_points, a, b) && !crosses(hole_points, a, b)
        })
        .unwrap_or(candidates[0]);

    let mut polygon = Vec::with_capacity(outer.len() + hole.len() + 2);
    polygon.extend_from_slice(&outer[..=o]);
    polygon.extend_from_slice(&hole[h..]);
    polygon.extend_from_slice(&hole[..=h]);
    polygon.extend_from_slice(&outer[o..]);
    polygon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Mesh, Primitive, Transform};
    use approx::assert_relative_eq;
    use nalgebra::Matrix4;

    fn cuboid(min: [f64; 3], max: [f64; 3]) -> Surface {
        Surface::import(
            &Primitive::cuboid(Point3::from(min), Point3::from(max)).to_mesh(),
            Transform::identity(),
        )
        .unwrap()
    }

    fn volume(surface: &Surface) -> f64 {
        let mesh = surface.to_mesh(&Matrix4::identity()).unwrap();
        mesh.triangles()
            .map(|[a, b, c]| {
                let (a, b, c) = (mesh.positions[a], mesh.positions[b], mesh.positions[c]);
                a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
            })
            .sum()
    }

    fn total_area(surface: &Surface) -> f64 {
        surface.triangles().map(|(id, _)| surface.triangle_area(id)).sum()
    }

    fn offset_cubes() -> (Surface, Surface) {
        (
            cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            cuboid([0.53, 0.37, 0.29], [1.53, 1.37, 1.29]),
        )
    }

    #[test]
    fn test_offset_cubes_form_one_loop() {
        let (a, b) = offset_cubes();
        let driver = CutDriver::new(&a, &b).unwrap();

        assert_eq!(driver.context().len(), 15);
        assert_eq!(driver.loops().len(), 1);
        assert_eq!(driver.loops()[0].len(), 15);
        assert!(driver.loops()[0].is_closed());
        for vertex in driver.context().vertices() {
            assert!(vertex.is_used_in_loop());
            assert_eq!(vertex.loop_index(), Some(0));
        }
        assert_eq!(driver.new_vertices().len(), 15);
    }

    #[test]
    fn test_offset_cube_booleans() {
        let (a, b) = offset_cubes();
        let driver = CutDriver::new(&a, &b).unwrap();

        let union = driver.boolean(BooleanOp::Union).unwrap();
        let intersection = driver.boolean(BooleanOp::Intersection).unwrap();
        let difference = driver.boolean(BooleanOp::Difference).unwrap();

        let overlap = 0.47 * 0.63 * 0.71;
        assert_relative_eq!(volume(&union), 2.0 - overlap, epsilon = 1e-9);
        assert_relative_eq!(volume(&intersection), overlap, epsilon = 1e-9);
        assert_relative_eq!(volume(&difference), 1.0 - overlap, epsilon = 1e-9);

        for result in [&union, &intersection, &difference] {
            assert!(result.is_closed());
        }
    }

    #[test]
    fn test_partition_areas() {
        let (a, b) = offset_cubes();
        let driver = CutDriver::new(&a, &b).unwrap();
        let (inside, outside) = driver.partition(Operand::First).unwrap();

        let expected = 0.63 * 0.71 + 0.47 * 0.71 + 0.47 * 0.63;
        assert_relative_eq!(total_area(&inside), expected, epsilon = 1e-9);
        assert_relative_eq!(total_area(&outside), 6.0 - expected, epsilon = 1e-9);
    }

    #[test]
    fn test_split_fragments_keep_winding() {
        let (a, b) = offset_cubes();
        let driver = CutDriver::new(&a, &b).unwrap();

        for fragment in driver.split(Operand::First).unwrap() {
            let normal = a[fragment.source].normal();
            for &corners in &fragment.triangles {
                let [p, q, r] = corners.map(|v| driver.position(Operand::First, v));
                assert!((q - p).cross(&(r - p)).dot(&normal) > 0.0);
            }
        }
    }

    #[test]
    fn test_nested_cubes() {
        let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = cuboid([0.2, 0.3, 0.4], [0.5, 0.6, 0.7]);
        let driver = CutDriver::new(&a, &b).unwrap();
        assert!(driver.loops().is_empty());

        let union = driver.boolean(BooleanOp::Union).unwrap();
        assert_eq!(union.triangle_count(), 12);
        assert_relative_eq!(volume(&union), 1.0, epsilon = 1e-9);

        let intersection = driver.boolean(BooleanOp::Intersection).unwrap();
        assert_eq!(intersection.triangle_count(), 12);
        assert_relative_eq!(volume(&intersection), 0.027, epsilon = 1e-9);

        let difference = driver.boolean(BooleanOp::Difference).unwrap();
        assert_eq!(difference.triangle_count(), 24);
        assert_relative_eq!(volume(&difference), 0.973, epsilon = 1e-9);
    }

    #[test]
    fn test_disjoint_cubes() {
        let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = cuboid([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]);

        let union = boolean(&a, &b, BooleanOp::Union).unwrap();
        assert_eq!(union.triangle_count(), 24);
        assert_relative_eq!(volume(&union), 2.0, epsilon = 1e-9);

        assert!(a.boolean(&b, BooleanOp::Intersection).unwrap().is_empty());

        let difference = a.boolean(&b, BooleanOp::Difference).unwrap();
        assert_eq!(difference.triangle_count(), 12);
        assert_relative_eq!(volume(&difference), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ring_inside_single_triangle() {
        // The post pierces one triangle of the big cube's top face
        let big = cuboid([-2.0, -2.0, -2.0], [2.0, 2.0, 2.0]);
        let post = cuboid([0.5, 1.5, 0.5], [1.0, 3.0, 1.0]);
        let driver = CutDriver::new(&big, &post).unwrap();
        assert_eq!(driver.loops().len(), 1);
        assert_eq!(driver.loops()[0].len(), 8);

        let union = driver.boolean(BooleanOp::Union).unwrap();
        assert!(union.is_closed());
        assert_relative_eq!(volume(&union), 64.25, epsilon = 1e-9);

        let intersection = driver.boolean(BooleanOp::Intersection).unwrap();
        assert!(intersection.is_closed());
        assert_relative_eq!(volume(&intersection), 0.125, epsilon = 1e-9);

        let difference = driver.boolean(BooleanOp::Difference).unwrap();
        assert!(difference.is_closed());
        assert_relative_eq!(volume(&difference), 63.875, epsilon = 1e-9);
    }

    #[test]
    fn test_open_cut_is_rejected() {
        // A lone triangle poking into the cube leaves loose ends
        let cube = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let blade = Surface::import(
            &Mesh::from_parts(
                vec![
                    Point3::new(-1.0, 0.5, 0.5),
                    Point3::new(0.5, 0.5, 0.3),
                    Point3::new(0.5, 0.5, 0.7),
                ],
                vec![0, 1, 2],
            ),
            Transform::identity(),
        )
        .unwrap();

        let err = CutDriver::new(&cube, &blade).unwrap_err();
        assert!(matches!(err, CsgError::CutTopology { .. }));
    }

    #[test]
    fn test_folded_polygon_is_rejected() {
        let a = cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = cuboid([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]);
        let driver = CutDriver::new(&a, &b).unwrap();

        // Doubles back over its first corner, so no ear can be cut
        let (source, triangle) = a.triangles().next().unwrap();
        let [p, q, r] = triangle.vertices();
        let polygon: Polygon = [p, q, p, r].into_iter().map(FragmentVertex::Original).collect();

        let err = driver.fragment(Operand::First, source, &polygon, true).unwrap_err();
        assert!(matches!(err, CsgError::CutTopology { .. }));
        assert!(err.to_string().contains("could not be triangulated"));
    }

    #[test]
    fn test_keep_rules() {
        assert!(!BooleanOp::Union.keeps_inside(Operand::First));
        assert!(!BooleanOp::Union.keeps_inside(Operand::Second));
        assert!(BooleanOp::Intersection.keeps_inside(Operand::First));
        assert!(BooleanOp::Intersection.keeps_inside(Operand::Second));
        assert!(!BooleanOp::Difference.keeps_inside(Operand::First));
        assert!(BooleanOp::Difference.keeps_inside(Operand::Second));
    }

    #[test]
    fn test_cyclic_range_wraps() {
        let polygon: Polygon = (0..5).map(|i| FragmentVertex::Original(VertexId(i))).collect();
        let range = cyclic_range(&polygon, 3, 1);
        let expected: Polygon = [3, 4, 0, 1]
            .into_iter()
            .map(|i| FragmentVertex::Original(VertexId(i)))
            .collect();
        assert_eq!(range, expected);
    }
}
