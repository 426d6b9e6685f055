// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - surfaces, intersection and cutting

mod bbox;
pub mod cut;
pub mod edge_loop;
pub mod intersection;
mod mesh;
pub mod predicates;
mod primitives;
mod role;
mod spatial_hash;
mod surface;
pub mod topology;
mod transform;
pub mod triangulate;

pub use bbox::BoundingBox;
pub use cut::{boolean, BooleanOp, CutDriver, CutSegment, Fragment, FragmentVertex};
pub use edge_loop::{lies_within_loop, EdgeLoop};
pub use intersection::{CutContext, CutVertex, CutVertexId, Intersection, Operand};
pub use mesh::Mesh;
pub use primitives::Primitive;
pub use role::SurfaceRole;
pub use spatial_hash::SpatialHash;
pub use surface::Surface;
pub use topology::{Edge, EdgeId, Triangle, TriangleId, Vertex, VertexId, VertexKey};
pub use transform::Transform;
