// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Meshcut
//!
//! Intersection, clipping and boolean operations on triangle surfaces.
//! Raw meshes are welded into [`Surface`]s with explicit vertex, edge and
//! triangle topology; two surfaces are intersected edge-against-triangle,
//! the hits are closed into edge loops, and every crossed triangle is split
//! and classified against the other surface.
//!
//! ```no_run
//! use meshcut::{BooleanOp, Primitive, Surface, Transform};
//! use nalgebra::Point3;
//!
//! let a = Primitive::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
//! let b = Primitive::cuboid(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5));
//! let a = Surface::import(&a.to_mesh(), Transform::identity())?;
//! let b = Surface::import(&b.to_mesh(), Transform::identity())?;
//! let union = a.boolean(&b, BooleanOp::Union)?;
//! let mesh = union.to_mesh(&Transform::identity().world_to_local)?;
//! # Ok::<(), meshcut::CsgError>(())
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod utils;

pub use config::{CsgConfig, UpAxis};
pub use error::{CsgError, Result};
pub use geometry::{
    boolean, lies_within_loop, BooleanOp, BoundingBox, CutContext, CutDriver, EdgeLoop, Mesh,
    Operand, Primitive, Surface, SurfaceRole, Transform,
};
