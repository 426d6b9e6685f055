// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Local <-> world transform pair attached to every surface

use crate::error::{CsgError, Result};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A pair of mutually inverse 4x4 matrices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub local_to_world: Matrix4<f64>,
    pub world_to_local: Matrix4<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            local_to_world: Matrix4::identity(),
            world_to_local: Matrix4::identity(),
        }
    }

    /// Build from a local -> world matrix, inverting it for the reverse direction
    pub fn from_local_to_world(local_to_world: Matrix4<f64>) -> Result<Self> {
        let world_to_local = local_to_world
            .try_inverse()
            .ok_or(CsgError::NonInvertibleTransform)?;
        Ok(Self {
            local_to_world,
            world_to_local,
        })
    }

    pub fn translation(offset: Vector3<f64>) -> Self {
        Self {
            local_to_world: Matrix4::new_translation(&offset),
            world_to_local: Matrix4::new_translation(&-offset),
        }
    }

    pub fn to_world(&self, point: &Point3<f64>) -> Point3<f64> {
        self.local_to_world.transform_point(point)
    }

    pub fn to_local(&self, point: &Point3<f64>) -> Point3<f64> {
        self.world_to_local.transform_point(point)
    }

    /// Matrix re-expressing points from `from`'s local space in `to`'s local space
    pub fn between(from: &Transform, to: &Transform) -> Matrix4<f64> {
        to.world_to_local * from.local_to_world
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
