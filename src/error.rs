// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for surface import, cutting and serialization

use thiserror::Error;

/// Result alias used throughout the geometry kernel
pub type Result<T> = std::result::Result<T, CsgError>;

/// Topology-level failures surfaced to the caller.
///
/// Numerical degeneracies inside the predicates (parallel segments, zero-length
/// directions) are not errors; the predicates simply report no intersection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsgError {
    /// Raw mesh data could not be turned into a surface
    #[error("malformed mesh: {reason}")]
    MalformedMesh { reason: String },

    /// An intersection vertex could not be resolved into exactly one edge loop
    #[error("cut topology error at ({x:.4}, {y:.4}, {z:.4}): {reason}")]
    CutTopology {
        reason: String,
        x: f64,
        y: f64,
        z: f64,
    },

    /// A triangle collapsed to (near-)zero area
    #[error("degenerate triangle {triangle} (area {area:e}) during {stage}")]
    DegenerateGeometry {
        triangle: usize,
        area: f64,
        stage: &'static str,
    },

    /// A transform source carried a matrix without an inverse
    #[error("transform matrix is not invertible")]
    NonInvertibleTransform,
}

impl CsgError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMesh {
            reason: reason.into(),
        }
    }

    pub(crate) fn cut_topology(reason: impl Into<String>, at: &nalgebra::Point3<f64>) -> Self {
        Self::CutTopology {
            reason: reason.into(),
            x: at.x,
            y: at.y,
            z: at.z,
        }
    }
}
