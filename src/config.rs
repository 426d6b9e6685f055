// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Tolerance configuration for welding, intersection and containment

use anyhow::{Context, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file consulted by [`CsgConfig::load`]
pub const CONFIG_FILE: &str = "meshcut.toml";

/// Axis along which containment rays are cast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpAxis {
    X,
    Y,
    Z,
}

impl UpAxis {
    pub fn direction(self) -> Vector3<f64> {
        match self {
            UpAxis::X => Vector3::x(),
            UpAxis::Y => Vector3::y(),
            UpAxis::Z => Vector3::z(),
        }
    }

    /// Component of `v` along this axis
    pub fn height(self, v: &Vector3<f64>) -> f64 {
        match self {
            UpAxis::X => v.x,
            UpAxis::Y => v.y,
            UpAxis::Z => v.z,
        }
    }
}

/// Tolerances used by the cutting engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsgConfig {
    /// Distance under which two vertex positions are welded into one
    pub weld_tolerance: f64,
    /// Barycentric slack allowed at triangle borders for segment hits
    pub intersection_epsilon: f64,
    /// Distance under which containment ray hits are merged
    pub containment_epsilon: f64,
    /// Distance under which loop ray hits are merged
    pub loop_merge_epsilon: f64,
    /// Triangles with a smaller area are considered collapsed
    pub degenerate_area: f64,
    /// Direction of the containment ray
    pub up_axis: UpAxis,
}

impl Default for CsgConfig {
    fn default() -> Self {
        Self {
            weld_tolerance: 1e-6,
            intersection_epsilon: 1e-7,
            containment_epsilon: 1e-4,
            loop_merge_epsilon: 1e-4,
            degenerate_area: 1e-12,
            up_axis: UpAxis::Y,
        }
    }
}

impl CsgConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: CsgConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from(CONFIG_FILE).exists() {
            Self::from_file(CONFIG_FILE)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("MESHCUT_WELD_TOLERANCE") {
            self.weld_tolerance = value
                .parse()
                .with_context(|| format!("Invalid MESHCUT_WELD_TOLERANCE: {}", value))?;
        }

        if let Ok(value) = std::env::var("MESHCUT_CONTAINMENT_EPSILON") {
            self.containment_epsilon = value
                .parse()
                .with_context(|| format!("Invalid MESHCUT_CONTAINMENT_EPSILON: {}", value))?;
        }

        if let Ok(value) = std::env::var("MESHCUT_INTERSECTION_EPSILON") {
            self.intersection_epsilon = value
                .parse()
                .with_context(|| format!("Invalid MESHCUT_INTERSECTION_EPSILON: {}", value))?;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Same configuration with a different weld tolerance
    pub fn with_weld_tolerance(mut self, tolerance: f64) -> Self {
        self.weld_tolerance = tolerance;
        self
    }
}
