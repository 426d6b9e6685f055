// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Roles a clippable surface can play for its owner.
//!
//! Every role carries the same [`Surface`]; callers match on the variant to
//! decide what to do with it.

use super::Surface;

#[derive(Debug, Clone)]
pub enum SurfaceRole {
    /// The surface being cut
    Primary(Surface),
    /// A surface cutting the primary one
    Secondary(Surface),
    /// A surface both cutting and being cut
    Entangled(Surface),
}

impl SurfaceRole {
    pub fn surface(&self) -> &Surface {
        match self {
            SurfaceRole::Primary(surface)
            | SurfaceRole::Secondary(surface)
            | SurfaceRole::Entangled(surface) => surface,
        }
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        match self {
            SurfaceRole::Primary(surface)
            | SurfaceRole::Secondary(surface)
            | SurfaceRole::Entangled(surface) => surface,
        }
    }

    pub fn into_surface(self) -> Surface {
        match self {
            SurfaceRole::Primary(surface)
            | SurfaceRole::Secondary(surface)
            | SurfaceRole::Entangled(surface) => surface,
        }
    }

    /// Same role around a different surface
    pub fn map(self, f: impl FnOnce(Surface) -> Surface) -> Self {
        match self {
            SurfaceRole::Primary(surface) => SurfaceRole::Primary(f(surface)),
            SurfaceRole::Secondary(surface) => SurfaceRole::Secondary(f(surface)),
            SurfaceRole::Entangled(surface) => SurfaceRole::Entangled(f(surface)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SurfaceRole::Primary(_) => "primary",
            SurfaceRole::Secondary(_) => "secondary",
            SurfaceRole::Entangled(_) => "entangled",
        }
    }

    /// Whether this surface gets cut
    pub fn is_cut(&self) -> bool {
        matches!(self, SurfaceRole::Primary(_) | SurfaceRole::Entangled(_))
    }

    /// Whether this surface cuts others
    pub fn is_cutter(&self) -> bool {
        matches!(self, SurfaceRole::Secondary(_) | SurfaceRole::Entangled(_))
    }
}

impl AsRef<Surface> for SurfaceRole {
    fn as_ref(&self) -> &Surface {
        self.surface()
    }
}
