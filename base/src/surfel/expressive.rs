//! Expressive Parameters

use crate::pbrt::{lerp, Float};
use crate::spectrum::Color3;

/// Non-physical adjustments to the finite part of a BSDF used for stylized
/// rendering.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExpressiveParameters {
    /// Scale applied to the diffuse reflectivity of saturated surfaces.
    pub saturated_material_boost: Float,

    /// Scale applied to the diffuse reflectivity of unsaturated surfaces.
    pub unsaturated_material_boost: Float,
}

impl Default for ExpressiveParameters {
    fn default() -> Self {
        Self {
            saturated_material_boost: 1.0,
            unsaturated_material_boost: 1.0,
        }
    }
}

impl ExpressiveParameters {
    /// Create new expressive parameters.
    ///
    /// * `saturated_material_boost`   - Boost for saturated spectra.
    /// * `unsaturated_material_boost` - Boost for grey spectra.
    pub fn new(saturated_material_boost: Float, unsaturated_material_boost: Float) -> Self {
        Self {
            saturated_material_boost,
            unsaturated_material_boost,
        }
    }

    /// Returns the factor to scale a diffuse reflectivity by.
    ///
    /// * `diffuse` - A priori diffuse reflectivity.
    pub fn boost(&self, diffuse: &Color3) -> Float {
        lerp(
            diffuse.saturation(),
            self.unsaturated_material_boost,
            self.saturated_material_boost,
        )
    }

    /// Returns true when no boost is applied.
    pub fn is_identity(&self) -> bool {
        self.saturated_material_boost == 1.0 && self.unsaturated_material_boost == 1.0
    }
}
