//! Surfel Data

use crate::geometry::{Point3f, Vector3f};
use crate::material::MaterialId;
use crate::pbrt::{Float, INFINITY};
use crate::spectrum::Color3;
use crate::surface::SurfaceId;
use bitflags::bitflags;

bitflags! {
    /// Surfel flags.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SurfelFlags: u8 {
        /// The surface emits light.
        const IS_LIGHT = 0x1;
    }
}

/// Identifies the primitive a surfel was generated from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfelSource {
    /// Triangle index in the tree that produced the hit.
    pub index: usize,

    /// Index of that triangle within its surface.
    pub primitive: u32,

    /// Barycentric weight of the second vertex.
    pub u: Float,

    /// Barycentric weight of the third vertex.
    pub v: Float,
}

impl Default for SurfelSource {
    fn default() -> Self {
        Self {
            index: usize::MAX,
            primitive: u32::MAX,
            u: 0.0,
            v: 0.0,
        }
    }
}

/// Local geometry shared by every surfel implementation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfelData {
    /// World space position.
    pub position: Point3f,

    /// World space position at the previous frame.
    pub prev_position: Point3f,

    /// Normal of the underlying triangle.
    pub geometric_normal: Vector3f,

    /// Interpolated, possibly bump mapped normal.
    pub shading_normal: Vector3f,

    /// First shading tangent.
    pub shading_tangent1: Vector3f,

    /// Second shading tangent.
    pub shading_tangent2: Vector3f,

    /// Ratio of the index of refraction on the normal side to the back side.
    /// NaN for opaque surfaces.
    pub eta_ratio: Float,

    /// Extinction coefficient on the normal side.
    pub kappa_pos: Color3,

    /// Extinction coefficient on the back side.
    pub kappa_neg: Color3,

    /// Material that produced this surfel.
    pub material: Option<MaterialId>,

    /// Surface the triangle was extracted from.
    pub surface: Option<SurfaceId>,

    /// Flags.
    pub flags: SurfelFlags,

    /// Debug descriptor.
    pub source: SurfelSource,
}

impl Default for SurfelData {
    /// Returns an opaque surfel at the origin.
    fn default() -> Self {
        Self {
            position: Point3f::default(),
            prev_position: Point3f::default(),
            geometric_normal: Vector3f::default(),
            shading_normal: Vector3f::default(),
            shading_tangent1: Vector3f::default(),
            shading_tangent2: Vector3f::default(),
            eta_ratio: Float::NAN,
            kappa_pos: Color3::gray(INFINITY),
            kappa_neg: Color3::gray(INFINITY),
            material: None,
            surface: None,
            flags: SurfelFlags::empty(),
            source: SurfelSource::default(),
        }
    }
}

impl SurfelData {
    /// Returns true if the surface is flagged as emissive.
    pub fn is_light(&self) -> bool {
        self.flags.contains(SurfelFlags::IS_LIGHT)
    }

    /// Returns true if the interface transmits light, i.e. has a finite
    /// index of refraction.
    pub fn is_refractive_interface(&self) -> bool {
        !self.eta_ratio.is_nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_opaque() {
        let d = SurfelData::default();
        assert!(!d.is_refractive_interface());
        assert!(d.kappa_pos.r.is_infinite() && d.kappa_neg.b.is_infinite());
        assert!(!d.is_light());
        assert_eq!(d.source.index, usize::MAX);
    }

    #[test]
    fn light_flag() {
        let d = SurfelData {
            flags: SurfelFlags::IS_LIGHT,
            ..Default::default()
        };
        assert!(d.is_light());
    }
}
