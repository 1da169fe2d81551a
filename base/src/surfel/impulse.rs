//! Impulses

use crate::geometry::Vector3f;
use crate::spectrum::Color3;
use smallvec::SmallVec;

/// Direction in which light travels along a path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PathDirection {
    /// Forward tracing, e.g. photon emission. `w_from` is the incident light
    /// direction.
    SourceToEye,

    /// Backward tracing, e.g. path tracing from the camera. `w_from` is the
    /// direction toward the eye.
    EyeToSource,
}

/// A delta function in a BSDF.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Impulse {
    /// Unit direction facing away from the surface.
    pub direction: Vector3f,

    /// Probability of scattering along `direction` per channel, in `[0, 1]`.
    pub magnitude: Color3,
}

impl Impulse {
    /// Create a new impulse.
    ///
    /// * `direction` - Unit direction facing away from the surface.
    /// * `magnitude` - Scattering probability per channel.
    pub fn new(direction: Vector3f, magnitude: Color3) -> Self {
        debug_assert!(
            magnitude.min_component() >= 0.0 && magnitude.max_component() <= 1.0 + 1e-5,
            "impulse magnitude {magnitude:?} outside [0, 1]"
        );
        Self { direction, magnitude }
    }
}

/// Impulses of a BSDF; a reflection and a refraction fit inline.
pub type ImpulseArray = SmallVec<[Impulse; 2]>;
