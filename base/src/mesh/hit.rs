//! Hit Records

use crate::pbrt::{Float, INFINITY};

/// Result of a nearest hit query for one ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hit {
    /// Index of the triangle in the tree, or `Hit::NONE`.
    pub tri_index: u32,

    /// Barycentric weight of the second vertex.
    pub u: Float,

    /// Barycentric weight of the third vertex.
    pub v: Float,

    /// True if the ray hit the back of the triangle.
    pub backface: bool,

    /// Distance along the ray.
    pub distance: Float,
}

impl Hit {
    /// Triangle index of a miss.
    pub const NONE: u32 = u32::MAX;

    /// Returns a miss.
    pub const fn miss() -> Self {
        Self {
            tri_index: Self::NONE,
            u: 0.0,
            v: 0.0,
            backface: false,
            distance: INFINITY,
        }
    }

    /// Returns true if a triangle was hit.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.tri_index != Self::NONE
    }
}

impl Default for Hit {
    fn default() -> Self {
        Self::miss()
    }
}
