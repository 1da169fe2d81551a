//! 3-D Coordinate System

use super::{Dot, Vector3f};

/// An orthonormal basis built around a unit vector.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// First tangent.
    pub s: Vector3f,

    /// Second tangent.
    pub t: Vector3f,

    /// The unit vector the frame was built around.
    pub n: Vector3f,
}

impl Frame {
    /// Creates a frame whose `n` axis is the given unit vector.
    ///
    /// * `n` - Unit vector.
    pub fn from_z(n: Vector3f) -> Self {
        let (s, t) = coordinate_system(&n);
        Self { s, t, n }
    }

    /// Creates a frame from a unit normal and an approximate tangent. The
    /// tangent is made orthogonal to the normal; a tangent parallel to the
    /// normal falls back to an arbitrary basis.
    ///
    /// * `n`       - Unit normal.
    /// * `tangent` - Approximate tangent.
    pub fn from_normal_tangent(n: Vector3f, tangent: Vector3f) -> Self {
        let s = tangent - n * n.dot(&tangent);
        if s.length_squared() < 1e-12 {
            Self::from_z(n)
        } else {
            let s = s.normalize();
            Self { s, t: n.cross(&s), n }
        }
    }

    /// Converts a vector from world space to frame-local coordinates.
    ///
    /// * `v` - World space vector.
    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.s), v.dot(&self.t), v.dot(&self.n))
    }

    /// Converts a frame-local vector to world space.
    ///
    /// * `v` - Local vector.
    pub fn from_local(&self, v: &Vector3f) -> Vector3f {
        self.s * v.x + self.t * v.y + self.n * v.z
    }
}

/// Returns two unit vectors that together with the unit vector `v1` form an
/// orthonormal basis.
///
/// * `v1` - The first unit vector.
pub fn coordinate_system(v1: &Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if v1.x.abs() > v1.y.abs() {
        Vector3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vector3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };
    (v2, v1.cross(&v2))
}
