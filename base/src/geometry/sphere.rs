//! Spheres

use super::{Bounds3f, Point3f, Vector3f};
use crate::pbrt::Float;

/// A solid sphere.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sphere {
    /// Centre.
    pub center: Point3f,

    /// Radius.
    pub radius: Float,
}

impl Sphere {
    /// Creates a new sphere.
    ///
    /// * `center` - Centre.
    /// * `radius` - Radius.
    pub fn new(center: Point3f, radius: Float) -> Self {
        Self { center, radius }
    }

    /// Returns the axis aligned box enclosing the sphere.
    pub fn bounds(&self) -> Bounds3f {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        Bounds3f::new(self.center - r, self.center + r)
    }

    /// Returns true if the point is inside the solid sphere.
    ///
    /// * `p` - The point.
    pub fn contains(&self, p: &Point3f) -> bool {
        self.center.distance_squared(p) <= self.radius * self.radius
    }

    /// Returns the smallest sphere enclosing a bounding box.
    ///
    /// * `b` - The bounding box.
    pub fn bounding(b: &Bounds3f) -> Self {
        if b.is_empty() {
            Self::default()
        } else {
            let center = b.centroid();
            Self::new(center, center.distance(&b.p_max))
        }
    }
}
