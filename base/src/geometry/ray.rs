//! Rays

use super::{Point3f, Vector3f};
use crate::pbrt::{Float, INFINITY};

/// A ray segment from `origin + min_distance * direction` to
/// `origin + max_distance * direction`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Origin.
    pub origin: Point3f,

    /// Unit direction.
    pub direction: Vector3f,

    /// Hits nearer than this are ignored.
    pub min_distance: Float,

    /// Hits farther than this are ignored.
    pub max_distance: Float,
}

impl Ray {
    /// Returns a ray covering `[0, ∞)`.
    ///
    /// * `origin`    - Origin.
    /// * `direction` - Direction.
    pub fn new(origin: Point3f, direction: Vector3f) -> Self {
        Self {
            origin,
            direction,
            min_distance: 0.0,
            max_distance: INFINITY,
        }
    }

    /// Returns the ray with a new minimum distance.
    ///
    /// * `d` - Minimum distance.
    pub fn with_min_distance(mut self, d: Float) -> Self {
        self.min_distance = d;
        self
    }

    /// Returns the ray with a new maximum distance.
    ///
    /// * `d` - Maximum distance.
    pub fn with_max_distance(mut self, d: Float) -> Self {
        self.max_distance = d;
        self
    }

    /// Returns the point at distance `t` along the ray.
    ///
    /// * `t` - Distance along the ray.
    pub fn at(&self, t: Float) -> Point3f {
        self.origin + self.direction * t
    }

    /// Returns a ray that intersects nothing.
    pub fn degenerate() -> Self {
        Self {
            origin: Point3f::zero(),
            direction: Vector3f::zero(),
            min_distance: INFINITY,
            max_distance: 0.0,
        }
    }

    /// Returns true if the ray can intersect anything.
    pub fn is_valid(&self) -> bool {
        !self.direction.is_zero()
            && self.origin.is_finite()
            && self.direction.is_finite()
            && self.min_distance <= self.max_distance
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::degenerate()
    }
}
