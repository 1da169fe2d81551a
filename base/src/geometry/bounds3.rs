//! 3-D Axis Aligned Bounding Boxes.

use super::{point3, Point3, Ray, Union, Vector3};
use crate::pbrt::{gamma, max, min, Axis, Float};
use num_traits::bounds::Bounded;
use num_traits::Num;
use std::ops::Index;

/// 3-D Axis Aligned Bounding Box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds3<T> {
    /// Minimum bounds.
    pub p_min: Point3<T>,

    /// Maximum bounds.
    pub p_max: Point3<T>,
}

/// 3-D bounding box containing `Float` points.
pub type Bounds3f = Bounds3<Float>;

impl<T: Num + PartialOrd + Copy> Bounds3<T> {
    /// Creates a new 3-D bounding box from 2 points. The minimum and maximum
    /// bounds are used for each coordinate axis.
    ///
    /// * `p1` - First point.
    /// * `p2` - Second point.
    pub fn new(p1: Point3<T>, p2: Point3<T>) -> Self {
        Self {
            p_min: p1.min(&p2),
            p_max: p1.max(&p2),
        }
    }

    /// Returns a bounding box where minimum and maximum bounds are maximum
    /// and minimum values respectively of the type's limits, so that it
    /// can be grown from nothing.
    pub fn empty() -> Self
    where
        T: Bounded,
    {
        Self {
            p_min: point3(T::max_value(), T::max_value(), T::max_value()),
            p_max: point3(T::min_value(), T::min_value(), T::min_value()),
        }
    }

    /// Returns true if `p_max` is less than `p_min` along any axis.
    pub fn is_empty(&self) -> bool {
        self.p_max.x < self.p_min.x || self.p_max.y < self.p_min.y || self.p_max.z < self.p_min.z
    }

    /// Returns the vector along the box diagonal from the minimum point to
    /// the maximum point.
    pub fn diagonal(&self) -> Vector3<T> {
        self.p_max - self.p_min
    }

    /// Returns the surface area of the bounding box.
    pub fn surface_area(&self) -> T {
        if self.is_empty() {
            T::zero()
        } else {
            let d = self.diagonal();
            let h = d.x * d.y + d.x * d.z + d.y * d.z;
            h + h
        }
    }

    /// Returns the volume of the bounding box.
    pub fn volume(&self) -> T {
        if self.is_empty() {
            T::zero()
        } else {
            let d = self.diagonal();
            d.x * d.y * d.z
        }
    }

    /// Returns the longest axis.
    pub fn maximum_extent(&self) -> Axis {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns true if extents of another bounding box overlap with this one.
    /// Touching boxes overlap.
    ///
    /// * `other` - The other bounding box.
    pub fn overlaps(&self, other: &Self) -> bool {
        let x = (self.p_max.x >= other.p_min.x) && (self.p_min.x <= other.p_max.x);
        let y = (self.p_max.y >= other.p_min.y) && (self.p_min.y <= other.p_max.y);
        let z = (self.p_max.z >= other.p_min.z) && (self.p_min.z <= other.p_max.z);
        x && y && z
    }

    /// Returns true if a point is inside the bounding box, boundary included.
    ///
    /// * `p` - The point.
    pub fn contains(&self, p: &Point3<T>) -> bool {
        p.x >= self.p_min.x
            && p.x <= self.p_max.x
            && p.y >= self.p_min.y
            && p.y <= self.p_max.y
            && p.z >= self.p_min.z
            && p.z <= self.p_max.z
    }

    /// Returns the continuous position of a point relative to the corners of
    /// the box; `p_min` maps to `(0, 0, 0)` and `p_max` to `(1, 1, 1)`.
    ///
    /// * `p` - The point.
    pub fn offset(&self, p: &Point3<T>) -> Vector3<T> {
        let mut o = *p - self.p_min;
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            if self.p_max[axis] > self.p_min[axis] {
                o[axis] = o[axis] / (self.p_max[axis] - self.p_min[axis]);
            }
        }
        o
    }

    /// Returns the box expanded by `delta` on every side.
    ///
    /// * `delta` - Amount to expand by.
    pub fn expand(&self, delta: T) -> Self {
        let d = Vector3::new(delta, delta, delta);
        Self {
            p_min: self.p_min - d,
            p_max: self.p_max + d,
        }
    }
}

impl Bounds3f {
    /// Returns the centre of the box.
    pub fn centroid(&self) -> Point3<Float> {
        self.p_min * 0.5 + self.p_max * 0.5
    }

    /// Returns the square of the distance from a point to the box. Points
    /// inside have distance zero.
    ///
    /// * `p` - The point.
    pub fn distance_squared(&self, p: &Point3<Float>) -> Float {
        let dx = max(0.0, max(self.p_min.x - p.x, p.x - self.p_max.x));
        let dy = max(0.0, max(self.p_min.y - p.y, p.y - self.p_max.y));
        let dz = max(0.0, max(self.p_min.z - p.z, p.z - self.p_max.z));
        dx * dx + dy * dy + dz * dz
    }

    /// Returns true if a ray segment `[t_min, t_max]` intersects the box,
    /// using a precomputed reciprocal direction and direction signs.
    ///
    /// * `ray`        - The ray.
    /// * `t_min`      - Start of the ray segment.
    /// * `t_max`      - End of the ray segment.
    /// * `inv_dir`    - Reciprocal of the ray direction.
    /// * `dir_is_neg` - 1 where the direction component is negative.
    pub fn intersect_p_inv(
        &self,
        ray: &Ray,
        t_min: Float,
        t_max: Float,
        inv_dir: &Vector3<Float>,
        dir_is_neg: [usize; 3],
    ) -> bool {
        let mut t0 = (self[dir_is_neg[0]].x - ray.origin.x) * inv_dir.x;
        let mut t1 = (self[1 - dir_is_neg[0]].x - ray.origin.x) * inv_dir.x;
        let ty0 = (self[dir_is_neg[1]].y - ray.origin.y) * inv_dir.y;
        let mut ty1 = (self[1 - dir_is_neg[1]].y - ray.origin.y) * inv_dir.y;

        // Update `t1` and `ty1` to ensure robust bounds intersection.
        t1 *= 1.0 + 2.0 * gamma(3);
        ty1 *= 1.0 + 2.0 * gamma(3);

        // NaN from 0 * inf fails both comparisons and leaves the slab open.
        if t0 > ty1 || ty0 > t1 {
            return false;
        }
        if ty0 > t0 {
            t0 = ty0;
        }
        if ty1 < t1 {
            t1 = ty1;
        }

        let tz0 = (self[dir_is_neg[2]].z - ray.origin.z) * inv_dir.z;
        let mut tz1 = (self[1 - dir_is_neg[2]].z - ray.origin.z) * inv_dir.z;
        tz1 *= 1.0 + 2.0 * gamma(3);

        if t0 > tz1 || tz0 > t1 {
            return false;
        }
        if tz0 > t0 {
            t0 = tz0;
        }
        if tz1 < t1 {
            t1 = tz1;
        }

        t0 <= t_max && t1 >= t_min
    }
}

impl<T: Num + PartialOrd + Copy> From<Point3<T>> for Bounds3<T> {
    fn from(p: Point3<T>) -> Self {
        Self { p_min: p, p_max: p }
    }
}

impl<T> Index<usize> for Bounds3<T> {
    type Output = Point3<T>;

    /// Returns `p_min` for 0 and `p_max` for 1.
    fn index(&self, i: usize) -> &Self::Output {
        match i {
            0 => &self.p_min,
            1 => &self.p_max,
            _ => panic!("invalid bounds index {i}"),
        }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Bounds3<T>> for Bounds3<T> {
    fn union(&self, other: &Bounds3<T>) -> Self {
        Self {
            p_min: point3(
                min(self.p_min.x, other.p_min.x),
                min(self.p_min.y, other.p_min.y),
                min(self.p_min.z, other.p_min.z),
            ),
            p_max: point3(
                max(self.p_max.x, other.p_max.x),
                max(self.p_max.y, other.p_max.y),
                max(self.p_max.z, other.p_max.z),
            ),
        }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Point3<T>> for Bounds3<T> {
    fn union(&self, p: &Point3<T>) -> Self {
        Self {
            p_min: self.p_min.min(p),
            p_max: self.p_max.max(p),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vector3;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    prop_point3!(point3_f32, f32, -100.0..100.0f32, -100.0..100.0f32, -100.0..100.0f32);

    fn unit_box() -> Bounds3f {
        Bounds3::new(point3(0.0, 0.0, 0.0), point3(1.0, 1.0, 1.0))
    }

    fn slab_test(b: &Bounds3f, ray: &Ray) -> bool {
        let inv_dir = vector3(1.0 / ray.direction.x, 1.0 / ray.direction.y, 1.0 / ray.direction.z);
        let dir_is_neg = [
            (inv_dir.x < 0.0) as usize,
            (inv_dir.y < 0.0) as usize,
            (inv_dir.z < 0.0) as usize,
        ];
        b.intersect_p_inv(ray, ray.min_distance, ray.max_distance, &inv_dir, dir_is_neg)
    }

    #[test]
    fn empty_box_grows_from_nothing() {
        let b = Bounds3f::empty();
        assert!(b.is_empty());
        assert_eq!(b.surface_area(), 0.0);
        let b = b.union(&point3(1.0, 2.0, 3.0));
        assert_eq!(b.p_min, b.p_max);
    }

    #[test]
    fn unit_box_measures() {
        let b = unit_box();
        assert_eq!(b.surface_area(), 6.0);
        assert_eq!(b.volume(), 1.0);
        assert_eq!(b.centroid(), point3(0.5, 0.5, 0.5));
        assert!(b.overlaps(&Bounds3::new(point3(1.0, 1.0, 1.0), point3(2.0, 2.0, 2.0))));
    }

    #[test]
    fn slab_hits_and_misses() {
        let b = unit_box();
        let hit = Ray::new(point3(0.5, 0.5, 5.0), vector3(0.0, 0.0, -1.0));
        let miss = Ray::new(point3(2.5, 0.5, 5.0), vector3(0.0, 0.0, -1.0));
        let short = Ray::new(point3(0.5, 0.5, 5.0), vector3(0.0, 0.0, -1.0)).with_max_distance(1.0);
        assert!(slab_test(&b, &hit));
        assert!(!slab_test(&b, &miss));
        assert!(!slab_test(&b, &short));
    }

    #[test]
    fn distance_to_box() {
        let b = unit_box();
        assert_eq!(b.distance_squared(&point3(0.5, 0.5, 0.5)), 0.0);
        assert!(approx_eq!(f32, b.distance_squared(&point3(3.0, 0.5, 0.5)), 4.0));
    }

    proptest! {
        #[test]
        fn union_contains_both(a in point3_f32(), b in point3_f32(), c in point3_f32()) {
            let bounds = Bounds3::new(a, b).union(&c);
            prop_assert!(bounds.contains(&a));
            prop_assert!(bounds.contains(&b));
            prop_assert!(bounds.contains(&c));
        }

        #[test]
        fn offset_inside_unit_range(a in point3_f32(), b in point3_f32(), t in 0.0..1.0f32) {
            let bounds = Bounds3::new(a, b);
            let p = bounds.p_min.lerp(t, &bounds.p_max);
            let o = bounds.offset(&p);
            prop_assert!(o.x >= -1e-3 && o.x <= 1.0 + 1e-3);
            prop_assert!(o.y >= -1e-3 && o.y <= 1.0 + 1e-3);
            prop_assert!(o.z >= -1e-3 && o.z <= 1.0 + 1e-3);
        }
    }
}
