//! 2-D Points

use crate::pbrt::Float;
use num_traits::Num;
use std::ops::{Add, Mul, Sub};

/// A 2-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point2<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,
}

/// 2-D point containing `Float` values. Used for texture coordinates and
/// sample values.
pub type Point2f = Point2<Float>;

/// Creates a new 2-D point.
///
/// * `x` - X-coordinate.
/// * `y` - Y-coordinate.
pub fn point2<T>(x: T, y: T) -> Point2<T> {
    Point2 { x, y }
}

impl<T: Num> Point2<T> {
    /// Creates the origin.
    pub fn zero() -> Self {
        point2(T::zero(), T::zero())
    }
}

impl<T: Num> Add for Point2<T> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        point2(self.x + other.x, self.y + other.y)
    }
}

impl<T: Num> Sub for Point2<T> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        point2(self.x - other.x, self.y - other.y)
    }
}

impl<T: Num + Copy> Mul<T> for Point2<T> {
    type Output = Self;

    fn mul(self, f: T) -> Self {
        point2(self.x * f, self.y * f)
    }
}

impl<T: Copy> From<[T; 2]> for Point2<T> {
    fn from(a: [T; 2]) -> Self {
        point2(a[0], a[1])
    }
}
