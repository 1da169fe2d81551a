//! 3-D Normals

use super::{Dot, FaceForward, Vector3};
use crate::pbrt::{Axis, Float};
use num_traits::Num;
use std::ops::{Add, Div, Index, Mul, Neg, Sub};

/// A 3-D normal containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Normal3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D normal containing `Float` values.
pub type Normal3f = Normal3<Float>;

/// Creates a new 3-D normal.
///
/// * `x` - X-coordinate.
/// * `y` - Y-coordinate.
/// * `z` - Z-coordinate.
pub fn normal3<T>(x: T, y: T, z: T) -> Normal3<T> {
    Normal3 { x, y, z }
}

impl<T: Num> Normal3<T> {
    /// Creates a zero normal.
    pub fn zero() -> Self {
        normal3(T::zero(), T::zero(), T::zero())
    }

    /// Returns the square of the normal's length.
    pub fn length_squared(&self) -> T
    where
        T: Copy,
    {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns the normal's length.
    pub fn length(&self) -> T
    where
        T: num_traits::Float,
    {
        self.length_squared().sqrt()
    }

    /// Returns the unit normal. A zero normal is returned unchanged.
    pub fn normalize(&self) -> Self
    where
        T: num_traits::Float,
    {
        let l = self.length();
        if l > T::zero() {
            *self / l
        } else {
            *self
        }
    }
}

impl<T: Num + Neg<Output = T> + PartialOrd + Copy> Dot<Normal3<T>> for Normal3<T> {
    type Output = T;

    fn dot(&self, other: &Normal3<T>) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl<T: Num + Neg<Output = T> + PartialOrd + Copy> Dot<Vector3<T>> for Normal3<T> {
    type Output = T;

    fn dot(&self, other: &Vector3<T>) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl<T: Num + Neg<Output = T> + PartialOrd + Copy> FaceForward<T, Vector3<T>> for Normal3<T> {}

impl<T: Num + Neg<Output = T> + PartialOrd + Copy> FaceForward<T, Normal3<T>> for Normal3<T> {}

impl<T: Num> Add for Normal3<T> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        normal3(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl<T: Num> Sub for Normal3<T> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        normal3(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<T: Num + Copy> Mul<T> for Normal3<T> {
    type Output = Self;

    fn mul(self, f: T) -> Self {
        normal3(self.x * f, self.y * f, self.z * f)
    }
}

impl<T: Num + Copy> Div<T> for Normal3<T> {
    type Output = Self;

    fn div(self, f: T) -> Self {
        normal3(self.x / f, self.y / f, self.z / f)
    }
}

impl<T: Num + Neg<Output = T>> Neg for Normal3<T> {
    type Output = Self;

    fn neg(self) -> Self {
        normal3(-self.x, -self.y, -self.z)
    }
}

impl<T> Index<Axis> for Normal3<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl<T> From<Vector3<T>> for Normal3<T> {
    fn from(v: Vector3<T>) -> Self {
        normal3(v.x, v.y, v.z)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
