//! RGB colour

use crate::pbrt::{clamp, max, min, Float};
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Sub};

/// A linear RGB triple. Used for reflectance, scattering weights and
/// radiance.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color3 {
    /// Red.
    pub r: Float,

    /// Green.
    pub g: Float,

    /// Blue.
    pub b: Float,
}

/// Radiance in W/(m^2 sr) per channel.
pub type Radiance3 = Color3;

impl Color3 {
    /// All channels zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// All channels one.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a new colour.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub const fn new(r: Float, g: Float, b: Float) -> Self {
        Self { r, g, b }
    }

    /// Creates a grey colour.
    ///
    /// * `v` - Value for every channel.
    pub const fn gray(v: Float) -> Self {
        Self::new(v, v, v)
    }

    /// Returns the mean of the channels.
    pub fn average(&self) -> Float {
        (self.r + self.g + self.b) / 3.0
    }

    /// Returns the sum of the channels.
    pub fn sum(&self) -> Float {
        self.r + self.g + self.b
    }

    /// Returns the largest channel.
    pub fn max_component(&self) -> Float {
        max(self.r, max(self.g, self.b))
    }

    /// Returns the smallest channel.
    pub fn min_component(&self) -> Float {
        min(self.r, min(self.g, self.b))
    }

    /// Returns true if all channels are zero.
    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }

    /// Returns true if all channels are finite.
    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    /// Clamps every channel to `[low, high]`.
    ///
    /// * `low`  - Minimum value.
    /// * `high` - Maximum value.
    pub fn clamp(&self, low: Float, high: Float) -> Self {
        Self::new(clamp(self.r, low, high), clamp(self.g, low, high), clamp(self.b, low, high))
    }

    /// Returns the HSV saturation in `[0, 1]`.
    pub fn saturation(&self) -> Float {
        let hi = self.max_component();
        if hi <= 0.0 {
            0.0
        } else {
            (hi - self.min_component()) / hi
        }
    }

    /// Returns the channels as an array.
    pub fn to_array(&self) -> [Float; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[Float; 3]> for Color3 {
    fn from(a: [Float; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }
}

impl Add for Color3 {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }
}

impl AddAssign for Color3 {
    fn add_assign(&mut self, o: Self) {
        *self = *self + o;
    }
}

impl Sub for Color3 {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        Self::new(self.r - o.r, self.g - o.g, self.b - o.b)
    }
}

impl Mul for Color3 {
    type Output = Self;

    fn mul(self, o: Self) -> Self {
        Self::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }
}

impl MulAssign for Color3 {
    fn mul_assign(&mut self, o: Self) {
        *self = *self * o;
    }
}

impl Mul<Float> for Color3 {
    type Output = Self;

    fn mul(self, f: Float) -> Self {
        Self::new(self.r * f, self.g * f, self.b * f)
    }
}

impl Mul<Color3> for Float {
    type Output = Color3;

    fn mul(self, c: Color3) -> Color3 {
        c * self
    }
}

impl MulAssign<Float> for Color3 {
    fn mul_assign(&mut self, f: Float) {
        *self = *self * f;
    }
}

impl Div for Color3 {
    type Output = Self;

    fn div(self, o: Self) -> Self {
        Self::new(self.r / o.r, self.g / o.g, self.b / o.b)
    }
}

impl Div<Float> for Color3 {
    type Output = Self;

    fn div(self, f: Float) -> Self {
        let inv = 1.0 / f;
        self * inv
    }
}

impl DivAssign<Float> for Color3 {
    fn div_assign(&mut self, f: Float) {
        *self = *self / f;
    }
}

impl Index<usize> for Color3 {
    type Output = Float;

    fn index(&self, i: usize) -> &Float {
        match i {
            0 => &self.r,
            1 => &self.g,
            2 => &self.b,
            _ => panic!("invalid colour channel {i}"),
        }
    }
}

impl IndexMut<usize> for Color3 {
    fn index_mut(&mut self, i: usize) -> &mut Float {
        match i {
            0 => &mut self.r,
            1 => &mut self.g,
            2 => &mut self.b,
            _ => panic!("invalid colour channel {i}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    #[test]
    fn saturation_of_grey_and_primary() {
        assert_eq!(Color3::gray(0.5).saturation(), 0.0);
        assert_eq!(Color3::new(1.0, 0.0, 0.0).saturation(), 1.0);
        assert_eq!(Color3::ZERO.saturation(), 0.0);
    }

    proptest! {
        #[test]
        fn average_between_extremes(r in 0.0..10.0f32, g in 0.0..10.0f32, b in 0.0..10.0f32) {
            let c = Color3::new(r, g, b);
            prop_assert!(c.average() >= c.min_component() - 1e-5);
            prop_assert!(c.average() <= c.max_component() + 1e-5);
            prop_assert!(approx_eq!(f32, c.sum(), 3.0 * c.average(), epsilon = 1e-4));
        }
    }
}
