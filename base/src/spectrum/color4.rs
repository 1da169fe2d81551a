//! RGBA colour

use super::Color3;
use crate::pbrt::Float;

/// A linear RGB colour with an extra channel, used for texels and packed
/// buffer output.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color4 {
    /// Red.
    pub r: Float,

    /// Green.
    pub g: Float,

    /// Blue.
    pub b: Float,

    /// Alpha or a packed scalar.
    pub a: Float,
}

impl Color4 {
    /// All channels zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// All channels one.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new colour.
    pub const fn new(r: Float, g: Float, b: Float, a: Float) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a colour from an RGB triple and a fourth channel.
    ///
    /// * `c` - RGB channels.
    /// * `a` - Fourth channel.
    pub fn from_rgb(c: Color3, a: Float) -> Self {
        Self::new(c.r, c.g, c.b, a)
    }

    /// Returns the RGB channels.
    pub fn rgb(&self) -> Color3 {
        Color3::new(self.r, self.g, self.b)
    }

    /// Returns the channels as an array.
    pub fn to_array(&self) -> [Float; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[Float; 4]> for Color4 {
    fn from(a: [Float; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }
}

impl From<Color4> for [Float; 4] {
    fn from(c: Color4) -> Self {
        c.to_array()
    }
}
