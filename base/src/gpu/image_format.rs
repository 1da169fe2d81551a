//! Image formats

use crate::spectrum::Color4;
use std::fmt;

/// Pixel layouts supported by transfer buffers and textures.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Four 32-bit float channels.
    RGBA32F,

    /// One 32-bit float channel.
    R32F,

    /// One 8-bit unsigned normalized channel.
    R8,
}

impl ImageFormat {
    /// Returns the number of channels.
    pub fn num_components(&self) -> usize {
        match self {
            Self::RGBA32F => 4,
            Self::R32F | Self::R8 => 1,
        }
    }

    /// Returns the size of one pixel in bits.
    pub fn cpu_bits_per_pixel(&self) -> usize {
        match self {
            Self::RGBA32F => 128,
            Self::R32F => 32,
            Self::R8 => 8,
        }
    }

    /// Returns the size of one pixel in bytes.
    pub fn bytes_per_pixel(&self) -> usize {
        self.cpu_bits_per_pixel() / 8
    }

    /// Decodes one pixel. Missing channels are 0 and a missing alpha is 1.
    ///
    /// * `bytes` - Exactly `bytes_per_pixel()` bytes.
    pub fn decode(&self, bytes: &[u8]) -> Color4 {
        match self {
            Self::RGBA32F => {
                let v: [f32; 4] = bytemuck::pod_read_unaligned(bytes);
                Color4::from(v)
            }
            Self::R32F => {
                let v: f32 = bytemuck::pod_read_unaligned(bytes);
                Color4::new(v, 0.0, 0.0, 1.0)
            }
            Self::R8 => Color4::new(bytes[0] as f32 / 255.0, 0.0, 0.0, 1.0),
        }
    }

    /// Encodes one pixel.
    ///
    /// * `c`     - The colour.
    /// * `bytes` - Exactly `bytes_per_pixel()` bytes.
    pub fn encode(&self, c: &Color4, bytes: &mut [u8]) {
        match self {
            Self::RGBA32F => bytes.copy_from_slice(bytemuck::bytes_of(&c.to_array())),
            Self::R32F => bytes.copy_from_slice(bytemuck::bytes_of(&c.r)),
            Self::R8 => bytes[0] = (c.r.clamp(0.0, 1.0) * 255.0).round() as u8,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RGBA32F => "RGBA32F",
            Self::R32F => "R32F",
            Self::R8 => "R8",
        };
        write!(f, "{name}")
    }
}
