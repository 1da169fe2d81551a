//! G-buffer

use super::{ArcTexture, ImageFormat, Texture};
use std::sync::Arc;

/// The surface attributes written by wavefront intersection queries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GBufferField {
    /// World space position; alpha is 1 for hits.
    WsPosition = 0,

    /// World space shading normal.
    WsNormal = 1,

    /// Lambertian reflectivity; alpha is coverage.
    Lambertian = 2,

    /// Glossy reflectivity; alpha is smoothness.
    Glossy = 3,

    /// Emitted radiance.
    Emissive = 4,
}

impl GBufferField {
    /// All fields in output buffer order.
    pub const ALL: [GBufferField; 5] = [
        GBufferField::WsPosition,
        GBufferField::WsNormal,
        GBufferField::Lambertian,
        GBufferField::Glossy,
        GBufferField::Emissive,
    ];

    /// Returns the field name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WsPosition => "position",
            Self::WsNormal => "normal",
            Self::Lambertian => "lambertian",
            Self::Glossy => "glossy",
            Self::Emissive => "emissive",
        }
    }
}

/// A set of device-resident RGBA32F textures, one per `GBufferField`.
pub struct GBuffer {
    width: usize,
    height: usize,
    textures: [ArcTexture; 5],
}

impl GBuffer {
    /// Creates zero filled G-buffer textures.
    ///
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    pub fn new(width: usize, height: usize) -> Self {
        let textures = GBufferField::ALL
            .map(|f| Arc::new(Texture::new_device(f.name(), ImageFormat::RGBA32F, width, height)));
        Self {
            width,
            height,
            textures,
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the texture holding a field.
    ///
    /// * `field` - The field.
    pub fn texture(&self, field: GBufferField) -> &ArcTexture {
        &self.textures[field as usize]
    }

    /// Returns all textures in `GBufferField::ALL` order.
    pub fn textures(&self) -> &[ArcTexture; 5] {
        &self.textures
    }
}
