//! Textures

use super::{ImageFormat, PixelTransferBuffer};
use crate::geometry::Point2f;
use crate::pbrt::{lerp, Float};
use crate::spectrum::Color4;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Where texture data should live after a scene is loaded into a TriTree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageStorage {
    /// Keep a CPU copy and release the device copy.
    MoveToCpu,

    /// Keep both copies.
    CopyToCpu,

    /// Keep a device copy and release the CPU copy.
    MoveToGpu,

    /// Ensure a device copy exists and keep the CPU copy.
    CopyToGpu,

    /// Leave residency unchanged.
    #[default]
    Current,
}

/// Immutable texel storage shared between copies.
type Texels = Arc<[Color4]>;

#[derive(Clone, Default)]
struct Residency {
    device: Option<Texels>,
    cpu: Option<Texels>,
    mean: Color4,
}

/// A 2-D texture with a simulated device-resident copy and an optional
/// CPU-resident copy.
pub struct Texture {
    name: String,
    format: ImageFormat,
    width: usize,
    height: usize,
    data: RwLock<Residency>,
    warned_gpu_only: AtomicBool,
}

/// Atomically reference counted `Texture`.
pub type ArcTexture = Arc<Texture>;

fn mean_of(texels: &[Color4]) -> Color4 {
    let n = texels.len().max(1) as Float;
    let sum = texels.iter().fold([0.0; 4], |mut acc, t| {
        acc.iter_mut().zip(t.to_array()).for_each(|(a, v)| *a += v);
        acc
    });
    Color4::new(sum[0] / n, sum[1] / n, sum[2] / n, sum[3] / n)
}

impl Texture {
    /// Creates a CPU-resident texture.
    ///
    /// * `name`   - Name used in log messages.
    /// * `format` - Pixel format used for transfers.
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    /// * `texels` - `width * height` texels in row-major order, top row first.
    pub fn new(name: &str, format: ImageFormat, width: usize, height: usize, texels: Vec<Color4>) -> Self {
        assert_eq!(texels.len(), width * height, "texel count does not match dimensions");
        assert!(width > 0 && height > 0, "texture dimensions must be positive");
        let mean = mean_of(&texels);
        Self {
            name: name.to_string(),
            format,
            width,
            height,
            data: RwLock::new(Residency {
                device: None,
                cpu: Some(texels.into()),
                mean,
            }),
            warned_gpu_only: AtomicBool::new(false),
        }
    }

    /// Creates a device-resident texture filled with zero, as a render
    /// target would be.
    ///
    /// * `name`   - Name used in log messages.
    /// * `format` - Pixel format.
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    pub fn new_device(name: &str, format: ImageFormat, width: usize, height: usize) -> Self {
        let t = Self::new(name, format, width, height, vec![Color4::ZERO; width * height]);
        t.set_storage(ImageStorage::MoveToGpu);
        t
    }

    /// Creates a 1x1 CPU-resident texture.
    ///
    /// * `name`  - Name used in log messages.
    /// * `color` - The colour.
    pub fn constant(name: &str, color: Color4) -> Self {
        Self::new(name, ImageFormat::RGBA32F, 1, 1, vec![color])
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pixel format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Residency> {
        self.data.read().expect("texture lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Residency> {
        self.data.write().expect("texture lock poisoned")
    }

    /// Returns true if a CPU copy exists.
    pub fn is_cpu_resident(&self) -> bool {
        self.read().cpu.is_some()
    }

    /// Returns true if a device copy exists.
    pub fn is_device_resident(&self) -> bool {
        self.read().device.is_some()
    }

    /// Returns the mean texel value.
    pub fn mean(&self) -> Color4 {
        self.read().mean
    }

    /// Applies a residency policy.
    ///
    /// * `storage` - The policy.
    pub fn set_storage(&self, storage: ImageStorage) {
        let mut data = self.write();
        match storage {
            ImageStorage::MoveToCpu => {
                if data.cpu.is_none() {
                    data.cpu = data.device.take();
                } else {
                    data.device = None;
                }
            }
            ImageStorage::CopyToCpu => {
                if data.cpu.is_none() {
                    data.cpu = data.device.clone();
                }
            }
            ImageStorage::MoveToGpu => {
                if data.device.is_none() {
                    data.device = data.cpu.take();
                } else {
                    data.cpu = None;
                }
            }
            ImageStorage::CopyToGpu => {
                if data.device.is_none() {
                    data.device = data.cpu.clone();
                }
            }
            ImageStorage::Current => {}
        }
        debug!("texture '{}' storage {:?}", self.name, storage);
    }

    /// Samples the CPU copy with bilinear filtering and repeat wrapping. `uv`
    /// (0, 0) is the top left corner. A texture without a CPU copy returns
    /// its mean value and warns once.
    ///
    /// * `uv` - Texture coordinates.
    pub fn sample(&self, uv: &Point2f) -> Color4 {
        let data = self.read();
        let Some(texels) = data.cpu.as_ref() else {
            if !self.warned_gpu_only.swap(true, Ordering::Relaxed) {
                warn!("texture '{}' has no CPU copy; sampling its mean", self.name);
            }
            return data.mean;
        };

        let x = uv.x * self.width as Float - 0.5;
        let y = uv.y * self.height as Float - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (dx, dy) = (x - x0, y - y0);
        let texel = |i: Float, j: Float| {
            let i = (i as i64).rem_euclid(self.width as i64) as usize;
            let j = (j as i64).rem_euclid(self.height as i64) as usize;
            texels[j * self.width + i].to_array()
        };

        let (t00, t10) = (texel(x0, y0), texel(x0 + 1.0, y0));
        let (t01, t11) = (texel(x0, y0 + 1.0), texel(x0 + 1.0, y0 + 1.0));
        let mut out = [0.0; 4];
        for c in 0..4 {
            out[c] = lerp(dy, lerp(dx, t00[c], t10[c]), lerp(dx, t01[c], t11[c]));
        }
        Color4::from(out)
    }

    /// Reads the texels back into a packed transfer buffer in this texture's
    /// format. Reads the device copy if present, otherwise the CPU copy.
    pub fn to_pixel_transfer_buffer(&self) -> PixelTransferBuffer {
        let data = self.read();
        let texels = data
            .device
            .as_ref()
            .or(data.cpu.as_ref())
            .expect("texture has neither device nor CPU data");

        let ptb = PixelTransferBuffer::new(self.format, self.width, self.height, 1, 1);
        {
            let mut mapped = ptb.map_write();
            let bpp = self.format.bytes_per_pixel();
            for (t, bytes) in texels.iter().zip(mapped.bytes_mut().chunks_exact_mut(bpp)) {
                self.format.encode(t, bytes);
            }
        }
        ptb
    }

    /// Replaces the texels from a transfer buffer of the same size. The
    /// device copy is always written; an existing CPU copy is kept in sync.
    ///
    /// * `ptb` - Source buffer.
    pub fn update(&self, ptb: &PixelTransferBuffer) {
        assert!(
            ptb.width() == self.width && ptb.height() == self.height,
            "texture '{}' is {}x{} but buffer is {}x{}",
            self.name,
            self.width,
            self.height,
            ptb.width(),
            ptb.height()
        );

        let format = ptb.format();
        let bpp = format.bytes_per_pixel();
        let texels: Texels = {
            let mapped = ptb.map_read();
            (0..self.height)
                .flat_map(|r| {
                    mapped
                        .row_at(r)
                        .chunks_exact(bpp)
                        .map(|b| format.decode(b))
                        .collect::<Vec<_>>()
                })
                .collect()
        };

        let mut data = self.write();
        data.mean = mean_of(&texels);
        if data.cpu.is_some() {
            data.cpu = Some(texels.clone());
        }
        data.device = Some(texels);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
