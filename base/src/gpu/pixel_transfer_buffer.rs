//! Pixel transfer buffers

use super::ImageFormat;
use bytemuck::Pod;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A block of pixel memory used to move image data between the device and
/// the CPU. Rows are padded to `row_alignment` bytes. The contents can only be
/// accessed through a mapping guard and a buffer can be mapped at most once
/// at a time.
#[derive(Debug)]
pub struct PixelTransferBuffer {
    format: ImageFormat,
    width: usize,
    height: usize,
    depth: usize,
    row_alignment: usize,
    row_stride: usize,

    /// Storage as words so that 32-bit texel casts are always aligned.
    data: Mutex<Vec<u32>>,

    mapped: AtomicBool,
}

impl PixelTransferBuffer {
    /// Creates a zero filled buffer.
    ///
    /// * `format`        - Pixel format.
    /// * `width`         - Width in pixels (> 0).
    /// * `height`        - Height in pixels (> 0).
    /// * `depth`         - Number of layers (> 0).
    /// * `row_alignment` - Row alignment in bytes; a power of two.
    pub fn new(format: ImageFormat, width: usize, height: usize, depth: usize, row_alignment: usize) -> Self {
        assert!(width > 0 && height > 0 && depth > 0, "buffer dimensions must be positive");
        assert!(row_alignment.is_power_of_two(), "row alignment {row_alignment} is not a power of two");

        let row_bytes = (width * format.cpu_bits_per_pixel()).div_ceil(8);
        let row_stride = row_bytes.next_multiple_of(row_alignment);
        let total = row_stride * height * depth;

        Self {
            format,
            width,
            height,
            depth,
            row_alignment,
            row_stride,
            data: Mutex::new(vec![0; total.div_ceil(4)]),
            mapped: AtomicBool::new(false),
        }
    }

    /// Creates a packed single layer buffer initialized from texels.
    ///
    /// * `format` - Pixel format; its pixel size must match `T`.
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    /// * `texels` - `width * height` texels in row-major order.
    pub fn from_texels<T: Pod>(format: ImageFormat, width: usize, height: usize, texels: &[T]) -> Self {
        assert_eq!(texels.len(), width * height, "texel count does not match dimensions");
        let ptb = Self::new(format, width, height, 1, 1);
        ptb.map_write().texels_mut::<T>().copy_from_slice(texels);
        ptb
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

    /// Returns the number of layers.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the row alignment in bytes.
    pub fn row_alignment(&self) -> usize {
        self.row_alignment
    }

    /// Returns the distance between rows in bytes.
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Returns the number of bytes in a row excluding padding.
    pub fn row_bytes(&self) -> usize {
        (self.width * self.format.cpu_bits_per_pixel()).div_ceil(8)
    }

    /// Returns the total size in bytes including row padding.
    pub fn size_in_bytes(&self) -> usize {
        self.row_stride * self.height * self.depth
    }

    /// Returns the number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Returns true if rows have no padding.
    pub fn is_packed(&self) -> bool {
        self.row_stride == self.row_bytes()
    }

    /// Returns true if both buffers have the same dimensions.
    ///
    /// * `other` - The other buffer.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.depth == other.depth
    }

    /// Returns true while a mapping guard is alive.
    pub fn is_mapped(&self) -> bool {
        self.mapped.load(Ordering::Acquire)
    }

    fn map(&self) -> MutexGuard<'_, Vec<u32>> {
        assert!(
            !self.mapped.swap(true, Ordering::AcqRel),
            "pixel transfer buffer is already mapped"
        );
        // Contents are plain bytes; a panic while mapped leaves them valid.
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maps the buffer for reading.
    pub fn map_read(&self) -> MappedRead<'_> {
        MappedRead {
            guard: self.map(),
            ptb: self,
        }
    }

    /// Maps the buffer for writing.
    pub fn map_write(&self) -> MappedWrite<'_> {
        MappedWrite {
            guard: self.map(),
            ptb: self,
        }
    }

    /// Returns a copy of the texels with row padding removed.
    pub fn to_vec<T: Pod>(&self) -> Vec<T> {
        let mapped = self.map_read();
        (0..self.height * self.depth)
            .flat_map(|r| bytemuck::pod_collect_to_vec::<u8, T>(mapped.row_at(r)))
            .collect()
    }
}

impl Drop for PixelTransferBuffer {
    fn drop(&mut self) {
        debug_assert!(!self.is_mapped(), "pixel transfer buffer dropped while mapped");
    }
}

/// Read access to a mapped buffer. Unmaps on drop.
pub struct MappedRead<'a> {
    guard: MutexGuard<'a, Vec<u32>>,
    ptb: &'a PixelTransferBuffer,
}

/// Write access to a mapped buffer. Unmaps on drop.
pub struct MappedWrite<'a> {
    guard: MutexGuard<'a, Vec<u32>>,
    ptb: &'a PixelTransferBuffer,
}

/// Casts the whole buffer to texels; rows must be packed.
fn check_texel_cast<T: Pod>(ptb: &PixelTransferBuffer) -> usize {
    assert!(ptb.is_packed(), "texel access requires packed rows");
    assert_eq!(
        std::mem::size_of::<T>(),
        ptb.format.bytes_per_pixel(),
        "texel type does not match {}",
        ptb.format
    );
    ptb.size_in_bytes()
}

impl MappedRead<'_> {
    /// Returns all bytes including row padding.
    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u32, u8>(self.guard.as_slice())[..self.ptb.size_in_bytes()]
    }

    /// Returns the bytes of one row excluding padding.
    ///
    /// * `r` - Row index across all layers.
    pub fn row_at(&self, r: usize) -> &[u8] {
        let start = r * self.ptb.row_stride;
        &self.bytes()[start..start + self.ptb.row_bytes()]
    }

    /// Returns the texels of a packed buffer.
    pub fn texels<T: Pod>(&self) -> &[T] {
        let n = check_texel_cast::<T>(self.ptb);
        bytemuck::cast_slice(&bytemuck::cast_slice::<u32, u8>(self.guard.as_slice())[..n])
    }
}

impl MappedWrite<'_> {
    /// Returns all bytes including row padding.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let n = self.ptb.size_in_bytes();
        &mut bytemuck::cast_slice_mut::<u32, u8>(self.guard.as_mut_slice())[..n]
    }

    /// Returns the bytes of one row excluding padding.
    ///
    /// * `r` - Row index across all layers.
    pub fn row_at_mut(&mut self, r: usize) -> &mut [u8] {
        let start = r * self.ptb.row_stride;
        let len = self.ptb.row_bytes();
        &mut self.bytes_mut()[start..start + len]
    }

    /// Returns the texels of a packed buffer.
    pub fn texels_mut<T: Pod>(&mut self) -> &mut [T] {
        let n = check_texel_cast::<T>(self.ptb);
        bytemuck::cast_slice_mut(&mut bytemuck::cast_slice_mut::<u32, u8>(self.guard.as_mut_slice())[..n])
    }
}

impl Drop for MappedRead<'_> {
    fn drop(&mut self) {
        self.ptb.mapped.store(false, Ordering::Release);
    }
}

impl Drop for MappedWrite<'_> {
    fn drop(&mut self) {
        self.ptb.mapped.store(false, Ordering::Release);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
