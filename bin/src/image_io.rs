//! Image output

use base::pbrt::{clamp, gamma_correct, Float};
use base::spectrum::Color3;
use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Rgb};

/// Clamp a linear value to 8-bit range with sRGB encoding.
///
/// * `v` - Value to clamp.
#[inline]
fn clamp_byte(v: Float) -> u8 {
    clamp(255.0 * gamma_correct(v) + 0.5, 0.0, 255.0) as u8
}

/// Writes linear RGB pixels as an sRGB encoded PNG.
///
/// * `path`   - Output file path.
/// * `pixels` - Row-major pixels, top row first.
/// * `width`  - Width in pixels.
/// * `height` - Height in pixels.
pub fn write_png(path: &str, pixels: &[Color3], width: usize, height: usize) -> Result<(), String> {
    if pixels.len() != width * height {
        return Err(format!("{path}: expected {} pixels, got {}", width * height, pixels.len()));
    }
    info!("Writing image {path} with resolution {width}x{height}");

    let imgbuf = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let c = pixels[y as usize * width + x as usize];
        Rgb([clamp_byte(c.r), clamp_byte(c.g), clamp_byte(c.b)])
    });
    imgbuf
        .save_with_format(path, ImageFormat::Png)
        .map_err(|err| format!("Error saving output image {path}: {err}."))
}

/// Writes a single channel 8-bit mask as a PNG without encoding.
///
/// * `path`   - Output file path.
/// * `mask`   - Row-major values, top row first.
/// * `width`  - Width in pixels.
/// * `height` - Height in pixels.
pub fn write_mask(path: &str, mask: &[u8], width: usize, height: usize) -> Result<(), String> {
    if mask.len() != width * height {
        return Err(format!("{path}: expected {} pixels, got {}", width * height, mask.len()));
    }
    info!("Writing mask {path} with resolution {width}x{height}");

    let imgbuf = GrayImage::from_fn(width as u32, height as u32, |x, y| Luma([mask[y as usize * width + x as usize]]));
    imgbuf
        .save_with_format(path, ImageFormat::Png)
        .map_err(|err| format!("Error saving output image {path}: {err}."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_srgb_encoded_and_clamped() {
        assert_eq!(clamp_byte(0.0), 0);
        assert_eq!(clamp_byte(1.0), 255);
        assert_eq!(clamp_byte(4.0), 255);
        assert_eq!(clamp_byte(-1.0), 0);
        // Mid grey encodes brighter than half.
        assert!(clamp_byte(0.5) > 128);
    }

    #[test]
    fn size_mismatch_is_an_error() {
        assert!(write_png("unused.png", &[Color3::ZERO; 3], 2, 2).is_err());
        assert!(write_mask("unused.png", &[0; 5], 2, 2).is_err());
    }
}
