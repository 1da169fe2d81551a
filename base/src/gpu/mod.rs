//! Simulated GPU resources: formats, transfer buffers, textures and the
//! G-buffer used by wavefront queries.

mod gbuffer;
mod image_format;
mod pixel_transfer_buffer;
mod texture;

// Re-export
pub use gbuffer::*;
pub use image_format::*;
pub use pixel_transfer_buffer::*;
pub use texture::*;
