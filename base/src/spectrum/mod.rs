//! Colours

mod color3;
mod color4;

// Re-export
pub use color3::*;
pub use color4::*;
