//! Flat world space meshes

mod hit;
mod tri;
mod vertex;

// Re-export
pub use hit::*;
pub use tri::*;
pub use vertex::*;
