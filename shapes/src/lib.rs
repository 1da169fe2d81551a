//! Surfaces built from indexed triangle meshes.

#[macro_use]
extern crate log;

mod mesh;
mod procedural;
mod scene;

// Re-export
pub use mesh::*;
pub use procedural::*;
pub use scene::*;
