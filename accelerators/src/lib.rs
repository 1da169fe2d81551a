//! Ray intersection acceleration structures and batch queries.

#[macro_use]
extern crate log;

mod bvh;
mod tritree;

// Re-export
pub use bvh::{Bvh, LinearBVHNode, SplitMethod};
pub use tritree::*;
