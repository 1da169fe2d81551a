//! Base types shared by the ray intersection and shading crates.

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

pub mod app;
pub mod geometry;
pub mod gpu;
pub mod material;
pub mod mesh;
pub mod parallel;
pub mod pbrt;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod spectrum;
pub mod stats;
pub mod surface;
pub mod surfel;
