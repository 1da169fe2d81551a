//! Materials

#[macro_use]
extern crate log;

mod lambertian;
mod universal;
mod universal_surfel;

// Re-export
pub use lambertian::*;
pub use universal::*;
pub use universal_surfel::*;
