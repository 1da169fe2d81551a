//! Surface samples and the scattering protocol

mod data;
mod expressive;
mod impulse;
mod lambertian;
mod protocol;

// Re-export
pub use data::*;
pub use expressive::*;
pub use impulse::*;
pub use lambertian::*;
pub use protocol::*;
