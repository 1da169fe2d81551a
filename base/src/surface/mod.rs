//! Surfaces

mod extraction;
mod table;

use crate::geometry::{Bounds3f, Sphere, Transform};
use crate::gpu::ImageStorage;
use crate::material::ArcMaterial;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

// Re-export
pub use extraction::*;
pub use table::*;

/// A posed renderable object that can emit world space triangles.
pub trait Surface: Send + Sync {
    /// Returns the name used in log messages.
    fn name(&self) -> &str;

    /// Returns the bounds in object space.
    fn object_space_bounds(&self) -> Bounds3f;

    /// Returns a sphere enclosing the object in object space.
    fn object_space_bounding_sphere(&self) -> Sphere {
        Sphere::bounding(&self.object_space_bounds())
    }

    /// Returns the object to world transform.
    fn frame(&self) -> Transform;

    /// Returns the object to world transform at the previous frame.
    fn previous_frame(&self) -> Transform {
        self.frame()
    }

    /// Returns the world space bounds.
    fn bounds(&self) -> Bounds3f {
        self.frame().transform_bounds(&self.object_space_bounds())
    }

    /// Returns a sphere enclosing the object in world space.
    fn bounding_sphere(&self) -> Sphere {
        Sphere::bounding(&self.bounds())
    }

    /// Returns false if the geometry and pose never change.
    fn can_change(&self) -> bool {
        true
    }

    /// Returns the material, if any.
    fn material(&self) -> Option<ArcMaterial>;

    /// Applies a residency policy to the textures of the material.
    ///
    /// * `storage` - The policy.
    fn set_storage(&self, storage: ImageStorage) {
        if let Some(m) = self.material() {
            m.set_storage(storage);
        }
    }

    /// Returns an identifier of the object space vertex data. Surfaces with
    /// the same identifier and the same frame share world space vertices.
    fn vertex_source_id(&self) -> usize;

    /// Returns `self` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Appends world space geometry for a group of surfaces which all have
    /// the concrete type of `self`.
    ///
    /// * `group` - Surfaces of the same type, including `self`.
    /// * `out`   - Destination.
    fn get_tris_homogeneous(&self, group: &[ArcSurface], out: &mut TriExtraction);
}

/// Atomically reference counted `Surface`.
pub type ArcSurface = Arc<dyn Surface>;

impl fmt::Debug for dyn Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Surface({})", self.name())
    }
}
