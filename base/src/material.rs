//! Material

use crate::geometry::{Frame, Point2f, Point3f, Vector3f};
use crate::gpu::ImageStorage;
use crate::pbrt::Float;
use crate::surface::SurfaceId;
use crate::surfel::{ArcSurfel, SurfelData, SurfelSource};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Interpolated triangle attributes at a hit, handed to `Material::sample()`.
#[derive(Copy, Clone, Debug, Default)]
pub struct SurfelSampleContext {
    /// World space position.
    pub position: Point3f,

    /// World space position at the previous frame.
    pub prev_position: Point3f,

    /// Unit normal of the triangle, facing the side the vertices wind
    /// counter-clockwise around.
    pub geometric_normal: Vector3f,

    /// Interpolated vertex normal; not necessarily unit length.
    pub interpolated_normal: Vector3f,

    /// Interpolated vertex tangent.
    pub interpolated_tangent: Vector3f,

    /// Handedness of the tangent frame; +1 or -1.
    pub tangent_handedness: Float,

    /// Interpolated texture coordinate.
    pub tex_coord: Point2f,

    /// True if the ray hit the back of the triangle.
    pub backface: bool,

    /// True if the triangle is visible from both sides.
    pub two_sided: bool,

    /// Material id of the triangle.
    pub material: Option<MaterialId>,

    /// Surface id of the triangle.
    pub surface: Option<SurfaceId>,

    /// Debug descriptor.
    pub source: SurfelSource,
}

impl SurfelSampleContext {
    /// Returns the local geometry for a surfel at this hit. The normals of a
    /// two-sided triangle hit from behind are flipped toward the ray.
    pub fn surfel_data(&self) -> SurfelData {
        let mut geometric_normal = self.geometric_normal;
        let mut shading_normal = if self.interpolated_normal.length_squared() > 0.0 {
            self.interpolated_normal.normalize()
        } else {
            geometric_normal
        };
        if self.backface && self.two_sided {
            geometric_normal = -geometric_normal;
            shading_normal = -shading_normal;
        }

        let frame = Frame::from_normal_tangent(shading_normal, self.interpolated_tangent);
        let handedness = if self.tangent_handedness < 0.0 { -1.0 } else { 1.0 };

        SurfelData {
            position: self.position,
            prev_position: self.prev_position,
            geometric_normal,
            shading_normal,
            shading_tangent1: frame.s,
            shading_tangent2: frame.t * handedness,
            material: self.material,
            surface: self.surface,
            source: self.source,
            ..Default::default()
        }
    }
}

/// Material common functions.
pub trait Material: Send + Sync {
    /// Returns the name used in log messages.
    fn name(&self) -> &str;

    /// Returns a surfel for the interpolated attributes at a hit.
    ///
    /// * `ctx` - Interpolated attributes.
    fn sample(&self, ctx: &SurfelSampleContext) -> ArcSurfel;

    /// Returns the coverage (alpha) at a texture coordinate in `[0, 1]`.
    ///
    /// * `uv` - Texture coordinate.
    fn coverage(&self, _uv: &Point2f) -> Float {
        1.0
    }

    /// Returns true if some part of the material is not fully covered.
    fn has_partial_coverage(&self) -> bool {
        false
    }

    /// Applies a residency policy to every texture the material samples.
    ///
    /// * `storage` - The policy.
    fn set_storage(&self, storage: ImageStorage);

    /// Returns `self` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Atomically reference counted `Material`.
pub type ArcMaterial = Arc<dyn Material>;

impl fmt::Debug for dyn Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Material({})", self.name())
    }
}

/// Index of a material in a `MaterialTable`. Only meaningful together with
/// the table that issued it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    /// Returns the table index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Materials referenced by triangles, de-duplicated by `Arc` identity.
#[derive(Clone, Default)]
pub struct MaterialTable {
    materials: Vec<ArcMaterial>,
    ids: HashMap<usize, MaterialId>,
}

impl MaterialTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of a material, adding it if it is new.
    ///
    /// * `material` - The material.
    pub fn intern(&mut self, material: &ArcMaterial) -> MaterialId {
        let key = Arc::as_ptr(material) as *const () as usize;
        *self.ids.entry(key).or_insert_with(|| {
            self.materials.push(Arc::clone(material));
            MaterialId((self.materials.len() - 1) as u32)
        })
    }

    /// Returns the material with the given id.
    ///
    /// * `id` - Material id.
    pub fn get(&self, id: MaterialId) -> Option<&ArcMaterial> {
        self.materials.get(id.index())
    }

    /// Returns the number of materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Returns an iterator over the materials.
    pub fn iter(&self) -> impl Iterator<Item = &ArcMaterial> {
        self.materials.iter()
    }
}

impl fmt::Debug for MaterialTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.materials.iter().map(|m| m.name())).finish()
    }
}
