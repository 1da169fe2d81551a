//! Triangles

use super::{CpuVertexArray, Hit};
use crate::geometry::{intersect_ray_triangle, point2, Bounds3f, Point2f, Point3f, Ray, TriangleHit, Union, Vector3f};
use crate::material::{MaterialId, MaterialTable, SurfelSampleContext};
use crate::pbrt::Float;
use crate::spectrum::{Color3, Radiance3};
use crate::surface::SurfaceId;
use crate::surfel::{ArcSurfel, LambertianSurfel, SurfelSource};
use bitflags::bitflags;
use std::sync::Arc;

/// Reflectivity of triangles without a material.
pub const DEFAULT_REFLECTIVITY: Color3 = Color3::gray(0.8);

bitflags! {
    /// Triangle flags.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TriFlags: u8 {
        /// Visible from both sides.
        const TWO_SIDED = 0x1;
    }
}

/// Where a triangle came from, for debugging and re-sampling. The surface
/// itself is `Tri::surface`; hits add the barycentric coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriSource {
    /// Index of the triangle within its surface.
    pub primitive: u32,
}

impl Default for TriSource {
    fn default() -> Self {
        Self { primitive: u32::MAX }
    }
}

/// An indexed triangle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tri {
    /// Vertex indices.
    pub index: [u32; 3],

    /// Material used to shade the triangle.
    pub material: Option<MaterialId>,

    /// Surface the triangle was extracted from.
    pub surface: Option<SurfaceId>,

    /// Flags.
    pub flags: TriFlags,

    /// Debug descriptor.
    pub source: TriSource,

    area: Float,
}

impl Tri {
    /// Create a new triangle.
    ///
    /// * `index`    - Vertex indices.
    /// * `vertices` - Vertex array the indices refer to.
    /// * `material` - Material id.
    /// * `surface`  - Surface id.
    /// * `flags`    - Flags.
    pub fn new(
        index: [u32; 3],
        vertices: &CpuVertexArray,
        material: Option<MaterialId>,
        surface: Option<SurfaceId>,
        flags: TriFlags,
    ) -> Self {
        let mut tri = Self {
            index,
            material,
            surface,
            flags,
            source: TriSource::default(),
            area: 0.0,
        };
        let [p0, p1, p2] = tri.positions(vertices);
        tri.area = 0.5 * (p1 - p0).cross(&(p2 - p0)).length();
        tri
    }

    /// Sets the debug descriptor.
    ///
    /// * `source` - Where the triangle came from.
    pub fn with_source(mut self, source: TriSource) -> Self {
        self.source = source;
        self
    }

    /// Returns the world space area computed at construction.
    pub fn area(&self) -> Float {
        self.area
    }

    /// Returns true if the triangle has zero area.
    pub fn is_degenerate(&self) -> bool {
        !(self.area > 0.0)
    }

    /// Returns true if the triangle is visible from both sides.
    pub fn is_two_sided(&self) -> bool {
        self.flags.contains(TriFlags::TWO_SIDED)
    }

    /// Returns the vertex positions.
    ///
    /// * `vertices` - Vertex array.
    #[inline]
    pub fn positions(&self, vertices: &CpuVertexArray) -> [Point3f; 3] {
        [
            vertices.position(self.index[0]),
            vertices.position(self.index[1]),
            vertices.position(self.index[2]),
        ]
    }

    /// Returns the world space bounds.
    ///
    /// * `vertices` - Vertex array.
    pub fn bounds(&self, vertices: &CpuVertexArray) -> Bounds3f {
        let [p0, p1, p2] = self.positions(vertices);
        Bounds3f::new(p0, p1).union(&p2)
    }

    /// Returns the unit normal of the counter-clockwise winding, or zero for a
    /// degenerate triangle.
    ///
    /// * `vertices` - Vertex array.
    pub fn geometric_normal(&self, vertices: &CpuVertexArray) -> Vector3f {
        let [p0, p1, p2] = self.positions(vertices);
        let n = (p1 - p0).cross(&(p2 - p0));
        if n.length_squared() > 0.0 {
            n.normalize()
        } else {
            n
        }
    }

    /// Intersects a ray with the triangle ignoring flags.
    ///
    /// * `ray`      - The ray.
    /// * `vertices` - Vertex array.
    #[inline]
    pub fn intersect(&self, ray: &Ray, vertices: &CpuVertexArray) -> Option<TriangleHit> {
        intersect_ray_triangle(ray, &self.positions(vertices))
    }

    /// Returns the interpolated texture coordinate.
    ///
    /// * `vertices` - Vertex array.
    /// * `u`        - Barycentric weight of the second vertex.
    /// * `v`        - Barycentric weight of the third vertex.
    pub fn tex_coord(&self, vertices: &CpuVertexArray, u: Float, v: Float) -> Point2f {
        let w = 1.0 - u - v;
        let t = |i: usize| vertices.vertex[self.index[i] as usize].tex_coord0;
        let (t0, t1, t2) = (t(0), t(1), t(2));
        point2(
            w * t0.x + u * t1.x + v * t2.x,
            w * t0.y + u * t1.y + v * t2.y,
        )
    }

    /// Returns the interpolated attributes at a hit.
    ///
    /// * `hit`      - A hit on this triangle.
    /// * `vertices` - Vertex array.
    pub fn sample_context(&self, hit: &Hit, vertices: &CpuVertexArray) -> SurfelSampleContext {
        let (u, v) = (hit.u, hit.v);
        let w = 1.0 - u - v;
        let vtx = |i: usize| &vertices.vertex[self.index[i] as usize];
        let (a, b, c) = (vtx(0), vtx(1), vtx(2));

        let lerp3 = |x: Vector3f, y: Vector3f, z: Vector3f| x * w + y * u + z * v;
        let position = Point3f::from(lerp3(a.position.into(), b.position.into(), c.position.into()));
        let prev_position = Point3f::from(lerp3(
            vertices.prev_position(self.index[0]).into(),
            vertices.prev_position(self.index[1]).into(),
            vertices.prev_position(self.index[2]).into(),
        ));

        SurfelSampleContext {
            position,
            prev_position,
            geometric_normal: self.geometric_normal(vertices),
            interpolated_normal: lerp3(a.normal, b.normal, c.normal),
            interpolated_tangent: lerp3(a.tangent, b.tangent, c.tangent),
            tangent_handedness: a.tangent_w,
            tex_coord: self.tex_coord(vertices, u, v),
            backface: hit.backface,
            two_sided: self.is_two_sided(),
            material: self.material,
            surface: self.surface,
            source: SurfelSource {
                index: hit.tri_index as usize,
                primitive: self.source.primitive,
                u,
                v,
            },
        }
    }

    /// Returns a surfel for a hit on this triangle. Triangles without a
    /// material are shaded as grey Lambertian reflectors.
    ///
    /// * `hit`       - A hit on this triangle.
    /// * `vertices`  - Vertex array.
    /// * `materials` - Table the material id refers to.
    pub fn sample(&self, hit: &Hit, vertices: &CpuVertexArray, materials: &MaterialTable) -> ArcSurfel {
        let ctx = self.sample_context(hit, vertices);
        match self.material.and_then(|id| materials.get(id)) {
            Some(material) => material.sample(&ctx),
            None => Arc::new(LambertianSurfel::new(
                ctx.surfel_data(),
                DEFAULT_REFLECTIVITY,
                Radiance3::ZERO,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::CpuVertex;
    use float_cmp::approx_eq;

    fn vertices(points: &[[Float; 3]]) -> CpuVertexArray {
        let mut va = CpuVertexArray::new(false);
        for (i, p) in points.iter().enumerate() {
            va.push(
                CpuVertex {
                    position: Point3f::from(*p),
                    normal: Vector3f::new(0.0, 0.0, 1.0),
                    tangent: Vector3f::new(1.0, 0.0, 0.0),
                    tangent_w: 1.0,
                    tex_coord0: point2(i as Float, 0.0),
                },
                None,
            );
        }
        va
    }

    #[test]
    fn area_and_normal() {
        let va = vertices(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [2.0, 0.0, 0.0]]);
        let tri = Tri::new([0, 1, 2], &va, None, None, TriFlags::empty());
        assert_eq!(tri.area(), 0.5);
        assert!(!tri.is_degenerate());
        assert_eq!(tri.geometric_normal(&va), Vector3f::new(0.0, 0.0, 1.0));

        let flat = Tri::new([0, 1, 3], &va, None, None, TriFlags::TWO_SIDED);
        assert!(flat.is_degenerate());
        assert!(flat.is_two_sided());
        assert_eq!(flat.geometric_normal(&va), Vector3f::zero());
    }

    #[test]
    fn sample_interpolates_attributes() {
        let va = vertices(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let tri = Tri::new([0, 1, 2], &va, None, None, TriFlags::empty()).with_source(TriSource { primitive: 7 });
        let hit = Hit {
            tri_index: 3,
            u: 0.2,
            v: 0.2,
            backface: false,
            distance: 1.0,
        };
        let s = tri.sample(&hit, &va, &MaterialTable::new());
        let d = s.data();
        assert!(approx_eq!(f32, d.position.x, 0.2, epsilon = 1e-6));
        assert!(approx_eq!(f32, d.position.y, 0.2, epsilon = 1e-6));
        assert_eq!(d.shading_normal, Vector3f::new(0.0, 0.0, 1.0));
        assert_eq!(d.source.index, 3);
        assert_eq!(d.source.primitive, 7);
        assert_eq!((d.source.u, d.source.v), (0.2, 0.2));
        assert_eq!(s.shading_terms().map(|t| t.lambertian), Some(DEFAULT_REFLECTIVITY));

        let uv = tri.tex_coord(&va, 0.2, 0.2);
        assert!(approx_eq!(f32, uv.x, 0.6, epsilon = 1e-6));
    }
}
