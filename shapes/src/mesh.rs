//! Indexed triangle meshes

use base::geometry::{Bounds3f, Dot, Transform, Union, Vector3f};
use base::material::ArcMaterial;
use base::mesh::{CpuVertex, TriFlags};
use base::surface::{ArcSurface, Surface, TriExtraction};
use std::any::Any;
use std::sync::Arc;

/// Object space vertices and triangles shared between surfaces.
#[derive(Clone, Debug)]
pub struct MeshGeometry {
    /// Name used in log messages.
    pub name: String,

    /// Object space vertices.
    pub vertices: Vec<CpuVertex>,

    /// Vertex indices. Triangle `i` uses `indices[3 * i..3 * i + 3]`, wound
    /// counter-clockwise around its front side.
    pub indices: Vec<u32>,

    /// Object space bounds.
    bounds: Bounds3f,
}

/// Atomically reference counted `MeshGeometry`.
pub type ArcMeshGeometry = Arc<MeshGeometry>;

impl MeshGeometry {
    /// Create a new mesh.
    ///
    /// * `name`     - Name used in log messages.
    /// * `vertices` - Object space vertices.
    /// * `indices`  - Vertex indices, three per triangle.
    pub fn new(name: &str, vertices: Vec<CpuVertex>, indices: Vec<u32>) -> Self {
        assert!(indices.len() % 3 == 0, "mesh '{name}' index count is not a multiple of 3");
        assert!(
            indices.iter().all(|&i| (i as usize) < vertices.len()),
            "mesh '{name}' has a vertex index out of range"
        );

        let bounds = vertices
            .iter()
            .fold(Bounds3f::empty(), |b, v| b.union(&v.position));
        Self {
            name: name.to_string(),
            vertices,
            indices,
            bounds,
        }
    }

    /// Returns the number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Returns the object space bounds.
    pub fn bounds(&self) -> Bounds3f {
        self.bounds
    }

    /// Returns the vertex indices of a triangle.
    ///
    /// * `i` - Triangle index.
    pub fn triangle(&self, i: usize) -> [u32; 3] {
        [self.indices[3 * i], self.indices[3 * i + 1], self.indices[3 * i + 2]]
    }

    /// Replaces vertex normals with area weighted face normals.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vector3f::zero(); self.vertices.len()];
        for t in 0..self.num_triangles() {
            let [i0, i1, i2] = self.triangle(t);
            let p = |i: u32| self.vertices[i as usize].position;
            // Unnormalized, so larger faces weigh more.
            let n = (p(i1) - p(i0)).cross(&(p(i2) - p(i0)));
            for i in [i0, i1, i2] {
                normals[i as usize] += n;
            }
        }

        for (v, n) in self.vertices.iter_mut().zip(normals) {
            if n.length_squared() > 0.0 {
                v.normal = n.normalize();
                let t = v.tangent - v.normal * v.normal.dot(&v.tangent);
                if t.length_squared() > 0.0 {
                    v.tangent = t.normalize();
                }
            }
        }
    }
}

/// A posed instance of a `MeshGeometry`.
#[derive(Clone)]
pub struct MeshSurface {
    name: String,
    geometry: ArcMeshGeometry,
    frame: Transform,
    previous_frame: Transform,
    material: Option<ArcMaterial>,
    two_sided: bool,
    can_change: bool,
}

impl MeshSurface {
    /// Create a new surface.
    ///
    /// * `name`     - Name used in log messages.
    /// * `geometry` - Object space mesh; may be shared by other surfaces.
    /// * `frame`    - Object to world transform.
    /// * `material` - Material; triangles without one are shaded grey.
    pub fn new(name: &str, geometry: ArcMeshGeometry, frame: Transform, material: Option<ArcMaterial>) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            frame,
            previous_frame: frame,
            material,
            two_sided: false,
            can_change: true,
        }
    }

    /// Sets the object to world transform at the previous frame.
    ///
    /// * `previous_frame` - The transform.
    pub fn with_previous_frame(mut self, previous_frame: Transform) -> Self {
        self.previous_frame = previous_frame;
        self
    }

    /// Makes the triangles visible from both sides.
    ///
    /// * `two_sided` - True for two-sided triangles.
    pub fn with_two_sided(mut self, two_sided: bool) -> Self {
        self.two_sided = two_sided;
        self
    }

    /// Marks the surface as never moving.
    pub fn with_static(mut self) -> Self {
        self.can_change = false;
        self
    }

    /// Returns the shared geometry.
    pub fn geometry(&self) -> &ArcMeshGeometry {
        &self.geometry
    }

    /// Returns true if the triangles are visible from both sides.
    pub fn is_two_sided(&self) -> bool {
        self.two_sided
    }
}

impl Surface for MeshSurface {
    fn name(&self) -> &str {
        &self.name
    }

    fn object_space_bounds(&self) -> Bounds3f {
        self.geometry.bounds()
    }

    fn frame(&self) -> Transform {
        self.frame
    }

    fn previous_frame(&self) -> Transform {
        self.previous_frame
    }

    fn can_change(&self) -> bool {
        self.can_change
    }

    fn material(&self) -> Option<ArcMaterial> {
        self.material.clone()
    }

    fn vertex_source_id(&self) -> usize {
        Arc::as_ptr(&self.geometry) as usize
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    /// Appends every surface in the group. Instances of the same geometry
    /// with the same frame share vertices. A frame that mirrors the mesh
    /// reverses the winding so front faces stay in front.
    fn get_tris_homogeneous(&self, group: &[ArcSurface], out: &mut TriExtraction) {
        for s in group {
            let Some(mesh) = s.as_any().downcast_ref::<MeshSurface>() else {
                warn!("surface '{}' is not a MeshSurface; skipped", s.name());
                continue;
            };

            let geometry = &mesh.geometry;
            let base = out.append_vertices(
                mesh.vertex_source_id(),
                &mesh.frame,
                &mesh.previous_frame,
                &geometry.vertices,
            );

            let flags = if mesh.two_sided { TriFlags::TWO_SIDED } else { TriFlags::empty() };
            let mirrored = mesh.frame.swaps_handedness();
            for t in 0..geometry.num_triangles() {
                let [i0, i1, i2] = geometry.triangle(t);
                let index = if mirrored {
                    [base + i0, base + i2, base + i1]
                } else {
                    [base + i0, base + i1, base + i2]
                };
                out.add_tri(index, mesh.material.as_ref(), s, flags);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
