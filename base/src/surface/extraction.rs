//! Geometry Extraction

use super::{ArcSurface, SurfaceTable};
use crate::geometry::{Normal3f, Transform, Vector3f};
use crate::material::{ArcMaterial, MaterialTable};
use crate::mesh::{CpuVertex, CpuVertexArray, Tri, TriFlags, TriSource};
use std::any::TypeId;
use std::collections::HashMap;

crate::stat_counter!("Extraction/Vertices emitted", N_VERTICES, report_vertices);
crate::stat_counter!("Extraction/Vertex sources reused", N_REUSED, report_reused);
crate::stat_register_fns!(report_vertices, report_reused);

/// A flat world space mesh under construction. Surfaces append to it from
/// `Surface::get_tris_homogeneous()`.
#[derive(Debug, Default)]
pub struct TriExtraction {
    /// World space vertices.
    pub vertices: CpuVertexArray,

    /// Triangles.
    pub tris: Vec<Tri>,

    /// Materials referenced by `tris`.
    pub materials: MaterialTable,

    /// Surfaces referenced by `tris`.
    pub surfaces: SurfaceTable,

    /// Number of triangles added so far for each surface.
    primitives: Vec<u32>,

    /// First vertex emitted for a vertex source, frame and, when previous
    /// positions are stored, previous frame.
    vertex_cache: HashMap<(usize, [u32; 16], Option<[u32; 16]>), u32>,
}

impl TriExtraction {
    /// Create an empty mesh.
    ///
    /// * `compute_prev_position` - Also store previous frame positions.
    pub fn new(compute_prev_position: bool) -> Self {
        Self {
            vertices: CpuVertexArray::new(compute_prev_position),
            ..Default::default()
        }
    }

    /// Returns true if previous frame positions are stored.
    pub fn compute_prev_position(&self) -> bool {
        self.vertices.has_prev_position()
    }

    /// Transforms object space vertices to world space and appends them,
    /// returning the index of the first one. Vertices already appended for
    /// the same source and frames are reused instead.
    ///
    /// * `source_id`  - Identifier of the object space vertex data.
    /// * `frame`      - Object to world transform.
    /// * `prev_frame` - Object to world transform at the previous frame.
    /// * `vertices`   - Object space vertices.
    pub fn append_vertices(
        &mut self,
        source_id: usize,
        frame: &Transform,
        prev_frame: &Transform,
        vertices: &[CpuVertex],
    ) -> u32 {
        let store_prev = self.compute_prev_position();
        let key = (source_id, frame.bits(), store_prev.then(|| prev_frame.bits()));
        if let Some(&base) = self.vertex_cache.get(&key) {
            crate::stat_inc!(N_REUSED, 1);
            return base;
        }

        let base = self.vertices.len() as u32;
        let flip = if frame.swaps_handedness() { -1.0 } else { 1.0 };
        for v in vertices {
            let n = Vector3f::from(frame.transform_normal(&Normal3f::from(v.normal)));
            let world = CpuVertex {
                position: frame.transform_point(&v.position),
                normal: if n.length_squared() > 0.0 { n.normalize() } else { n },
                tangent: frame.transform_vector(&v.tangent),
                tangent_w: v.tangent_w * flip,
                tex_coord0: v.tex_coord0,
            };
            let prev = store_prev.then(|| prev_frame.transform_point(&v.position));
            self.vertices.push(world, prev);
        }
        crate::stat_inc!(N_VERTICES, vertices.len() as i64);

        self.vertex_cache.insert(key, base);
        base
    }

    /// Appends a triangle.
    ///
    /// * `index`    - World space vertex indices.
    /// * `material` - Material used to shade it.
    /// * `surface`  - Surface it belongs to.
    /// * `flags`    - Flags.
    pub fn add_tri(&mut self, index: [u32; 3], material: Option<&ArcMaterial>, surface: &ArcSurface, flags: TriFlags) {
        let material = material.map(|m| self.materials.intern(m));
        let surface = self.surfaces.intern(surface);
        if surface.index() == self.primitives.len() {
            self.primitives.push(0);
        }
        let primitive = self.primitives[surface.index()];
        self.primitives[surface.index()] += 1;

        let tri = Tri::new(index, &self.vertices, material, Some(surface), flags);
        self.tris.push(tri.with_source(TriSource { primitive }));
    }
}

/// Extracts one flat world space mesh from posed surfaces. Surfaces are
/// grouped by concrete type in order of first appearance and each group is
/// emitted with a single `get_tris_homogeneous()` call.
///
/// * `surfaces`              - Posed surfaces.
/// * `compute_prev_position` - Also store previous frame positions.
pub fn get_tris(surfaces: &[ArcSurface], compute_prev_position: bool) -> TriExtraction {
    register_stats();

    let mut groups: Vec<(TypeId, Vec<ArcSurface>)> = vec![];
    for s in surfaces {
        let type_id = s.as_any().type_id();
        match groups.iter_mut().find(|(t, _)| *t == type_id) {
            Some((_, group)) => group.push(s.clone()),
            None => groups.push((type_id, vec![s.clone()])),
        }
    }

    let mut out = TriExtraction::new(compute_prev_position);
    for (_, group) in groups.iter() {
        group[0].get_tris_homogeneous(group, &mut out);
    }

    debug!(
        "extracted {} triangles, {} vertices from {} surfaces in {} groups",
        out.tris.len(),
        out.vertices.len(),
        surfaces.len(),
        groups.len()
    );
    out
}
