//! TriTree
//!
//! A triangle soup indexed by a BVH. The mesh, the material and surface
//! tables and the BVH live together in an immutable `Snapshot`; every query
//! runs against the snapshot that was current when it started and
//! `rebuild()` swaps in a new one.

mod options;
mod query;
mod wavefront;

use crate::bvh::{Bvh, SplitMethod};
use arc_swap::ArcSwapOption;
use base::geometry::Bounds3f;
use base::gpu::ImageStorage;
use base::material::{ArcMaterial, MaterialId, MaterialTable};
use base::mesh::{CpuVertexArray, Tri};
use base::scene::Scene;
use base::surface::{get_tris, ArcSurface, SurfaceId, SurfaceTable};
use base::{stat_counter, stat_percent, stat_register_fns};
use std::sync::{Arc, Mutex};

// Re-export
pub use options::*;
pub use wavefront::*;

stat_counter!("TriTree/Ray-triangle tests", N_RAY_TRI_TESTS, tritree_stats_ray_tri_tests);
stat_percent!(
    "TriTree/Ray intersection hits",
    N_RAY_HITS,
    N_RAYS,
    tritree_stats_ray_hits,
);

stat_register_fns!(tritree_stats_ray_tri_tests, tritree_stats_ray_hits);

/// BVH build parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TriTreeSettings {
    /// Partitioning method.
    pub split_method: SplitMethod,

    /// Maximum number of triangles in a leaf.
    pub max_tris_per_leaf: u8,

    /// Store previous frame vertex positions when extracting surfaces.
    pub compute_prev_position: bool,
}

impl Default for TriTreeSettings {
    fn default() -> Self {
        Self {
            split_method: SplitMethod::SAH,
            max_tris_per_leaf: 4,
            compute_prev_position: false,
        }
    }
}

/// The data a query runs against.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub(crate) vertices: Arc<CpuVertexArray>,
    pub(crate) tris: Arc<[Tri]>,
    pub(crate) materials: Arc<MaterialTable>,
    pub(crate) surfaces: Arc<SurfaceTable>,
    pub(crate) bvh: Bvh,
}

impl Snapshot {
    /// Returns a snapshot without triangles.
    fn empty() -> Self {
        Self {
            vertices: Arc::new(CpuVertexArray::new(false)),
            tris: Vec::new().into(),
            materials: Arc::new(MaterialTable::new()),
            surfaces: Arc::new(SurfaceTable::new()),
            bvh: Bvh::default(),
        }
    }

    /// Indexes the given contents.
    ///
    /// * `vertices`  - Vertex array.
    /// * `tris`      - Triangles.
    /// * `materials` - Materials referenced by `tris`.
    /// * `surfaces`  - Surfaces referenced by `tris`.
    /// * `settings`  - BVH build parameters.
    fn build(
        vertices: Arc<CpuVertexArray>,
        tris: Arc<[Tri]>,
        materials: Arc<MaterialTable>,
        surfaces: Arc<SurfaceTable>,
        settings: &TriTreeSettings,
    ) -> Self {
        let bounds: Vec<Bounds3f> = tris.iter().map(|t| t.bounds(&vertices)).collect();
        let bvh = Bvh::new(&bounds, settings.split_method, settings.max_tris_per_leaf);
        Self {
            vertices,
            tris,
            materials,
            surfaces,
            bvh,
        }
    }
}

/// A ray intersection acceleration structure over world space triangles.
///
/// Queries may run concurrently with each other and with content changes;
/// content changes are serialized.
pub struct TriTree {
    /// BVH build parameters.
    settings: TriTreeSettings,

    /// Current contents; `None` until contents are first set.
    snapshot: ArcSwapOption<Snapshot>,

    /// Serializes content changes.
    writer: Mutex<()>,
}

impl Default for TriTree {
    fn default() -> Self {
        Self::new(TriTreeSettings::default())
    }
}

impl TriTree {
    /// Create an empty tree.
    ///
    /// * `settings` - BVH build parameters.
    pub fn new(settings: TriTreeSettings) -> Self {
        register_stats();
        Self {
            settings,
            snapshot: ArcSwapOption::empty(),
            writer: Mutex::new(()),
        }
    }

    /// Returns the BVH build parameters.
    pub fn settings(&self) -> &TriTreeSettings {
        &self.settings
    }

    /// Returns the current snapshot.
    ///
    /// Panics if contents were never set.
    pub(crate) fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .load_full()
            .unwrap_or_else(|| panic!("TriTree queried before set_contents"))
    }

    /// Replaces the contents with the surfaces a scene poses.
    ///
    /// * `scene`   - The scene.
    /// * `storage` - Texture residency policy for the referenced materials.
    pub fn set_contents_from_scene(&self, scene: &dyn Scene, storage: ImageStorage) {
        let mut surfaces = vec![];
        scene.on_pose(&mut surfaces);
        self.set_contents_from_surfaces(&surfaces, storage);
    }

    /// Replaces the contents with the triangles of posed surfaces.
    ///
    /// * `surfaces` - The surfaces.
    /// * `storage`  - Texture residency policy for the referenced materials.
    pub fn set_contents_from_surfaces(&self, surfaces: &[ArcSurface], storage: ImageStorage) {
        let extraction = get_tris(surfaces, self.settings.compute_prev_position);
        debug!(
            "extracted {} triangles and {} vertices from {} surfaces",
            extraction.tris.len(),
            extraction.vertices.len(),
            surfaces.len()
        );
        self.install(
            extraction.vertices,
            extraction.tris,
            extraction.materials,
            extraction.surfaces,
            storage,
        );
    }

    /// Replaces the contents with explicit triangles.
    ///
    /// * `tris`      - Triangles; indices refer to `vertices` and material
    ///                 ids to `materials`.
    /// * `vertices`  - Vertex array.
    /// * `materials` - Materials referenced by `tris`.
    /// * `storage`   - Texture residency policy for `materials`.
    pub fn set_contents_from_tris(
        &self,
        tris: Vec<Tri>,
        vertices: CpuVertexArray,
        materials: MaterialTable,
        storage: ImageStorage,
    ) {
        let n = vertices.len();
        assert!(
            tris.iter().all(|t| t.index.iter().all(|&i| (i as usize) < n)),
            "triangle vertex index out of range"
        );
        self.install(vertices, tris, materials, SurfaceTable::new(), storage);
    }

    fn install(
        &self,
        vertices: CpuVertexArray,
        tris: Vec<Tri>,
        materials: MaterialTable,
        surfaces: SurfaceTable,
        storage: ImageStorage,
    ) {
        if storage != ImageStorage::Current {
            materials.iter().for_each(|m| m.set_storage(storage));
        }

        let _lock = self.writer.lock().expect("TriTree writer lock poisoned");
        let snapshot = Snapshot::build(
            Arc::new(vertices),
            tris.into(),
            Arc::new(materials),
            Arc::new(surfaces),
            &self.settings,
        );
        self.snapshot.store(Some(Arc::new(snapshot)));
    }

    /// Rebuilds the BVH over the current contents. Queries that started
    /// before the rebuild finish against the old index.
    pub fn rebuild(&self) {
        let _lock = self.writer.lock().expect("TriTree writer lock poisoned");
        let Some(current) = self.snapshot.load_full() else {
            warn!("TriTree rebuild() called before set_contents; nothing to do");
            return;
        };
        let snapshot = Snapshot::build(
            Arc::clone(&current.vertices),
            Arc::clone(&current.tris),
            Arc::clone(&current.materials),
            Arc::clone(&current.surfaces),
            &self.settings,
        );
        self.snapshot.store(Some(Arc::new(snapshot)));
    }

    /// Removes all triangles. Subsequent queries miss.
    pub fn clear(&self) {
        let _lock = self.writer.lock().expect("TriTree writer lock poisoned");
        self.snapshot.store(Some(Arc::new(Snapshot::empty())));
    }

    /// Returns the number of triangles.
    pub fn size(&self) -> usize {
        self.snapshot.load().as_ref().map_or(0, |s| s.tris.len())
    }

    /// Returns a triangle. Hit and surfel source indices refer to this.
    ///
    /// * `i` - Triangle index.
    pub fn tri(&self, i: usize) -> Tri {
        self.snapshot().tris[i]
    }

    /// Returns the vertex array triangle indices refer to.
    pub fn vertex_array(&self) -> Arc<CpuVertexArray> {
        Arc::clone(&self.snapshot().vertices)
    }

    /// Returns the bounds of all triangles.
    pub fn bounds(&self) -> Bounds3f {
        self.snapshot.load().as_ref().map_or_else(Bounds3f::empty, |s| s.bvh.bounds())
    }

    /// Returns a material referenced by the triangles.
    ///
    /// * `id` - Material id from a triangle or surfel.
    pub fn material(&self, id: MaterialId) -> Option<ArcMaterial> {
        self.snapshot().materials.get(id).cloned()
    }

    /// Returns a surface the triangles were extracted from.
    ///
    /// * `id` - Surface id from a triangle or surfel.
    pub fn surface(&self, id: SurfaceId) -> Option<ArcSurface> {
        self.snapshot().surfaces.get(id).cloned()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
