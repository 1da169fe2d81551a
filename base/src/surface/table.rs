//! Surface Table

use super::ArcSurface;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Index of a surface in a `SurfaceTable`. Only meaningful together with the
/// table that issued it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

impl SurfaceId {
    /// Returns the table index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Surfaces referenced by triangles, de-duplicated by `Arc` identity.
#[derive(Clone, Default)]
pub struct SurfaceTable {
    surfaces: Vec<ArcSurface>,
    ids: HashMap<usize, SurfaceId>,
}

impl SurfaceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of a surface, adding it if it is new.
    ///
    /// * `surface` - The surface.
    pub fn intern(&mut self, surface: &ArcSurface) -> SurfaceId {
        let key = Arc::as_ptr(surface) as *const () as usize;
        *self.ids.entry(key).or_insert_with(|| {
            self.surfaces.push(Arc::clone(surface));
            SurfaceId((self.surfaces.len() - 1) as u32)
        })
    }

    /// Returns the surface with the given id.
    ///
    /// * `id` - Surface id.
    pub fn get(&self, id: SurfaceId) -> Option<&ArcSurface> {
        self.surfaces.get(id.index())
    }

    /// Returns the number of surfaces.
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Returns an iterator over the surfaces.
    pub fn iter(&self) -> impl Iterator<Item = &ArcSurface> {
        self.surfaces.iter()
    }
}

impl fmt::Debug for SurfaceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.surfaces.iter().map(|s| s.name())).finish()
    }
}
