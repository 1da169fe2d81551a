//! Shape scenes

use base::scene::Scene;
use base::surface::ArcSurface;

/// A list of posed surfaces, some of which may be hidden.
#[derive(Clone, Debug, Default)]
pub struct ShapeScene {
    entries: Vec<(ArcSurface, bool)>,
}

impl ShapeScene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a visible surface.
    ///
    /// * `surface` - The surface.
    pub fn add(&mut self, surface: ArcSurface) -> &mut Self {
        self.entries.push((surface, true));
        self
    }

    /// Shows or hides every surface with the given name.
    ///
    /// * `name`    - Surface name.
    /// * `visible` - True to show.
    pub fn set_visible(&mut self, name: &str, visible: bool) {
        self.entries
            .iter_mut()
            .filter(|(s, _)| s.name() == name)
            .for_each(|(_, v)| *v = visible);
    }

    /// Returns the number of surfaces including hidden ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the scene has no surfaces.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Scene for ShapeScene {
    fn on_pose(&self, surfaces: &mut Vec<ArcSurface>) {
        surfaces.extend(self.entries.iter().filter(|(_, v)| *v).map(|(s, _)| s.clone()));
    }
}
