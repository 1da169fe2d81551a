//! Scene

use crate::surface::ArcSurface;

/// Provides the posed surfaces a tree is built from.
pub trait Scene {
    /// Appends the currently posed, visible surfaces.
    ///
    /// * `surfaces` - Destination.
    fn on_pose(&self, surfaces: &mut Vec<ArcSurface>);
}
