//! CPU Vertex Array

use crate::geometry::{Point2f, Point3f, Vector3f};
use crate::pbrt::Float;

/// A world space vertex.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CpuVertex {
    /// Position.
    pub position: Point3f,

    /// Unit normal.
    pub normal: Vector3f,

    /// Unit tangent.
    pub tangent: Vector3f,

    /// Handedness of the tangent frame; +1 or -1.
    pub tangent_w: Float,

    /// Texture coordinate.
    pub tex_coord0: Point2f,
}

/// Vertices shared by the triangles of a tree, with optional positions at the
/// previous frame stored in a parallel array.
#[derive(Clone, Debug, Default)]
pub struct CpuVertexArray {
    /// Vertices.
    pub vertex: Vec<CpuVertex>,

    /// Previous positions; empty unless requested.
    pub prev_position: Vec<Point3f>,

    has_prev_position: bool,
}

impl CpuVertexArray {
    /// Create an empty array.
    ///
    /// * `has_prev_position` - Store previous frame positions.
    pub fn new(has_prev_position: bool) -> Self {
        Self {
            vertex: vec![],
            prev_position: vec![],
            has_prev_position,
        }
    }

    /// Returns true if previous positions are stored.
    pub fn has_prev_position(&self) -> bool {
        self.has_prev_position
    }

    /// Returns the number of vertices.
    pub fn len(&self) -> usize {
        self.vertex.len()
    }

    /// Returns true if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty()
    }

    /// Appends a vertex and returns its index.
    ///
    /// * `v`    - The vertex.
    /// * `prev` - Previous position; ignored unless previous positions are
    ///            stored, in which case `None` means the vertex did not move.
    pub fn push(&mut self, v: CpuVertex, prev: Option<Point3f>) -> u32 {
        if self.has_prev_position {
            self.prev_position.push(prev.unwrap_or(v.position));
        }
        self.vertex.push(v);
        (self.vertex.len() - 1) as u32
    }

    /// Returns the position of a vertex.
    ///
    /// * `i` - Vertex index.
    #[inline]
    pub fn position(&self, i: u32) -> Point3f {
        self.vertex[i as usize].position
    }

    /// Returns the previous position of a vertex, or the current position
    /// when previous positions are not stored.
    ///
    /// * `i` - Vertex index.
    pub fn prev_position(&self, i: u32) -> Point3f {
        if self.has_prev_position {
            self.prev_position[i as usize]
        } else {
            self.position(i)
        }
    }

    /// Returns the heap memory used in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.vertex.capacity() * std::mem::size_of::<CpuVertex>()
            + self.prev_position.capacity() * std::mem::size_of::<Point3f>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prev_position_defaults_to_position() {
        let v = CpuVertex {
            position: Point3f::new(1.0, 2.0, 3.0),
            ..Default::default()
        };

        let mut a = CpuVertexArray::new(false);
        assert_eq!(a.push(v, Some(Point3f::zero())), 0);
        assert!(a.prev_position.is_empty());
        assert_eq!(a.prev_position(0), v.position);

        let mut b = CpuVertexArray::new(true);
        b.push(v, None);
        b.push(v, Some(Point3f::zero()));
        assert_eq!(b.len(), 2);
        assert_eq!(b.prev_position(0), v.position);
        assert_eq!(b.prev_position(1), Point3f::zero());
    }
}
