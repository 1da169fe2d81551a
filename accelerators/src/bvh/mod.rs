//! Bounding Volume Hierarchy over triangle bounds.

mod build;
mod node;

use base::geometry::{Bounds3f, Ray, Vector3f};
use base::pbrt::Float;
use shared_arena::{ArenaArc, SharedArena};

pub use node::*;

/// Initial capacity of the traversal stack. Unbalanced trees grow it.
const TRAVERSAL_STACK_CAPACITY: usize = 64;

/// A bounding volume hierarchy over a set of triangle bounds. Leaves refer to
/// triangles by their index in the input.
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    /// Nodes in depth first order.
    nodes: Vec<LinearBVHNode>,

    /// Triangle indices in leaf order.
    tri_indices: Vec<u32>,
}

impl Bvh {
    /// Builds a hierarchy.
    ///
    /// * `bounds`           - Bounds of each triangle.
    /// * `split_method`     - Partitioning method.
    /// * `max_tris_in_node` - Maximum number of triangles in a leaf.
    pub fn new(bounds: &[Bounds3f], split_method: SplitMethod, max_tris_in_node: u8) -> Self {
        register_stats();

        if bounds.is_empty() {
            return Self::default();
        }

        let mut tri_info: Vec<BVHTriInfo> = bounds
            .iter()
            .enumerate()
            .map(|(i, b)| BVHTriInfo::new(i as u32, *b))
            .collect();

        let arena = SharedArena::<BVHBuildNode>::new();
        let mut total_nodes = 0;
        let mut tri_indices = Vec::with_capacity(bounds.len());
        let root = build::build(
            &arena,
            split_method,
            max_tris_in_node.max(1) as usize,
            &mut tri_info,
            0,
            bounds.len(),
            &mut total_nodes,
            &mut tri_indices,
        );

        let mut nodes = vec![LinearBVHNode::default(); total_nodes];
        let mut offset = 0_u32;
        Self::flatten_bvh_tree(root, &mut nodes, &mut offset);
        debug_assert!(total_nodes == offset as usize);

        let bvh = Self { nodes, tri_indices };
        report_tree_bytes(bvh.size_in_bytes());
        info!(
            "BVH created with {} nodes for {} triangles ({:.2} MB)",
            total_nodes,
            bounds.len(),
            bvh.size_in_bytes() as f32 / (1024.0 * 1024.0)
        );
        bvh
    }

    /// Flattens the tree depth first.
    ///
    /// * `node`   - The node.
    /// * `nodes`  - Destination.
    /// * `offset` - Next free entry in `nodes`.
    fn flatten_bvh_tree(node: ArenaArc<BVHBuildNode>, nodes: &mut [LinearBVHNode], offset: &mut u32) -> u32 {
        let my_offset = *offset;
        *offset += 1;

        if node.n_tris > 0 {
            assert!(node.n_tris < 65536);
            nodes[my_offset as usize] =
                LinearBVHNode::new_leaf_node(node.bounds, node.first_tri_offset as u32, node.n_tris as u16);
        } else if let [Some(c0), Some(c1)] = node.children.clone() {
            Self::flatten_bvh_tree(c0, nodes, offset);
            let second_child_offset = Self::flatten_bvh_tree(c1, nodes, offset);
            nodes[my_offset as usize] =
                LinearBVHNode::new_interior_node(node.bounds, second_child_offset, node.split_axis.into());
        }

        my_offset
    }

    /// Returns true if the hierarchy has no triangles.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the bounds of all triangles.
    pub fn bounds(&self) -> Bounds3f {
        self.nodes.first().map_or_else(Bounds3f::empty, |n| n.bounds)
    }

    /// Returns the memory used in bytes.
    pub fn size_in_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.nodes.len() * std::mem::size_of::<LinearBVHNode>()
            + self.tri_indices.len() * std::mem::size_of::<u32>()
    }

    /// Visits the triangles in leaves the ray passes through, near leaves
    /// first. `visit` receives a triangle index and the current end of the
    /// ray segment, which it may shorten after a hit; returning `true` stops
    /// the traversal.
    ///
    /// * `ray`   - The ray.
    /// * `visit` - Called for each candidate triangle.
    pub fn traverse_ray<F>(&self, ray: &Ray, mut visit: F)
    where
        F: FnMut(u32, &mut Float) -> bool,
    {
        if self.nodes.is_empty() {
            return;
        }

        let d = ray.direction;
        let inv_dir = Vector3f::new(1.0 / d.x, 1.0 / d.y, 1.0 / d.z);
        let dir_is_neg = [
            (inv_dir.x < 0.0) as usize,
            (inv_dir.y < 0.0) as usize,
            (inv_dir.z < 0.0) as usize,
        ];
        let mut t_max = ray.max_distance;

        let mut current_node_index = 0;
        let mut nodes_to_visit = Vec::with_capacity(TRAVERSAL_STACK_CAPACITY);

        loop {
            let node = &self.nodes[current_node_index];
            if node.bounds.intersect_p_inv(ray, ray.min_distance, t_max, &inv_dir, dir_is_neg) {
                if node.is_leaf() {
                    let first = node.offset as usize;
                    for &tri in &self.tri_indices[first..first + node.n_tris as usize] {
                        if visit(tri, &mut t_max) {
                            return;
                        }
                    }
                    match nodes_to_visit.pop() {
                        Some(i) => current_node_index = i,
                        None => break,
                    }
                } else if dir_is_neg[node.axis as usize] == 1 {
                    // Put far node on the stack, advance to near node.
                    nodes_to_visit.push(current_node_index + 1);
                    current_node_index = node.offset as usize;
                } else {
                    nodes_to_visit.push(node.offset as usize);
                    current_node_index += 1;
                }
            } else {
                match nodes_to_visit.pop() {
                    Some(i) => current_node_index = i,
                    None => break,
                }
            }
        }
    }

    /// Returns the indices of triangles whose bounds overlap a box.
    ///
    /// * `b` - The box.
    pub fn overlapping(&self, b: &Bounds3f) -> Vec<u32> {
        let mut result = vec![];
        if self.nodes.is_empty() {
            return result;
        }

        let mut stack = Vec::with_capacity(TRAVERSAL_STACK_CAPACITY);
        stack.push(0_usize);
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            if !node.bounds.overlaps(b) {
                continue;
            }
            if node.is_leaf() {
                let first = node.offset as usize;
                result.extend_from_slice(&self.tri_indices[first..first + node.n_tris as usize]);
            } else {
                stack.push(node.offset as usize);
                stack.push(i + 1);
            }
        }
        result
    }
}
