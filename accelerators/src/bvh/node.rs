//! BVH Nodes

use base::geometry::{Bounds3f, Point3f, Union};
use base::pbrt::Axis;
use base::{stat_counter, stat_inc, stat_memory_counter, stat_ratio, stat_register_fns};
use shared_arena::ArenaArc;

stat_memory_counter!("Memory/TriTree BVH", TREE_BYTES, bvh_stats_tree_bytes);
stat_ratio!(
    "TriTree/Triangles per leaf node",
    TOTAL_TRIS,
    TOTAL_LEAF_NODES,
    bvh_stats_tris_per_leaf_node,
);
stat_counter!("TriTree/Interior nodes", INTERIOR_NODES, bvh_stats_interior_nodes);
stat_counter!("TriTree/Leaf nodes", LEAF_NODES, bvh_stats_leaf_nodes);

stat_register_fns!(
    bvh_stats_tree_bytes,
    bvh_stats_tris_per_leaf_node,
    bvh_stats_interior_nodes,
    bvh_stats_leaf_nodes,
);

/// Splitting method used to subdivide triangles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SplitMethod {
    /// Surface Area Heuristic.
    #[default]
    SAH,

    /// Split at the midpoint of the centroid bounds.
    Middle,

    /// Split into halves with equal triangle counts along the widest axis.
    EqualCounts,
}

impl std::str::FromStr for SplitMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sah" => Ok(Self::SAH),
            "middle" => Ok(Self::Middle),
            "equal" => Ok(Self::EqualCounts),
            _ => Err(format!("unknown BVH split method '{s}'")),
        }
    }
}

/// SAH bucket information.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BucketInfo {
    /// Number of triangles.
    pub count: usize,

    /// Bounds of the triangles.
    pub bounds: Bounds3f,
}

impl Default for BucketInfo {
    fn default() -> Self {
        Self {
            count: 0,
            bounds: Bounds3f::empty(),
        }
    }
}

/// Bounds of one triangle during construction.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BVHTriInfo {
    /// Index of the triangle.
    pub tri_index: u32,

    /// Bounds.
    pub bounds: Bounds3f,

    /// Centre of the bounds.
    pub centroid: Point3f,
}

impl BVHTriInfo {
    /// Create a new `BVHTriInfo`.
    ///
    /// * `tri_index` - Index of the triangle.
    /// * `bounds`    - Bounds of the triangle.
    pub fn new(tri_index: u32, bounds: Bounds3f) -> Self {
        Self {
            tri_index,
            bounds,
            centroid: bounds.centroid(),
        }
    }
}

/// Node of the tree during construction.
#[derive(Clone)]
pub(crate) struct BVHBuildNode {
    /// Bounds of everything beneath this node.
    pub bounds: Bounds3f,

    /// Children of an interior node.
    pub children: [Option<ArenaArc<BVHBuildNode>>; 2],

    /// Axis the children are partitioned along.
    pub split_axis: Axis,

    /// First entry of the ordered triangle list for a leaf.
    pub first_tri_offset: usize,

    /// Number of triangles in a leaf; 0 for interior nodes.
    pub n_tris: usize,
}

impl BVHBuildNode {
    /// Create a leaf node.
    ///
    /// * `first`  - First entry of the ordered triangle list.
    /// * `n`      - Number of triangles.
    /// * `bounds` - Bounds.
    pub fn new_leaf_node(first: usize, n: usize, bounds: Bounds3f) -> Self {
        stat_inc!(LEAF_NODES, 1);
        stat_inc!(TOTAL_LEAF_NODES, 1);
        stat_inc!(TOTAL_TRIS, n as i64);
        Self {
            bounds,
            children: [None, None],
            split_axis: Axis::default(),
            first_tri_offset: first,
            n_tris: n,
        }
    }

    /// Create an interior node.
    ///
    /// * `axis` - Axis used for partitioning children.
    /// * `c0`   - First child.
    /// * `c1`   - Second child.
    pub fn new_interior_node(axis: Axis, c0: ArenaArc<BVHBuildNode>, c1: ArenaArc<BVHBuildNode>) -> Self {
        stat_inc!(INTERIOR_NODES, 1);
        Self {
            bounds: c0.bounds.union(&c1.bounds),
            children: [Some(c0), Some(c1)],
            split_axis: axis,
            first_tri_offset: 0,
            n_tris: 0,
        }
    }
}

/// Depth first node used for traversal.
#[derive(Copy, Clone, Debug)]
pub struct LinearBVHNode {
    /// Bounds.
    pub bounds: Bounds3f,

    /// Offset of the first triangle for leaves; offset of the second child
    /// for interior nodes.
    pub offset: u32,

    /// Number of triangles for leaves; 0 for interior nodes.
    pub n_tris: u16,

    /// Partition axis of interior nodes.
    pub axis: u8,

    /// Padding to 32 bytes.
    pub pad: u8,
}

impl Default for LinearBVHNode {
    fn default() -> Self {
        Self {
            bounds: Bounds3f::empty(),
            offset: 0,
            n_tris: 0,
            axis: 0,
            pad: 0,
        }
    }
}

impl LinearBVHNode {
    /// Create a leaf node.
    ///
    /// * `bounds` - Bounds.
    /// * `offset` - First triangle.
    /// * `n_tris` - Number of triangles.
    pub fn new_leaf_node(bounds: Bounds3f, offset: u32, n_tris: u16) -> Self {
        Self {
            bounds,
            offset,
            n_tris,
            axis: 0,
            pad: 0,
        }
    }

    /// Create an interior node.
    ///
    /// * `bounds` - Bounds.
    /// * `offset` - Offset of the second child.
    /// * `axis`   - Partition axis.
    pub fn new_interior_node(bounds: Bounds3f, offset: u32, axis: u8) -> Self {
        Self {
            bounds,
            offset,
            n_tris: 0,
            axis,
            pad: 0,
        }
    }

    /// Returns true for leaves.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.n_tris > 0
    }
}

/// Records the memory used by a tree.
///
/// * `bytes` - Size in bytes.
pub(crate) fn report_tree_bytes(bytes: usize) {
    stat_inc!(TREE_BYTES, bytes as u64);
}
