//! BVH Construction

use super::node::{BVHBuildNode, BVHTriInfo, BucketInfo, SplitMethod};
use base::geometry::{Bounds3f, Union};
use base::pbrt::{Axis, Float};
use order_stat::kth_by;
use shared_arena::{ArenaArc, SharedArena};
use std::cmp::Ordering;

const N_BUCKETS: usize = 12;

/// Recursively builds the tree over `tri_info[start..end]`.
///
/// * `arena`             - Arena for build nodes.
/// * `split_method`      - Partitioning method.
/// * `max_tris_in_node`  - Maximum number of triangles in a leaf.
/// * `tri_info`          - Triangle bounds; reordered in place.
/// * `start`             - First entry. 0 on the first call.
/// * `end`               - One past the last entry.
/// * `total_nodes`       - Incremented for every node created.
/// * `ordered_tris`      - Triangle indices in leaf order.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build(
    arena: &SharedArena<BVHBuildNode>,
    split_method: SplitMethod,
    max_tris_in_node: usize,
    tri_info: &mut [BVHTriInfo],
    start: usize,
    end: usize,
    total_nodes: &mut usize,
    ordered_tris: &mut Vec<u32>,
) -> ArenaArc<BVHBuildNode> {
    *total_nodes += 1;

    let bounds = tri_info[start..end]
        .iter()
        .fold(Bounds3f::empty(), |b, info| b.union(&info.bounds));

    let n_tris = end - start;
    let mut dim = Axis::default();
    let mid = if n_tris == 1 {
        None
    } else {
        let centroid_bounds = tri_info[start..end]
            .iter()
            .fold(Bounds3f::empty(), |b, info| b.union(&info.centroid));
        dim = centroid_bounds.maximum_extent();

        if centroid_bounds.p_max[dim] == centroid_bounds.p_min[dim] {
            // All centroids coincide; only an oversized leaf can be split.
            (n_tris > max_tris_in_node).then(|| split_equal_counts(tri_info, start, end, dim))
        } else {
            match split_method {
                SplitMethod::Middle => Some(split_middle(tri_info, start, end, dim, &centroid_bounds)),
                SplitMethod::EqualCounts => Some(split_equal_counts(tri_info, start, end, dim)),
                SplitMethod::SAH => split_sah(tri_info, start, end, dim, &centroid_bounds, &bounds, max_tris_in_node),
            }
        }
    };

    match mid {
        Some(mid) => {
            let c0 = build(arena, split_method, max_tris_in_node, tri_info, start, mid, total_nodes, ordered_tris);
            let c1 = build(arena, split_method, max_tris_in_node, tri_info, mid, end, total_nodes, ordered_tris);
            arena.alloc_arc(BVHBuildNode::new_interior_node(dim, c0, c1))
        }
        None => {
            let first_tri_offset = ordered_tris.len();
            ordered_tris.extend(tri_info[start..end].iter().map(|info| info.tri_index));
            arena.alloc_arc(BVHBuildNode::new_leaf_node(first_tri_offset, n_tris, bounds))
        }
    }
}

/// Splits at the midpoint of the centroid bounds, falling back to equal
/// counts when every centroid lands on one side.
///
/// * `tri_info`        - Triangle bounds.
/// * `start`           - First entry.
/// * `end`             - One past the last entry.
/// * `dim`             - Partition axis.
/// * `centroid_bounds` - Bounds of the centroids in `start..end`.
fn split_middle(tri_info: &mut [BVHTriInfo], start: usize, end: usize, dim: Axis, centroid_bounds: &Bounds3f) -> usize {
    let pmid = (centroid_bounds.p_min[dim] + centroid_bounds.p_max[dim]) / 2.0;
    let split = itertools::partition(tri_info[start..end].iter_mut(), |ti| ti.centroid[dim] < pmid);
    let mid = start + split;

    if mid != start && mid != end {
        mid
    } else {
        split_equal_counts(tri_info, start, end, dim)
    }
}

/// Partitions so that the first half has the smallest centroid coordinates
/// along `dim`.
///
/// * `tri_info` - Triangle bounds.
/// * `start`    - First entry.
/// * `end`      - One past the last entry.
/// * `dim`      - Partition axis.
fn split_equal_counts(tri_info: &mut [BVHTriInfo], start: usize, end: usize, dim: Axis) -> usize {
    let mid = (start + end) / 2;
    kth_by(&mut tri_info[start..end], mid - start, |a, b| {
        a.centroid[dim].partial_cmp(&b.centroid[dim]).unwrap_or(Ordering::Equal)
    });
    mid
}

/// Returns the SAH bucket of a centroid.
#[inline]
fn bucket_of(info: &BVHTriInfo, dim: Axis, centroid_bounds: &Bounds3f) -> usize {
    let b = (N_BUCKETS as Float * centroid_bounds.offset(&info.centroid)[dim]) as usize;
    b.min(N_BUCKETS - 1)
}

/// Partitions with the surface area heuristic. Returns `None` when a leaf is
/// cheaper than any split.
///
/// * `tri_info`         - Triangle bounds.
/// * `start`            - First entry.
/// * `end`              - One past the last entry.
/// * `dim`              - Partition axis.
/// * `centroid_bounds`  - Bounds of the centroids in `start..end`.
/// * `bounds`           - Bounds of the triangles in `start..end`.
/// * `max_tris_in_node` - Maximum triangles in a leaf.
fn split_sah(
    tri_info: &mut [BVHTriInfo],
    start: usize,
    end: usize,
    dim: Axis,
    centroid_bounds: &Bounds3f,
    bounds: &Bounds3f,
    max_tris_in_node: usize,
) -> Option<usize> {
    let n_tris = end - start;
    if n_tris <= 2 {
        return Some(split_equal_counts(tri_info, start, end, dim));
    }

    let mut buckets = [BucketInfo::default(); N_BUCKETS];
    for info in tri_info[start..end].iter() {
        let b = bucket_of(info, dim, centroid_bounds);
        buckets[b].count += 1;
        buckets[b].bounds = buckets[b].bounds.union(&info.bounds);
    }

    // Cost of splitting after each bucket.
    let mut cost = [0.0 as Float; N_BUCKETS - 1];
    for (i, cost_i) in cost.iter_mut().enumerate() {
        let (mut b0, mut b1) = (Bounds3f::empty(), Bounds3f::empty());
        let (mut count0, mut count1) = (0, 0);
        for bucket in buckets[..=i].iter() {
            b0 = b0.union(&bucket.bounds);
            count0 += bucket.count;
        }
        for bucket in buckets[i + 1..].iter() {
            b1 = b1.union(&bucket.bounds);
            count1 += bucket.count;
        }

        let area = |b: &Bounds3f, n: usize| if n == 0 { 0.0 } else { n as Float * b.surface_area() };
        *cost_i = 1.0 + (area(&b0, count0) + area(&b1, count1)) / bounds.surface_area().max(Float::MIN_POSITIVE);
    }

    let (min_cost_split_bucket, min_cost) = cost
        .iter()
        .copied()
        .enumerate()
        .fold((0, Float::INFINITY), |best, (i, c)| if c < best.1 { (i, c) } else { best });

    let leaf_cost = n_tris as Float;
    if n_tris > max_tris_in_node || min_cost < leaf_cost {
        let split = itertools::partition(tri_info[start..end].iter_mut(), |ti| {
            bucket_of(ti, dim, centroid_bounds) <= min_cost_split_bucket
        });
        let mid = start + split;
        if mid == start || mid == end {
            Some(split_equal_counts(tri_info, start, end, dim))
        } else {
            Some(mid)
        }
    } else {
        None
    }
}
