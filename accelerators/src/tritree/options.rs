//! Ray intersection options

use bitflags::bitflags;

bitflags! {
    /// Options for ray queries.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct IntersectRayOptions: u32 {
        /// Rays in the batch are spatially coherent. Accepted for
        /// compatibility; the BVH traversal does not use it.
        const COHERENT_RAY_HINT = 0x1;

        /// Report hits on the back of single-sided triangles instead of
        /// culling them.
        const DO_NOT_CULL_BACKFACES = 0x2;

        /// Return any hit instead of the nearest one.
        const OCCLUSION_TEST_ONLY = 0x4;

        /// Skip the material coverage (alpha) test.
        const NO_PARTIAL_COVERAGE_TEST = 0x8;

        /// Only reject hits where coverage is exactly zero. By default hits
        /// with coverage below one half are rejected.
        const PARTIAL_COVERAGE_THRESHOLD_ZERO = 0x10;
    }
}
