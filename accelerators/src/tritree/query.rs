//! Ray, box and sphere queries

use super::{IntersectRayOptions, Snapshot, TriTree, N_RAYS, N_RAY_HITS, N_RAY_TRI_TESTS};
use base::geometry::{box_overlaps_triangle, sphere_overlaps_triangle, Bounds3f, Ray, Sphere};
use base::mesh::{Hit, Tri};
use base::parallel::{parallel_for, parallel_map, DEFAULT_BLOCK_SIZE};
use base::pbrt::Float;
use base::stat_inc;
use base::surfel::ArcSurfel;
use std::sync::Mutex;

impl Snapshot {
    /// Returns false if the material of a triangle is transparent at a hit.
    ///
    /// * `tri`     - The triangle.
    /// * `u`       - Barycentric weight of the second vertex.
    /// * `v`       - Barycentric weight of the third vertex.
    /// * `options` - Query options.
    fn covered(&self, tri: &Tri, u: Float, v: Float, options: IntersectRayOptions) -> bool {
        if options.contains(IntersectRayOptions::NO_PARTIAL_COVERAGE_TEST) {
            return true;
        }
        let Some(material) = tri.material.and_then(|id| self.materials.get(id)) else {
            return true;
        };
        if !material.has_partial_coverage() {
            return true;
        }

        let coverage = material.coverage(&tri.tex_coord(&self.vertices, u, v));
        if options.contains(IntersectRayOptions::PARTIAL_COVERAGE_THRESHOLD_ZERO) {
            coverage > 0.0
        } else {
            coverage >= 0.5
        }
    }

    /// Returns the nearest accepted hit, or any accepted hit for occlusion
    /// tests.
    ///
    /// * `ray`     - The ray.
    /// * `options` - Query options.
    pub(crate) fn intersect_ray(&self, ray: &Ray, options: IntersectRayOptions) -> Hit {
        let mut hit = Hit::miss();
        if !ray.is_valid() {
            return hit;
        }

        let any_hit = options.contains(IntersectRayOptions::OCCLUSION_TEST_ONLY);
        let cull = !options.contains(IntersectRayOptions::DO_NOT_CULL_BACKFACES);
        let mut n_tests = 0;

        self.bvh.traverse_ray(ray, |tri_index, t_max| {
            n_tests += 1;
            let tri = &self.tris[tri_index as usize];
            let segment = ray.with_max_distance(*t_max);
            let Some(th) = tri.intersect(&segment, &self.vertices) else {
                return false;
            };
            if cull && th.backface && !tri.is_two_sided() {
                return false;
            }
            if !self.covered(tri, th.u, th.v, options) {
                return false;
            }

            *t_max = th.t;
            hit = Hit {
                tri_index,
                u: th.u,
                v: th.v,
                backface: th.backface,
                distance: th.t,
            };
            any_hit
        });

        stat_inc!(N_RAYS, 1);
        stat_inc!(N_RAY_TRI_TESTS, n_tests);
        if hit.is_hit() {
            stat_inc!(N_RAY_HITS, 1);
        }
        hit
    }

    /// Returns a surfel for a hit.
    ///
    /// * `hit` - A hit on a triangle of this snapshot.
    pub(crate) fn sample(&self, hit: &Hit) -> Option<ArcSurfel> {
        hit.is_hit()
            .then(|| self.tris[hit.tri_index as usize].sample(hit, &self.vertices, &self.materials))
    }

    /// Returns the non-degenerate triangles overlapping a solid box.
    ///
    /// * `b` - The box.
    pub(crate) fn intersect_box(&self, b: &Bounds3f) -> Vec<Tri> {
        if b.is_empty() {
            return vec![];
        }

        let candidates = self.bvh.overlapping(b);
        let result = Mutex::new(Vec::new());
        parallel_for(candidates.len(), DEFAULT_BLOCK_SIZE, |k| {
            let tri = &self.tris[candidates[k] as usize];
            if !tri.is_degenerate() && box_overlaps_triangle(b, &tri.positions(&self.vertices)) {
                result.lock().expect("box query result poisoned").push(*tri);
            }
        });
        result.into_inner().expect("box query result poisoned")
    }
}

impl TriTree {
    /// Returns the nearest hit along a ray, or `Hit::miss()`.
    ///
    /// * `ray`     - The ray.
    /// * `options` - Query options.
    pub fn intersect_ray(&self, ray: &Ray, options: IntersectRayOptions) -> Hit {
        self.snapshot().intersect_ray(ray, options)
    }

    /// Returns the nearest hit for each ray. Results are in ray order.
    ///
    /// * `rays`    - The rays.
    /// * `options` - Query options.
    pub fn intersect_rays(&self, rays: &[Ray], options: IntersectRayOptions) -> Vec<Hit> {
        let snapshot = self.snapshot();
        parallel_map(rays.len(), DEFAULT_BLOCK_SIZE, |i| snapshot.intersect_ray(&rays[i], options))
    }

    /// Returns true for each ray that hits anything.
    ///
    /// * `rays`    - The rays.
    /// * `options` - Query options; `OCCLUSION_TEST_ONLY` is implied.
    pub fn intersect_rays_bool(&self, rays: &[Ray], options: IntersectRayOptions) -> Vec<bool> {
        let snapshot = self.snapshot();
        let options = options | IntersectRayOptions::OCCLUSION_TEST_ONLY;
        parallel_map(rays.len(), DEFAULT_BLOCK_SIZE, |i| {
            snapshot.intersect_ray(&rays[i], options).is_hit()
        })
    }

    /// Returns a surfel at the nearest hit of each ray, `None` for misses.
    ///
    /// * `rays`    - The rays.
    /// * `options` - Query options.
    pub fn intersect_rays_surfels(&self, rays: &[Ray], options: IntersectRayOptions) -> Vec<Option<ArcSurfel>> {
        let snapshot = self.snapshot();
        parallel_map(rays.len(), DEFAULT_BLOCK_SIZE, |i| {
            snapshot.sample(&snapshot.intersect_ray(&rays[i], options))
        })
    }

    /// Returns a surfel at a hit returned by this tree.
    ///
    /// * `hit` - The hit.
    pub fn sample(&self, hit: &Hit) -> Option<ArcSurfel> {
        self.snapshot().sample(hit)
    }

    /// Returns all triangles with positive area that overlap a solid box,
    /// in no particular order.
    ///
    /// * `b` - The box.
    pub fn intersect_box(&self, b: &Bounds3f) -> Vec<Tri> {
        self.snapshot().intersect_box(b)
    }

    /// Returns all triangles with positive area that overlap a solid
    /// sphere, in no particular order.
    ///
    /// * `sphere` - The sphere.
    pub fn intersect_sphere(&self, sphere: &Sphere) -> Vec<Tri> {
        let snapshot = self.snapshot();
        let mut tris = snapshot.intersect_box(&sphere.bounds());
        tris.retain(|t| sphere_overlaps_triangle(sphere, &t.positions(&snapshot.vertices)));
        tris
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::super::tests::{tree, unit_tri, vertices};
    use super::*;
    use base::geometry::{Point2f, Point3f, Vector3f};
    use base::gpu::ImageStorage;
    use base::material::{ArcMaterial, Material, MaterialTable, SurfelSampleContext};
    use base::mesh::TriFlags;
    use base::spectrum::{Color3, Radiance3};
    use base::surfel::LambertianSurfel;
    use float_cmp::approx_eq;
    use proptest::prelude::*;
    use std::any::Any;
    use std::sync::Arc;

    fn down_ray(x: Float, y: Float) -> Ray {
        Ray::new(Point3f::new(x, y, 1.0), Vector3f::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn single_triangle_hit() {
        let tree = unit_tri();
        let hit = tree.intersect_ray(&down_ray(0.2, 0.2), IntersectRayOptions::empty());
        assert_eq!(hit.tri_index, 0);
        assert!(approx_eq!(f32, hit.distance, 1.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, hit.u, 0.2, epsilon = 1e-6));
        assert!(approx_eq!(f32, hit.v, 0.2, epsilon = 1e-6));
        assert!(!hit.backface);
    }

    #[test]
    fn single_triangle_miss() {
        let tree = unit_tri();
        let ray = Ray::new(Point3f::new(5.0, 5.0, 5.0), Vector3f::new(0.0, 0.0, -1.0));
        let hits = tree.intersect_rays(&[ray], IntersectRayOptions::empty());
        assert_eq!(hits, vec![Hit::miss()]);
        assert_eq!(tree.intersect_rays_bool(&[ray], IntersectRayOptions::empty()), vec![false]);
        assert!(tree.intersect_rays_surfels(&[ray], IntersectRayOptions::empty())[0].is_none());
    }

    #[test]
    fn zero_direction_misses() {
        let tree = unit_tri();
        let ray = Ray::new(Point3f::new(0.2, 0.2, 1.0), Vector3f::zero());
        assert!(!tree.intersect_ray(&ray, IntersectRayOptions::empty()).is_hit());
    }

    #[test]
    fn distance_limits() {
        let tree = unit_tri();
        let near = down_ray(0.2, 0.2).with_max_distance(0.5);
        assert!(!tree.intersect_ray(&near, IntersectRayOptions::empty()).is_hit());
        let far = down_ray(0.2, 0.2).with_min_distance(1.5);
        assert!(!tree.intersect_ray(&far, IntersectRayOptions::empty()).is_hit());
    }

    #[test]
    fn backface_culling() {
        let up = Ray::new(Point3f::new(0.2, 0.2, -1.0), Vector3f::new(0.0, 0.0, 1.0));

        let single = unit_tri();
        assert!(!single.intersect_ray(&up, IntersectRayOptions::empty()).is_hit());
        let hit = single.intersect_ray(&up, IntersectRayOptions::DO_NOT_CULL_BACKFACES);
        assert!(hit.is_hit() && hit.backface);

        let two_sided = tree(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
            TriFlags::TWO_SIDED,
        );
        let hit = two_sided.intersect_ray(&up, IntersectRayOptions::empty());
        assert!(hit.is_hit() && hit.backface);
    }

    #[test]
    fn nearest_of_stacked_triangles() {
        let tree = tree(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.5],
                [1.0, 0.0, 0.5],
                [0.0, 1.0, 0.5],
            ],
            &[[0, 1, 2], [3, 4, 5]],
            TriFlags::empty(),
        );
        let hit = tree.intersect_ray(&down_ray(0.1, 0.1), IntersectRayOptions::empty());
        assert_eq!(hit.tri_index, 1);
        assert!(approx_eq!(f32, hit.distance, 0.5, epsilon = 1e-6));

        let any = tree.intersect_ray(&down_ray(0.1, 0.1), IntersectRayOptions::OCCLUSION_TEST_ONLY);
        assert!(any.is_hit());
    }

    #[test]
    fn surfels_without_material_are_grey() {
        let tree = unit_tri();
        let surfels = tree.intersect_rays_surfels(&[down_ray(0.2, 0.2)], IntersectRayOptions::empty());
        let surfel = surfels[0].as_ref().expect("hit");
        let data = surfel.data();
        assert!(approx_eq!(f32, data.position.x, 0.2, epsilon = 1e-6));
        assert_eq!(data.geometric_normal, Vector3f::new(0.0, 0.0, 1.0));
        assert_eq!(data.source.index, 0);
        let terms = surfel.shading_terms().expect("lambertian terms");
        assert_eq!(terms.lambertian, Color3::gray(0.8));
    }

    struct Cutout(Float);

    impl Material for Cutout {
        fn name(&self) -> &str {
            "cutout"
        }

        fn sample(&self, ctx: &SurfelSampleContext) -> ArcSurfel {
            Arc::new(LambertianSurfel::new(ctx.surfel_data(), Color3::ONE, Radiance3::ZERO))
        }

        fn coverage(&self, _uv: &Point2f) -> Float {
            self.0
        }

        fn has_partial_coverage(&self) -> bool {
            true
        }

        fn set_storage(&self, _storage: ImageStorage) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn cutout_tree(alpha: Float) -> TriTree {
        let va = vertices(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let mut materials = MaterialTable::new();
        let material: ArcMaterial = Arc::new(Cutout(alpha));
        let id = materials.intern(&material);
        let tri = Tri::new([0, 1, 2], &va, Some(id), None, TriFlags::empty());
        let tree = TriTree::default();
        tree.set_contents_from_tris(vec![tri], va, materials, ImageStorage::Current);
        tree
    }

    #[test]
    fn partial_coverage_thresholds() {
        let ray = down_ray(0.2, 0.2);

        let quarter = cutout_tree(0.25);
        assert!(!quarter.intersect_ray(&ray, IntersectRayOptions::empty()).is_hit());
        assert!(quarter
            .intersect_ray(&ray, IntersectRayOptions::PARTIAL_COVERAGE_THRESHOLD_ZERO)
            .is_hit());
        assert!(quarter
            .intersect_ray(&ray, IntersectRayOptions::NO_PARTIAL_COVERAGE_TEST)
            .is_hit());

        let clear = cutout_tree(0.0);
        assert!(!clear
            .intersect_ray(&ray, IntersectRayOptions::PARTIAL_COVERAGE_THRESHOLD_ZERO)
            .is_hit());

        let half = cutout_tree(0.5);
        assert!(half.intersect_ray(&ray, IntersectRayOptions::empty()).is_hit());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let tree = unit_tri();
        let rays: Vec<Ray> = (0..10).map(|i| down_ray(0.1 * i as Float, 0.05)).collect();
        let before = tree.intersect_rays(&rays, IntersectRayOptions::empty());
        tree.rebuild();
        tree.rebuild();
        assert_eq!(tree.intersect_rays(&rays, IntersectRayOptions::empty()), before);
    }

    #[test]
    fn box_and_sphere_skip_degenerate() {
        let tree = tree(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
                [5.0, 5.0, 5.0],
                [6.0, 5.0, 5.0],
                [5.0, 6.0, 5.0],
            ],
            &[[0, 1, 2], [0, 1, 3], [4, 5, 6]],
            TriFlags::empty(),
        );
        let b = Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        let found = tree.intersect_box(&b);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, [0, 1, 2]);

        let s = Sphere::new(Point3f::new(0.0, 0.0, 0.0), 0.5);
        assert_eq!(tree.intersect_sphere(&s).len(), 1);

        // Beyond the hypotenuse, but its bounding box reaches the triangle.
        let s = Sphere::new(Point3f::new(0.9, 0.9, 0.0), 0.5);
        assert!(tree.intersect_sphere(&s).is_empty());
        assert_eq!(tree.intersect_box(&s.bounds()).len(), 1);
    }

    #[test]
    fn enclosing_box_returns_every_non_degenerate_tri() {
        let tree = tree(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [2.0, 0.0, 0.0],
                [5.0, 5.0, 5.0],
                [6.0, 5.0, 5.0],
                [5.0, 6.0, 5.0],
            ],
            &[[4, 5, 6], [0, 1, 3], [0, 1, 2], [0, 0, 2]],
            TriFlags::empty(),
        );
        let b = Bounds3f::new(Point3f::new(-10.0, -10.0, -10.0), Point3f::new(10.0, 10.0, 10.0));
        let mut found: Vec<[u32; 3]> = tree.intersect_box(&b).iter().map(|t| t.index).collect();
        found.sort_unstable();
        assert_eq!(found, vec![[0, 1, 2], [4, 5, 6]]);
    }

    #[test]
    fn sphere_around_triangle() {
        let tree = unit_tri();
        let found = tree.intersect_sphere(&Sphere::new(Point3f::new(0.3, 0.3, 0.0), 2.0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, [0, 1, 2]);

        // Radius smaller than the distance to the triangle's bounds.
        assert!(tree.intersect_sphere(&Sphere::new(Point3f::new(10.0, 10.0, 10.0), 1.0)).is_empty());
    }

    #[test]
    fn cleared_tree_misses() {
        let tree = unit_tri();
        tree.clear();
        assert!(!tree.intersect_ray(&down_ray(0.2, 0.2), IntersectRayOptions::empty()).is_hit());
        let b = Bounds3f::new(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0));
        assert!(tree.intersect_box(&b).is_empty());
    }

    fn soup(coords: &[Float]) -> (Vec<[Float; 3]>, Vec<[u32; 3]>) {
        let points: Vec<[Float; 3]> = coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        let indices = (0..points.len() as u32 / 3).map(|t| [3 * t, 3 * t + 1, 3 * t + 2]).collect();
        (points, indices)
    }

    fn sorted_indices(tris: &[Tri]) -> Vec<[u32; 3]> {
        let mut v: Vec<[u32; 3]> = tris.iter().map(|t| t.index).collect();
        v.sort_unstable();
        v
    }

    proptest! {
        #[test]
        fn nearest_hit_matches_brute_force(
            coords in prop::collection::vec(-10.0..10.0f32, 9..270),
            o in prop::array::uniform3(-12.0..12.0f32),
            d in prop::array::uniform3(-1.0..1.0f32),
        ) {
            let (points, indices) = soup(&coords);
            prop_assume!(!indices.is_empty());
            let direction = Vector3f::new(d[0], d[1], d[2]);
            prop_assume!(direction.length() > 0.1);
            let ray = Ray::new(Point3f::from(o), direction.normalize());

            let tree = tree(&points, &indices, TriFlags::empty());
            let hit = tree.intersect_ray(&ray, IntersectRayOptions::DO_NOT_CULL_BACKFACES);

            let va = tree.vertex_array();
            let mut best: Option<Float> = None;
            for i in 0..tree.size() {
                let segment = ray.with_max_distance(best.unwrap_or(ray.max_distance));
                if let Some(th) = tree.tri(i).intersect(&segment, &va) {
                    best = Some(th.t);
                }
            }

            match best {
                Some(t) => {
                    prop_assert!(hit.is_hit());
                    prop_assert!(approx_eq!(f32, hit.distance, t, epsilon = 1e-4));
                }
                None => prop_assert!(!hit.is_hit()),
            }

            let any = tree.intersect_rays_bool(&[ray], IntersectRayOptions::DO_NOT_CULL_BACKFACES);
            prop_assert_eq!(any[0], hit.is_hit());
        }

        #[test]
        fn box_query_matches_brute_force(
            coords in prop::collection::vec(-10.0..10.0f32, 9..270),
            p0 in prop::array::uniform3(-10.0..10.0f32),
            p1 in prop::array::uniform3(-10.0..10.0f32),
        ) {
            let (points, indices) = soup(&coords);
            prop_assume!(!indices.is_empty());
            let b = Bounds3f::new(Point3f::from(p0), Point3f::from(p1));

            let tree = tree(&points, &indices, TriFlags::empty());
            let va = tree.vertex_array();
            let expected: Vec<Tri> = (0..tree.size())
                .map(|i| tree.tri(i))
                .filter(|t| !t.is_degenerate() && box_overlaps_triangle(&b, &t.positions(&va)))
                .collect();

            prop_assert_eq!(sorted_indices(&tree.intersect_box(&b)), sorted_indices(&expected));
        }

        #[test]
        fn sphere_query_matches_brute_force(
            coords in prop::collection::vec(-10.0..10.0f32, 9..270),
            c in prop::array::uniform3(-10.0..10.0f32),
            r in 0.0..8.0f32,
        ) {
            let (points, indices) = soup(&coords);
            prop_assume!(!indices.is_empty());
            let s = Sphere::new(Point3f::from(c), r);

            let tree = tree(&points, &indices, TriFlags::empty());
            let va = tree.vertex_array();
            let expected: Vec<Tri> = (0..tree.size())
                .map(|i| tree.tri(i))
                .filter(|t| !t.is_degenerate() && sphere_overlaps_triangle(&s, &t.positions(&va)))
                .collect();

            prop_assert_eq!(sorted_indices(&tree.intersect_sphere(&s)), sorted_indices(&expected));
        }

        #[test]
        fn batch_matches_single_queries(
            coords in prop::collection::vec(-5.0..5.0f32, 9..90),
            xs in prop::collection::vec(-5.0..5.0f32, 1..300),
        ) {
            let (points, indices) = soup(&coords);
            prop_assume!(!indices.is_empty());
            let tree = tree(&points, &indices, TriFlags::empty());
            let rays: Vec<Ray> = xs
                .iter()
                .map(|x| Ray::new(Point3f::new(*x, *x * 0.5, 10.0), Vector3f::new(0.0, 0.0, -1.0)))
                .collect();

            let batch = tree.intersect_rays(&rays, IntersectRayOptions::empty());
            for (ray, hit) in rays.iter().zip(batch.iter()) {
                prop_assert_eq!(*hit, tree.intersect_ray(ray, IntersectRayOptions::empty()));
            }
        }
    }
}
