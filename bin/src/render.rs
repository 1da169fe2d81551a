//! Rendering passes
//!
//! A G-buffer pass through the texture wavefront entry point, a shadow mask
//! through the transfer buffer entry point and a progressive path tracer
//! over batched surfel queries.

use crate::camera::PinholeCamera;
use accelerators::{IntersectRayOptions, TriTree};
use base::geometry::{Bounds3f, Dot, Point3f, Ray, Vector3f};
use base::gpu::{GBuffer, GBufferField, ImageFormat, PixelTransferBuffer};
use base::parallel::{parallel_map, DEFAULT_BLOCK_SIZE};
use base::pbrt::Float;
use base::rng::RNG;
use base::spectrum::{Color3, Radiance3};
use base::surfel::{ArcSurfel, ExpressiveParameters, PathDirection};

/// Radiance of rays that leave the scene.
pub const SKY: Radiance3 = Color3::new(0.15, 0.18, 0.25);

/// Offset applied along the geometric normal to secondary ray origins.
const RAY_BUMP: Float = 1e-3;

/// Returns `p` moved off the surface to the side `w` points to.
///
/// * `p` - Surface position.
/// * `n` - Geometric normal.
/// * `w` - Direction leaving the surface.
fn bump(p: &Point3f, n: &Vector3f, w: &Vector3f) -> Point3f {
    if w.dot(n) >= 0.0 {
        *p + *n * RAY_BUMP
    } else {
        *p - *n * RAY_BUMP
    }
}

/// Intersects one ray per pixel and returns the filled G-buffer.
///
/// * `tree`   - The scene.
/// * `camera` - The camera.
pub fn trace_gbuffer(tree: &TriTree, camera: &PinholeCamera) -> GBuffer {
    let (origin, direction) = camera.ray_textures();
    let gbuffer = GBuffer::new(camera.width(), camera.height());
    tree.intersect_texture_rays(
        &origin,
        &direction,
        &gbuffer,
        IntersectRayOptions::COHERENT_RAY_HINT,
        None,
    );
    gbuffer
}

/// Reads a G-buffer field back as RGBA texels.
fn read_field(gbuffer: &GBuffer, field: GBufferField) -> Vec<[f32; 4]> {
    gbuffer.texture(field).to_pixel_transfer_buffer().to_vec::<[f32; 4]>()
}

/// Converts each G-buffer field to displayable colours. Positions are
/// normalized to `bounds` and normals remapped from `[-1, 1]`.
///
/// * `gbuffer` - The G-buffer.
/// * `bounds`  - Scene bounds.
pub fn gbuffer_images(gbuffer: &GBuffer, bounds: &Bounds3f) -> Vec<(GBufferField, Vec<Color3>)> {
    let extent = bounds.p_max - bounds.p_min;
    let scale = |v: Float, lo: Float, size: Float| if size > 0.0 { (v - lo) / size } else { 0.0 };

    GBufferField::ALL
        .iter()
        .map(|&field| {
            let texels = read_field(gbuffer, field);
            let pixels = texels
                .iter()
                .map(|&[r, g, b, a]| match field {
                    GBufferField::WsPosition if a > 0.0 => Color3::new(
                        scale(r, bounds.p_min.x, extent.x),
                        scale(g, bounds.p_min.y, extent.y),
                        scale(b, bounds.p_min.z, extent.z),
                    ),
                    GBufferField::WsPosition => Color3::ZERO,
                    GBufferField::WsNormal if r != 0.0 || g != 0.0 || b != 0.0 => {
                        Color3::new(0.5 * r + 0.5, 0.5 * g + 0.5, 0.5 * b + 0.5)
                    }
                    GBufferField::WsNormal => Color3::ZERO,
                    _ => Color3::new(r, g, b),
                })
                .collect();
            (field, pixels)
        })
        .collect()
}

/// Returns 255 for G-buffer pixels that see `light` and 0 for shadowed
/// pixels and pixels without a surface.
///
/// * `tree`    - The scene.
/// * `gbuffer` - Primary hits.
/// * `light`   - Point light position.
pub fn shadow_mask(tree: &TriTree, gbuffer: &GBuffer, light: &Point3f) -> Vec<u8> {
    let (w, h) = (gbuffer.width(), gbuffer.height());
    let positions = read_field(gbuffer, GBufferField::WsPosition);
    let normals = read_field(gbuffer, GBufferField::WsNormal);

    // Pixels without a surface, or facing away from the light, get a
    // degenerate ray and are masked out below.
    let mut facing = vec![false; w * h];
    let mut origins = vec![[0.0f32; 4]; w * h];
    let mut directions = vec![[0.0f32; 4]; w * h];
    for i in 0..w * h {
        let [px, py, pz, hit] = positions[i];
        if hit <= 0.0 {
            continue;
        }
        let p = Point3f::new(px, py, pz);
        let n = Vector3f::new(normals[i][0], normals[i][1], normals[i][2]);
        let to_light = *light - p;
        if to_light.dot(&n) <= 0.0 {
            continue;
        }
        let origin = bump(&p, &n, &to_light);
        let to_light = *light - origin;
        let distance = to_light.length();
        let d = to_light / distance;
        facing[i] = true;
        origins[i] = [origin.x, origin.y, origin.z, 0.0];
        directions[i] = [d.x, d.y, d.z, distance];
    }

    let origin_ptb = PixelTransferBuffer::from_texels(ImageFormat::RGBA32F, w, h, &origins);
    let direction_ptb = PixelTransferBuffer::from_texels(ImageFormat::RGBA32F, w, h, &directions);
    let occluded_ptb = PixelTransferBuffer::new(ImageFormat::R8, w, h, 1, 1);
    tree.intersect_wavefront_bool(
        &origin_ptb,
        &direction_ptb,
        &occluded_ptb,
        IntersectRayOptions::DO_NOT_CULL_BACKFACES,
    );

    occluded_ptb
        .to_vec::<u8>()
        .into_iter()
        .zip(facing)
        .map(|(occluded, facing)| if facing && occluded == 0 { 255 } else { 0 })
        .collect()
}

/// State of one camera path.
#[derive(Clone, Default)]
struct Path {
    /// Next ray to trace; `None` once the path terminated.
    ray: Option<Ray>,

    /// Product of the scattering weights so far.
    throughput: Color3,

    /// Radiance gathered so far.
    radiance: Radiance3,

    /// Per path random numbers.
    rng: RNG,
}

impl Path {
    /// Accounts for the surface hit by the current ray and scatters.
    ///
    /// * `ray`    - The ray just traced.
    /// * `surfel` - The surface it hit, if any.
    /// * `last`   - Do not scatter.
    fn advance(&self, ray: &Ray, surfel: Option<&ArcSurfel>, last: bool) -> Self {
        let mut next = self.clone();
        next.ray = None;

        let Some(surfel) = surfel else {
            next.radiance += self.throughput * SKY;
            return next;
        };

        let w_o = -ray.direction;
        next.radiance += self.throughput * surfel.emitted_radiance(&w_o);
        if last {
            return next;
        }

        let ep = ExpressiveParameters::default();
        let scatter = surfel.scatter(PathDirection::EyeToSource, &w_o, true, &mut next.rng, &ep);
        if scatter.did_scatter {
            let data = surfel.data();
            next.throughput = self.throughput * scatter.weight;
            next.ray = Some(Ray::new(
                bump(&data.position, &data.geometric_normal, &scatter.w_after),
                scatter.w_after,
            ));
        }
        next
    }
}

/// Returns the mean radiance per pixel over `spp` jittered camera paths of
/// up to `max_depth` surface interactions. Every bounce of every path is
/// traced as one batch.
///
/// * `tree`      - The scene.
/// * `camera`    - The camera.
/// * `spp`       - Paths per pixel.
/// * `max_depth` - Maximum number of surface interactions.
pub fn path_trace(tree: &TriTree, camera: &PinholeCamera, spp: usize, max_depth: usize) -> Vec<Radiance3> {
    let (w, h) = (camera.width(), camera.height());
    let n = w * h;
    let mut sum = vec![Radiance3::ZERO; n];

    for pass in 0..spp {
        let mut paths: Vec<Path> = parallel_map(n, DEFAULT_BLOCK_SIZE, |i| {
            let mut rng = RNG::new((pass * n + i) as u64);
            let x = (i % w) as Float + rng.uniform_float();
            let y = (i / w) as Float + rng.uniform_float();
            Path {
                ray: Some(camera.ray(x, y)),
                throughput: Color3::ONE,
                radiance: Radiance3::ZERO,
                rng,
            }
        });

        for depth in 0..max_depth {
            let active: Vec<usize> = (0..n).filter(|&i| paths[i].ray.is_some()).collect();
            if active.is_empty() {
                break;
            }
            let rays: Vec<Ray> = active.iter().filter_map(|&i| paths[i].ray).collect();

            // Refracted paths travel inside closed meshes.
            let surfels = tree.intersect_rays_surfels(&rays, IntersectRayOptions::DO_NOT_CULL_BACKFACES);
            let last = depth + 1 == max_depth;
            let advanced: Vec<Path> = parallel_map(active.len(), DEFAULT_BLOCK_SIZE, |k| {
                paths[active[k]].advance(&rays[k], surfels[k].as_ref(), last)
            });
            for (k, path) in advanced.into_iter().enumerate() {
                paths[active[k]] = path;
            }
        }

        for (s, path) in sum.iter_mut().zip(&paths) {
            *s += path.radiance;
        }
        debug!("path tracing pass {} of {spp} done", pass + 1);
    }

    let inv = 1.0 / spp.max(1) as Float;
    sum.into_iter().map(|s| s * inv).collect()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use base::geometry::Transform;
    use base::gpu::ImageStorage;
    use base::material::ArcMaterial;
    use base::surface::ArcSurface;
    use float_cmp::approx_eq;
    use materials::{LambertianMaterial, UniversalMaterial};
    use shapes::{box_mesh, quad, MeshSurface};
    use std::sync::Arc;

    /// A floor quad with a box floating above its centre.
    fn tree(with_box: bool) -> TriTree {
        let floor: ArcMaterial = Arc::new(LambertianMaterial::constant("floor", Color3::gray(0.5)));
        let mut surfaces: Vec<ArcSurface> = vec![Arc::new(MeshSurface::new(
            "floor",
            Arc::new(quad(4.0, 4.0)),
            Transform::IDENTITY,
            Some(floor),
        ))];
        if with_box {
            surfaces.push(Arc::new(MeshSurface::new(
                "box",
                Arc::new(box_mesh(&Vector3f::new(1.0, 1.0, 1.0))),
                Transform::translate(&Vector3f::new(0.0, 1.5, 0.0)),
                None,
            )));
        }
        let tree = TriTree::default();
        tree.set_contents_from_surfaces(&surfaces, ImageStorage::CopyToCpu);
        tree
    }

    /// Looks straight down; the centre pixel stays clear of the quad
    /// diagonals.
    fn top_down(size: usize) -> PinholeCamera {
        PinholeCamera::look_at(
            Point3f::new(0.3, 10.0, 0.2),
            Point3f::new(0.3, 0.0, 0.2),
            Vector3f::new(0.0, 0.0, -1.0),
            20.0,
            size,
            size,
        )
    }

    #[test]
    fn gbuffer_sees_the_floor() {
        let tree = tree(false);
        let camera = top_down(3);
        let gbuffer = trace_gbuffer(&tree, &camera);
        let images = gbuffer_images(&gbuffer, &tree.bounds());
        assert_eq!(images.len(), 5);

        let (field, normals) = &images[1];
        assert_eq!(*field, GBufferField::WsNormal);
        let centre = normals[4];
        assert!(approx_eq!(f32, centre.g, 1.0, epsilon = 1e-5));
        assert!(approx_eq!(f32, centre.r, 0.5, epsilon = 1e-5));

        let (_, lambertian) = &images[2];
        assert!(approx_eq!(f32, lambertian[4].r, 0.5, epsilon = 1e-5));
    }

    #[test]
    fn box_casts_a_shadow() {
        let camera = top_down(5);
        let light = Point3f::new(0.0, 5.0, 0.0);

        let open = tree(false);
        let mask = shadow_mask(&open, &trace_gbuffer(&open, &camera), &light);
        assert_eq!(mask[12], 255);

        let covered = tree(true);
        let mask = shadow_mask(&covered, &trace_gbuffer(&covered, &camera), &light);
        // The camera now sees the top of the box, which is lit.
        assert_eq!(mask[12], 255);

        // Looking at the floor from below the box, the light is blocked.
        let low = PinholeCamera::look_at(
            Point3f::new(0.3, 0.5, 3.0),
            Point3f::new(0.3, 0.0, 0.2),
            Vector3f::new(0.0, 1.0, 0.0),
            1.0,
            1,
            1,
        );
        let mask = shadow_mask(&covered, &trace_gbuffer(&covered, &low), &light);
        assert_eq!(mask, vec![0]);
    }

    #[test]
    fn sky_only_paths_return_the_sky() {
        let tree = tree(false);
        let up = PinholeCamera::look_at(
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, 2.0, 0.0),
            Vector3f::new(0.0, 0.0, -1.0),
            10.0,
            2,
            2,
        );
        for radiance in path_trace(&tree, &up, 2, 3) {
            assert_eq!(radiance, SKY);
        }
    }

    #[test]
    fn emitter_seen_directly() {
        let lamp: ArcMaterial = Arc::new(
            UniversalMaterial::constant("lamp", Color3::ZERO, Color3::ZERO, 0.0).with_emission(Arc::new(
                base::gpu::Texture::constant("lamp", base::spectrum::Color4::new(3.0, 2.0, 1.0, 1.0)),
            )),
        );
        let tree = TriTree::default();
        let surfaces: Vec<ArcSurface> = vec![Arc::new(MeshSurface::new(
            "lamp",
            Arc::new(quad(100.0, 100.0)),
            Transform::IDENTITY,
            Some(lamp),
        ))];
        tree.set_contents_from_surfaces(&surfaces, ImageStorage::CopyToCpu);

        // A black emitter absorbs everything, so only emission is seen.
        for radiance in path_trace(&tree, &top_down(2), 1, 4) {
            assert_eq!(radiance, Color3::new(3.0, 2.0, 1.0));
        }
    }
}
