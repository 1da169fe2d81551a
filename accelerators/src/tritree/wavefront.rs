//! Wavefront queries
//!
//! Batches of rays stored in pixel transfer buffers or textures, the way a
//! GPU renderer keeps them. Origins and directions are two RGBA32F images of
//! the same shape; the alpha channels carry the minimum and maximum
//! distance.

use super::{IntersectRayOptions, TriTree};
use base::geometry::{Point3f, Ray, Vector3f};
use base::gpu::{GBuffer, ImageFormat, MappedWrite, PixelTransferBuffer, Texture};
use base::parallel::{parallel_map, DEFAULT_BLOCK_SIZE};
use base::pbrt::INFINITY;
use base::surfel::ShadingTerms;
use bytemuck::{Pod, Zeroable};

/// A ray as stored on the device: `origin.w` is the minimum distance and
/// `direction.w` the maximum distance. A non-positive maximum distance means
/// the ray is unbounded.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuRay {
    /// Origin and minimum distance.
    pub origin: [f32; 4],

    /// Direction and maximum distance.
    pub direction: [f32; 4],
}

impl GpuRay {
    /// Packs a ray.
    ///
    /// * `ray` - The ray.
    pub fn new(ray: &Ray) -> Self {
        let max = if ray.max_distance.is_finite() { ray.max_distance } else { 0.0 };
        Self {
            origin: [ray.origin.x, ray.origin.y, ray.origin.z, ray.min_distance],
            direction: [ray.direction.x, ray.direction.y, ray.direction.z, max],
        }
    }

    /// Unpacks the ray.
    pub fn to_ray(&self) -> Ray {
        let [ox, oy, oz, min] = self.origin;
        let [dx, dy, dz, max] = self.direction;
        Ray::new(Point3f::new(ox, oy, oz), Vector3f::new(dx, dy, dz))
            .with_min_distance(min)
            .with_max_distance(if max > 0.0 { max } else { INFINITY })
    }
}

/// Reads the rays from origin and direction buffers.
///
/// * `origin`     - RGBA32F origins and minimum distances.
/// * `direction`  - RGBA32F directions and maximum distances.
/// * `dimensions` - Number of rays as `(width, height)`; the whole buffer if
///                  `None`.
pub fn copy_to_cpu(
    origin: &PixelTransferBuffer,
    direction: &PixelTransferBuffer,
    dimensions: Option<(usize, usize)>,
) -> Vec<GpuRay> {
    assert_eq!(origin.format(), ImageFormat::RGBA32F, "ray origins must be RGBA32F");
    assert_eq!(direction.format(), ImageFormat::RGBA32F, "ray directions must be RGBA32F");
    assert!(
        origin.same_shape(direction),
        "ray origin and direction buffers differ in shape"
    );

    let n = match dimensions {
        Some((w, h)) => {
            assert!(
                w * h <= origin.pixel_count(),
                "wavefront {w}x{h} exceeds the ray buffers"
            );
            w * h
        }
        None => origin.pixel_count(),
    };

    let origins = origin.to_vec::<[f32; 4]>();
    let directions = direction.to_vec::<[f32; 4]>();
    origins
        .into_iter()
        .zip(directions)
        .take(n)
        .map(|(origin, direction)| GpuRay { origin, direction })
        .collect()
}

/// Reads a single channel ray coherence buffer.
///
/// * `coherence` - One value per ray.
pub fn copy_coherence_to_cpu(coherence: &PixelTransferBuffer) -> Vec<f32> {
    let format = coherence.format();
    assert_eq!(format.num_components(), 1, "ray coherence must have one channel");

    let bpp = format.bytes_per_pixel();
    let mapped = coherence.map_read();
    (0..coherence.height() * coherence.depth())
        .flat_map(|r| {
            mapped
                .row_at(r)
                .chunks_exact(bpp)
                .map(|b| format.decode(b).r)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// The five RGBA32F result texels for a hit.
type WavefrontTexels = [[f32; 4]; 5];

fn wavefront_texels(position: &Point3f, normal: &Vector3f, terms: &ShadingTerms) -> WavefrontTexels {
    let [lr, lg, lb] = terms.lambertian.to_array();
    let [gr, gg, gb] = terms.glossy.to_array();
    let [er, eg, eb] = terms.emission.to_array();
    [
        [position.x, position.y, position.z, 1.0],
        [normal.x, normal.y, normal.z, 0.0],
        [lr, lg, lb, 1.0],
        [gr, gg, gb, terms.smoothness],
        [er, eg, eb, 1.0],
    ]
}

/// Writes one texel into ray order position `i` of a buffer.
fn write_texel(mapped: &mut MappedWrite<'_>, width: usize, i: usize, bytes: &[u8]) {
    let (row, col) = (i / width, i % width);
    let n = bytes.len();
    mapped.row_at_mut(row)[col * n..(col + 1) * n].copy_from_slice(bytes);
}

impl TriTree {
    /// Intersects a wavefront of rays stored in transfer buffers and writes
    /// world space position, shading normal, lambertian, glossy with
    /// smoothness in alpha, and emission for each hit. Texels of rays that
    /// miss are left unchanged.
    ///
    /// * `origin`     - RGBA32F origins and minimum distances.
    /// * `direction`  - RGBA32F directions and maximum distances.
    /// * `results`    - RGBA32F outputs in `GBufferField::ALL` order, each
    ///                  the shape of `origin`.
    /// * `options`    - Query options.
    /// * `coherence`  - Optional single channel ray coherence.
    /// * `dimensions` - Number of rays as `(width, height)`; the whole buffer
    ///                  if `None`.
    pub fn intersect_wavefront(
        &self,
        origin: &PixelTransferBuffer,
        direction: &PixelTransferBuffer,
        results: &[PixelTransferBuffer; 5],
        options: IntersectRayOptions,
        coherence: Option<&PixelTransferBuffer>,
        dimensions: Option<(usize, usize)>,
    ) {
        for r in results {
            assert_eq!(r.format(), ImageFormat::RGBA32F, "wavefront results must be RGBA32F");
            assert!(r.same_shape(origin), "wavefront result buffers differ in shape from the rays");
        }

        let rays = copy_to_cpu(origin, direction, dimensions);
        if let Some(c) = coherence {
            // Reserved for texture level selection; only validated.
            let _coherence = copy_coherence_to_cpu(c);
        }

        let snapshot = self.snapshot();
        let texels: Vec<Option<WavefrontTexels>> = parallel_map(rays.len(), DEFAULT_BLOCK_SIZE, |i| {
            let hit = snapshot.intersect_ray(&rays[i].to_ray(), options);
            snapshot.sample(&hit).map(|surfel| {
                let data = surfel.data();
                let terms = surfel.shading_terms().unwrap_or_default();
                wavefront_texels(&data.position, &data.shading_normal, &terms)
            })
        });

        let width = origin.width();
        for (k, ptb) in results.iter().enumerate() {
            let mut mapped = ptb.map_write();
            for (i, t) in texels.iter().enumerate() {
                if let Some(t) = t {
                    write_texel(&mut mapped, width, i, bytemuck::bytes_of(&t[k]));
                }
            }
        }
    }

    /// Intersects a wavefront of rays stored in transfer buffers and writes
    /// 255 for rays that hit anything and 0 otherwise.
    ///
    /// * `origin`    - RGBA32F origins and minimum distances.
    /// * `direction` - RGBA32F directions and maximum distances.
    /// * `hits`      - R8 output the shape of `origin`.
    /// * `options`   - Query options; `OCCLUSION_TEST_ONLY` is implied.
    pub fn intersect_wavefront_bool(
        &self,
        origin: &PixelTransferBuffer,
        direction: &PixelTransferBuffer,
        hits: &PixelTransferBuffer,
        options: IntersectRayOptions,
    ) {
        assert_eq!(hits.format(), ImageFormat::R8, "wavefront hit mask must be R8");
        assert!(hits.same_shape(origin), "wavefront hit mask differs in shape from the rays");

        let rays: Vec<Ray> = copy_to_cpu(origin, direction, None).iter().map(GpuRay::to_ray).collect();
        let result = self.intersect_rays_bool(&rays, options);

        let width = origin.width();
        let mut mapped = hits.map_write();
        for (i, hit) in result.into_iter().enumerate() {
            write_texel(&mut mapped, width, i, &[if hit { 255 } else { 0 }]);
        }
    }

    /// Intersects rays stored in textures and fills a G-buffer. Texels of
    /// rays that miss are zero.
    ///
    /// * `origin`    - RGBA32F origins and minimum distances.
    /// * `direction` - RGBA32F directions and maximum distances.
    /// * `results`   - Destination, the size of `origin`.
    /// * `options`   - Query options.
    /// * `coherence` - Optional single channel ray coherence.
    pub fn intersect_texture_rays(
        &self,
        origin: &Texture,
        direction: &Texture,
        results: &GBuffer,
        options: IntersectRayOptions,
        coherence: Option<&Texture>,
    ) {
        let (w, h) = (origin.width(), origin.height());
        assert!(
            results.width() == w && results.height() == h,
            "G-buffer is {}x{} but the rays are {w}x{h}",
            results.width(),
            results.height()
        );

        let origin_ptb = origin.to_pixel_transfer_buffer();
        let direction_ptb = direction.to_pixel_transfer_buffer();
        let coherence_ptb = coherence.map(Texture::to_pixel_transfer_buffer);
        let result_ptbs: [PixelTransferBuffer; 5] =
            std::array::from_fn(|_| PixelTransferBuffer::new(ImageFormat::RGBA32F, w, h, 1, 1));

        self.intersect_wavefront(
            &origin_ptb,
            &direction_ptb,
            &result_ptbs,
            options,
            coherence_ptb.as_ref(),
            None,
        );

        for (texture, ptb) in results.textures().iter().zip(result_ptbs.iter()) {
            texture.update(ptb);
        }
    }

    /// Intersects rays stored in textures and fills an R8 hit mask.
    ///
    /// * `origin`    - RGBA32F origins and minimum distances.
    /// * `direction` - RGBA32F directions and maximum distances.
    /// * `hits`      - Destination, the size of `origin`.
    /// * `options`   - Query options.
    pub fn intersect_texture_rays_bool(
        &self,
        origin: &Texture,
        direction: &Texture,
        hits: &Texture,
        options: IntersectRayOptions,
    ) {
        let origin_ptb = origin.to_pixel_transfer_buffer();
        let direction_ptb = direction.to_pixel_transfer_buffer();
        let hit_ptb = PixelTransferBuffer::new(ImageFormat::R8, origin.width(), origin.height(), 1, 1);
        self.intersect_wavefront_bool(&origin_ptb, &direction_ptb, &hit_ptb, options);
        hits.update(&hit_ptb);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::super::tests::unit_tri;
    use super::*;
    use base::gpu::GBufferField;
    use base::spectrum::Color4;
    use float_cmp::approx_eq;

    /// A 2x2 wavefront of downward rays; only the first pixel hits the unit
    /// triangle.
    fn rays() -> (PixelTransferBuffer, PixelTransferBuffer) {
        let xy = [[0.2, 0.2], [5.0, 5.0], [0.9, 0.9], [-1.0, 0.5]];
        let origins: Vec<[f32; 4]> = xy.iter().map(|p| [p[0], p[1], 1.0, 0.0]).collect();
        let directions: Vec<[f32; 4]> = vec![[0.0, 0.0, -1.0, 0.0]; 4];
        (
            PixelTransferBuffer::from_texels(ImageFormat::RGBA32F, 2, 2, &origins),
            PixelTransferBuffer::from_texels(ImageFormat::RGBA32F, 2, 2, &directions),
        )
    }

    fn results(w: usize, h: usize) -> [PixelTransferBuffer; 5] {
        std::array::from_fn(|_| PixelTransferBuffer::new(ImageFormat::RGBA32F, w, h, 1, 1))
    }

    #[test]
    fn gpu_ray_distances() {
        let ray = Ray::new(Point3f::new(1.0, 2.0, 3.0), Vector3f::new(0.0, 1.0, 0.0)).with_min_distance(0.5);
        let g = GpuRay::new(&ray);
        assert_eq!(g.origin, [1.0, 2.0, 3.0, 0.5]);
        assert_eq!(g.direction[3], 0.0);
        assert_eq!(g.to_ray(), ray);

        let bounded = ray.with_max_distance(4.0);
        assert_eq!(GpuRay::new(&bounded).to_ray().max_distance, 4.0);
    }

    #[test]
    fn wavefront_writes_hits_only() {
        let tree = unit_tri();
        let (o, d) = rays();
        let out = results(2, 2);
        tree.intersect_wavefront(&o, &d, &out, IntersectRayOptions::empty(), None, None);

        let position = out[0].to_vec::<[f32; 4]>();
        assert!(approx_eq!(f32, position[0][0], 0.2, epsilon = 1e-6));
        assert!(approx_eq!(f32, position[0][1], 0.2, epsilon = 1e-6));
        assert!(approx_eq!(f32, position[0][2], 0.0, epsilon = 1e-6));
        assert_eq!(position[0][3], 1.0);
        assert_eq!(&position[1..], &[[0.0; 4]; 3]);

        let normal = out[1].to_vec::<[f32; 4]>();
        assert_eq!(normal[0], [0.0, 0.0, 1.0, 0.0]);

        let lambertian = out[2].to_vec::<[f32; 4]>();
        assert!(approx_eq!(f32, lambertian[0][0], 0.8, epsilon = 1e-6));
        assert_eq!(lambertian[1], [0.0; 4]);
    }

    #[test]
    fn wavefront_misses_are_untouched() {
        let tree = unit_tri();
        let (o, d) = rays();
        let out = results(2, 2);
        for ptb in &out {
            ptb.map_write().texels_mut::<[f32; 4]>().fill([7.0; 4]);
        }
        tree.intersect_wavefront(&o, &d, &out, IntersectRayOptions::empty(), None, None);
        assert_eq!(out[4].to_vec::<[f32; 4]>()[1], [7.0; 4]);
        assert_eq!(out[4].to_vec::<[f32; 4]>()[0], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn wavefront_dimensions_limit_rays() {
        let tree = unit_tri();
        let (o, d) = rays();
        assert_eq!(copy_to_cpu(&o, &d, Some((1, 1))).len(), 1);
        assert_eq!(copy_to_cpu(&o, &d, None).len(), 4);

        let out = results(2, 2);
        let coherence = PixelTransferBuffer::from_texels(ImageFormat::R32F, 2, 2, &[0.5f32; 4]);
        tree.intersect_wavefront(&o, &d, &out, IntersectRayOptions::empty(), Some(&coherence), Some((1, 1)));
        assert_eq!(out[0].to_vec::<[f32; 4]>()[0][3], 1.0);
    }

    #[test]
    fn wavefront_bool_mask() {
        let tree = unit_tri();
        let (o, d) = rays();
        let mask = PixelTransferBuffer::new(ImageFormat::R8, 2, 2, 1, 4);
        tree.intersect_wavefront_bool(&o, &d, &mask, IntersectRayOptions::empty());
        assert_eq!(mask.to_vec::<u8>(), vec![255, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "differ in shape")]
    fn mismatched_shapes_panic() {
        let tree = unit_tri();
        let (o, _) = rays();
        let d = PixelTransferBuffer::new(ImageFormat::RGBA32F, 4, 1, 1, 1);
        tree.intersect_wavefront(&o, &d, &results(2, 2), IntersectRayOptions::empty(), None, None);
    }

    #[test]
    #[should_panic(expected = "must be RGBA32F")]
    fn wrong_format_panics() {
        let tree = unit_tri();
        let (o, d) = rays();
        let mut out = results(2, 2);
        out[3] = PixelTransferBuffer::new(ImageFormat::R32F, 2, 2, 1, 1);
        tree.intersect_wavefront(&o, &d, &out, IntersectRayOptions::empty(), None, None);
    }

    #[test]
    #[should_panic(expected = "one channel")]
    fn coherence_must_be_single_channel() {
        let tree = unit_tri();
        let (o, d) = rays();
        let coherence = PixelTransferBuffer::new(ImageFormat::RGBA32F, 2, 2, 1, 1);
        tree.intersect_wavefront(&o, &d, &results(2, 2), IntersectRayOptions::empty(), Some(&coherence), None);
    }

    fn ray_textures() -> (Texture, Texture) {
        let (o, d) = rays();
        let to_colors = |ptb: &PixelTransferBuffer| ptb.to_vec::<[f32; 4]>().into_iter().map(Color4::from).collect();
        (
            Texture::new("origin", ImageFormat::RGBA32F, 2, 2, to_colors(&o)),
            Texture::new("direction", ImageFormat::RGBA32F, 2, 2, to_colors(&d)),
        )
    }

    #[test]
    fn texture_rays_fill_gbuffer() {
        let tree = unit_tri();
        let (o, d) = ray_textures();
        let gbuffer = GBuffer::new(2, 2);
        tree.intersect_texture_rays(&o, &d, &gbuffer, IntersectRayOptions::empty(), None);

        let normal = gbuffer.texture(GBufferField::WsNormal);
        let texels = normal.to_pixel_transfer_buffer().to_vec::<[f32; 4]>();
        assert_eq!(texels[0], [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(texels[1], [0.0; 4]);
    }

    #[test]
    fn texture_rays_bool() {
        let tree = unit_tri();
        let (o, d) = ray_textures();
        let mask = Texture::new_device("mask", ImageFormat::R8, 2, 2);
        tree.intersect_texture_rays_bool(&o, &d, &mask, IntersectRayOptions::empty());
        assert_eq!(mask.to_pixel_transfer_buffer().to_vec::<u8>(), vec![255, 0, 0, 0]);
    }
}
