//! Lambertian Material

use base::geometry::Point2f;
use base::gpu::{ArcTexture, ImageStorage, Texture};
use base::material::{Material, SurfelSampleContext};
use base::pbrt::Float;
use base::spectrum::{Color3, Color4, Radiance3};
use base::surfel::{ArcSurfel, LambertianSurfel, SurfelFlags};
use std::any::Any;
use std::sync::Arc;

/// An ideal diffuse material. The alpha channel of the reflectivity texture
/// is the coverage.
pub struct LambertianMaterial {
    name: String,
    reflectivity: ArcTexture,
    emission: Radiance3,
    partial_coverage: bool,
}

impl LambertianMaterial {
    /// Create a new textured material.
    ///
    /// * `name`         - Name used in log messages.
    /// * `reflectivity` - Reflectivity and coverage.
    /// * `emission`     - Emitted radiance.
    pub fn new(name: &str, reflectivity: ArcTexture, emission: Radiance3) -> Self {
        let partial_coverage = reflectivity.mean().a < 1.0;
        Self {
            name: name.to_string(),
            reflectivity,
            emission,
            partial_coverage,
        }
    }

    /// Create a new material with a constant reflectivity.
    ///
    /// * `name`         - Name used in log messages.
    /// * `reflectivity` - Reflectivity.
    pub fn constant(name: &str, reflectivity: Color3) -> Self {
        let texture = Texture::constant(name, Color4::from_rgb(reflectivity, 1.0));
        Self::new(name, Arc::new(texture), Radiance3::ZERO)
    }
}

impl Material for LambertianMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&self, ctx: &SurfelSampleContext) -> ArcSurfel {
        let mut data = ctx.surfel_data();
        if !self.emission.is_black() {
            data.flags |= SurfelFlags::IS_LIGHT;
        }
        let reflectivity = self.reflectivity.sample(&ctx.tex_coord).rgb();
        Arc::new(LambertianSurfel::new(data, reflectivity, self.emission))
    }

    fn coverage(&self, uv: &Point2f) -> Float {
        self.reflectivity.sample(uv).a
    }

    fn has_partial_coverage(&self) -> bool {
        self.partial_coverage
    }

    fn set_storage(&self, storage: ImageStorage) {
        self.reflectivity.set_storage(storage);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use base::geometry::{point2, Vector3f};
    use base::rng::RNG;
    use base::surfel::{ExpressiveParameters, PathDirection};

    fn ctx(backface: bool, two_sided: bool) -> SurfelSampleContext {
        SurfelSampleContext {
            geometric_normal: Vector3f::new(0.0, 0.0, 1.0),
            interpolated_normal: Vector3f::new(0.0, 0.0, 2.0),
            interpolated_tangent: Vector3f::new(1.0, 0.0, 0.0),
            tangent_handedness: 1.0,
            tex_coord: point2(0.5, 0.5),
            backface,
            two_sided,
            ..Default::default()
        }
    }

    #[test]
    fn samples_a_lambertian_surfel() {
        let m = LambertianMaterial::constant("white", Color3::gray(0.8));
        assert_eq!(m.name(), "white");
        assert!(!m.has_partial_coverage());

        let s = m.sample(&ctx(false, false));
        assert!(!s.transmissive());
        assert!(!s.data().is_light());
        assert!(!s.data().is_refractive_interface());
        assert_eq!(s.data().shading_normal, Vector3f::new(0.0, 0.0, 1.0));

        let ep = ExpressiveParameters::default();
        let mut rng = RNG::new(4);
        let w = Vector3f::new(0.0, 0.0, 1.0);
        let p = s.probability_of_scattering(PathDirection::EyeToSource, &w, &mut rng, &ep);
        assert!((p.g - 0.8).abs() < 1e-4);
    }

    #[test]
    fn two_sided_backface_flips_normal() {
        let m = LambertianMaterial::constant("white", Color3::ONE);
        let s = m.sample(&ctx(true, true));
        assert_eq!(s.data().shading_normal, Vector3f::new(0.0, 0.0, -1.0));
        assert_eq!(s.data().geometric_normal, Vector3f::new(0.0, 0.0, -1.0));

        let s = m.sample(&ctx(true, false));
        assert_eq!(s.data().shading_normal, Vector3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn emission_flags_lights() {
        let texture = Arc::new(Texture::constant("white", Color4::ONE));
        let m = LambertianMaterial::new("lamp", texture, Color3::gray(5.0));
        let s = m.sample(&ctx(false, false));
        assert!(s.data().is_light());
        assert_eq!(s.emitted_radiance(&Vector3f::new(0.0, 0.0, 1.0)), Color3::gray(5.0));
    }

    #[test]
    fn translucent_texture_has_partial_coverage() {
        let texture = Arc::new(Texture::constant("veil", Color4::new(1.0, 1.0, 1.0, 0.3)));
        let m = LambertianMaterial::new("veil", texture, Radiance3::ZERO);
        assert!(m.has_partial_coverage());
        assert!((m.coverage(&point2(0.1, 0.7)) - 0.3).abs() < 1e-6);
    }
}
