//! Universal Material

use super::UniversalSurfel;
use base::geometry::Point2f;
use base::gpu::{ArcTexture, ImageStorage, Texture};
use base::material::{Material, SurfelSampleContext};
use base::pbrt::Float;
use base::spectrum::{Color3, Color4};
use base::surfel::{ArcSurfel, SurfelFlags};
use std::any::Any;
use std::sync::Arc;

/// Textured parameters for `UniversalSurfel`.
///
/// The alpha channel of the lambertian texture is the coverage and the alpha
/// channel of the glossy texture is the smoothness.
pub struct UniversalMaterial {
    name: String,
    lambertian: ArcTexture,
    glossy: ArcTexture,
    emission: ArcTexture,
    transmission: Color3,
    eta_pos: Float,
    eta_neg: Float,
    partial_coverage: bool,
}

impl UniversalMaterial {
    /// Create a new opaque, non-emissive material.
    ///
    /// * `name`       - Name used in log messages.
    /// * `lambertian` - Lambertian reflectivity and coverage.
    /// * `glossy`     - Glossy reflectance at normal incidence and smoothness.
    pub fn new(name: &str, lambertian: ArcTexture, glossy: ArcTexture) -> Self {
        let partial_coverage = lambertian.mean().a < 1.0;
        if partial_coverage {
            debug!("material '{name}' has partial coverage");
        }
        Self {
            name: name.to_string(),
            lambertian,
            glossy,
            emission: Arc::new(Texture::constant("black", Color4::ZERO)),
            transmission: Color3::ZERO,
            eta_pos: 1.0,
            eta_neg: 1.0,
            partial_coverage,
        }
    }

    /// Create a new material from constant parameters.
    ///
    /// * `name`       - Name used in log messages.
    /// * `lambertian` - Lambertian reflectivity.
    /// * `glossy`     - Glossy reflectance at normal incidence.
    /// * `smoothness` - Smoothness in `[0, 1]`.
    pub fn constant(name: &str, lambertian: Color3, glossy: Color3, smoothness: Float) -> Self {
        Self::new(
            name,
            Arc::new(Texture::constant(&format!("{name}/lambertian"), Color4::from_rgb(lambertian, 1.0))),
            Arc::new(Texture::constant(&format!("{name}/glossy"), Color4::from_rgb(glossy, smoothness))),
        )
    }

    /// Sets the emitted radiance.
    ///
    /// * `emission` - Emitted radiance in the RGB channels.
    pub fn with_emission(mut self, emission: ArcTexture) -> Self {
        self.emission = emission;
        self
    }

    /// Makes the material a refractive interface.
    ///
    /// * `transmission` - Transmission coefficient.
    /// * `eta_pos`      - Index of refraction on the front side.
    /// * `eta_neg`      - Index of refraction on the back side.
    pub fn with_transmission(mut self, transmission: Color3, eta_pos: Float, eta_neg: Float) -> Self {
        assert!(eta_pos > 0.0 && eta_neg > 0.0, "indices of refraction must be positive");
        self.transmission = transmission;
        self.eta_pos = eta_pos;
        self.eta_neg = eta_neg;
        self
    }
}

impl Material for UniversalMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample(&self, ctx: &SurfelSampleContext) -> ArcSurfel {
        let uv = ctx.tex_coord;
        let glossy = self.glossy.sample(&uv);
        let emission = self.emission.sample(&uv).rgb();

        let mut data = ctx.surfel_data();
        if !emission.is_black() {
            data.flags |= SurfelFlags::IS_LIGHT;
        }

        let mut surfel = UniversalSurfel::new(data, self.lambertian.sample(&uv).rgb(), glossy.rgb(), glossy.a, emission);
        if !self.transmission.is_black() {
            surfel = surfel.with_transmission(self.transmission, self.eta_pos, self.eta_neg);
        }
        Arc::new(surfel)
    }

    fn coverage(&self, uv: &Point2f) -> Float {
        self.lambertian.sample(uv).a
    }

    fn has_partial_coverage(&self) -> bool {
        self.partial_coverage
    }

    fn set_storage(&self, storage: ImageStorage) {
        for texture in [&self.lambertian, &self.glossy, &self.emission] {
            texture.set_storage(storage);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
