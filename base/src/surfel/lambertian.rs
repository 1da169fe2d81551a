//! Lambertian Surfel

use super::{
    is_refraction, ExpressiveParameters, ImpulseArray, PathDirection, ShadingTerms, Surfel, SurfelData,
};
use crate::geometry::Vector3f;
use crate::pbrt::INV_PI;
use crate::spectrum::{Color3, Radiance3};

/// An opaque ideal diffuse reflector. Relies on the default sampling of the
/// scattering protocol.
#[derive(Clone, Debug)]
pub struct LambertianSurfel {
    /// Local geometry.
    pub data: SurfelData,

    /// Reflectivity in `[0, 1]` per channel.
    pub reflectivity: Color3,

    /// Emitted radiance.
    pub emission: Radiance3,
}

impl LambertianSurfel {
    /// Create a new Lambertian surfel.
    ///
    /// * `data`         - Local geometry.
    /// * `reflectivity` - Reflectivity.
    /// * `emission`     - Emitted radiance.
    pub fn new(data: SurfelData, reflectivity: Color3, emission: Radiance3) -> Self {
        Self {
            data,
            reflectivity,
            emission,
        }
    }
}

impl Surfel for LambertianSurfel {
    fn data(&self) -> &SurfelData {
        &self.data
    }

    fn finite_scattering_density(&self, w_i: &Vector3f, w_o: &Vector3f, ep: &ExpressiveParameters) -> Color3 {
        if is_refraction(&self.data.shading_normal, w_i, w_o) {
            Color3::ZERO
        } else {
            self.reflectivity * (ep.boost(&self.reflectivity) * INV_PI)
        }
    }

    fn get_impulses(&self, _path_direction: PathDirection, _w: &Vector3f, _ep: &ExpressiveParameters) -> ImpulseArray {
        ImpulseArray::new()
    }

    fn emitted_radiance(&self, _w_o: &Vector3f) -> Radiance3 {
        self.emission
    }

    fn transmissive(&self) -> bool {
        false
    }

    fn non_zero_finite_scattering(&self) -> bool {
        !self.reflectivity.is_black()
    }

    fn shading_terms(&self) -> Option<ShadingTerms> {
        Some(ShadingTerms {
            lambertian: self.reflectivity,
            glossy: Color3::ZERO,
            smoothness: 0.0,
            emission: self.emission,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dot;
    use crate::pbrt::Float;
    use crate::rng::RNG;
    use float_cmp::approx_eq;

    fn surfel(reflectivity: Color3) -> LambertianSurfel {
        let n = Vector3f::new(0.0, 1.0, 0.0);
        let data = SurfelData {
            geometric_normal: n,
            shading_normal: n,
            shading_tangent1: Vector3f::new(1.0, 0.0, 0.0),
            shading_tangent2: Vector3f::new(0.0, 0.0, 1.0),
            ..Default::default()
        };
        LambertianSurfel::new(data, reflectivity, Radiance3::ZERO)
    }

    #[test]
    fn density_is_reciprocal() {
        let s = surfel(Color3::new(0.8, 0.4, 0.2));
        let ep = ExpressiveParameters::default();
        let a = Vector3f::new(0.3, 0.8, 0.1).normalize();
        let b = Vector3f::new(-0.5, 0.5, 0.2).normalize();
        assert_eq!(
            s.finite_scattering_density(&a, &b, &ep),
            s.finite_scattering_density(&b, &a, &ep)
        );
        assert!(s.finite_scattering_density(&a, &-b, &ep).is_black());
    }

    #[test]
    fn scatter_stays_on_incident_side() {
        let s = surfel(Color3::gray(0.5));
        let w = Vector3f::new(0.0, 1.0, 0.0);
        let mut rng = RNG::new(1);
        for _ in 0..200 {
            let sc = s.scatter(PathDirection::EyeToSource, &w, false, &mut rng, &Default::default());
            assert!(sc.did_scatter && !sc.impulse_scattered);
            assert!(sc.w_after.dot(&w) >= 0.0);
            assert!(approx_eq!(f32, sc.weight.r, 0.5, epsilon = 1e-4));
        }
    }

    #[test]
    fn russian_roulette_is_unbiased() {
        let s = surfel(Color3::new(0.2, 0.4, 0.6));
        let w = Vector3f::new(0.2, 1.0, 0.0).normalize();
        let mut rng = RNG::new(17);
        let count = 50_000;
        let mut sum = Color3::ZERO;
        let mut survived = 0;
        for _ in 0..count {
            let sc = s.scatter(PathDirection::SourceToEye, &w, true, &mut rng, &Default::default());
            if sc.did_scatter {
                survived += 1;
                sum += sc.weight;
            }
        }
        let mean = sum / count as Float;
        assert!(approx_eq!(f32, mean.r, 0.2, epsilon = 0.02));
        assert!(approx_eq!(f32, mean.b, 0.6, epsilon = 0.02));
        let rate = survived as Float / count as Float;
        assert!(approx_eq!(f32, rate, 0.6, epsilon = 0.02));
    }

    #[test]
    fn reflectivity_estimate() {
        let s = surfel(Color3::new(0.25, 0.5, 0.75));
        let mut rng = RNG::new(4);
        let r = s.reflectivity(&mut rng, &Default::default());
        assert!(approx_eq!(f32, r.r, 0.25, epsilon = 1e-3));
        assert!(approx_eq!(f32, r.b, 0.75, epsilon = 1e-3));
    }

    #[test]
    fn black_surface_absorbs() {
        let s = surfel(Color3::ZERO);
        let mut rng = RNG::new(4);
        let sc = s.scatter(PathDirection::EyeToSource, &Vector3f::new(0.0, 1.0, 0.0), false, &mut rng, &Default::default());
        assert!(!sc.did_scatter);
        assert_eq!(
            s.probability_of_scattering(PathDirection::EyeToSource, &Vector3f::new(0.0, 1.0, 0.0), &mut rng, &Default::default()),
            Color3::ZERO
        );
    }

    #[test]
    fn boost_scales_density() {
        let s = surfel(Color3::gray(0.5));
        let a = Vector3f::new(0.0, 1.0, 0.0);
        let plain = s.finite_scattering_density(&a, &a, &ExpressiveParameters::default());
        let boosted = s.finite_scattering_density(&a, &a, &ExpressiveParameters::new(1.0, 2.0));
        assert!(approx_eq!(f32, boosted.g, plain.g * 2.0, epsilon = 1e-6));
    }
}
