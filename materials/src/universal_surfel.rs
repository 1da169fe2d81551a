//! Universal Surfel

use base::geometry::{Dot, Frame, Vector3f};
use base::pbrt::{clamp, max, Float, INV_PI, PI};
use base::rng::RNG;
use base::spectrum::{Color3, Radiance3};
use base::surfel::{
    is_refraction, ExpressiveParameters, Impulse, ImpulseArray, PathDirection, ShadingTerms, Surfel, SurfelData,
};

/// Number of strata along each axis used to integrate the glossy lobe.
const GLOSSY_STRATA: usize = 16;

/// Returns the Blinn-Phong exponent for a smoothness in `[0, 1)`.
///
/// * `smoothness` - Smoothness.
#[inline]
pub fn smoothness_to_blinn_phong_exponent(smoothness: Float) -> Float {
    let x = 1.0 / (1.0001 - smoothness);
    x * x
}

/// Returns the factor that normalizes `cos(θh)^exponent` so the lobe
/// reflects all light at normal incidence:
///
/// (e + 2)(e + 4) / (8π(2^(-e/2) + e))
///
/// * `exponent` - Blinn-Phong exponent.
#[inline]
pub fn blinn_phong_normalization(exponent: Float) -> Float {
    (exponent + 2.0) * (exponent + 4.0) / (8.0 * PI * ((-0.5 * exponent).exp2() + exponent))
}

#[inline]
fn pow5(x: Float) -> Float {
    let x2 = x * x;
    x2 * x2 * x
}

/// Returns the Schlick approximation to the Fresnel reflectance. Rough
/// surfaces brighten less towards grazing angles:
///
/// F(cosθ) = F0 + (max(F0, smoothness) - F0)(1 - cosθ)^5
///
/// * `f0`         - Reflectance at normal incidence.
/// * `cos_theta`  - Cosine of the angle of incidence.
/// * `smoothness` - Smoothness in `[0, 1]`.
pub fn schlick_fresnel(f0: &Color3, cos_theta: Float, smoothness: Float) -> Color3 {
    let t = pow5(1.0 - clamp(cos_theta, 0.0, 1.0));
    *f0 + (schlick_grazing(f0, smoothness) - *f0) * t
}

/// Returns the cosine weighted hemispherical average of `schlick_fresnel`,
/// F0 + (max(F0, smoothness) - F0) / 21.
///
/// * `f0`         - Reflectance at normal incidence.
/// * `smoothness` - Smoothness in `[0, 1]`.
pub fn schlick_fresnel_average(f0: &Color3, smoothness: Float) -> Color3 {
    *f0 + (schlick_grazing(f0, smoothness) - *f0) / 21.0
}

#[inline]
fn schlick_grazing(f0: &Color3, smoothness: Float) -> Color3 {
    Color3::new(max(f0.r, smoothness), max(f0.g, smoothness), max(f0.b, smoothness))
}

/// Computes the refracted direction, given direction `w` facing away from the
/// surface, a unit normal `n` on the same side as `w` and `eta`. Returns
/// `None` on total internal reflection.
///
/// * `w`   - Direction on the incident side.
/// * `n`   - Normal on the incident side.
/// * `eta` - Ratio of the indices of refraction on the incident and
///           transmitted sides.
pub fn refract(w: &Vector3f, n: &Vector3f, eta: Float) -> Option<Vector3f> {
    let cos_theta_i = n.dot(w);
    let sin_2_theta_i = max(0.0, 1.0 - cos_theta_i * cos_theta_i);
    let sin_2_theta_t = eta * eta * sin_2_theta_i;
    if sin_2_theta_t >= 1.0 {
        None
    } else {
        let cos_theta_t = (1.0 - sin_2_theta_t).sqrt();
        Some(-(*w) * eta + *n * (eta * cos_theta_i - cos_theta_t))
    }
}

/// A general purpose surfel. A Fresnel weighted specular layer, glossy or a
/// mirror when perfectly smooth, sits on top of a base that refracts a
/// fraction of the light and scatters the rest diffusely. It also emits.
///
/// Light not reflected by the specular layer, `1 - F`, is split between
/// refraction (`transmission`) and the Lambertian base (`1 - transmission`),
/// so no combination of coefficients in `[0, 1]` reflects more light than
/// arrives.
#[derive(Clone, Debug)]
pub struct UniversalSurfel {
    /// Local geometry.
    pub data: SurfelData,

    /// Lambertian reflectivity.
    pub lambertian: Color3,

    /// Glossy reflectance at normal incidence.
    pub glossy: Color3,

    /// Smoothness in `[0, 1]`; 1 is a mirror.
    pub smoothness: Float,

    /// Fraction of the light not reflected by the glossy layer that passes
    /// through the interface.
    pub transmission: Color3,

    /// Emitted radiance.
    pub emission: Radiance3,

    /// Index of refraction on the normal side.
    pub eta_pos: Float,

    /// Index of refraction on the back side.
    pub eta_neg: Float,
}

impl UniversalSurfel {
    /// Create a new opaque surfel.
    ///
    /// * `data`       - Local geometry.
    /// * `lambertian` - Lambertian reflectivity.
    /// * `glossy`     - Glossy reflectance at normal incidence.
    /// * `smoothness` - Smoothness in `[0, 1]`.
    /// * `emission`   - Emitted radiance.
    pub fn new(data: SurfelData, lambertian: Color3, glossy: Color3, smoothness: Float, emission: Radiance3) -> Self {
        Self {
            data,
            lambertian,
            glossy,
            smoothness: clamp(smoothness, 0.0, 1.0),
            transmission: Color3::ZERO,
            emission,
            eta_pos: 1.0,
            eta_neg: 1.0,
        }
    }

    /// Makes the surface a refractive interface with clear media on both
    /// sides.
    ///
    /// * `transmission` - Transmission coefficient.
    /// * `eta_pos`      - Index of refraction on the normal side.
    /// * `eta_neg`      - Index of refraction on the back side.
    pub fn with_transmission(mut self, transmission: Color3, eta_pos: Float, eta_neg: Float) -> Self {
        self.transmission = transmission;
        self.eta_pos = eta_pos;
        self.eta_neg = eta_neg;
        self.data.eta_ratio = eta_pos / eta_neg;
        self.data.kappa_pos = Color3::ZERO;
        self.data.kappa_neg = Color3::ZERO;
        self
    }

    /// Returns true if smoothness is high enough for a mirror impulse.
    fn is_mirror(&self) -> bool {
        self.smoothness >= 1.0
    }

    /// Returns true if there is a glossy lobe in the finite part.
    fn is_glossy(&self) -> bool {
        !self.is_mirror() && !self.glossy.is_black()
    }

    /// Returns the shading normal flipped to the side of `w`.
    fn facing(&self, w: &Vector3f) -> Vector3f {
        let n = self.data.shading_normal;
        if w.dot(&n) >= 0.0 {
            n
        } else {
            -n
        }
    }

    /// Returns the specular layer's reflectance. Without a glossy
    /// coefficient there is no specular layer.
    fn fresnel(&self, cos_theta: Float) -> Color3 {
        if self.glossy.is_black() {
            Color3::ZERO
        } else {
            schlick_fresnel(&self.glossy, cos_theta, self.smoothness)
        }
    }

    /// Returns the transmission coefficient, or zero if the surface does not
    /// refract.
    fn effective_transmission(&self) -> Color3 {
        if self.transmissive() {
            self.transmission
        } else {
            Color3::ZERO
        }
    }

    /// Returns the Lambertian base's weight before the Fresnel terms,
    /// `lambertian (1 - T) / (1 - F_avg)`. Dividing by the average Fresnel
    /// transmittance makes the base reflect exactly
    /// `lambertian (1 - T)(1 - F(cos θi))` of the incident light.
    fn base_reflectivity(&self, ep: &ExpressiveParameters) -> Color3 {
        let mut base = self.lambertian * (Color3::ONE - self.effective_transmission()) * ep.boost(&self.lambertian);
        if !self.glossy.is_black() {
            let escaping = Color3::ONE - schlick_fresnel_average(&self.glossy, self.smoothness);
            for c in 0..3 {
                base[c] = if escaping[c] > 0.0 { base[c] / escaping[c] } else { 0.0 };
            }
        }
        base
    }

    /// Returns the glossy lobe, Fresnel weighted at the half vector.
    ///
    /// * `w_i` - Incident direction.
    /// * `w_o` - Outgoing direction on the same side.
    fn glossy_density(&self, w_i: &Vector3f, w_o: &Vector3f) -> Color3 {
        let h = *w_i + *w_o;
        if h.length_squared() == 0.0 {
            return Color3::ZERO;
        }
        let w_h = h.normalize();
        let cos_h = max(0.0, w_h.dot(&self.facing(w_i)));
        let exponent = smoothness_to_blinn_phong_exponent(self.smoothness);
        let d = blinn_phong_normalization(exponent) * cos_h.powf(exponent);
        self.fresnel(w_i.dot(&w_h)) * d
    }

    /// Integrates the cosine weighted glossy lobe over outgoing directions
    /// with stratified half vectors distributed as `cos(θh)^(e + 1)`.
    ///
    /// * `w` - Incident direction.
    fn glossy_albedo(&self, w: &Vector3f) -> Color3 {
        let n = self.facing(w);
        let frame = Frame::from_normal_tangent(n, self.data.shading_tangent1);
        let exponent = smoothness_to_blinn_phong_exponent(self.smoothness);
        // f / pdf of the outgoing direction, without the cos(θh)^e factor
        // that appears in both.
        let scale = blinn_phong_normalization(exponent) * 8.0 * PI / (exponent + 2.0);

        let mut sum = Color3::ZERO;
        for i in 0..GLOSSY_STRATA {
            let u = (i as Float + 0.5) / GLOSSY_STRATA as Float;
            let cos_h = u.powf(1.0 / (exponent + 2.0));
            let sin_h = max(0.0, 1.0 - cos_h * cos_h).sqrt();
            for j in 0..GLOSSY_STRATA {
                let phi = 2.0 * PI * (j as Float + 0.5) / GLOSSY_STRATA as Float;
                let w_h = frame.from_local(&Vector3f::new(sin_h * phi.cos(), sin_h * phi.sin(), cos_h));
                let cos_ih = w.dot(&w_h);
                if cos_ih <= 0.0 {
                    continue;
                }
                let cos_o = (w_h * (2.0 * cos_ih) - *w).dot(&n);
                if cos_o <= 0.0 {
                    continue;
                }
                sum += self.fresnel(cos_ih) * (scale * cos_ih * cos_o / cos_h);
            }
        }
        sum / (GLOSSY_STRATA * GLOSSY_STRATA) as Float
    }
}

impl Surfel for UniversalSurfel {
    fn data(&self) -> &SurfelData {
        &self.data
    }

    /// The Lambertian base is scaled by the Fresnel transmittance on both
    /// sides, which keeps the density reciprocal.
    fn finite_scattering_density(&self, w_i: &Vector3f, w_o: &Vector3f, ep: &ExpressiveParameters) -> Color3 {
        if is_refraction(&self.data.shading_normal, w_i, w_o) {
            return Color3::ZERO;
        }

        let n = self.facing(w_i);
        let escaping = (Color3::ONE - self.fresnel(w_i.dot(&n))) * (Color3::ONE - self.fresnel(w_o.dot(&n)));
        let mut f = self.base_reflectivity(ep) * escaping * INV_PI;
        if self.is_glossy() {
            f += self.glossy_density(w_i, w_o);
        }
        f
    }

    /// Returns the mirror reflection when perfectly smooth and the refracted
    /// direction when transmissive. Light that would refract under total
    /// internal reflection is added to the reflected impulse.
    fn get_impulses(&self, _path_direction: PathDirection, w: &Vector3f, _ep: &ExpressiveParameters) -> ImpulseArray {
        let mut impulses = ImpulseArray::new();
        let n = self.facing(w);
        let fresnel = self.fresnel(w.dot(&n));

        if self.is_mirror() && !fresnel.is_black() {
            impulses.push(Impulse::new(w.reflect_about(&n), fresnel));
        }

        if self.transmissive() {
            let magnitude = self.transmission * (Color3::ONE - fresnel);
            let outside = w.dot(&self.data.shading_normal) >= 0.0;
            let eta = if outside {
                self.eta_pos / self.eta_neg
            } else {
                self.eta_neg / self.eta_pos
            };

            match refract(w, &n, eta) {
                Some(direction) => impulses.push(Impulse::new(direction, magnitude)),
                None => match impulses.first_mut() {
                    Some(mirror) => mirror.magnitude += magnitude,
                    None => impulses.push(Impulse::new(w.reflect_about(&n), magnitude)),
                },
            }
        }
        impulses
    }

    fn emitted_radiance(&self, _w_o: &Vector3f) -> Radiance3 {
        self.emission
    }

    fn transmissive(&self) -> bool {
        !self.transmission.is_black() && self.data.is_refractive_interface()
    }

    fn non_zero_finite_scattering(&self) -> bool {
        !(self.lambertian * (Color3::ONE - self.effective_transmission())).is_black() || self.is_glossy()
    }

    /// Sums the impulses, the Lambertian base's albedo, which has a closed
    /// form, and the glossy lobe's albedo, integrated numerically.
    fn probability_of_scattering(
        &self,
        path_direction: PathDirection,
        w: &Vector3f,
        _rng: &mut RNG,
        ep: &ExpressiveParameters,
    ) -> Color3 {
        let mut prob = self
            .get_impulses(path_direction, w, ep)
            .iter()
            .fold(Color3::ZERO, |acc, i| acc + i.magnitude);

        let escaping = Color3::ONE - self.fresnel(w.dot(&self.facing(w)));
        let base = self.lambertian * (Color3::ONE - self.effective_transmission()) * ep.boost(&self.lambertian);
        prob += base * escaping;

        if self.is_glossy() {
            prob += self.glossy_albedo(w);
        }
        prob
    }

    fn shading_terms(&self) -> Option<ShadingTerms> {
        Some(ShadingTerms {
            lambertian: self.lambertian,
            glossy: self.glossy,
            smoothness: self.smoothness,
            emission: self.emission,
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use base::sampling::cos_hemi_random;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    fn up_data() -> SurfelData {
        SurfelData {
            geometric_normal: Vector3f::new(0.0, 0.0, 1.0),
            shading_normal: Vector3f::new(0.0, 0.0, 1.0),
            shading_tangent1: Vector3f::new(1.0, 0.0, 0.0),
            shading_tangent2: Vector3f::new(0.0, 1.0, 0.0),
            ..Default::default()
        }
    }

    fn glass() -> UniversalSurfel {
        UniversalSurfel::new(up_data(), Color3::ZERO, Color3::gray(0.04), 1.0, Color3::ZERO)
            .with_transmission(Color3::ONE, 1.0, 1.5)
    }

    fn direction(theta: Float, phi: Float) -> Vector3f {
        Vector3f::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos())
    }

    #[test]
    fn lambertian_only_is_constant() {
        let s = UniversalSurfel::new(up_data(), Color3::new(0.6, 0.3, 0.1), Color3::ZERO, 0.0, Color3::ZERO);
        let ep = ExpressiveParameters::default();
        let f = s.finite_scattering_density(&direction(0.3, 1.0), &direction(1.2, 4.0), &ep);
        assert!(approx_eq!(f32, f.r, 0.6 * INV_PI, ulps = 4));
        assert!(approx_eq!(f32, f.b, 0.1 * INV_PI, ulps = 4));
        assert!(s.get_impulses(PathDirection::EyeToSource, &direction(0.3, 1.0), &ep).is_empty());
        assert!(!s.transmissive());
        assert!(s.non_zero_finite_scattering());

        // Nothing scatters into the back side of an opaque surface.
        let below = -direction(0.5, 0.0);
        assert!(s.finite_scattering_density(&direction(0.3, 1.0), &below, &ep).is_black());
    }

    #[test]
    fn schlick_endpoints() {
        let f0 = Color3::gray(0.04);
        assert_eq!(schlick_fresnel(&f0, 1.0, 1.0), f0);
        assert!(approx_eq!(f32, schlick_fresnel(&f0, 0.0, 1.0).g, 1.0, ulps = 4));
        assert!(approx_eq!(f32, schlick_fresnel(&f0, 0.0, 0.5).g, 0.5, ulps = 4));
        // Never darker than F0.
        assert!(approx_eq!(f32, schlick_fresnel(&Color3::gray(0.9), 0.0, 0.2).g, 0.9, ulps = 4));
    }

    #[test]
    fn mirror_reflects_with_fresnel_weight() {
        let s = UniversalSurfel::new(up_data(), Color3::ZERO, Color3::gray(0.04), 1.0, Color3::ZERO);
        let ep = ExpressiveParameters::default();
        assert!(!s.non_zero_finite_scattering());

        let impulses = s.get_impulses(PathDirection::EyeToSource, &Vector3f::new(0.0, 0.0, 1.0), &ep);
        assert_eq!(impulses.len(), 1);
        assert_eq!(impulses[0].direction, Vector3f::new(0.0, 0.0, 1.0));
        assert!(approx_eq!(f32, impulses[0].magnitude.r, 0.04, ulps = 4));

        let w = direction(1.0, 0.0);
        let impulses = s.get_impulses(PathDirection::EyeToSource, &w, &ep);
        let r = impulses[0].direction;
        assert!(approx_eq!(f32, r.x, -w.x, epsilon = 1e-6));
        assert!(approx_eq!(f32, r.z, w.z, epsilon = 1e-6));
        assert!(impulses[0].magnitude.r > 0.04);
    }

    #[test]
    fn glass_reflects_and_refracts_at_normal_incidence() {
        let s = glass();
        assert!(s.transmissive());
        assert!(s.data().is_refractive_interface());
        assert!(approx_eq!(f32, s.data().eta_ratio, 1.0 / 1.5, ulps = 4));

        let impulses = s.get_impulses(PathDirection::EyeToSource, &Vector3f::new(0.0, 0.0, 1.0), &Default::default());
        assert_eq!(impulses.len(), 2);
        assert!(approx_eq!(f32, impulses[0].magnitude.g, 0.04, ulps = 4));
        let t = impulses[1];
        assert!(approx_eq!(f32, t.direction.z, -1.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, t.magnitude.g, 0.96, epsilon = 1e-6));
    }

    #[test]
    fn total_internal_reflection_folds_into_mirror() {
        let s = glass();
        // Grazing direction inside the denser medium.
        let w = Vector3f::new(0.9, 0.0, -0.1).normalize();
        let impulses = s.get_impulses(PathDirection::EyeToSource, &w, &Default::default());
        assert_eq!(impulses.len(), 1);
        assert!(impulses[0].direction.z < 0.0);
        assert!(approx_eq!(f32, impulses[0].magnitude.b, 1.0, epsilon = 1e-5));
    }

    #[test]
    fn scatter_mean_matches_analytic_probability() {
        let s = UniversalSurfel::new(up_data(), Color3::new(0.5, 0.4, 0.1), Color3::gray(0.2), 1.0, Color3::ZERO);
        let ep = ExpressiveParameters::default();
        let w = Vector3f::new(0.0, 0.0, 1.0);
        let mut rng = RNG::new(9);
        let expected = s.probability_of_scattering(PathDirection::EyeToSource, &w, &mut rng, &ep);
        // Mirror F0 plus the Lambertian base under (1 - F0).
        assert!(approx_eq!(f32, expected.r, 0.6, epsilon = 1e-5));
        assert!(approx_eq!(f32, expected.b, 0.28, epsilon = 1e-5));

        let count = 40_000;
        let mut sum = Color3::ZERO;
        for _ in 0..count {
            sum += s.scatter(PathDirection::EyeToSource, &w, false, &mut rng, &ep).weight;
        }
        let mean = sum / count as Float;
        for c in 0..3 {
            assert!((mean[c] - expected[c]).abs() < 0.03, "mean={mean:?} expected={expected:?}");
        }
    }

    /// Returns the mean `scatter` weight over `count` samples.
    fn mean_scatter_weight(s: &UniversalSurfel, w: &Vector3f, count: usize, rng: &mut RNG) -> Color3 {
        let ep = ExpressiveParameters::default();
        let mut sum = Color3::ZERO;
        for _ in 0..count {
            sum += s.scatter(PathDirection::EyeToSource, w, false, rng, &ep).weight;
        }
        sum / count as Float
    }

    #[test]
    fn finite_albedo_matches_probability() {
        let s = UniversalSurfel::new(up_data(), Color3::gray(0.4), Color3::gray(0.3), 0.6, Color3::ZERO);
        let ep = ExpressiveParameters::default();
        let n = s.data().shading_normal;
        let mut rng = RNG::new(3);
        for theta in [0.0, 0.7, 1.3] {
            let w_i = direction(theta, 0.5);
            let count = 40_000;
            let mut sum = Color3::ZERO;
            for _ in 0..count {
                // With cosine sampling f cos / pdf = f pi.
                let w_o = cos_hemi_random(&n, &mut rng);
                sum += s.finite_scattering_density(&w_i, &w_o, &ep) * PI;
            }
            let albedo = sum / count as Float;
            let expected = s.probability_of_scattering(PathDirection::EyeToSource, &w_i, &mut rng, &ep);
            assert!(albedo.max_component() < 1.0, "theta={theta} albedo={albedo:?}");
            assert!(
                (albedo.g - expected.g).abs() < 0.02,
                "theta={theta} albedo={albedo:?} expected={expected:?}"
            );
        }
    }

    #[test]
    fn bright_base_under_gloss_conserves_energy() {
        // F0 equals the smoothness, so the specular layer reflects half the
        // light at every angle and the base gets the other half.
        let s = UniversalSurfel::new(up_data(), Color3::gray(0.8), Color3::gray(0.5), 0.5, Color3::ZERO);
        let ep = ExpressiveParameters::default();
        let mut rng = RNG::new(17);

        let w = Vector3f::new(0.0, 0.0, 1.0);
        let expected = s.probability_of_scattering(PathDirection::EyeToSource, &w, &mut rng, &ep);
        assert!(approx_eq!(f32, expected.r, 0.9, epsilon = 0.01), "expected={expected:?}");

        for w in [w, direction(0.8, 2.0)] {
            let expected = s.probability_of_scattering(PathDirection::EyeToSource, &w, &mut rng, &ep);
            let mean = mean_scatter_weight(&s, &w, 50_000, &mut rng);
            assert!(expected.max_component() <= 1.0, "expected={expected:?}");
            assert!(mean.max_component() <= 1.02, "mean={mean:?}");
            assert!((mean.r - expected.r).abs() < 0.02, "mean={mean:?} expected={expected:?}");
        }
    }

    #[test]
    fn transmission_takes_light_from_the_base() {
        let s = UniversalSurfel::new(up_data(), Color3::gray(0.9), Color3::gray(0.04), 0.7, Color3::ZERO)
            .with_transmission(Color3::gray(0.5), 1.0, 1.5);
        let ep = ExpressiveParameters::default();
        let mut rng = RNG::new(23);
        let w = direction(0.4, 1.0);

        let impulses = s.get_impulses(PathDirection::EyeToSource, &w, &ep);
        assert_eq!(impulses.len(), 1);
        assert!(impulses[0].direction.z < 0.0);

        let expected = s.probability_of_scattering(PathDirection::EyeToSource, &w, &mut rng, &ep);
        let mean = mean_scatter_weight(&s, &w, 50_000, &mut rng);
        assert!(expected.max_component() <= 1.0, "expected={expected:?}");
        assert!((mean.g - expected.g).abs() < 0.02, "mean={mean:?} expected={expected:?}");
    }

    #[test]
    fn density_is_reciprocal_across_refractive_interface() {
        let s = UniversalSurfel::new(up_data(), Color3::gray(0.6), Color3::new(0.04, 0.1, 0.3), 0.4, Color3::ZERO)
            .with_transmission(Color3::gray(0.3), 1.0, 1.5);
        let ep = ExpressiveParameters::default();
        let mut rng = RNG::new(31);
        for _ in 0..200 {
            let a = cos_hemi_random(&Vector3f::new(0.0, 0.0, 1.0), &mut rng);
            let b = cos_hemi_random(&Vector3f::new(0.0, 0.0, 1.0), &mut rng);

            // Both directions in the same medium, so (eta_o / eta_i)^2 = 1.
            for (w_i, w_o) in [(a, b), (-a, -b)] {
                let fab = s.finite_scattering_density(&w_i, &w_o, &ep);
                let fba = s.finite_scattering_density(&w_o, &w_i, &ep);
                for c in 0..3 {
                    assert!(approx_eq!(f32, fab[c], fba[c], epsilon = 1e-4 * (1.0 + fab[c])));
                }
            }

            // Refraction is carried by the impulse only.
            assert!(s.finite_scattering_density(&a, &-b, &ep).is_black());
            assert!(s.finite_scattering_density(&-b, &a, &ep).is_black());
        }
    }

    #[test]
    fn shading_terms_and_emission() {
        let s = UniversalSurfel::new(up_data(), Color3::gray(0.2), Color3::gray(0.5), 0.25, Color3::new(1.0, 2.0, 3.0));
        let terms = s.shading_terms().unwrap();
        assert_eq!(terms.lambertian, Color3::gray(0.2));
        assert_eq!(terms.glossy, Color3::gray(0.5));
        assert_eq!(terms.smoothness, 0.25);
        assert_eq!(s.emitted_radiance(&direction(0.2, 0.0)), Color3::new(1.0, 2.0, 3.0));
    }

    proptest! {
        #[test]
        fn glossy_density_is_reciprocal(
            t0 in 0.0..1.5f32, p0 in 0.0..6.28f32,
            t1 in 0.0..1.5f32, p1 in 0.0..6.28f32,
            smoothness in 0.0..0.95f32,
        ) {
            let s = UniversalSurfel::new(up_data(), Color3::gray(0.3), Color3::new(0.04, 0.2, 0.5), smoothness, Color3::ZERO);
            let ep = ExpressiveParameters::default();
            let (a, b) = (direction(t0, p0), direction(t1, p1));
            let fab = s.finite_scattering_density(&a, &b, &ep);
            let fba = s.finite_scattering_density(&b, &a, &ep);
            for c in 0..3 {
                prop_assert!(approx_eq!(f32, fab[c], fba[c], epsilon = 1e-4 * (1.0 + fab[c])));
            }
        }

        #[test]
        fn refraction_obeys_snell(theta in 0.0..1.5f32, phi in 0.0..6.28f32) {
            let n = Vector3f::new(0.0, 0.0, 1.0);
            let w = direction(theta, phi);
            let t = refract(&w, &n, 1.0 / 1.5).unwrap();
            prop_assert!(t.z < 0.0);
            prop_assert!(approx_eq!(f32, t.length(), 1.0, epsilon = 1e-4));
            let sin_i = theta.sin();
            let sin_t = (t.x * t.x + t.y * t.y).sqrt();
            prop_assert!(approx_eq!(f32, sin_i, 1.5 * sin_t, epsilon = 1e-4));
        }

        #[test]
        fn probability_is_bounded(
            theta in 0.0..1.5f32,
            l in 0.0..1.0f32,
            g in 0.0..=1.0f32,
            smoothness in 0.0..1.0f32,
            t in 0.0..1.0f32,
        ) {
            let s = UniversalSurfel::new(up_data(), Color3::gray(l), Color3::gray(g), smoothness, Color3::ZERO)
                .with_transmission(Color3::gray(t), 1.0, 1.33);
            let mut rng = RNG::new(1);
            for w in [direction(theta, 0.0), -direction(theta, 0.0)] {
                let p = s.probability_of_scattering(PathDirection::SourceToEye, &w, &mut rng, &Default::default());
                // Numerical integration of the glossy lobe is accurate to
                // about 1%.
                prop_assert!(p.min_component() >= 0.0 && p.max_component() <= 1.01, "p={:?}", p);
                for i in s.get_impulses(PathDirection::SourceToEye, &w, &Default::default()) {
                    prop_assert!(i.magnitude.min_component() >= 0.0 && i.magnitude.max_component() <= 1.0 + 1e-6);
                }
            }
        }
    }
}
