//! Scattering Protocol

use super::{ExpressiveParameters, ImpulseArray, PathDirection, SurfelData};
use crate::geometry::{Dot, Vector3f};
use crate::pbrt::{min, Float, INV_PI};
use crate::rng::RNG;
use crate::sampling::cos_hemi_random;
use crate::spectrum::{Color3, Radiance3};
use std::fmt::Debug;
use std::sync::Arc;

/// Number of directions used by the default `probability_of_scattering()`.
const PROBABILITY_SAMPLES: usize = 32;

/// Number of directions used by the default `reflectivity()`.
const REFLECTIVITY_SAMPLES: usize = 25;

/// Result of sampling a scattered direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Scatter {
    /// Sampled direction facing away from the surface.
    pub w_after: Vector3f,

    /// `g(w_after) / h(w_after)` where `g` is the cosine weighted BSDF and `h`
    /// the density the direction was sampled from. Zero when absorbed.
    pub weight: Color3,

    /// False when the path was absorbed.
    pub did_scatter: bool,

    /// True if an impulse was chosen.
    pub impulse_scattered: bool,

    /// 1 for impulses, 0 for zero density, increasing with the density in
    /// between.
    pub probability_hint: Float,
}

impl Scatter {
    /// Returns an absorbed sample.
    pub fn absorbed() -> Self {
        Self {
            w_after: Vector3f::zero(),
            weight: Color3::ZERO,
            did_scatter: false,
            impulse_scattered: false,
            probability_hint: 0.0,
        }
    }
}

/// Coefficients written to G-buffer style outputs.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ShadingTerms {
    /// Lambertian reflectivity.
    pub lambertian: Color3,

    /// Glossy reflection coefficient at normal incidence.
    pub glossy: Color3,

    /// Smoothness in `[0, 1]`; 1 is a mirror.
    pub smoothness: Float,

    /// Emitted radiance.
    pub emission: Radiance3,
}

/// A sample of a surface: local geometry plus the BSDF and emission at that
/// point. Implementations only need to provide `data()`,
/// `finite_scattering_density()` and `get_impulses()`; the remaining methods
/// have Monte Carlo defaults that work for any BSDF.
///
/// Directions always face away from the surface.
pub trait Surfel: Debug + Send + Sync {
    /// Returns the local geometry.
    fn data(&self) -> &SurfelData;

    /// Returns the finite (non-impulse) part of the BSDF
    /// `f(w_i, w_o)`.
    ///
    /// * `w_i` - Direction light arrives from.
    /// * `w_o` - Direction light leaves toward.
    /// * `ep`  - Expressive parameters.
    fn finite_scattering_density(&self, w_i: &Vector3f, w_o: &Vector3f, ep: &ExpressiveParameters) -> Color3;

    /// Returns the impulses for scattering from `w`.
    ///
    /// * `path_direction` - Direction of transport.
    /// * `w`              - `w_o` for `EyeToSource`, `w_i` for `SourceToEye`.
    /// * `ep`             - Expressive parameters.
    fn get_impulses(&self, path_direction: PathDirection, w: &Vector3f, ep: &ExpressiveParameters) -> ImpulseArray;

    /// Returns the radiance emitted toward `w_o`.
    ///
    /// * `w_o` - Outgoing direction.
    fn emitted_radiance(&self, _w_o: &Vector3f) -> Radiance3 {
        Radiance3::ZERO
    }

    /// Returns true if light may pass through the surface.
    fn transmissive(&self) -> bool {
        true
    }

    /// Returns false if `finite_scattering_density()` is zero everywhere.
    fn non_zero_finite_scattering(&self) -> bool {
        true
    }

    /// Evaluates the finite density with arguments ordered by the direction
    /// of transport.
    ///
    /// * `path_direction` - Direction of transport.
    /// * `w_from`         - Direction the path arrives from.
    /// * `w_to`           - Direction the path leaves toward.
    /// * `ep`             - Expressive parameters.
    fn finite_scattering_density_path(
        &self,
        path_direction: PathDirection,
        w_from: &Vector3f,
        w_to: &Vector3f,
        ep: &ExpressiveParameters,
    ) -> Color3 {
        match path_direction {
            PathDirection::SourceToEye => self.finite_scattering_density(w_from, w_to, ep),
            PathDirection::EyeToSource => self.finite_scattering_density(w_to, w_from, ep),
        }
    }

    /// Samples a scattered direction. See `default_scatter()`.
    ///
    /// * `path_direction`   - Direction of transport.
    /// * `w_before`         - Direction the path arrives from.
    /// * `russian_roulette` - Terminate low weight paths and boost survivors.
    /// * `rng`              - Random number generator.
    /// * `ep`               - Expressive parameters.
    fn scatter(
        &self,
        path_direction: PathDirection,
        w_before: &Vector3f,
        russian_roulette: bool,
        rng: &mut RNG,
        ep: &ExpressiveParameters,
    ) -> Scatter {
        default_scatter(self, path_direction, w_before, russian_roulette, rng, ep)
    }

    /// Returns the probability of scattering (vs. absorption) per channel for
    /// light arriving along `w`. In `[0, 1]` unless `ep` boosts the BSDF.
    ///
    /// * `path_direction` - Direction of transport.
    /// * `w`              - Direction the path arrives from.
    /// * `rng`            - Random number generator.
    /// * `ep`             - Expressive parameters.
    fn probability_of_scattering(
        &self,
        path_direction: PathDirection,
        w: &Vector3f,
        rng: &mut RNG,
        ep: &ExpressiveParameters,
    ) -> Color3 {
        default_probability_of_scattering(self, path_direction, w, rng, ep)
    }

    /// Returns an approximate reflectivity, e.g. for ambient terms.
    ///
    /// * `rng` - Random number generator.
    /// * `ep`  - Expressive parameters.
    fn reflectivity(&self, rng: &mut RNG, ep: &ExpressiveParameters) -> Color3 {
        default_reflectivity(self, rng, ep)
    }

    /// Returns the terms written to G-buffer outputs, if this surfel kind
    /// has them.
    fn shading_terms(&self) -> Option<ShadingTerms> {
        None
    }
}

/// Atomically reference counted `Surfel`.
pub type ArcSurfel = Arc<dyn Surfel>;

/// Returns true if `w_i` and `w_o` are on opposite sides of the surface.
///
/// * `n`   - Surface normal.
/// * `w_i` - Incident direction.
/// * `w_o` - Outgoing direction.
#[inline]
pub fn is_refraction(n: &Vector3f, w_i: &Vector3f, w_o: &Vector3f) -> bool {
    (w_i.dot(n) > 0.0) != (w_o.dot(n) > 0.0)
}

/// Samples a direction against the BSDF of `surfel`.
///
/// An impulse is chosen with probability equal to its mean magnitude
/// (normalized if the impulses sum to more than one). Otherwise the direction
/// is cosine distributed about the shading normal on the side of `w_before`,
/// or on either side with equal probability for transmissive surfaces, and
/// weighted by the finite density.
///
/// * `surfel`           - The surface sample.
/// * `path_direction`   - Direction of transport.
/// * `w_before`         - Direction the path arrives from.
/// * `russian_roulette` - Terminate low weight paths and boost survivors.
/// * `rng`              - Random number generator.
/// * `ep`               - Expressive parameters.
pub fn default_scatter<S: Surfel + ?Sized>(
    surfel: &S,
    path_direction: PathDirection,
    w_before: &Vector3f,
    russian_roulette: bool,
    rng: &mut RNG,
    ep: &ExpressiveParameters,
) -> Scatter {
    let impulses = surfel.get_impulses(path_direction, w_before, ep);
    let total: Float = impulses.iter().map(|i| i.magnitude.average()).sum();
    let scale = if total > 1.0 { 1.0 / total } else { 1.0 };

    let r = rng.uniform_float();
    let mut accum = 0.0;
    let mut result = None;
    for impulse in impulses.iter() {
        let p = impulse.magnitude.average() * scale;
        accum += p;
        if p > 0.0 && r < accum {
            result = Some(Scatter {
                w_after: impulse.direction,
                weight: impulse.magnitude / p,
                did_scatter: true,
                impulse_scattered: true,
                probability_hint: 1.0,
            });
            break;
        }
    }

    let mut result = match result {
        Some(s) => s,
        None => {
            let p_finite = 1.0 - total * scale;
            if p_finite <= 0.0 || !surfel.non_zero_finite_scattering() {
                return Scatter::absorbed();
            }
            sample_finite(surfel, path_direction, w_before, p_finite, rng, ep)
        }
    };

    if russian_roulette && !result.weight.is_black() {
        let q = min(1.0, result.weight.max_component());
        if rng.uniform_float() >= q {
            return Scatter::absorbed();
        }
        result.weight /= q;
    }

    result.did_scatter = !result.weight.is_black();
    result
}

/// Cosine samples the finite part of the BSDF.
fn sample_finite<S: Surfel + ?Sized>(
    surfel: &S,
    path_direction: PathDirection,
    w_before: &Vector3f,
    p_finite: Float,
    rng: &mut RNG,
    ep: &ExpressiveParameters,
) -> Scatter {
    let n = surfel.data().shading_normal;
    let mut side = if w_before.dot(&n) >= 0.0 { n } else { -n };
    let mut side_probability = 1.0;
    if surfel.transmissive() {
        side_probability = 0.5;
        if rng.uniform_float() < 0.5 {
            side = -side;
        }
    }

    let w_after = cos_hemi_random(&side, rng);
    let cos_theta = w_after.abs_dot(&n);
    let pdf = cos_theta * INV_PI * side_probability;
    if pdf <= 0.0 {
        return Scatter::absorbed();
    }

    let f = surfel.finite_scattering_density_path(path_direction, w_before, &w_after, ep);
    Scatter {
        w_after,
        weight: f * (cos_theta / (pdf * p_finite)),
        did_scatter: true,
        impulse_scattered: false,
        probability_hint: pdf / (1.0 + pdf),
    }
}

/// Estimates the probability of scattering from the impulse magnitudes plus
/// a Monte Carlo integral of the cosine weighted finite density.
///
/// * `surfel`         - The surface sample.
/// * `path_direction` - Direction of transport.
/// * `w`              - Direction the path arrives from.
/// * `rng`            - Random number generator.
/// * `ep`             - Expressive parameters.
pub fn default_probability_of_scattering<S: Surfel + ?Sized>(
    surfel: &S,
    path_direction: PathDirection,
    w: &Vector3f,
    rng: &mut RNG,
    ep: &ExpressiveParameters,
) -> Color3 {
    let mut prob = surfel
        .get_impulses(path_direction, w, ep)
        .iter()
        .fold(Color3::ZERO, |acc, i| acc + i.magnitude);

    if surfel.non_zero_finite_scattering() {
        let n = surfel.data().shading_normal;
        let front = if w.dot(&n) >= 0.0 { n } else { -n };
        let mut sides = vec![front];
        if surfel.transmissive() {
            sides.push(-front);
        }

        // With cosine sampling f |cos| / pdf reduces to f * pi.
        for side in sides {
            let mut sum = Color3::ZERO;
            for _ in 0..PROBABILITY_SAMPLES {
                let w_after = cos_hemi_random(&side, rng);
                sum += surfel.finite_scattering_density_path(path_direction, w, &w_after, ep);
            }
            prob += sum * (crate::pbrt::PI / PROBABILITY_SAMPLES as Float);
        }
    }

    if ep.is_identity() {
        prob.clamp(0.0, 1.0)
    } else {
        prob
    }
}

/// Averages `probability_of_scattering()` over cosine distributed viewing
/// directions about the shading normal.
///
/// * `surfel` - The surface sample.
/// * `rng`    - Random number generator.
/// * `ep`     - Expressive parameters.
pub fn default_reflectivity<S: Surfel + ?Sized>(surfel: &S, rng: &mut RNG, ep: &ExpressiveParameters) -> Color3 {
    let n = surfel.data().shading_normal;
    let mut sum = Color3::ZERO;
    for _ in 0..REFLECTIVITY_SAMPLES {
        let w = cos_hemi_random(&n, rng);
        sum += surfel.probability_of_scattering(PathDirection::EyeToSource, &w, rng, ep);
    }
    sum / REFLECTIVITY_SAMPLES as Float
}
